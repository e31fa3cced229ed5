//! Triage scoring engine.
//!
//! [`score`] is a pure, total function: the same symptoms and vitals always produce the same
//! [`TriageResult`], and malformed vitals never produce an error. The rules are evaluated in a
//! fixed order and each one that fires appends one fixed sentence to the explanation:
//!
//! 1. a critical symptom phrase (+5, trauma center), *else* a common-illness phrase (+2);
//! 2. heart rate above 120 bpm (+3);
//! 3. SpO2 below 95% (+4, always routes to the trauma center).
//!
//! The total is clamped to `1..=10`.
//!
//! Symptom matching is a case-insensitive substring search, so "feverish" matches "fever".

use crate::constants::{
    COMMON_ILLNESS_POINTS, COMMON_ILLNESS_SENTENCE, COMMON_ILLNESS_SYMPTOMS,
    CRITICAL_SYMPTOMS, CRITICAL_SYMPTOM_POINTS, CRITICAL_SYMPTOM_SENTENCE,
    ELEVATED_HEART_RATE_POINTS, ELEVATED_HEART_RATE_SENTENCE, EXPLANATION_PREAMBLE,
    HEART_RATE_THRESHOLD_BPM, LOW_OXYGEN_POINTS, LOW_OXYGEN_SENTENCE, MAX_SEVERITY_SCORE,
    MIN_SEVERITY_SCORE, SPO2_THRESHOLD_PERCENT,
};
use crate::triage::{Facility, TriageResult, VitalSigns};

/// Scores one submission.
pub fn score(symptoms: &str, vitals: &VitalSigns) -> TriageResult {
    let mut total = 0u32;
    let mut explanation = String::from(EXPLANATION_PREAMBLE);
    let mut facility = Facility::GeneralHospital;

    let symptoms = symptoms.to_lowercase();
    let heart_rate = parse_int_prefix(&vitals.heart_rate);
    let spo2 = parse_float_prefix(&vitals.spo2);

    if contains_any(&symptoms, &CRITICAL_SYMPTOMS) {
        total += CRITICAL_SYMPTOM_POINTS;
        explanation.push_str(CRITICAL_SYMPTOM_SENTENCE);
        facility = Facility::TraumaCenter;
    } else if contains_any(&symptoms, &COMMON_ILLNESS_SYMPTOMS) {
        total += COMMON_ILLNESS_POINTS;
        explanation.push_str(COMMON_ILLNESS_SENTENCE);
    }

    if heart_rate.is_some_and(|bpm| bpm > HEART_RATE_THRESHOLD_BPM) {
        total += ELEVATED_HEART_RATE_POINTS;
        explanation.push_str(ELEVATED_HEART_RATE_SENTENCE);
    }

    if spo2.is_some_and(|pct| pct < SPO2_THRESHOLD_PERCENT) {
        total += LOW_OXYGEN_POINTS;
        explanation.push_str(LOW_OXYGEN_SENTENCE);
        facility = Facility::TraumaCenter;
    }

    let severity = total.clamp(MIN_SEVERITY_SCORE, MAX_SEVERITY_SCORE);
    TriageResult::new(severity, explanation, facility)
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| haystack.contains(phrase))
}

/// Parses the leading base-10 integer of `input`, ignoring leading whitespace and anything after
/// the digits (`"130bpm"` is 130, `"12.9"` is 12). Returns `None` when no digits lead the input.
/// Values too large for `i64` saturate.
pub(crate) fn parse_int_prefix(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = split_sign(trimmed);
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let digits = &rest[..digits_len];
    let value = match digits.parse::<i64>() {
        Ok(v) => v,
        // Only overflow can fail here: the slice is all ASCII digits.
        Err(_) => i64::MAX,
    };
    Some(if negative { value.saturating_neg() } else { value })
}

/// Parses the leading decimal number of `input` (`"92.5%"` is 92.5, `".5"` is 0.5, `"1e2"` is
/// 100, `"-Infinity"` is negative infinity). Returns `None` when the input does not start with a
/// number.
pub(crate) fn parse_float_prefix(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if trimmed[end..].starts_with("Infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}

fn split_sign(input: &str) -> (bool, &str) {
    if let Some(rest) = input.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = input.strip_prefix('+') {
        (false, rest)
    } else {
        (false, input)
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        GENERAL_HOSPITAL_INFO, GENERAL_HOSPITAL_NAME, TRAUMA_CENTER_INFO, TRAUMA_CENTER_NAME,
    };

    fn vitals(heart_rate: &str, spo2: &str) -> VitalSigns {
        VitalSigns {
            heart_rate: heart_rate.into(),
            blood_pressure: String::new(),
            temperature: String::new(),
            spo2: spo2.into(),
        }
    }

    #[test]
    fn critical_case_with_bad_vitals_clamps_to_ten() {
        let vitals = VitalSigns {
            heart_rate: "130".into(),
            blood_pressure: "120/80".into(),
            temperature: "99".into(),
            spo2: "92".into(),
        };
        let result = score("I have chest pain", &vitals);

        assert_eq!(result.severity_score, 10);
        assert_eq!(result.recommended_hospital, TRAUMA_CENTER_NAME);
        assert_eq!(result.hospital_info, TRAUMA_CENTER_INFO);
        assert_eq!(
            result.explanation,
            "Based on your reported symptoms. Critical symptoms indicate a high priority. \
             Elevated heart rate is a significant concern. \
             Low oxygen saturation requires immediate attention."
        );
    }

    #[test]
    fn nothing_triggered_floors_to_one() {
        let result = score("mild headache", &VitalSigns::default());

        assert_eq!(result.severity_score, 1);
        assert_eq!(result.explanation, EXPLANATION_PREAMBLE);
        assert_eq!(result.recommended_hospital, GENERAL_HOSPITAL_NAME);
        assert_eq!(result.hospital_info, GENERAL_HOSPITAL_INFO);
    }

    #[test]
    fn vitals_rules_fire_without_symptom_match() {
        let result = score("", &vitals("150", "90"));

        assert_eq!(result.severity_score, 7);
        assert_eq!(result.recommended_hospital, TRAUMA_CENTER_NAME);
        assert_eq!(
            result.explanation,
            format!("{EXPLANATION_PREAMBLE}{ELEVATED_HEART_RATE_SENTENCE}{LOW_OXYGEN_SENTENCE}")
        );
    }

    #[test]
    fn critical_symptoms_shadow_common_illness() {
        let result = score("Chest pain and a fever", &VitalSigns::default());

        assert_eq!(result.severity_score, 5);
        assert!(result.explanation.contains(CRITICAL_SYMPTOM_SENTENCE.trim()));
        assert!(!result.explanation.contains(COMMON_ILLNESS_SENTENCE.trim()));
    }

    #[test]
    fn common_illness_keeps_general_hospital() {
        let result = score("VOMITING since last night", &vitals("90", "98"));

        assert_eq!(result.severity_score, 2);
        assert_eq!(result.recommended_hospital, GENERAL_HOSPITAL_NAME);
        assert_eq!(
            result.explanation,
            format!("{EXPLANATION_PREAMBLE}{COMMON_ILLNESS_SENTENCE}")
        );
    }

    #[test]
    fn low_spo2_alone_overrides_facility() {
        let result = score("", &vitals("", "80"));

        assert_eq!(result.severity_score, 4);
        assert_eq!(result.recommended_hospital, TRAUMA_CENTER_NAME);
        assert_eq!(result.hospital_info, TRAUMA_CENTER_INFO);
    }

    #[test]
    fn difficulty_breathing_is_critical() {
        let result = score("some Difficulty Breathing when walking", &VitalSigns::default());
        assert_eq!(result.severity_score, 5);
        assert_eq!(result.recommended_hospital, TRAUMA_CENTER_NAME);
    }

    #[test]
    fn substring_matching_accepts_partial_words() {
        let result = score("feverish chestnut pain", &VitalSigns::default());
        assert_eq!(result.severity_score, 2);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(score("", &vitals("120", "95")).severity_score, 1);
        assert_eq!(score("", &vitals("121", "95")).severity_score, 3);
        assert_eq!(score("", &vitals("120", "94.9")).severity_score, 4);
    }

    #[test]
    fn unparseable_vitals_are_ignored() {
        let result = score("", &vitals("fast", "low"));
        assert_eq!(result.severity_score, 1);
        assert_eq!(result.explanation, EXPLANATION_PREAMBLE);
    }

    #[test]
    fn vitals_with_units_still_parse() {
        let result = score("", &vitals(" 130bpm", "92.5%"));
        assert_eq!(result.severity_score, 7);
    }

    #[test]
    fn infinite_oxygen_readings_follow_the_sign() {
        let result = score("", &vitals("", "-Infinity"));
        assert_eq!(result.severity_score, 4);
        assert_eq!(result.recommended_hospital, TRAUMA_CENTER_NAME);

        let result = score("", &vitals("", "Infinity"));
        assert_eq!(result.severity_score, 1);
        assert_eq!(result.recommended_hospital, GENERAL_HOSPITAL_NAME);
    }

    #[test]
    fn scoring_is_deterministic() {
        let vitals = vitals("135", "91");
        let first = score("difficulty breathing", &vitals);
        let second = score("difficulty breathing", &vitals);
        assert_eq!(first, second);
    }

    #[test]
    fn score_stays_in_range_for_assorted_inputs() {
        let symptoms = ["", "fever", "chest pain", "vomiting and chest pain", "ok"];
        let rates = ["", "0", "121", "-5", "999999999999999999999", "abc"];
        let oxygen = ["", "100", "94", "-1", "1e2", "."];

        for s in symptoms {
            for hr in rates {
                for o2 in oxygen {
                    let result = score(s, &vitals(hr, o2));
                    assert!(
                        (1..=10).contains(&result.severity_score),
                        "score out of range for {s:?}/{hr:?}/{o2:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn int_prefix_parsing() {
        assert_eq!(parse_int_prefix("85"), Some(85));
        assert_eq!(parse_int_prefix("  130 bpm"), Some(130));
        assert_eq!(parse_int_prefix("12.9"), Some(12));
        assert_eq!(parse_int_prefix("-7"), Some(-7));
        assert_eq!(parse_int_prefix("+42"), Some(42));
        assert_eq!(parse_int_prefix("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("bpm 130"), None);
        assert_eq!(parse_int_prefix("-"), None);
    }

    #[test]
    fn float_prefix_parsing() {
        assert_eq!(parse_float_prefix("98"), Some(98.0));
        assert_eq!(parse_float_prefix("92.5%"), Some(92.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("7."), Some(7.0));
        assert_eq!(parse_float_prefix("1e2"), Some(100.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix(" -3.25x"), Some(-3.25));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix("+Infinity%"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix(" Infinityx"), Some(f64::INFINITY));
        assert_eq!(parse_float_prefix("infinity"), None);
        assert_eq!(parse_float_prefix("inf"), None);
        assert_eq!(parse_float_prefix("NaN"), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
    }
}
