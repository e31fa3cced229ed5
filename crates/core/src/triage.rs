//! Triage data model.
//!
//! Field names serialise in camelCase so documents written by the record store keep the layout
//! `{symptoms, vitals: {heartRate, bloodPressure, temperature, spO2}, severityScore, ...}`.

use crate::constants::{
    GENERAL_HOSPITAL_INFO, GENERAL_HOSPITAL_NAME, TRAUMA_CENTER_INFO, TRAUMA_CENTER_NAME,
};
use crate::lenient;
use serde::{Deserialize, Serialize};

/// Patient-reported vital signs, kept exactly as typed.
///
/// No field is validated. Heart rate and SpO2 are parsed by the scoring engine and treated as
/// absent when they do not start with a number; blood pressure and temperature are recorded but
/// never scored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalSigns {
    #[serde(deserialize_with = "lenient::string")]
    pub heart_rate: String,
    #[serde(deserialize_with = "lenient::string")]
    pub blood_pressure: String,
    #[serde(deserialize_with = "lenient::string")]
    pub temperature: String,
    #[serde(rename = "spO2", deserialize_with = "lenient::string")]
    pub spo2: String,
}

impl VitalSigns {
    /// Builds vitals from optional form fields; every missing field becomes the empty string.
    pub fn from_fields(
        heart_rate: Option<String>,
        blood_pressure: Option<String>,
        temperature: Option<String>,
        spo2: Option<String>,
    ) -> Self {
        Self {
            heart_rate: heart_rate.unwrap_or_default(),
            blood_pressure: blood_pressure.unwrap_or_default(),
            temperature: temperature.unwrap_or_default(),
            spo2: spo2.unwrap_or_default(),
        }
    }
}

/// Raw values of one form submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriageForm {
    pub symptoms: String,
    pub vitals: VitalSigns,
}

impl TriageForm {
    pub fn new(symptoms: impl Into<String>, vitals: VitalSigns) -> Self {
        Self {
            symptoms: symptoms.into(),
            vitals,
        }
    }
}

/// Facilities a triage result can recommend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facility {
    GeneralHospital,
    TraumaCenter,
}

impl Facility {
    pub fn name(self) -> &'static str {
        match self {
            Facility::GeneralHospital => GENERAL_HOSPITAL_NAME,
            Facility::TraumaCenter => TRAUMA_CENTER_NAME,
        }
    }

    /// Fixed description shown next to the facility name.
    pub fn info(self) -> &'static str {
        match self {
            Facility::GeneralHospital => GENERAL_HOSPITAL_INFO,
            Facility::TraumaCenter => TRAUMA_CENTER_INFO,
        }
    }
}

/// Output of the scoring engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageResult {
    /// Always within `1..=10`.
    pub severity_score: u32,
    pub explanation: String,
    pub recommended_hospital: String,
    pub hospital_info: String,
}

impl TriageResult {
    pub(crate) fn new(severity_score: u32, explanation: String, facility: Facility) -> Self {
        Self {
            severity_score,
            explanation,
            recommended_hospital: facility.name().to_string(),
            hospital_info: facility.info().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_default_missing_fields_to_empty() {
        let vitals = VitalSigns::from_fields(Some("88".into()), None, None, Some("97".into()));
        assert_eq!(vitals.heart_rate, "88");
        assert_eq!(vitals.blood_pressure, "");
        assert_eq!(vitals.temperature, "");
        assert_eq!(vitals.spo2, "97");
    }

    #[test]
    fn vitals_use_stored_field_names() {
        let vitals = VitalSigns {
            heart_rate: "130".into(),
            blood_pressure: "120/80".into(),
            temperature: "99".into(),
            spo2: "92".into(),
        };
        let json = serde_json::to_value(&vitals).expect("serialize vitals");
        assert_eq!(json["heartRate"], "130");
        assert_eq!(json["bloodPressure"], "120/80");
        assert_eq!(json["temperature"], "99");
        assert_eq!(json["spO2"], "92");
    }

    #[test]
    fn vitals_tolerate_partial_documents() {
        let vitals: VitalSigns =
            serde_json::from_str(r#"{"heartRate":"72"}"#).expect("deserialize vitals");
        assert_eq!(vitals.heart_rate, "72");
        assert_eq!(vitals.spo2, "");
    }
}
