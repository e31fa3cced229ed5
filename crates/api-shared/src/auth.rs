/// Validates a caller-provided API key against the key resolved at startup.
///
/// `expected` is `None` when no store credentials are configured; in that case every caller is
/// accepted because nothing can be persisted anyway.
#[allow(clippy::result_large_err)]
pub fn validate_api_key(
    provided_key: Option<&str>,
    expected: Option<&str>,
) -> Result<(), tonic::Status> {
    let Some(expected) = expected else {
        return Ok(());
    };

    match provided_key {
        None => Err(tonic::Status::unauthenticated("Missing x-api-key header")),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(tonic::Status::unauthenticated("Invalid API key")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_key() {
        assert!(validate_api_key(Some("secret"), Some("secret")).is_ok());
    }

    #[test]
    fn rejects_missing_or_wrong_key() {
        let missing = validate_api_key(None, Some("secret")).unwrap_err();
        assert_eq!(missing.code(), tonic::Code::Unauthenticated);

        let wrong = validate_api_key(Some("nope"), Some("secret")).unwrap_err();
        assert_eq!(wrong.code(), tonic::Code::Unauthenticated);
        assert_eq!(wrong.message(), "Invalid API key");
    }

    #[test]
    fn open_when_no_key_is_configured() {
        assert!(validate_api_key(None, None).is_ok());
        assert!(validate_api_key(Some("anything"), None).is_ok());
    }
}
