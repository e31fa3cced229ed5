use crate::pb::HealthRes;

/// Health check shared by the gRPC and REST APIs.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Reports the service as healthy.
    ///
    /// `persistence_enabled` is reflected in the message so operators can see when the store
    /// configuration was rejected at startup and only scoring is available.
    pub fn check_health(persistence_enabled: bool) -> HealthRes {
        let message = if persistence_enabled {
            "OpenHealth triage is alive"
        } else {
            "OpenHealth triage is alive (persistence disabled)"
        };
        HealthRes {
            ok: true,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_is_ok_with_and_without_persistence() {
        let with_store = HealthService::check_health(true);
        assert!(with_store.ok);
        assert_eq!(with_store.message, "OpenHealth triage is alive");

        let without_store = HealthService::check_health(false);
        assert!(without_store.ok);
        assert!(without_store.message.contains("persistence disabled"));
    }
}
