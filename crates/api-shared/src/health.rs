use crate::wire::{HealthRes, RootRes};
use crate::SERVICE_NAME;

/// Liveness and landing responses shared by the REST server and the CLI.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Returns the liveness response. The service has no hard dependencies that could make
    /// it unhealthy once it is serving: storage failures surface on the report endpoints.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "healthy".into(),
            service: SERVICE_NAME.into(),
        }
    }

    /// Landing payload for `GET /`.
    pub fn welcome() -> RootRes {
        RootRes {
            message: "Welcome to Swasthya Saathi API".into(),
            docs: "/docs".into(),
            health: "/health".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_reports_service_name() {
        let res = HealthService::check_health();
        assert_eq!(res.status, "healthy");
        assert_eq!(res.service, "Swasthya Saathi API");
    }

    #[test]
    fn welcome_points_at_docs_and_health() {
        let res = HealthService::welcome();
        assert_eq!(res.docs, "/docs");
        assert_eq!(res.health, "/health");
    }
}
