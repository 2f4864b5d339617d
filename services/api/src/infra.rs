use metrics_exporter_prometheus::PrometheusHandle;
use schoolmgmt::config::AppConfig;
use schoolmgmt::directory::{InMemorySchoolRepository, User};
use schoolmgmt::seed::{ensure_admin, populate, SeedPlan, SeedSummary};
use schoolmgmt::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store with its startup data in place.
pub(crate) struct Bootstrapped {
    pub(crate) repository: Arc<InMemorySchoolRepository>,
    pub(crate) admin: User,
    pub(crate) seeded: Option<SeedSummary>,
}

pub(crate) fn bootstrap(config: &AppConfig, seed: bool) -> Result<Bootstrapped, AppError> {
    let repository =
        InMemorySchoolRepository::for_enrollment_uniqueness(config.enrollment.uniqueness);
    let seeded = if seed {
        Some(populate(&repository, &SeedPlan::default())?)
    } else {
        None
    };
    let admin = ensure_admin(&repository, &config.bootstrap.admin_username)?;

    Ok(Bootstrapped {
        repository: Arc::new(repository),
        admin,
        seeded,
    })
}
