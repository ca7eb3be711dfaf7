use metrics_exporter_prometheus::PrometheusHandle;
use rcd_permits::config::DatabaseConfig;
use rcd_permits::error::AppError;
use rcd_permits::graphql::PortalSchema;
use rcd_permits::storage::SqliteStore;
use rcd_permits::workflows::applications::{
    ApplicantNotification, NotificationError, NotificationPublisher,
};
use rcd_permits::workflows::employees::EmployeeService;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Header carrying the employee id set by the authenticating proxy.
pub(crate) const EMPLOYEE_HEADER: &str = "x-rcd-employee";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) schema: PortalSchema,
    pub(crate) employees: Arc<EmployeeService<SqliteStore>>,
}

/// Records applicant notifications in the log stream.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl NotificationPublisher for TracingNotifier {
    fn publish(&self, notification: ApplicantNotification) -> Result<(), NotificationError> {
        info!(
            application_id = %notification.application_id,
            template = ?notification.template,
            recipient = %notification.recipient,
            "applicant notification queued"
        );
        Ok(())
    }
}

pub(crate) fn open_store(config: &DatabaseConfig) -> Result<Arc<SqliteStore>, AppError> {
    Ok(Arc::new(SqliteStore::open(&config.path)?))
}
