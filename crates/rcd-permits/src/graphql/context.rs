use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions};
use tracing::debug;

use crate::storage::SqliteStore;
use crate::workflows::applicants::ApplicantService;
use crate::workflows::applications::{ApplicationService, FeeSchedule, NotificationPublisher};
use crate::workflows::employees::{
    EmployeeId, EmployeeRecord, EmployeeRepository, EmployeeService, Permission,
};
use crate::workflows::physicians::PhysicianService;
use crate::workflows::reports::ReportService;

/// Services shared by every resolver, stored once in the schema data.
pub struct PortalContext {
    pub applications: ApplicationService<SqliteStore, dyn NotificationPublisher>,
    pub applicants: ApplicantService<SqliteStore>,
    pub physicians: PhysicianService<SqliteStore>,
    pub employees: EmployeeService<SqliteStore>,
    pub reports: ReportService<SqliteStore>,
}

impl PortalContext {
    pub fn new(
        store: Arc<SqliteStore>,
        notifications: Arc<dyn NotificationPublisher>,
        fees: FeeSchedule,
    ) -> Self {
        Self {
            applications: ApplicationService::new(store.clone(), notifications, fees),
            applicants: ApplicantService::new(store.clone()),
            physicians: PhysicianService::new(store.clone()),
            employees: EmployeeService::new(store.clone()),
            reports: ReportService::new(store),
        }
    }
}

/// Identity attached to a single GraphQL request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Viewer {
    #[default]
    Anonymous,
    Employee(EmployeeRecord),
}

impl Viewer {
    /// Resolve the employee id forwarded by the authenticating proxy.
    ///
    /// Malformed, unknown and deactivated ids all resolve to `Viewer::Anonymous`.
    pub fn resolve<R>(employees: &EmployeeService<R>, header: Option<&str>) -> Self
    where
        R: EmployeeRepository + ?Sized + 'static,
    {
        let Some(id) = header.and_then(|value| value.trim().parse::<i64>().ok()) else {
            return Viewer::Anonymous;
        };

        match employees.get(EmployeeId(id)) {
            Ok(employee) if employee.active => Viewer::Employee(employee),
            Ok(_) => {
                debug!(employee_id = id, "inactive employee treated as anonymous");
                Viewer::Anonymous
            }
            Err(err) => {
                debug!(employee_id = id, error = %err, "unknown employee treated as anonymous");
                Viewer::Anonymous
            }
        }
    }

    pub fn employee(&self) -> Option<&EmployeeRecord> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Employee(employee) => Some(employee),
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.employee()
            .is_some_and(|employee| employee.can(permission))
    }
}

pub(crate) fn portal<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a PortalContext> {
    ctx.data::<PortalContext>()
}

pub(crate) fn viewer<'a>(ctx: &Context<'a>) -> &'a Viewer {
    static ANONYMOUS: Viewer = Viewer::Anonymous;
    ctx.data_opt::<Viewer>().unwrap_or(&ANONYMOUS)
}

/// The acting employee, or a `FORBIDDEN` error when the viewer lacks `permission`.
pub(crate) fn require<'a>(
    ctx: &Context<'a>,
    permission: Permission,
) -> async_graphql::Result<&'a EmployeeRecord> {
    match viewer(ctx).employee() {
        Some(employee) if employee.can(permission) => Ok(employee),
        _ => Err(forbidden(permission)),
    }
}

pub(crate) fn forbidden(permission: Permission) -> async_graphql::Error {
    async_graphql::Error::new(format!("not permitted: {permission:?}"))
        .extend_with(|_, ext| ext.set("code", "FORBIDDEN"))
}
