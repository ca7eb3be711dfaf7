use crate::infra::{open_store, TracingNotifier};
use chrono::{Months, NaiveDate, Utc};
use clap::Args;
use rcd_permits::config::AppConfig;
use rcd_permits::error::AppError;
use rcd_permits::storage::{RepositoryError, SqliteStore};
use rcd_permits::workflows::applicants::{MedicalAssessment, MobilityAid, PatientCondition};
use rcd_permits::workflows::applications::{
    ApplicationService, FeeSchedule, NewApplicationDetails, NewApplicationInput, PaymentInformation,
    PaymentMethod, PermitType, ProcessingTask, TaskUpdate,
};
use rcd_permits::workflows::employees::{
    EmployeeInput, EmployeeRecord, EmployeeService, EmployeeServiceError, Role,
};
use rcd_permits::workflows::people::{Address, Gender, PersonalInformation, Province};
use rcd_permits::workflows::physicians::PhysicianDetails;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SeedArgs {
    /// Override the SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// E-mail of the admin account to create
    #[arg(long, default_value = "admin@rcd.example")]
    pub(crate) admin_email: String,
    #[arg(long, default_value = "Portal")]
    pub(crate) admin_first_name: String,
    #[arg(long, default_value = "Admin")]
    pub(crate) admin_last_name: String,
    /// Also submit a sample application and walk it through to an issued permit
    #[arg(long)]
    pub(crate) sample: bool,
    /// APP number assigned to the sample permit
    #[arg(long, default_value_t = 10_001)]
    pub(crate) sample_app_number: i64,
}

pub(crate) fn run_seed(mut args: SeedArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(database) = args.database.take() {
        config.database.path = database;
    }

    let store = open_store(&config.database)?;
    println!("Seeding {}", config.database.path.display());
    seed_store(store, config.fees, args)?;
    Ok(())
}

fn seed_store(
    store: Arc<SqliteStore>,
    fees: FeeSchedule,
    args: SeedArgs,
) -> Result<EmployeeRecord, AppError> {
    let employees = EmployeeService::new(store.clone());
    let admin = ensure_admin(
        &employees,
        EmployeeInput {
            email: args.admin_email,
            first_name: args.admin_first_name,
            last_name: args.admin_last_name,
            role: Role::Admin,
        },
    )?;
    println!(
        "- Admin {} (employee id {}); send it as the x-rcd-employee header",
        admin.email, admin.id
    );

    if args.sample {
        seed_sample_application(store, fees, &admin, args.sample_app_number)?;
    }
    Ok(admin)
}

fn ensure_admin(
    employees: &EmployeeService<SqliteStore>,
    input: EmployeeInput,
) -> Result<EmployeeRecord, EmployeeServiceError> {
    let email = input.email.clone();
    match employees.create(input) {
        Ok(record) => Ok(record),
        Err(EmployeeServiceError::Repository(RepositoryError::Conflict(_))) => employees
            .find_by_email(&email)?
            .ok_or(EmployeeServiceError::Repository(RepositoryError::NotFound)),
        Err(err) => Err(err),
    }
}

fn seed_sample_application(
    store: Arc<SqliteStore>,
    fees: FeeSchedule,
    admin: &EmployeeRecord,
    app_number: i64,
) -> Result<(), AppError> {
    let service = ApplicationService::new(store, Arc::new(TracingNotifier), fees);

    println!("\nSample application");
    let record = service.create_new(sample_input(fees.processing_fee_cents()))?;
    let view = record.status_view();
    println!(
        "- Received application {} for {} -> {}",
        view.application_id, view.applicant_name, view.status
    );

    service.approve(record.id, admin.id)?;
    for task in ProcessingTask::fulfillment() {
        let mut update = TaskUpdate::done(task);
        match task {
            ProcessingTask::AssignAppNumber => update.app_number = Some(app_number),
            ProcessingTask::UploadDocuments => {
                update.documents_url = Some(format!("https://files.rcd.example/app/{app_number}"))
            }
            _ => {}
        }
        service.update_task(record.id, update, admin.id)?;
        println!("  [x] {}", task.label());
    }

    let receipt = service.complete(record.id, admin.id)?;
    println!(
        "- Issued permit {} to applicant {} (expires {})",
        receipt.rcd_permit_id, receipt.applicant_id, receipt.expiry_date
    );
    Ok(())
}

fn sample_input(processing_fee_cents: i64) -> NewApplicationInput {
    let today = Utc::now().date_naive();
    let address = Address {
        line1: "5671 No. 3 Rd".to_string(),
        line2: None,
        city: "Richmond".to_string(),
        province: Province::Bc,
        postal_code: "V6X 2C7".to_string(),
    };

    NewApplicationInput {
        permit_type: PermitType::Permanent,
        personal: PersonalInformation {
            first_name: "Evelyn".to_string(),
            middle_name: None,
            last_name: "Sandhu".to_string(),
            phone: "604-555-0147".to_string(),
            email: Some("evelyn.sandhu@example.com".to_string()),
            receive_email_updates: true,
            address: address.clone(),
        },
        payment: PaymentInformation {
            payment_method: PaymentMethod::Debit,
            processing_fee_cents,
            donation_cents: 500,
            paid_through_shopify: false,
            shopify_order_number: None,
            ship_to_same_address: true,
            shipping_address: None,
            bill_to_same_address: true,
            billing_address: None,
        },
        details: NewApplicationDetails {
            date_of_birth: NaiveDate::from_ymd_opt(1952, 4, 18).unwrap_or(today),
            gender: Gender::Female,
            other_gender: None,
            medical: MedicalAssessment {
                disability: "Chronic obstructive pulmonary disease".to_string(),
                disability_certification_date: today
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(today),
                patient_condition: PatientCondition::CannotWalk100m,
                mobility_aids: vec![MobilityAid::Walker],
                notes: None,
            },
            physician: PhysicianDetails {
                msp_number: "62077".to_string(),
                first_name: "Hannah".to_string(),
                last_name: "Okafor".to_string(),
                phone: "604-555-0188".to_string(),
                address,
                notes: None,
            },
            omit_guardian: true,
            guardian: None,
            requested_expiry: None,
            uses_accessible_converted_van: false,
            requires_wider_parking_space: true,
        },
    }
}
