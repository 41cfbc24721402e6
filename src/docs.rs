use crate::domain::attendance::{ImportProblems, NameMismatch, RowError};
use crate::domain::collection::CollectionSummary;
use crate::domain::incentive::IncentiveSplit;
use crate::domain::month::MonthOption;
use crate::model::attendance::{AttendanceRecord, CreateAttendance, ImportSummary, UpdateAttendance};
use crate::model::collection::{
    PlannedCollection, PlannedCollectionInput, ReceivedCollection, ReceivedCollectionInput,
};
use crate::model::customer::{CreateCustomer, Customer};
use crate::model::distribution::{Distribution, DistributionInput};
use crate::model::fixed_amount::{FixedAmount, SetFixedAmount};
use crate::model::payout::{CaseEntry, CreateCaseEntry, UpdateCaseEntry};
use crate::model::process::{CreateProcess, Process};
use crate::model::product::{CreateProduct, Product};
use crate::model::report::{CollectionReport, Dashboard};
use crate::model::role::{Role, RoleInfo};
use crate::model::user::{CreateUser, UpdatePassword, User, UserListResponse};
use crate::model::verification::{CreateVerification, Verification};
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Field Operations API",
        version = "1.0.0",
        description = r#"
## Field operations back office

Clients, their products and processes, priced verifications, per-case
payouts, monthly collection plans against what was received, incentive
distribution between supervisors and their teams, and attendance for
fixed-salary staff.

### Security
Every endpoint except `POST /api/users/login` needs a **JWT Bearer** token.
Logging out, or an admin forcing a logout, invalidates all tokens issued
to that user.

### Months
Monthly resources take `?month=` as `YYYY-MM`, a label such as
`March 2025`, or `all`. "Current month" is decided in India Standard Time.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,

        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,
        crate::api::users::set_password,
        crate::api::users::force_logout,
        crate::api::users::force_logout_all,
        crate::api::users::list_supervisors,
        crate::api::users::list_team_members,
        crate::api::users::list_roles,

        crate::api::customers::list_customers,
        crate::api::customers::create_customer,
        crate::api::customers::get_customer,
        crate::api::customers::update_customer,
        crate::api::customers::delete_customer,

        crate::api::products::list_products,
        crate::api::products::create_product,
        crate::api::products::delete_product,

        crate::api::processes::list_processes,
        crate::api::processes::create_process,
        crate::api::processes::get_process,
        crate::api::processes::update_process,
        crate::api::processes::delete_process,

        crate::api::verifications::list_verifications,
        crate::api::verifications::create_verification,
        crate::api::verifications::update_verification,
        crate::api::verifications::delete_verification,

        crate::api::payouts::list_case_entries,
        crate::api::payouts::create_case_entry,
        crate::api::payouts::update_case_entry,
        crate::api::payouts::delete_case_entry,

        crate::api::planned_collections::list_planned,
        crate::api::planned_collections::create_planned,
        crate::api::planned_collections::update_planned,
        crate::api::planned_collections::delete_planned,

        crate::api::received_collections::list_received,
        crate::api::received_collections::create_received,
        crate::api::received_collections::update_received,
        crate::api::received_collections::delete_received,

        crate::api::distributions::list_distributions,
        crate::api::distributions::create_distribution,
        crate::api::distributions::get_distribution,
        crate::api::distributions::update_distribution,
        crate::api::distributions::delete_distribution,

        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::create_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::import_attendance,
        crate::api::attendance::export_attendance,

        crate::api::fixed_amount::list_fixed_amounts,
        crate::api::fixed_amount::set_fixed_amount,

        crate::api::reports::collection_summary,
        crate::api::reports::list_months,
        crate::api::reports::dashboard
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            RoleInfo,
            User,
            CreateUser,
            UpdatePassword,
            UserListResponse,
            Customer,
            CreateCustomer,
            Product,
            CreateProduct,
            Process,
            CreateProcess,
            Verification,
            CreateVerification,
            CaseEntry,
            CreateCaseEntry,
            UpdateCaseEntry,
            PlannedCollection,
            PlannedCollectionInput,
            ReceivedCollection,
            ReceivedCollectionInput,
            Distribution,
            DistributionInput,
            IncentiveSplit,
            CollectionSummary,
            CollectionReport,
            MonthOption,
            Dashboard,
            AttendanceRecord,
            CreateAttendance,
            UpdateAttendance,
            ImportSummary,
            ImportProblems,
            RowError,
            NameMismatch,
            FixedAmount,
            SetFixedAmount
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Login, accounts, roles and forced logout"),
        (name = "Clients", description = "Clients, products and processes"),
        (name = "Payouts", description = "Verification pricing and per-case payouts"),
        (name = "Collections", description = "Planned and received collections, incentive distribution"),
        (name = "Attendance", description = "Fixed-salary attendance and sheet import/export"),
        (name = "Reports", description = "Collection summary, month options and dashboard"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/users/login",
            "/api/payout-verifications",
            "/api/planned-collections/recived",
            "/api/planned-collections/distribution/{id}",
            "/api/attendance/import",
            "/api/reports/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let schemes = doc.components.as_ref().unwrap();
        assert!(schemes.security_schemes.contains_key("bearer_auth"));
    }
}
