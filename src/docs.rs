use crate::api::analytics::FleetPulse;
use crate::api::calls::AnnotateCall;
use crate::api::device::{BindDevice, DeviceCallLog, DeviceCallType, SyncCalls, SyncReceipt};
use crate::api::personnel::{EmployeeFilter, UpdateEmployee, UpdateEmployeeStatus};
use crate::api::reports::{CreateReport, ReportFilter, ReviewReport};
use crate::model::call::{CallDirection, CallStatus, CallView, SyncSource};
use crate::model::notification::{Notification, NotificationType};
use crate::model::report::{DailyReport, ReportStatus};
use crate::model::role::{Role, Team};
use crate::model::user::{User, UserStatus};
use crate::models::{LoginReqDto, LoginResponse, SignupReq, TokenPair};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ConnectaSetu CRM API",
        version = "1.0.0",
        description = r#"
## ConnectaSetu CRM

Backend for a field-sales CRM with **team-scoped** access control.

### 🔹 Key Features
- **Personnel**
  - List the team, edit profiles, activate or suspend accounts
- **Daily reports**
  - Employees file one report per day, admins approve or reject
- **Call telemetry**
  - Call logs uploaded from the bound handset, signed with SHA-256
- **Notifications** and a 7-day **fleet pulse** chart

### 🔐 Security
Every endpoint outside `/api/auth` needs a **JWT Bearer** access token.
A team admin only sees and reviews records of their own team;
the super admin sees everything.
"#,
    ),
    paths(
        crate::auth::handlers::signup,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::personnel::list_team_employees,
        crate::api::personnel::update_employee,
        crate::api::personnel::update_employee_status,

        crate::api::reports::submit_report,
        crate::api::reports::my_reports,
        crate::api::reports::all_reports,
        crate::api::reports::review_report,

        crate::api::calls::call_history,
        crate::api::calls::call_recording,
        crate::api::calls::annotate_call,

        crate::api::device::bind_device,
        crate::api::device::sync_calls,

        crate::api::notifications::list_notifications,
        crate::api::notifications::mark_read,
        crate::api::notifications::mark_all_read,

        crate::api::analytics::fleet_pulse
    ),
    components(
        schemas(
            Role,
            Team,
            User,
            UserStatus,
            SignupReq,
            LoginReqDto,
            LoginResponse,
            TokenPair,
            EmployeeFilter,
            UpdateEmployee,
            UpdateEmployeeStatus,
            DailyReport,
            ReportStatus,
            CreateReport,
            ReportFilter,
            ReviewReport,
            CallView,
            CallDirection,
            CallStatus,
            SyncSource,
            AnnotateCall,
            BindDevice,
            DeviceCallType,
            DeviceCallLog,
            SyncCalls,
            SyncReceipt,
            Notification,
            NotificationType,
            FleetPulse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Signup, login and token rotation"),
        (name = "Personnel", description = "Team roster management APIs"),
        (name = "Reports", description = "Daily report submission and review"),
        (name = "Calls", description = "Call history and recordings"),
        (name = "Device", description = "Handset binding and call-log sync"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Analytics", description = "Dashboard aggregates"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
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
