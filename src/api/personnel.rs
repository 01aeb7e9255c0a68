use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        notification::{Notification, NotificationType},
        user::{User, UserStatus},
    },
    policy::{Access, Resource, Scope, authorize},
    store::CrmStore,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EmployeeFilter {
    /// Filter by account status
    pub status: Option<UserStatus>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    #[schema(example = "Arjun Mehta")]
    pub name: Option<String>,
    #[schema(example = "9111111111")]
    pub phone: Option<String>,
    #[schema(example = "Senior Field Sales")]
    pub designation: Option<String>,
    #[schema(example = "DEV_8829")]
    pub device_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployeeStatus {
    pub status: UserStatus,
}

/// Non-empty trimmed value, or `None`.
fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loads a user and checks the caller may manage them.
async fn load_managed_user(auth: &AuthUser, store: &dyn CrmStore, id: &str) -> Result<User, ApiError> {
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    authorize(auth, Access::Manage, Resource::team(user.team))
        .or_forbidden("Personnel management is restricted to your own team")?;

    if user.role.is_admin() && !auth.role.is_global_admin() {
        return Err(ApiError::forbidden("Only a global admin can manage admin accounts"));
    }

    Ok(user)
}

/// Accounts visible to the caller
#[utoipa::path(
    get,
    path = "/api/admin/team/employees",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "Employees in the caller's scope; the global admin also sees admin accounts", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn list_team_employees(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    query: web::Query<EmployeeFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    // global scope lists admin accounts too, minus the caller
    let (team, include_admins) = match Scope::for_actor(&auth) {
        Scope::Team(team) => (Some(team), false),
        Scope::All => (None, true),
        Scope::Owner(_) => (None, false),
    };

    let mut employees = store.list_employees(team, query.status, include_admins).await?;
    employees.retain(|u| u.id != auth.user_id);
    Ok(HttpResponse::Ok().json(employees))
}

/// Update employee details
#[utoipa::path(
    put,
    path = "/api/admin/employee/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Updated employee", body = User),
        (status = 403, description = "Employee belongs to another team"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn update_employee(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    path: web::Path<String>,
    body: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();
    let mut employee = load_managed_user(&auth, store.get_ref(), &employee_id).await?;

    let body = body.into_inner();
    if let Some(name) = provided(body.name) {
        employee.name = name;
    }
    if let Some(phone) = provided(body.phone) {
        employee.phone = Some(phone);
    }
    if let Some(designation) = provided(body.designation) {
        employee.designation = Some(designation);
    }
    if let Some(device_id) = provided(body.device_id) {
        employee.device_id = Some(device_id);
    }

    store.save_user(&employee).await?;

    info!(employee_id = %employee.id, by = %auth.user_id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Activate or suspend an account
#[utoipa::path(
    put,
    path = "/api/admin/employee/{employee_id}/status",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployeeStatus,
    responses(
        (status = 200, description = "Updated employee", body = User),
        (status = 400, description = "PENDING is not a valid target status"),
        (status = 403, description = "Employee belongs to another team"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Personnel"
)]
pub async fn update_employee_status(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    path: web::Path<String>,
    body: web::Json<UpdateEmployeeStatus>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if body.status == UserStatus::Pending {
        return Err(ApiError::bad_request("Status must be ACTIVE or SUSPENDED"));
    }

    let employee_id = path.into_inner();
    let mut employee = load_managed_user(&auth, store.get_ref(), &employee_id).await?;

    if employee.status != body.status {
        employee.status = body.status;
        store.save_user(&employee).await?;

        let notice = match body.status {
            UserStatus::Active => Notification::new(
                &employee.id,
                NotificationType::Success,
                "Account activated",
                format!("{} granted access to your account", auth.name),
            ),
            _ => Notification::new(
                &employee.id,
                NotificationType::Alert,
                "Account suspended",
                format!("{} suspended your account", auth.name),
            ),
        };
        store.insert_notification(&notice).await?;

        info!(employee_id = %employee.id, status = %employee.status, by = %auth.user_id, "Account status changed");
    }

    Ok(HttpResponse::Ok().json(employee))
}
