use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        notification::{Notification, NotificationType},
        report::{DailyReport, ReportStatus},
    },
    policy::{Access, Resource, Scope, authorize},
    store::CrmStore,
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    #[schema(example = "Follow-up round for plot visit leads")]
    pub tasks: Option<String>,
    #[serde(alias = "calls_count")]
    #[schema(example = 42)]
    pub calls_count: Option<u32>,
    /// Older clients send the count here; `callsCount` wins when both are present
    #[serde(default)]
    pub calls: Option<u32>,
    #[serde(default)]
    #[schema(example = 6)]
    pub follow_ups: u32,
    #[serde(default)]
    #[schema(example = "Two site visits booked")]
    pub remarks: String,
    /// Defaults to today (UTC)
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportFilter {
    /// Filter by review status
    pub status: Option<ReportStatus>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewReport {
    #[schema(example = "APPROVED")]
    pub status: ReportStatus,
}

/* =========================
Submit daily report (employee)
========================= */
#[utoipa::path(
    post,
    path = "/api/reports/daily",
    request_body = CreateReport,
    responses(
        (status = 201, description = "Report filed as PENDING", body = DailyReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only employees file reports"),
        (status = 409, description = "A report for that date already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn submit_report(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    body: web::Json<CreateReport>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let body = body.into_inner();
    let today = Utc::now().date_naive();
    let date = body.date.unwrap_or(today);
    if date > today {
        return Err(ApiError::bad_request("Report date cannot be in the future"));
    }

    let report = DailyReport {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: auth.user_id.clone(),
        employee_name: auth.name.clone(),
        team: auth.team,
        date,
        tasks: body.tasks.filter(|t| !t.trim().is_empty()),
        calls_count: body.calls_count.or(body.calls),
        follow_ups: body.follow_ups,
        remarks: body.remarks,
        status: ReportStatus::Pending,
        approved_by: None,
        reviewed_at: None,
        created_at: Utc::now(),
    };

    store.insert_report(&report).await?;

    info!(report_id = %report.id, employee_id = %auth.user_id, %date, "Daily report submitted");
    Ok(HttpResponse::Created().json(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/mine",
    responses(
        (status = 200, description = "The caller's reports, newest first", body = [DailyReport]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn my_reports(auth: AuthUser, store: web::Data<dyn CrmStore>) -> Result<HttpResponse, ApiError> {
    let reports = store
        .list_reports(&Scope::Owner(auth.user_id.clone()), None)
        .await?;
    Ok(HttpResponse::Ok().json(reports))
}

/* =========================
Admin review pipeline
========================= */
#[utoipa::path(
    get,
    path = "/api/admin/all-reports",
    params(ReportFilter),
    responses(
        (status = 200, description = "Reports in the caller's scope, newest first", body = [DailyReport]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn all_reports(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    query: web::Query<ReportFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let reports = store
        .list_reports(&Scope::for_actor(&auth), query.status)
        .await?;
    Ok(HttpResponse::Ok().json(reports))
}

#[utoipa::path(
    put,
    path = "/api/admin/report/{report_id}",
    params(
        ("report_id" = String, Path, description = "ID of the report to review")
    ),
    request_body = ReviewReport,
    responses(
        (status = 200, description = "Report reviewed", body = DailyReport),
        (status = 400, description = "Target status must be APPROVED or REJECTED"),
        (status = 403, description = "Report belongs to another team", body = Object, example = json!({
            "error": "Cannot review reports of another team"
        })),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report was already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn review_report(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    path: web::Path<String>,
    body: web::Json<ReviewReport>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let report_id = path.into_inner();
    let status = body.status;

    let report = store
        .find_report(&report_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Report not found"))?;

    authorize(&auth, Access::Manage, Resource::team(report.team))
        .or_forbidden("Cannot review reports of another team")?;

    if status == ReportStatus::Pending {
        return Err(ApiError::bad_request("Status must be APPROVED or REJECTED"));
    }

    let reviewed_at = Utc::now();
    if !store
        .review_report(&report_id, status, &auth.name, reviewed_at)
        .await?
    {
        return Err(ApiError::conflict("Report was already reviewed"));
    }

    let notice = match status {
        ReportStatus::Approved => Notification::new(
            &report.employee_id,
            NotificationType::Success,
            "Report approved",
            format!("Your report for {} was approved by {}", report.date, auth.name),
        ),
        _ => Notification::new(
            &report.employee_id,
            NotificationType::Alert,
            "Report rejected",
            format!("Your report for {} was rejected by {}", report.date, auth.name),
        ),
    };
    store.insert_notification(&notice).await?;

    info!(report_id = %report_id, %status, by = %auth.user_id, "Report reviewed");

    let reviewed = DailyReport {
        status,
        approved_by: Some(auth.name.clone()),
        reviewed_at: Some(reviewed_at),
        ..report
    };
    Ok(HttpResponse::Ok().json(reviewed))
}
