use crate::{auth::auth::AuthUser, error::ApiError, store::CrmStore};
use actix_web::{HttpResponse, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = [crate::model::notification::Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
) -> Result<HttpResponse, ApiError> {
    let items = store.list_notifications(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{notification_id}/read",
    params(
        ("notification_id" = String, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Marked as read", body = Object, example = json!({
            "message": "Notification marked as read"
        })),
        (status = 404, description = "No such notification for the caller")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_read(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !store.mark_notification_read(&id, &auth.user_id).await? {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Notification marked as read" })))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications marked", body = Object, example = json!({
            "updated": 3
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_read(auth: AuthUser, store: web::Data<dyn CrmStore>) -> Result<HttpResponse, ApiError> {
    let updated = store.mark_all_notifications_read(&auth.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}
