use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::call::CallView,
    policy::{Access, Resource, Scope, authorize},
    store::CrmStore,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AnnotateCall {
    #[schema(example = "Interested")]
    pub outcome: Option<String>,
    #[schema(example = "Asked for a callback on Monday")]
    pub notes: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/calls/history",
    responses(
        (status = 200, description = "Calls in the caller's scope, newest first", body = [CallView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Calls"
)]
pub async fn call_history(auth: AuthUser, store: web::Data<dyn CrmStore>) -> Result<HttpResponse, ApiError> {
    let calls: Vec<CallView> = store
        .list_calls(&Scope::for_actor(&auth))
        .await?
        .into_iter()
        .map(CallView::from)
        .collect();
    Ok(HttpResponse::Ok().json(calls))
}

/// Hands out the recording URL of a call
#[utoipa::path(
    get,
    path = "/api/calls/{call_id}/recording",
    params(
        ("call_id" = String, Path, description = "Call ID")
    ),
    responses(
        (status = 200, description = "Recording URL", body = Object, example = json!({
            "url": "https://recordings.connectasetu.com/c-1001.mp3"
        })),
        (status = 403, description = "Not visible to the caller, or no recording consent"),
        (status = 404, description = "Call not found or has no recording")
    ),
    security(("bearer_auth" = [])),
    tag = "Calls"
)]
pub async fn call_recording(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let call_id = path.into_inner();

    let call = store
        .find_call(&call_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Call not found"))?;

    authorize(
        &auth,
        Access::Read,
        Resource::owned(call.employee_team, &call.employee_id),
    )
    .or_forbidden("Call belongs to another team")?;

    if !call.recording_consent && !auth.role.is_global_admin() {
        return Err(ApiError::forbidden("Recording consent was not given for this call"));
    }

    let url = call
        .recording_url
        .ok_or_else(|| ApiError::not_found("No recording for this call"))?;

    info!(call_id = %call_id, by = %auth.user_id, "Recording accessed");
    Ok(HttpResponse::Ok().json(json!({ "url": url })))
}

/// Outcome and notes on one of the caller's own calls
#[utoipa::path(
    put,
    path = "/api/calls/{call_id}",
    params(
        ("call_id" = String, Path, description = "Call ID")
    ),
    request_body = AnnotateCall,
    responses(
        (status = 200, description = "Annotated call", body = CallView),
        (status = 403, description = "Only the employee who made the call may annotate it"),
        (status = 404, description = "Call not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Calls"
)]
pub async fn annotate_call(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    path: web::Path<String>,
    body: web::Json<AnnotateCall>,
) -> Result<HttpResponse, ApiError> {
    let call_id = path.into_inner();

    let mut call = store
        .find_call(&call_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Call not found"))?;

    if call.employee_id != auth.user_id {
        return Err(ApiError::forbidden("Only the employee who made the call may annotate it"));
    }

    let body = body.into_inner();
    if let Some(outcome) = body.outcome {
        call.outcome = Some(outcome.trim().to_string()).filter(|o| !o.is_empty());
    }
    if let Some(notes) = body.notes {
        call.notes = Some(notes.trim().to_string()).filter(|n| !n.is_empty());
    }

    store.save_call(&call).await?;

    Ok(HttpResponse::Ok().json(CallView::from(call)))
}
