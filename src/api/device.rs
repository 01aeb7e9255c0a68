use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        call::{CallDirection, CallRecord, CallStatus, SyncSource},
        notification::{Notification, NotificationType},
        user::User,
    },
    store::CrmStore,
    utils::signature::{batch_signature, call_signature},
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

/// Most entries a device may upload in one sync.
pub const MAX_SYNC_BATCH: usize = 50;

// column widths in the calls and users tables
const MAX_NUMBER_LEN: usize = 32;
const MAX_CONTACT_NAME_LEN: usize = 255;
const MAX_DEVICE_ID_LEN: usize = 128;

fn too_long(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BindDevice {
    #[schema(example = "DEV_8829")]
    pub device_id: String,
}

/// Call type as the handset's call log reports it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceCallType {
    Inbound,
    Outbound,
    Missed,
    #[serde(other)]
    Unresolved,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCallLog {
    #[schema(example = "9988776655")]
    pub number: String,
    /// Seconds
    #[schema(example = 120)]
    pub duration: u32,
    #[schema(value_type = String, format = "date-time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: Option<DeviceCallType>,
    pub contact_name: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncCalls {
    #[schema(example = "DEV_8829")]
    pub device_id: String,
    pub logs: Vec<DeviceCallLog>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReceipt {
    #[schema(example = "SUCCESS")]
    pub status: String,
    pub synced_count: u64,
    pub duplicate_count: u64,
    /// SHA-256 over the signatures of the uploaded entries
    pub signature: String,
}

fn classify(kind: Option<DeviceCallType>, duration: u32) -> (CallDirection, CallStatus) {
    let direction = match kind {
        Some(DeviceCallType::Inbound) | Some(DeviceCallType::Missed) => CallDirection::In,
        Some(DeviceCallType::Outbound) => CallDirection::Out,
        _ => CallDirection::Unknown,
    };
    let status = match kind {
        Some(DeviceCallType::Missed) => CallStatus::Missed,
        _ if duration > 0 => CallStatus::Connected,
        _ => CallStatus::Failed,
    };
    (direction, status)
}

async fn load_caller(auth: &AuthUser, store: &dyn CrmStore) -> Result<User, ApiError> {
    store
        .find_user(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account not found"))
}

/// Locks the caller's account to a handset
#[utoipa::path(
    post,
    path = "/api/device/bind",
    request_body = BindDevice,
    responses(
        (status = 200, description = "Device bound", body = User),
        (status = 400, description = "Device id missing"),
        (status = 403, description = "Only employees bind devices"),
        (status = 409, description = "Account is already bound to another device")
    ),
    security(("bearer_auth" = [])),
    tag = "Device"
)]
pub async fn bind_device(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    body: web::Json<BindDevice>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let device_id = body.device_id.trim();
    if device_id.is_empty() {
        return Err(ApiError::bad_request("deviceId is required"));
    }
    if too_long(device_id, MAX_DEVICE_ID_LEN) {
        return Err(ApiError::bad_request(format!(
            "deviceId is limited to {MAX_DEVICE_ID_LEN} characters"
        )));
    }

    let mut user = load_caller(&auth, store.get_ref()).await?;

    match user.device_id.as_deref() {
        Some(bound) if bound == device_id => {}
        Some(bound) => {
            warn!(user_id = %user.id, bound = %bound, requested = %device_id, "Rebind attempt rejected");
            return Err(ApiError::conflict("Account is already bound to another device"));
        }
        None => {
            user.device_id = Some(device_id.to_string());
            store.save_user(&user).await?;
            info!(user_id = %user.id, device_id = %device_id, "Device bound");
        }
    }

    Ok(HttpResponse::Ok().json(user))
}

/// Uploads call-log entries captured on the bound handset
#[utoipa::path(
    post,
    path = "/api/device/sync-calls",
    request_body = SyncCalls,
    responses(
        (status = 200, description = "Entries stored; duplicates skipped", body = SyncReceipt),
        (status = 400, description = "Too many entries, or an entry is malformed or too long"),
        (status = 403, description = "Device is not the one bound to this account")
    ),
    security(("bearer_auth" = [])),
    tag = "Device"
)]
pub async fn sync_calls(
    auth: AuthUser,
    store: web::Data<dyn CrmStore>,
    body: web::Json<SyncCalls>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let body = body.into_inner();
    if body.logs.len() > MAX_SYNC_BATCH {
        return Err(ApiError::bad_request(format!(
            "At most {MAX_SYNC_BATCH} entries per sync"
        )));
    }
    for log in &body.logs {
        let number = log.number.trim();
        if number.is_empty() {
            return Err(ApiError::bad_request("Every entry needs a number"));
        }
        if too_long(number, MAX_NUMBER_LEN) {
            return Err(ApiError::bad_request(format!(
                "number is limited to {MAX_NUMBER_LEN} characters"
            )));
        }
        if log.contact_name.as_deref().is_some_and(|n| too_long(n.trim(), MAX_CONTACT_NAME_LEN)) {
            return Err(ApiError::bad_request(format!(
                "contactName is limited to {MAX_CONTACT_NAME_LEN} characters"
            )));
        }
    }

    let mut user = load_caller(&auth, store.get_ref()).await?;

    let device_id = body.device_id.trim();
    if user.device_id.as_deref() != Some(device_id) {
        warn!(user_id = %user.id, device_id = %device_id, "Sync from unbound device rejected");
        return Err(ApiError::forbidden("Device is not bound to this account"));
    }

    let now = Utc::now();
    let calls: Vec<CallRecord> = body
        .logs
        .into_iter()
        .map(|log| {
            let number = log.number.trim().to_string();
            let (direction, status) = classify(log.kind, log.duration);
            CallRecord {
                id: uuid::Uuid::new_v4().to_string(),
                employee_id: user.id.clone(),
                employee_name: user.name.clone(),
                employee_team: user.team,
                hash_signature: call_signature(device_id, &number, log.time, log.duration),
                customer_number: number,
                contact_name: log
                    .contact_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
                direction,
                status,
                duration_seconds: log.duration,
                outcome: None,
                notes: None,
                sync_source: SyncSource::DeviceOnly,
                device_id: device_id.to_string(),
                recording_consent: false,
                recording_url: None,
                started_at: log.time,
                created_at: now,
            }
        })
        .collect();

    let signatures: Vec<String> = calls.iter().map(|c| c.hash_signature.clone()).collect();
    let synced = store.insert_calls(&calls).await?;
    let duplicates = calls.len() as u64 - synced;

    user.last_sync_at = Some(now);
    store.save_user(&user).await?;

    if synced > 0 {
        let notice = Notification::new(
            &user.id,
            NotificationType::Success,
            "Sync successful",
            format!("{synced} interactions synced with core"),
        );
        store.insert_notification(&notice).await?;
    }

    info!(user_id = %user.id, synced, duplicates, "Device sync complete");

    Ok(HttpResponse::Ok().json(SyncReceipt {
        status: "SUCCESS".to_string(),
        synced_count: synced,
        duplicate_count: duplicates,
        signature: batch_signature(&signatures),
    }))
}
