use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::role::Team;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CallStatus {
    Connected,
    Missed,
    Failed,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CallDirection {
    In,
    Out,
    Unknown,
}

/// Where a call record came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
pub enum SyncSource {
    #[serde(rename = "DEVICE_ONLY")]
    #[strum(serialize = "DEVICE_ONLY")]
    DeviceOnly,
    #[serde(rename = "SYSTEM_CORE")]
    #[strum(serialize = "SYSTEM_CORE")]
    SystemCore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub employee_team: Team,
    pub customer_number: String,
    pub contact_name: Option<String>,
    pub direction: CallDirection,
    pub status: CallStatus,
    pub duration_seconds: u32,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub sync_source: SyncSource,
    pub device_id: String,
    pub hash_signature: String,
    pub recording_consent: bool,
    pub recording_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Call record as listed to clients. The recording URL is only handed out
/// by the recording endpoint, after the consent check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallView {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub employee_team: Team,
    #[schema(example = "9876543210")]
    pub customer_number: String,
    pub contact_name: Option<String>,
    pub direction: CallDirection,
    pub status: CallStatus,
    #[schema(example = 342)]
    pub duration_seconds: u32,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub sync_source: SyncSource,
    pub device_id: String,
    pub hash_signature: String,
    pub is_verified: bool,
    pub recording_consent: bool,
    pub has_recording: bool,
    #[schema(value_type = String, format = "date-time")]
    pub started_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl From<CallRecord> for CallView {
    fn from(call: CallRecord) -> Self {
        Self {
            is_verified: call.sync_source == SyncSource::DeviceOnly && !call.hash_signature.is_empty(),
            has_recording: call.recording_url.is_some(),
            id: call.id,
            employee_id: call.employee_id,
            employee_name: call.employee_name,
            employee_team: call.employee_team,
            customer_number: call.customer_number,
            contact_name: call.contact_name,
            direction: call.direction,
            status: call.status,
            duration_seconds: call.duration_seconds,
            outcome: call.outcome,
            notes: call.notes,
            sync_source: call.sync_source,
            device_id: call.device_id,
            hash_signature: call.hash_signature,
            recording_consent: call.recording_consent,
            started_at: call.started_at,
            created_at: call.created_at,
        }
    }
}
