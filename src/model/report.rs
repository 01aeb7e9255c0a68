use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::role::Team;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "0b0c8d1e-22a4-4b7e-9d16-5f1f8a2e7c31",
    "employeeId": "7f6c1c9e-8d0a-4b53-9c55-3d1c2a0c1f10",
    "employeeName": "Arjun Mehta",
    "team": "teamA",
    "date": "2026-01-01",
    "tasks": "Follow-up round for plot visit leads",
    "callsCount": 42,
    "followUps": 6,
    "remarks": "Two site visits booked",
    "status": "PENDING",
    "approvedBy": null,
    "reviewedAt": null,
    "createdAt": "2026-01-01T18:00:00Z"
}))]
pub struct DailyReport {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub team: Team,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub tasks: Option<String>,
    pub calls_count: Option<u32>,
    pub follow_ups: u32,
    pub remarks: String,
    pub status: ReportStatus,
    pub approved_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
