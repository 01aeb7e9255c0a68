use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::role::{Role, Team};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Pending,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "7f6c1c9e-8d0a-4b53-9c55-3d1c2a0c1f10",
    "name": "Arjun Mehta",
    "email": "arjun@connectasetu.com",
    "phone": "9111111111",
    "designation": "Field Sales",
    "role": "employee_a",
    "team": "teamA",
    "deviceId": "DEV_8829",
    "status": "ACTIVE",
    "lastSyncAt": null,
    "joiningDate": "2026-01-01T00:00:00Z",
    "createdAt": "2026-01-01T00:00:00Z"
}))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub designation: Option<String>,
    pub role: Role,
    pub team: Team,
    /// Hardware id this account is locked to
    pub device_id: Option<String>,
    pub status: UserStatus,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub joining_date: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: Role,
        status: UserStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email: email.to_lowercase(),
            password_hash,
            phone: None,
            designation: None,
            role,
            team: role.team(),
            device_id: None,
            status,
            last_sync_at: None,
            joining_date: now,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}
