//! Storage for the five collections the service works on: users, calls,
//! daily reports, notifications and refresh tokens.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_more::Display;

use crate::{
    auth::password::hash_password,
    model::{
        call::CallRecord,
        notification::Notification,
        report::{DailyReport, ReportStatus},
        role::{Role, Team},
        user::{User, UserStatus},
    },
    policy::Scope,
};

#[derive(Debug, Display)]
pub enum StoreError {
    /// Unique constraint hit; the message is safe to show to clients
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    /// A stored value could not be mapped back to the domain type
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
    #[display(fmt = "store lock poisoned")]
    Poisoned,
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CrmStore: Send + Sync {
    // Users
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn save_user(&self, user: &User) -> StoreResult<()>;
    /// Employee accounts, plus admin accounts when `include_admins` is set.
    async fn list_employees(
        &self,
        team: Option<Team>,
        status: Option<UserStatus>,
        include_admins: bool,
    ) -> StoreResult<Vec<User>>;
    async fn all_emails(&self) -> StoreResult<Vec<String>>;
    async fn count_users(&self) -> StoreResult<u64>;

    // Calls
    async fn find_call(&self, id: &str) -> StoreResult<Option<CallRecord>>;
    /// Newest first.
    async fn list_calls(&self, scope: &Scope) -> StoreResult<Vec<CallRecord>>;
    /// Inserts the calls whose `hash_signature` is not stored yet and
    /// returns how many were inserted.
    async fn insert_calls(&self, calls: &[CallRecord]) -> StoreResult<u64>;
    async fn save_call(&self, call: &CallRecord) -> StoreResult<()>;

    // Daily reports
    async fn find_report(&self, id: &str) -> StoreResult<Option<DailyReport>>;
    /// Newest first.
    async fn list_reports(
        &self,
        scope: &Scope,
        status: Option<ReportStatus>,
    ) -> StoreResult<Vec<DailyReport>>;
    /// Fails with `Conflict` when the employee already filed a report for that date.
    async fn insert_report(&self, report: &DailyReport) -> StoreResult<()>;
    /// Applies the review only while the report is still pending.
    /// Returns false when it was already reviewed or does not exist.
    async fn review_report(
        &self,
        id: &str,
        status: ReportStatus,
        approved_by: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    // Notifications
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;
    /// Newest first.
    async fn list_notifications(&self, user_id: &str) -> StoreResult<Vec<Notification>>;
    /// Returns false when no notification with that id belongs to the user.
    async fn mark_notification_read(&self, id: &str, user_id: &str) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64>;

    // Refresh tokens
    async fn insert_refresh_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Revokes the token and returns its user id, or `None` if it was
    /// unknown, already revoked or expired.
    async fn consume_refresh_token(&self, jti: &str) -> StoreResult<Option<String>>;
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<()>;
}

struct SeedUser {
    name: &'static str,
    email: &'static str,
    role: Role,
    phone: &'static str,
    designation: &'static str,
    device_id: Option<&'static str>,
}

const SEED_USERS: [SeedUser; 5] = [
    SeedUser {
        name: "Global Admin",
        email: "admin@connectasetu.com",
        role: Role::SuperAdmin,
        phone: "9999999999",
        designation: "General Manager",
        device_id: None,
    },
    SeedUser {
        name: "Unit A Supervisor",
        email: "admin.a@connectasetu.com",
        role: Role::TeamAdminA,
        phone: "8888888888",
        designation: "Team Lead",
        device_id: None,
    },
    SeedUser {
        name: "Unit B Supervisor",
        email: "admin.b@connectasetu.com",
        role: Role::TeamAdminB,
        phone: "7777777777",
        designation: "Team Lead",
        device_id: None,
    },
    SeedUser {
        name: "Arjun Mehta",
        email: "arjun@connectasetu.com",
        role: Role::EmployeeA,
        phone: "9111111111",
        designation: "Field Sales",
        device_id: Some("DEV_8829"),
    },
    SeedUser {
        name: "Priya Das",
        email: "priya@connectasetu.com",
        role: Role::EmployeeB,
        phone: "9222222222",
        designation: "Tele-Sales",
        device_id: Some("DEV_4410"),
    },
];

/// Creates the demo accounts when the user collection is empty.
/// Returns how many users were created.
pub async fn seed_if_empty(store: &dyn CrmStore, password: &str) -> anyhow::Result<usize> {
    if store.count_users().await? > 0 {
        return Ok(0);
    }

    for seed in &SEED_USERS {
        let hashed = hash_password(password).map_err(|e| anyhow::anyhow!("hashing seed password: {e}"))?;
        let mut user = User::new(
            seed.name.to_string(),
            seed.email.to_string(),
            hashed,
            seed.role,
            UserStatus::Active,
        );
        user.phone = Some(seed.phone.to_string());
        user.designation = Some(seed.designation.to_string());
        user.device_id = seed.device_id.map(str::to_string);
        store.insert_user(&user).await?;
    }

    tracing::info!(count = SEED_USERS.len(), "Seeded demo accounts");
    Ok(SEED_USERS.len())
}
