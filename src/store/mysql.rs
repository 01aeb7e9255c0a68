use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::TryStreamExt;
use sqlx::{FromRow, MySqlPool};
use std::str::FromStr;
use tracing::debug;

use super::{CrmStore, StoreError, StoreResult};
use crate::{
    model::{
        call::CallRecord,
        notification::Notification,
        report::{DailyReport, ReportStatus},
        role::Team,
        user::{User, UserStatus},
    },
    policy::Scope,
};

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse<T: FromStr>(value: &str, field: &str) -> StoreResult<T> {
    value
        .parse()
        .map_err(|_| StoreError::Corrupt(format!("unexpected {field} value {value:?}")))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Appends the row filter for `scope` to `where_sql`.
fn push_scope(scope: &Scope, team_col: &str, owner_col: &str, where_sql: &mut String, args: &mut Vec<String>) {
    match scope {
        Scope::All => {}
        Scope::Team(team) => {
            where_sql.push_str(&format!(" AND {team_col} = ?"));
            args.push(team.as_ref().to_string());
        }
        Scope::Owner(id) => {
            where_sql.push_str(&format!(" AND {owner_col} = ?"));
            args.push(id.clone());
        }
    }
}

/* =========================
Row types
========================= */

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, designation, role, team, \
     device_id, status, last_sync_at, joining_date, created_at";

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    designation: Option<String>,
    role: String,
    team: String,
    device_id: Option<String>,
    status: String,
    last_sync_at: Option<DateTime<Utc>>,
    joining_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            role: parse(&row.role, "users.role")?,
            team: parse(&row.team, "users.team")?,
            status: parse(&row.status, "users.status")?,
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            designation: row.designation,
            device_id: row.device_id,
            last_sync_at: row.last_sync_at,
            joining_date: row.joining_date,
            created_at: row.created_at,
        })
    }
}

const CALL_COLUMNS: &str = "id, employee_id, employee_name, employee_team, customer_number, \
     contact_name, direction, status, duration_seconds, outcome, notes, sync_source, device_id, \
     hash_signature, recording_consent, recording_url, started_at, created_at";

#[derive(FromRow)]
struct CallRow {
    id: String,
    employee_id: String,
    employee_name: String,
    employee_team: String,
    customer_number: String,
    contact_name: Option<String>,
    direction: String,
    status: String,
    duration_seconds: u32,
    outcome: Option<String>,
    notes: Option<String>,
    sync_source: String,
    device_id: String,
    hash_signature: String,
    recording_consent: bool,
    recording_url: Option<String>,
    started_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CallRow> for CallRecord {
    type Error = StoreError;

    fn try_from(row: CallRow) -> StoreResult<Self> {
        Ok(CallRecord {
            employee_team: parse(&row.employee_team, "calls.employee_team")?,
            direction: parse(&row.direction, "calls.direction")?,
            status: parse(&row.status, "calls.status")?,
            sync_source: parse(&row.sync_source, "calls.sync_source")?,
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            customer_number: row.customer_number,
            contact_name: row.contact_name,
            duration_seconds: row.duration_seconds,
            outcome: row.outcome,
            notes: row.notes,
            device_id: row.device_id,
            hash_signature: row.hash_signature,
            recording_consent: row.recording_consent,
            recording_url: row.recording_url,
            started_at: row.started_at,
            created_at: row.created_at,
        })
    }
}

const REPORT_COLUMNS: &str = "id, employee_id, employee_name, team, report_date, tasks, \
     calls_count, follow_ups, remarks, status, approved_by, reviewed_at, created_at";

#[derive(FromRow)]
struct ReportRow {
    id: String,
    employee_id: String,
    employee_name: String,
    team: String,
    report_date: NaiveDate,
    tasks: Option<String>,
    calls_count: Option<u32>,
    follow_ups: u32,
    remarks: String,
    status: String,
    approved_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for DailyReport {
    type Error = StoreError;

    fn try_from(row: ReportRow) -> StoreResult<Self> {
        Ok(DailyReport {
            team: parse(&row.team, "daily_reports.team")?,
            status: parse(&row.status, "daily_reports.status")?,
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            date: row.report_date,
            tasks: row.tasks,
            calls_count: row.calls_count,
            follow_ups: row.follow_ups,
            remarks: row.remarks,
            approved_by: row.approved_by,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    title: String,
    message: String,
    kind: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> StoreResult<Self> {
        Ok(Notification {
            kind: parse(&row.kind, "notifications.kind")?,
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl CrmStore for MySqlStore {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (id, name, email, password_hash, phone, designation, role, team,
                 device_id, status, last_sync_at, joining_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.designation)
        .bind(user.role.as_ref())
        .bind(user.team.as_ref())
        .bind(&user.device_id)
        .bind(user.status.as_ref())
        .bind(user.last_sync_at)
        .bind(user.joining_date)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::Conflict("Email already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, phone = ?, designation = ?, device_id = ?, status = ?, last_sync_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.designation)
        .bind(&user.device_id)
        .bind(user.status.as_ref())
        .bind(user.last_sync_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_employees(
        &self,
        team: Option<Team>,
        status: Option<UserStatus>,
        include_admins: bool,
    ) -> StoreResult<Vec<User>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if !include_admins {
            clauses.push("role IN ('employee_a', 'employee_b')");
        }
        if let Some(team) = team {
            clauses.push("team = ?");
            args.push(team.as_ref().to_string());
        }
        if let Some(status) = status {
            clauses.push("status = ?");
            args.push(status.as_ref().to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let sql = format!("SELECT {USER_COLUMNS} FROM users{where_sql} ORDER BY name");
        let mut q = sqlx::query_as::<_, UserRow>(&sql);
        for arg in args {
            q = q.bind(arg);
        }
        convert_all(q.fetch_all(&self.pool).await?)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        let emails: Vec<String> = sqlx::query_scalar::<_, String>("SELECT email FROM users")
            .fetch(&self.pool)
            .try_collect()
            .await?;
        Ok(emails)
    }

    async fn count_users(&self) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn find_call(&self, id: &str) -> StoreResult<Option<CallRecord>> {
        let sql = format!("SELECT {CALL_COLUMNS} FROM calls WHERE id = ?");
        sqlx::query_as::<_, CallRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(CallRecord::try_from)
            .transpose()
    }

    async fn list_calls(&self, scope: &Scope) -> StoreResult<Vec<CallRecord>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args = Vec::new();
        push_scope(scope, "employee_team", "employee_id", &mut where_sql, &mut args);

        let sql = format!("SELECT {CALL_COLUMNS} FROM calls{where_sql} ORDER BY started_at DESC, created_at DESC");
        let mut q = sqlx::query_as::<_, CallRow>(&sql);
        for arg in args {
            q = q.bind(arg);
        }
        convert_all(q.fetch_all(&self.pool).await?)
    }

    async fn insert_calls(&self, calls: &[CallRecord]) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for call in calls {
            // a re-synced entry hits the unique key on hash_signature; anything else is an error
            let result = sqlx::query(
                r#"
                INSERT INTO calls
                    (id, employee_id, employee_name, employee_team, customer_number, contact_name,
                     direction, status, duration_seconds, outcome, notes, sync_source, device_id,
                     hash_signature, recording_consent, recording_url, started_at, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&call.id)
            .bind(&call.employee_id)
            .bind(&call.employee_name)
            .bind(call.employee_team.as_ref())
            .bind(&call.customer_number)
            .bind(&call.contact_name)
            .bind(call.direction.as_ref())
            .bind(call.status.as_ref())
            .bind(call.duration_seconds)
            .bind(&call.outcome)
            .bind(&call.notes)
            .bind(call.sync_source.as_ref())
            .bind(&call.device_id)
            .bind(&call.hash_signature)
            .bind(call.recording_consent)
            .bind(&call.recording_url)
            .bind(call.started_at)
            .bind(call.created_at)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(done) => inserted += done.rows_affected(),
                Err(e) if is_unique_violation(&e) => {
                    debug!(signature = %call.hash_signature, "Duplicate call skipped");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn save_call(&self, call: &CallRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE calls
            SET outcome = ?, notes = ?, recording_consent = ?, recording_url = ?
            WHERE id = ?
            "#,
        )
        .bind(&call.outcome)
        .bind(&call.notes)
        .bind(call.recording_consent)
        .bind(&call.recording_url)
        .bind(&call.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_report(&self, id: &str) -> StoreResult<Option<DailyReport>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM daily_reports WHERE id = ?");
        sqlx::query_as::<_, ReportRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(DailyReport::try_from)
            .transpose()
    }

    async fn list_reports(
        &self,
        scope: &Scope,
        status: Option<ReportStatus>,
    ) -> StoreResult<Vec<DailyReport>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args = Vec::new();
        push_scope(scope, "team", "employee_id", &mut where_sql, &mut args);

        if let Some(status) = status {
            where_sql.push_str(" AND status = ?");
            args.push(status.as_ref().to_string());
        }

        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM daily_reports{where_sql} ORDER BY created_at DESC"
        );
        let mut q = sqlx::query_as::<_, ReportRow>(&sql);
        for arg in args {
            q = q.bind(arg);
        }
        convert_all(q.fetch_all(&self.pool).await?)
    }

    async fn insert_report(&self, report: &DailyReport) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO daily_reports
                (id, employee_id, employee_name, team, report_date, tasks, calls_count,
                 follow_ups, remarks, status, approved_by, reviewed_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.employee_id)
        .bind(&report.employee_name)
        .bind(report.team.as_ref())
        .bind(report.date)
        .bind(&report.tasks)
        .bind(report.calls_count)
        .bind(report.follow_ups)
        .bind(&report.remarks)
        .bind(report.status.as_ref())
        .bind(&report.approved_by)
        .bind(report.reviewed_at)
        .bind(report.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "A report for {} was already submitted",
                report.date
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn review_report(
        &self,
        id: &str,
        status: ReportStatus,
        approved_by: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE daily_reports
            SET status = ?, approved_by = ?, reviewed_at = ?
            WHERE id = ?
            AND status = 'PENDING'
            "#,
        )
        .bind(status.as_ref())
        .bind(approved_by)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind.as_ref())
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(&self, user_id: &str) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, title, message, kind, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn mark_notification_read(&self, id: &str, user_id: &str) -> StoreResult<bool> {
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if owned == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_refresh_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (jti, user_id, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> StoreResult<Option<String>> {
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ?
            AND revoked = FALSE
            AND expires_at > ?
            "#,
        )
        .bind(jti)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if revoked.rows_affected() == 0 {
            return Ok(None);
        }

        let user_id = sqlx::query_scalar::<_, String>("SELECT user_id FROM refresh_tokens WHERE jti = ?")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<()> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
