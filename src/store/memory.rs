use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::{HashMap, HashSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

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

struct RefreshToken {
    user_id: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    calls: HashMap<String, CallRecord>,
    call_signatures: HashSet<String>,
    reports: HashMap<String, DailyReport>,
    notifications: HashMap<String, Notification>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Collections>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Collections>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.write()?;
        if db.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        db.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.write()?.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn list_employees(
        &self,
        team: Option<Team>,
        status: Option<UserStatus>,
        include_admins: bool,
    ) -> StoreResult<Vec<User>> {
        let db = self.read()?;
        let mut users: Vec<User> = db
            .users
            .values()
            .filter(|u| include_admins || u.role.is_employee())
            .filter(|u| team.is_none_or(|t| u.team == t))
            .filter(|u| status.is_none_or(|s| u.status == s))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        Ok(self.read()?.users.values().map(|u| u.email.clone()).collect())
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.read()?.users.len() as u64)
    }

    async fn find_call(&self, id: &str) -> StoreResult<Option<CallRecord>> {
        Ok(self.read()?.calls.get(id).cloned())
    }

    async fn list_calls(&self, scope: &Scope) -> StoreResult<Vec<CallRecord>> {
        let db = self.read()?;
        let mut calls: Vec<CallRecord> = db
            .calls
            .values()
            .filter(|c| scope.admits(c.employee_team, &c.employee_id))
            .cloned()
            .collect();
        calls.sort_by(|a, b| (b.started_at, b.created_at).cmp(&(a.started_at, a.created_at)));
        Ok(calls)
    }

    async fn insert_calls(&self, calls: &[CallRecord]) -> StoreResult<u64> {
        let mut db = self.write()?;
        let mut inserted = 0;
        for call in calls {
            if db.call_signatures.insert(call.hash_signature.clone()) {
                db.calls.insert(call.id.clone(), call.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn save_call(&self, call: &CallRecord) -> StoreResult<()> {
        self.write()?.calls.insert(call.id.clone(), call.clone());
        Ok(())
    }

    async fn find_report(&self, id: &str) -> StoreResult<Option<DailyReport>> {
        Ok(self.read()?.reports.get(id).cloned())
    }

    async fn list_reports(
        &self,
        scope: &Scope,
        status: Option<ReportStatus>,
    ) -> StoreResult<Vec<DailyReport>> {
        let db = self.read()?;
        let mut reports: Vec<DailyReport> = db
            .reports
            .values()
            .filter(|r| scope.admits(r.team, &r.employee_id))
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn insert_report(&self, report: &DailyReport) -> StoreResult<()> {
        let mut db = self.write()?;
        let duplicate = db
            .reports
            .values()
            .any(|r| r.employee_id == report.employee_id && r.date == report.date);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "A report for {} was already submitted",
                report.date
            )));
        }
        db.reports.insert(report.id.clone(), report.clone());
        Ok(())
    }

    async fn review_report(
        &self,
        id: &str,
        status: ReportStatus,
        approved_by: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut db = self.write()?;
        match db.reports.get_mut(id) {
            Some(report) if report.status == ReportStatus::Pending => {
                report.status = status;
                report.approved_by = Some(approved_by.to_string());
                report.reviewed_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.write()?
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, user_id: &str) -> StoreResult<Vec<Notification>> {
        let db = self.read()?;
        let mut items: Vec<Notification> = db
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn mark_notification_read(&self, id: &str, user_id: &str) -> StoreResult<bool> {
        let mut db = self.write()?;
        match db.notifications.get_mut(id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> StoreResult<u64> {
        let mut db = self.write()?;
        let mut updated = 0;
        for n in db.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn insert_refresh_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.write()?.refresh_tokens.insert(
            jti.to_string(),
            RefreshToken {
                user_id: user_id.to_string(),
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> StoreResult<Option<String>> {
        let mut db = self.write()?;
        match db.refresh_tokens.get_mut(jti) {
            Some(token) if !token.revoked && token.expires_at > Utc::now() => {
                token.revoked = true;
                Ok(Some(token.user_id.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<()> {
        if let Some(token) = self.write()?.refresh_tokens.get_mut(jti) {
            token.revoked = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        call::{CallDirection, CallStatus, SyncSource},
        role::Role,
    };
    use chrono::{Duration, NaiveDate};

    fn user(email: &str, role: Role) -> User {
        User::new("Test".into(), email.into(), String::new(), role, UserStatus::Active)
    }

    fn call(employee: &User, signature: &str, minutes_ago: i64) -> CallRecord {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        CallRecord {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            employee_team: employee.team,
            customer_number: "9876543210".into(),
            contact_name: None,
            direction: CallDirection::Out,
            status: CallStatus::Connected,
            duration_seconds: 60,
            outcome: None,
            notes: None,
            sync_source: SyncSource::DeviceOnly,
            device_id: "DEV_1".into(),
            hash_signature: signature.into(),
            recording_consent: false,
            recording_url: None,
            started_at: at,
            created_at: at,
        }
    }

    fn report(employee: &User, date: NaiveDate) -> DailyReport {
        DailyReport {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            team: employee.team,
            date,
            tasks: None,
            calls_count: Some(3),
            follow_ups: 1,
            remarks: String::new(),
            status: ReportStatus::Pending,
            approved_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn email_is_unique_case_insensitively() {
        let store = MemoryStore::new();
        store.insert_user(&user("arjun@connectasetu.com", Role::EmployeeA)).await.unwrap();
        let err = store
            .insert_user(&user("ARJUN@connectasetu.com", Role::EmployeeB))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(store.find_user_by_email("Arjun@Connectasetu.com").await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn employee_listing_skips_admins_and_filters_team() {
        let store = MemoryStore::new();
        store.insert_user(&user("a@x.com", Role::EmployeeA)).await.unwrap();
        store.insert_user(&user("b@x.com", Role::EmployeeB)).await.unwrap();
        store.insert_user(&user("adm@x.com", Role::TeamAdminA)).await.unwrap();

        assert_eq!(store.list_employees(None, None, false).await.unwrap().len(), 2);
        let team_a = store.list_employees(Some(Team::TeamA), None, false).await.unwrap();
        assert_eq!(team_a.len(), 1);
        assert_eq!(team_a[0].email, "a@x.com");

        let everyone = store.list_employees(None, None, true).await.unwrap();
        assert_eq!(everyone.len(), 3);
    }

    #[actix_web::test]
    async fn duplicate_call_signatures_are_skipped() {
        let store = MemoryStore::new();
        let emp = user("a@x.com", Role::EmployeeA);
        let first = store.insert_calls(&[call(&emp, "sig-1", 2), call(&emp, "sig-2", 1)]).await.unwrap();
        let second = store.insert_calls(&[call(&emp, "sig-2", 1), call(&emp, "sig-3", 0)]).await.unwrap();
        assert_eq!((first, second), (2, 1));

        let listed = store.list_calls(&Scope::All).await.unwrap();
        let signatures: Vec<_> = listed.iter().map(|c| c.hash_signature.as_str()).collect();
        assert_eq!(signatures, ["sig-3", "sig-2", "sig-1"]);
    }

    #[actix_web::test]
    async fn one_batch_lists_by_start_time() {
        let store = MemoryStore::new();
        let emp = user("a@x.com", Role::EmployeeA);
        let synced_at = Utc::now();
        let batch: Vec<CallRecord> = [(30, "sig-old"), (5, "sig-new"), (15, "sig-mid")]
            .into_iter()
            .map(|(minutes_ago, sig)| CallRecord {
                created_at: synced_at,
                ..call(&emp, sig, minutes_ago)
            })
            .collect();
        store.insert_calls(&batch).await.unwrap();

        let listed = store.list_calls(&Scope::All).await.unwrap();
        let signatures: Vec<_> = listed.iter().map(|c| c.hash_signature.as_str()).collect();
        assert_eq!(signatures, ["sig-new", "sig-mid", "sig-old"]);
    }

    #[actix_web::test]
    async fn calls_are_scoped() {
        let store = MemoryStore::new();
        let a = user("a@x.com", Role::EmployeeA);
        let b = user("b@x.com", Role::EmployeeB);
        store.insert_calls(&[call(&a, "sig-a", 1), call(&b, "sig-b", 1)]).await.unwrap();

        assert_eq!(store.list_calls(&Scope::Team(Team::TeamB)).await.unwrap().len(), 1);
        let own = store.list_calls(&Scope::Owner(a.id.clone())).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].employee_id, a.id);
    }

    #[actix_web::test]
    async fn one_report_per_day_and_reviews_are_terminal() {
        let store = MemoryStore::new();
        let emp = user("a@x.com", Role::EmployeeA);
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let r = report(&emp, day);
        store.insert_report(&r).await.unwrap();
        assert!(matches!(
            store.insert_report(&report(&emp, day)).await,
            Err(StoreError::Conflict(_))
        ));

        assert!(store.review_report(&r.id, ReportStatus::Approved, "Lead", Utc::now()).await.unwrap());
        assert!(!store.review_report(&r.id, ReportStatus::Rejected, "Lead", Utc::now()).await.unwrap());
        let stored = store.find_report(&r.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Approved);
        assert_eq!(stored.approved_by.as_deref(), Some("Lead"));
    }

    #[actix_web::test]
    async fn refresh_tokens_are_single_use() {
        let store = MemoryStore::new();
        let expires = Utc::now() + Duration::hours(1);
        store.insert_refresh_token("jti-1", "u1", expires).await.unwrap();
        assert_eq!(store.consume_refresh_token("jti-1").await.unwrap().as_deref(), Some("u1"));
        assert_eq!(store.consume_refresh_token("jti-1").await.unwrap(), None);

        store
            .insert_refresh_token("jti-old", "u1", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(store.consume_refresh_token("jti-old").await.unwrap(), None);
    }

    #[actix_web::test]
    async fn notifications_belong_to_their_user() {
        let store = MemoryStore::new();
        let n = Notification::new("u1", crate::model::notification::NotificationType::Info, "t", "m");
        store.insert_notification(&n).await.unwrap();
        assert!(!store.mark_notification_read(&n.id, "u2").await.unwrap());
        assert!(store.mark_notification_read(&n.id, "u1").await.unwrap());
        assert_eq!(store.mark_all_notifications_read("u1").await.unwrap(), 0);
    }
}
