use crate::{
    auth::auth::AuthUser, error::ApiError, model::call::CallRecord, policy::Scope, store::CrmStore,
};
use actix_web::{HttpResponse, web};
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

const PULSE_DAYS: u64 = 7;

/// Per-day call activity, oldest day first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "days": ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    "seriesA": [12, 9, 14, 0, 3, 7, 11],
    "seriesB": [41, 30, 52, 0, 8, 19, 33]
}))]
pub struct FleetPulse {
    pub days: Vec<String>,
    /// Calls per day
    pub series_a: Vec<u64>,
    /// Talk time per day, whole minutes
    pub series_b: Vec<u64>,
}

fn pulse(calls: &[CallRecord], today: NaiveDate) -> FleetPulse {
    let dates: Vec<NaiveDate> = (0..PULSE_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .collect();

    let mut counts = vec![0u64; dates.len()];
    let mut seconds = vec![0u64; dates.len()];
    for call in calls {
        let day = call.started_at.date_naive();
        if let Some(i) = dates.iter().position(|d| *d == day) {
            counts[i] += 1;
            seconds[i] += u64::from(call.duration_seconds);
        }
    }

    FleetPulse {
        days: dates.iter().map(|d| d.format("%a").to_string()).collect(),
        series_a: counts,
        series_b: seconds.into_iter().map(|s| s / 60).collect(),
    }
}

#[utoipa::path(
    get,
    path = "/api/analytics/fleet-pulse",
    responses(
        (status = 200, description = "Call volume over the last 7 days in the caller's scope", body = FleetPulse),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn fleet_pulse(auth: AuthUser, store: web::Data<dyn CrmStore>) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let calls = store.list_calls(&Scope::for_actor(&auth)).await?;
    Ok(HttpResponse::Ok().json(pulse(&calls, Utc::now().date_naive())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        call::{CallDirection, CallStatus, SyncSource},
        role::Team,
    };
    use chrono::TimeZone;

    fn call_on(day: u32, duration_seconds: u32) -> CallRecord {
        let at = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap();
        CallRecord {
            id: format!("c-{day}-{duration_seconds}"),
            employee_id: "emp-1".into(),
            employee_name: "Arjun Mehta".into(),
            employee_team: Team::TeamA,
            customer_number: "9876543210".into(),
            contact_name: None,
            direction: CallDirection::Out,
            status: CallStatus::Connected,
            duration_seconds,
            outcome: None,
            notes: None,
            sync_source: SyncSource::DeviceOnly,
            device_id: "DEV_8829".into(),
            hash_signature: String::new(),
            recording_consent: false,
            recording_url: None,
            started_at: at,
            created_at: at,
        }
    }

    #[test]
    fn buckets_last_seven_days_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let calls = vec![call_on(8, 90), call_on(8, 60), call_on(2, 600), call_on(1, 300)];

        let p = pulse(&calls, today);
        assert_eq!(p.days.len(), 7);
        // 2026-03-02 is a Monday
        assert_eq!(p.days[0], "Mon");
        assert_eq!(p.series_a, vec![1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(p.series_b, vec![10, 0, 0, 0, 0, 0, 2]);
    }
}
