//! Aggregate statistics over a window of audit entries.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, DurationRound, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Serialize;

use caseflow_core::{AuditAction, EntityType, Severity, UserId};

use crate::models::AuditLogEntry;

/// Number of users reported in [`AuditStats::top_users`].
pub const TOP_USERS: usize = 10;

/// Number of hours reported in [`PerformanceMetrics::peak_hours`].
pub const PEAK_HOURS: usize = 5;

/// Local hours before this count as off-hours.
const OFF_HOURS_BEFORE: u32 = 6;

/// Local hours after this count as off-hours.
const OFF_HOURS_AFTER: u32 = 22;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub user_id: UserId,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourActivity {
    /// Local hour of day, 0 to 23.
    pub hour: u32,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityMetrics {
    /// LOGIN plus LOGIN_FAILED entries.
    pub login_attempts: u64,
    pub failed_logins: u64,
    /// Rounded percentage of attempts that succeeded; 0 with no attempts.
    pub success_rate: u32,
    pub unique_ips: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BusinessMetrics {
    /// Entries with an admin email.
    pub admin_activity: u64,
    /// Entries with a user but no admin email.
    pub user_engagement: u64,
    pub data_modifications: u64,
    pub file_operations: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceMetrics {
    /// Rounded percentage of entries with error or critical severity.
    pub error_rate: u32,
    /// Busiest local hours of day, busiest first.
    pub peak_hours: Vec<HourActivity>,
    /// Entry counts per UTC hour.
    pub hourly_activity: BTreeMap<DateTime<Utc>, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskMetrics {
    pub high_risk_actions: u64,
    pub error_events: u64,
    /// Failed logins, off-hours activity and warnings. A heuristic only.
    pub suspicious_activity: u64,
}

/// Audit statistics for a rolling window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub period_days: u32,
    pub total_events: u64,
    pub by_action: BTreeMap<AuditAction, u64>,
    pub by_entity_type: BTreeMap<EntityType, u64>,
    pub by_severity: BTreeMap<Severity, u64>,
    /// Entry counts per UTC calendar day.
    pub daily_activity: BTreeMap<NaiveDate, u64>,
    pub top_users: Vec<UserActivity>,
    pub security: SecurityMetrics,
    pub business: BusinessMetrics,
    pub performance: PerformanceMetrics,
    pub risk: RiskMetrics,
}

impl AuditStats {
    /// Aggregate the entries with `timestamp >= now - days`.
    ///
    /// Hour-of-day figures use `local_offset`; day and hour buckets are UTC.
    #[must_use]
    pub fn compute(
        entries: &[AuditLogEntry],
        now: DateTime<Utc>,
        days: u32,
        local_offset: FixedOffset,
    ) -> Self {
        let cutoff = now - Duration::days(i64::from(days));
        let mut stats = Self {
            period_days: days,
            ..Self::default()
        };

        let mut per_user: HashMap<UserId, u64> = HashMap::new();
        let mut per_local_hour = [0_u64; 24];
        let mut ips = BTreeSet::new();

        for entry in entries.iter().filter(|e| e.timestamp >= cutoff) {
            stats.total_events += 1;
            *stats.by_action.entry(entry.action).or_default() += 1;
            *stats.by_entity_type.entry(entry.entity_type).or_default() += 1;
            *stats.by_severity.entry(entry.severity).or_default() += 1;
            *stats
                .daily_activity
                .entry(entry.timestamp.date_naive())
                .or_default() += 1;

            if let Some(user_id) = entry.user_id {
                *per_user.entry(user_id).or_default() += 1;
            }
            if let Some(ip) = &entry.ip_address {
                ips.insert(ip.as_str());
            }

            match entry.action {
                AuditAction::Login => stats.security.login_attempts += 1,
                AuditAction::LoginFailed => {
                    stats.security.login_attempts += 1;
                    stats.security.failed_logins += 1;
                }
                _ => {}
            }

            if entry.admin_email.is_some() {
                stats.business.admin_activity += 1;
            } else if entry.user_id.is_some() {
                stats.business.user_engagement += 1;
            }
            if entry.action.is_data_modification() {
                stats.business.data_modifications += 1;
            }
            if entry.action.is_file_operation() {
                stats.business.file_operations += 1;
            }

            let local_hour = entry.timestamp.with_timezone(&local_offset).hour();
            if let Some(slot) = per_local_hour.get_mut(local_hour as usize) {
                *slot += 1;
            }
            let hour_start = entry
                .timestamp
                .duration_trunc(Duration::hours(1))
                .unwrap_or(entry.timestamp);
            *stats
                .performance
                .hourly_activity
                .entry(hour_start)
                .or_default() += 1;

            if entry.action.is_high_risk() {
                stats.risk.high_risk_actions += 1;
            }
            if entry.severity.is_error() {
                stats.risk.error_events += 1;
            }
            if entry.action == AuditAction::LoginFailed
                || !(OFF_HOURS_BEFORE..=OFF_HOURS_AFTER).contains(&local_hour)
                || entry.severity == Severity::Warning
            {
                stats.risk.suspicious_activity += 1;
            }
        }

        stats.security.unique_ips = ips.len() as u64;
        stats.security.success_rate = percent(
            stats.security.login_attempts - stats.security.failed_logins,
            stats.security.login_attempts,
        );
        stats.performance.error_rate = percent(stats.risk.error_events, stats.total_events);

        let mut top_users: Vec<UserActivity> = per_user
            .into_iter()
            .map(|(user_id, count)| UserActivity { user_id, count })
            .collect();
        top_users.sort_by(|a, b| b.count.cmp(&a.count).then(a.user_id.cmp(&b.user_id)));
        top_users.truncate(TOP_USERS);
        stats.top_users = top_users;

        let mut peak_hours: Vec<HourActivity> = (0_u32..)
            .zip(per_local_hour)
            .filter(|&(_, count)| count > 0)
            .map(|(hour, count)| HourActivity { hour, count })
            .collect();
        peak_hours.sort_by(|a, b| b.count.cmp(&a.count).then(a.hour.cmp(&b.hour)));
        peak_hours.truncate(PEAK_HOURS);
        stats.performance.peak_hours = peak_hours;

        stats
    }
}

/// `part / whole` as a percentage rounded half up; 0 when `whole` is 0.
fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let rounded = (part * 200 + whole) / (whole * 2);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}
