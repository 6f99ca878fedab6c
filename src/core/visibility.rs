//! Inject release gating.
//!
//! One predicate decides whether a viewer may see an inject. The injects list
//! filters with it, the detail page answers 404 when it is false and the
//! submission endpoint answers 403, so all three surfaces always agree.

use crate::entities::{competition, inject};
use chrono::{DateTime, Duration, Utc};

/// Returns whether `inject` is visible (and therefore submittable) right now.
///
/// Rules, first match wins:
/// 1. administrators see everything;
/// 2. an inject with `release_time == 0` is visible immediately;
/// 3. with a parseable `started_time`, the inject is visible once
///    `started_time + release_time minutes` is not after `now`;
/// 4. anything else is hidden.
///
/// A malformed `started_time` hides the inject instead of failing.
#[must_use]
pub fn is_inject_visible(
    inject: &inject::Model,
    competition: Option<&competition::Model>,
    now: DateTime<Utc>,
    is_admin: bool,
) -> bool {
    if is_admin {
        return true;
    }

    if inject.release_time == 0 {
        return true;
    }

    competition
        .and_then(started_at)
        .and_then(|started| release_instant(started, inject.release_time))
        .is_some_and(|release| release <= now)
}

/// Parses the competition's start time, if it is strict RFC 3339.
#[must_use]
pub fn started_at(competition: &competition::Model) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(competition.started_time.as_deref()?)
        .ok()
        .map(|started| started.with_timezone(&Utc))
}

fn release_instant(started: DateTime<Utc>, release_minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(release_minutes).and_then(|offset| started.checked_add_signed(offset))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::CompetitionStatus;

    fn inject_with_release(release_time: i64) -> inject::Model {
        inject::Model {
            id: 1,
            inject_id: "INJ1".to_string(),
            title: "Firewall audit".to_string(),
            description: None,
            filename: None,
            release_time,
            due_time: None,
            created_at: Utc::now(),
        }
    }

    fn competition_started(started_time: Option<&str>) -> competition::Model {
        competition::Model {
            id: 1,
            status: CompetitionStatus::Running,
            scheduled_time: None,
            started_time: started_time.map(ToString::to_string),
            stopped_time: None,
        }
    }

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_admin_always_sees_injects() {
        let inject = inject_with_release(600);
        let now = at("2024-01-01T00:00:00Z");

        assert!(is_inject_visible(&inject, None, now, true));
        let unparseable = competition_started(Some("yesterday-ish"));
        assert!(is_inject_visible(&inject, Some(&unparseable), now, true));
    }

    #[test]
    fn test_zero_release_visible_without_competition() {
        let inject = inject_with_release(0);
        assert!(is_inject_visible(&inject, None, Utc::now(), false));
    }

    #[test]
    fn test_release_boundary() {
        let inject = inject_with_release(30);
        let competition = competition_started(Some("2024-01-01T00:00:00Z"));

        assert!(!is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:29:00Z"),
            false
        ));
        assert!(is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:30:00Z"),
            false
        ));
        assert!(is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:31:00Z"),
            false
        ));
    }

    #[test]
    fn test_hidden_without_competition() {
        let inject = inject_with_release(30);
        assert!(!is_inject_visible(&inject, None, Utc::now(), false));
    }

    #[test]
    fn test_hidden_when_not_started() {
        let inject = inject_with_release(30);
        let competition = competition_started(None);
        assert!(!is_inject_visible(
            &inject,
            Some(&competition),
            Utc::now(),
            false
        ));

        let blank = competition_started(Some("   "));
        assert!(!is_inject_visible(&inject, Some(&blank), Utc::now(), false));
    }

    #[test]
    fn test_malformed_start_fails_closed() {
        let inject = inject_with_release(1);
        let competition = competition_started(Some("2024-13-45 25:61"));
        assert!(!is_inject_visible(
            &inject,
            Some(&competition),
            at("2030-01-01T00:00:00Z"),
            false
        ));
    }

    #[test]
    fn test_padded_start_fails_closed() {
        let inject = inject_with_release(1);
        let competition = competition_started(Some(" 2024-01-01T00:00:00Z "));

        assert!(started_at(&competition).is_none());
        assert!(!is_inject_visible(
            &inject,
            Some(&competition),
            at("2030-01-01T00:00:00Z"),
            false
        ));
    }

    #[test]
    fn test_release_scenario_flip() {
        let inject = inject_with_release(15);
        let competition = competition_started(Some("2024-01-01T00:00:00Z"));

        assert!(!is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:14:59Z"),
            false
        ));
        assert!(is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:15:00Z"),
            false
        ));
    }

    #[test]
    fn test_start_time_with_offset() {
        let inject = inject_with_release(60);
        // 02:00+02:00 is midnight UTC
        let competition = competition_started(Some("2024-01-01T02:00:00+02:00"));

        assert!(!is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:59:59Z"),
            false
        ));
        assert!(is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T01:00:00Z"),
            false
        ));
    }

    #[test]
    fn test_negative_release_is_already_out() {
        let inject = inject_with_release(-5);
        let competition = competition_started(Some("2024-01-01T00:00:00Z"));
        assert!(is_inject_visible(
            &inject,
            Some(&competition),
            at("2024-01-01T00:00:00Z"),
            false
        ));
    }
}
