use chrono::Utc;
use uuid::Uuid;

use crate::models::candidate::{Candidate, CANDIDATE_SCHEMA_VERSION};
use crate::persistence::StoreError;
use crate::session::stats::apply_stats;

/// Brings a freshly loaded record up to the current layout.
///
/// Version 0 predates session ids and activity tracking: both are stamped now,
/// and the aggregate stats are recomputed from the stored history.
/// Records written by a newer binary are refused instead of guessed at.
pub fn upgrade_record(candidate: &mut Candidate, stored_version: i32) -> Result<(), StoreError> {
    let current = CANDIDATE_SCHEMA_VERSION as i32;
    match stored_version {
        v if v < 0 => Err(StoreError::Corrupt {
            id: candidate.id,
            reason: format!("negative schema version {v}"),
        }),
        0 => {
            candidate.session_id = Uuid::new_v4();
            candidate.last_active_at = Utc::now();
            apply_stats(candidate);
            candidate.schema_version = CANDIDATE_SCHEMA_VERSION;
            Ok(())
        }
        v if v == current => {
            candidate.schema_version = CANDIDATE_SCHEMA_VERSION;
            Ok(())
        }
        v => Err(StoreError::UnsupportedVersion {
            id: candidate.id,
            version: v,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::models::candidate::{InterviewSession, SessionOutcome};

    #[test]
    fn test_version_zero_is_stamped() {
        let mut c = Candidate::new(Uuid::new_v4());
        let old_session = c.session_id;
        c.last_active_at = Utc::now() - Duration::days(30);
        c.schema_version = 0;
        c.interview_history.push(InterviewSession {
            id: Uuid::new_v4(),
            questions: vec![],
            answers: vec![],
            score: 64,
            summary: String::new(),
            start_time: Utc::now(),
            end_time: None,
            status: SessionOutcome::Completed,
            profile: None,
        });

        upgrade_record(&mut c, 0).unwrap();
        assert_ne!(c.session_id, old_session);
        assert_eq!((c.total_interviews, c.best_score, c.average_score), (1, 64, 64));
        assert!(Utc::now() - c.last_active_at < Duration::minutes(1));
        assert_eq!(c.schema_version, CANDIDATE_SCHEMA_VERSION);
    }

    #[test]
    fn test_current_version_untouched() {
        let mut c = Candidate::new(Uuid::new_v4());
        let before = c.clone();
        upgrade_record(&mut c, CANDIDATE_SCHEMA_VERSION as i32).unwrap();
        assert_eq!(c, before);
    }

    #[test]
    fn test_future_version_refused() {
        let mut c = Candidate::new(Uuid::new_v4());
        let err = upgrade_record(&mut c, CANDIDATE_SCHEMA_VERSION as i32 + 1).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion { version, .. } if version == 2));
    }

    #[test]
    fn test_negative_version_is_corrupt() {
        let mut c = Candidate::new(Uuid::new_v4());
        assert!(matches!(
            upgrade_record(&mut c, -1),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
