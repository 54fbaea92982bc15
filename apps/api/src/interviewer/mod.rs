//! Interviewer views: the filtered candidate roster and the dashboard totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::{Candidate, CandidateStatus, InterviewProfile};

pub mod handlers;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Highest score first.
    #[default]
    Score,
    /// Alphabetical, case-insensitive.
    Name,
    /// Most recently started first; never-started candidates last.
    Date,
}

/// One row of the interviewer roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateListItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: CandidateStatus,
    pub profile: Option<InterviewProfile>,
    pub score: u8,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_interviews: u32,
    pub best_score: u8,
    pub average_score: u8,
}

impl From<&Candidate> for CandidateListItem {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            email: c.email.clone(),
            status: c.status,
            profile: c.profile,
            score: c.score,
            start_time: c.start_time,
            end_time: c.end_time,
            total_interviews: c.total_interviews,
            best_score: c.best_score,
            average_score: c.average_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_candidates: usize,
    pub completed: usize,
    pub in_progress: usize,
    /// Rounded mean over completed candidates, 0 when none.
    pub average_score: u8,
}

/// Case-insensitive substring match on name or email, then ordered by `sort`.
pub fn filter_and_sort(
    candidates: &[Candidate],
    search: Option<&str>,
    sort: SortKey,
) -> Vec<CandidateListItem> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut rows: Vec<CandidateListItem> = candidates
        .iter()
        .filter(|c| match &needle {
            Some(n) => c.name.to_lowercase().contains(n) || c.email.to_lowercase().contains(n),
            None => true,
        })
        .map(CandidateListItem::from)
        .collect();

    match sort {
        SortKey::Score => rows.sort_by(|a, b| b.score.cmp(&a.score)),
        SortKey::Name => rows.sort_by_key(|r| r.name.to_lowercase()),
        // `None` sorts below any `Some`, so reversing puts unstarted rows last.
        SortKey::Date => rows.sort_by(|a, b| b.start_time.cmp(&a.start_time)),
    }
    rows
}

pub fn dashboard(candidates: &[Candidate]) -> DashboardStats {
    let completed: Vec<u8> = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Completed)
        .map(|c| c.score)
        .collect();
    let in_progress = candidates
        .iter()
        .filter(|c| {
            matches!(
                c.status,
                CandidateStatus::Interviewing | CandidateStatus::Paused
            )
        })
        .count();

    let average_score = if completed.is_empty() {
        0
    } else {
        let sum: u32 = completed.iter().map(|&s| u32::from(s)).sum();
        (f64::from(sum) / completed.len() as f64).round() as u8
    };

    DashboardStats {
        total_candidates: candidates.len(),
        completed: completed.len(),
        in_progress,
        average_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candidate(name: &str, email: &str, status: CandidateStatus, score: u8) -> Candidate {
        let mut c = Candidate::new(Uuid::new_v4());
        c.name = name.to_string();
        c.email = email.to_string();
        c.status = status;
        c.score = score;
        c
    }

    fn roster() -> Vec<Candidate> {
        let now = Utc::now();
        let mut ada = candidate("Ada", "ada@x.com", CandidateStatus::Completed, 80);
        ada.start_time = Some(now - Duration::days(2));
        let mut grace = candidate("grace", "grace@navy.mil", CandidateStatus::Completed, 91);
        grace.start_time = Some(now - Duration::days(1));
        let mut linus = candidate("Linus", "linus@x.com", CandidateStatus::Paused, 0);
        linus.start_time = Some(now);
        let fresh = candidate("Zed", "zed@x.com", CandidateStatus::Uploading, 0);
        vec![ada, grace, linus, fresh]
    }

    fn names(rows: &[CandidateListItem]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_default_sort_is_score_descending() {
        let rows = filter_and_sort(&roster(), None, SortKey::default());
        assert_eq!(names(&rows)[..2], ["grace", "Ada"]);
    }

    #[test]
    fn test_name_sort_ignores_case() {
        let rows = filter_and_sort(&roster(), None, SortKey::Name);
        assert_eq!(names(&rows), vec!["Ada", "grace", "Linus", "Zed"]);
    }

    #[test]
    fn test_date_sort_puts_unstarted_last() {
        let rows = filter_and_sort(&roster(), None, SortKey::Date);
        assert_eq!(names(&rows), vec!["Linus", "grace", "Ada", "Zed"]);
    }

    #[test]
    fn test_search_matches_name_or_email() {
        let rows = filter_and_sort(&roster(), Some("NAVY"), SortKey::Score);
        assert_eq!(names(&rows), vec!["grace"]);

        let rows = filter_and_sort(&roster(), Some("  "), SortKey::Score);
        assert_eq!(rows.len(), 4);

        assert!(filter_and_sort(&roster(), Some("nobody"), SortKey::Score).is_empty());
    }

    #[test]
    fn test_dashboard_totals() {
        let stats = dashboard(&roster());
        assert_eq!(
            stats,
            DashboardStats {
                total_candidates: 4,
                completed: 2,
                in_progress: 1,
                average_score: 86,
            }
        );
    }

    #[test]
    fn test_dashboard_empty() {
        assert_eq!(dashboard(&[]).average_score, 0);
        assert_eq!(dashboard(&[]).total_candidates, 0);
    }

    #[test]
    fn test_sort_key_parses_from_query() {
        let key: SortKey = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(key, SortKey::Date);
    }
}
