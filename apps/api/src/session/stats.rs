//! Score aggregation for a single run and across a candidate's interview history.

use serde::Serialize;

use crate::models::candidate::{Answer, Candidate, InterviewSession, SessionOutcome};

/// Upper bound of a single answer score.
pub const MAX_ANSWER_SCORE: u8 = 10;
/// Upper bound of an overall interview score.
pub const MAX_OVERALL_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStats {
    pub total_interviews: u32,
    pub best_score: u8,
    pub average_score: u8,
}

/// `round(10 × mean(answer scores))`, 0 when nothing was answered.
pub fn estimate_overall_score(answers: &[Answer]) -> u8 {
    if answers.is_empty() {
        return 0;
    }
    let mean = answers.iter().map(|a| f64::from(a.score)).sum::<f64>() / answers.len() as f64;
    clamp_score(mean * 10.0, MAX_OVERALL_SCORE)
}

/// Rounds a provider-reported score onto `0..=max`. Non-finite values become 0.
pub fn clamp_score(raw: f64, max: u8) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, f64::from(max)) as u8
}

/// Best and rounded average over completed sessions; every archived session counts
/// toward the total.
pub fn compute_stats(history: &[InterviewSession]) -> InterviewStats {
    let scores: Vec<u8> = history
        .iter()
        .filter(|s| s.status == SessionOutcome::Completed)
        .map(|s| s.score)
        .collect();

    let best_score = scores.iter().copied().max().unwrap_or(0);
    let average_score = if scores.is_empty() {
        0
    } else {
        let sum: u32 = scores.iter().map(|&s| u32::from(s)).sum();
        (f64::from(sum) / scores.len() as f64).round() as u8
    };

    InterviewStats {
        total_interviews: history.len() as u32,
        best_score,
        average_score,
    }
}

/// Appends a session to the candidate's history and refreshes the derived stats.
pub fn archive_session(candidate: &mut Candidate, session: InterviewSession) {
    candidate.interview_history.push(session);
    apply_stats(candidate);
}

pub fn apply_stats(candidate: &mut Candidate) {
    let stats = compute_stats(&candidate.interview_history);
    candidate.total_interviews = stats.total_interviews;
    candidate.best_score = stats.best_score;
    candidate.average_score = stats.average_score;
}
