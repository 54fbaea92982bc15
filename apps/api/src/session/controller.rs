//! SessionController drives one candidate at a time through intake, info
//! completion, profile selection, the six-question loop, pause/resume and
//! completion.
//!
//! Every live candidate sits behind its own async mutex, so each candidate has a
//! single writer. Operations work on a clone of the record, call the providers,
//! persist, and only then replace the live copy; a failed provider or store call
//! leaves the candidate exactly as it was.
//!
//! Deleting a candidate empties its slot rather than dropping it, so operations
//! already queued on the lock see `NotFound` instead of writing the record back.
//! Slots nobody holds and that have no countdown are evicted; the store stays the
//! source of truth and reloads them on the next access.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::intelligence::{CandidateFields, IntelligenceError, IntelligenceProvider};
use crate::models::candidate::{
    Answer, Candidate, CandidateStatus, InterviewProfile, InterviewSession, Question,
    SessionOutcome, QUESTIONS_PER_INTERVIEW,
};
use crate::models::user::{Actor, Role};
use crate::persistence::CandidateStore;
use crate::session::guard::InFlight;
use crate::session::stats::{
    archive_session, clamp_score, estimate_overall_score, MAX_ANSWER_SCORE, MAX_OVERALL_SCORE,
};
use crate::session::timer::{format_clock, Countdown, QuestionTimer, TimerExpired};
use crate::session::SessionError;

/// Answer recorded when the countdown runs out before the candidate submits.
pub const TIME_EXPIRED_ANSWER: &str = "No answer provided (time expired)";

/// `None` once the candidate has been deleted.
type Slot = Arc<AsyncMutex<Option<Candidate>>>;

/// Fields submitted from the info-collection step. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<Vec<String>>,
    pub education: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated(Candidate),
    /// Another generation is outstanding or questions already exist.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Advanced(Candidate),
    Completed(Candidate),
    /// The question was already answered, or another submission got there first.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Explicit,
    Timeout,
}

pub struct SessionController {
    intelligence: Arc<dyn IntelligenceProvider>,
    store: Arc<dyn CandidateStore>,
    live: Mutex<HashMap<Uuid, Slot>>,
    generating: InFlight,
    submitting: InFlight,
    timers: Mutex<HashMap<Uuid, QuestionTimer>>,
    expired_tx: UnboundedSender<TimerExpired>,
}

impl SessionController {
    /// Returns the controller and the receiving end of its timer expiry channel,
    /// to be handed to `spawn_expiry_listener`.
    pub fn new(
        intelligence: Arc<dyn IntelligenceProvider>,
        store: Arc<dyn CandidateStore>,
    ) -> (Self, UnboundedReceiver<TimerExpired>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let controller = Self {
            intelligence,
            store,
            live: Mutex::default(),
            generating: InFlight::new(),
            submitting: InFlight::new(),
            timers: Mutex::default(),
            expired_tx,
        };
        (controller, expired_rx)
    }

    /// Feeds timer expiries back into the answer path.
    pub fn spawn_expiry_listener(
        self: &Arc<Self>,
        mut expired_rx: UnboundedReceiver<TimerExpired>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = expired_rx.recv().await {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    if let Err(e) = controller.handle_timeout(event).await {
                        error!(
                            "Timed-out answer for candidate {} question {} failed: {e}",
                            event.candidate_id, event.question_index
                        );
                    }
                });
            }
        })
    }

    // ── Intake ────────────────────────────────────────────────────────────────

    /// Extracts fields from a resume and places the candidate in `interviewing`
    /// (complete contact info, nothing flagged missing) or `info-collection`.
    ///
    /// Reuses the caller's current record when it was reset by `start_new`, so
    /// interview history carries over.
    pub async fn intake_resume(
        &self,
        actor: &Actor,
        resume_text: &str,
    ) -> Result<Candidate, SessionError> {
        let resume_text = resume_text.trim();
        if resume_text.is_empty() {
            return Err(SessionError::Validation(
                "resume contains no readable text".to_string(),
            ));
        }

        let fields = self
            .intelligence
            .extract_candidate_fields(resume_text)
            .await?;

        let reusable = match self.store.current_candidate(actor.user_id).await? {
            Some(id) => match self.slot(id).await {
                Ok(slot) => Some(slot),
                Err(SessionError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        if let Some(slot) = reusable {
            let mut slot = slot.lock().await;
            if let Some(current) = slot.as_mut().filter(|c| {
                c.status == CandidateStatus::Uploading && c.user_id == actor.user_id
            }) {
                let mut updated = current.clone();
                apply_intake(&mut updated, resume_text, fields);
                self.commit(current, updated).await?;
                info!(
                    "Candidate {} re-entered intake as {}",
                    current.id,
                    current.status.as_str()
                );
                return Ok(current.clone());
            }
        }

        let mut candidate = Candidate::new(actor.user_id);
        apply_intake(&mut candidate, resume_text, fields);
        self.store.upsert(&candidate).await?;
        self.store
            .set_current_candidate(actor.user_id, Some(candidate.id))
            .await?;
        self.live_lock().insert(
            candidate.id,
            Arc::new(AsyncMutex::new(Some(candidate.clone()))),
        );

        info!(
            "Created candidate {} for user {} in {}",
            candidate.id,
            actor.user_id,
            candidate.status.as_str()
        );
        Ok(candidate)
    }

    pub async fn complete_info(
        &self,
        actor: &Actor,
        id: Uuid,
        info: CompleteInfo,
    ) -> Result<Candidate, SessionError> {
        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        ensure_owner(actor, current)?;
        if current.status != CandidateStatus::InfoCollection {
            return Err(invalid("submit candidate info", current));
        }

        let mut updated = current.clone();
        if let Some(name) = info.name {
            updated.name = name.trim().to_string();
        }
        if let Some(email) = info.email {
            updated.email = email.trim().to_string();
        }
        if let Some(phone) = info.phone {
            updated.phone = phone.trim().to_string();
        }

        let missing: Vec<&str> = [
            ("name", &updated.name),
            ("email", &updated.email),
            ("phone", &updated.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(SessionError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if let Some(skills) = info.skills {
            updated.skills = clean_list(skills);
        }
        if let Some(experience) = info.experience {
            updated.experience = clean_list(experience);
        }
        if let Some(education) = info.education {
            updated.education = clean_list(education);
        }
        updated.missing_info.clear();
        updated.status = CandidateStatus::Interviewing;
        updated.start_time = Some(Utc::now());

        self.commit(current, updated).await?;
        info!("Candidate {id} completed info collection");
        Ok(current.clone())
    }

    // ── Questions ─────────────────────────────────────────────────────────────

    /// Attaches the profile and immediately asks for questions.
    pub async fn select_profile(
        &self,
        actor: &Actor,
        id: Uuid,
        profile: InterviewProfile,
    ) -> Result<GenerationOutcome, SessionError> {
        {
            let mut slot = self.lock(id).await?;
            let current = occupied(&mut slot, id)?;
            ensure_owner(actor, current)?;
            if current.status != CandidateStatus::Interviewing || current.profile.is_some() {
                return Err(invalid("select a profile", current));
            }
            let mut updated = current.clone();
            updated.profile = Some(profile);
            self.commit(current, updated).await?;
            info!("Candidate {id} selected profile {}", profile.as_str());
        }
        self.generate_questions(actor, id).await
    }

    /// Requests the six questions. At most one request per candidate is in flight;
    /// duplicates, and calls once questions exist, are skipped.
    pub async fn generate_questions(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<GenerationOutcome, SessionError> {
        let Some(_in_flight) = self.generating.try_acquire(id) else {
            debug!("Question generation already in flight for candidate {id}; skipping");
            return Ok(GenerationOutcome::Skipped);
        };

        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        ensure_owner(actor, current)?;
        if current.status != CandidateStatus::Interviewing || !current.questions.is_empty() {
            return Ok(GenerationOutcome::Skipped);
        }
        let Some(profile) = current.profile else {
            return Err(SessionError::Validation(
                "select an interview profile before generating questions".to_string(),
            ));
        };

        let fields = CandidateFields::from_candidate(current);
        let questions = self
            .intelligence
            .generate_questions(&fields, profile)
            .await?;
        let questions = normalize_questions(questions)?;
        let first_limit = questions[0].time_limit;

        let mut updated = current.clone();
        updated.questions = questions;
        updated.answers.clear();
        updated.current_question = 0;
        updated.time_remaining = Some(first_limit);
        updated.start_time.get_or_insert_with(Utc::now);
        self.commit(current, updated).await?;

        self.start_timer(id, 0, Countdown::new(first_limit));
        info!("Generated questions for candidate {id}; question 1 started");
        Ok(GenerationOutcome::Generated(current.clone()))
    }

    // ── Pause / resume ────────────────────────────────────────────────────────

    pub async fn toggle_pause(&self, actor: &Actor, id: Uuid) -> Result<Candidate, SessionError> {
        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        ensure_owner(actor, current)?;
        let Some(question) = current.current_question().cloned() else {
            return Err(invalid("pause before questions exist", current));
        };
        let index = current.current_question;

        let mut updated = current.clone();
        let status = current.status;
        match status {
            CandidateStatus::Interviewing => {
                let remaining = self
                    .with_timer(id, |t| t.pause())
                    .or(current.time_remaining)
                    .unwrap_or(question.time_limit);
                updated.status = CandidateStatus::Paused;
                updated.time_remaining = Some(remaining);
                if let Err(e) = self.commit(current, updated).await {
                    self.with_timer(id, |t| t.resume());
                    return Err(e);
                }
                info!(
                    "Candidate {id} paused on question {} with {} left",
                    index + 1,
                    format_clock(remaining)
                );
            }
            CandidateStatus::Paused => {
                updated.status = CandidateStatus::Interviewing;
                self.commit(current, updated).await?;
                self.arm_timer(id, index, &question, current.time_remaining);
                info!("Candidate {id} resumed question {}", index + 1);
            }
            _ => return Err(invalid("pause", current)),
        }
        Ok(self.with_live_remaining(current.clone()))
    }

    // ── Answers ───────────────────────────────────────────────────────────────

    /// Records an explicit answer to question `question_index`.
    pub async fn submit_answer(
        &self,
        actor: &Actor,
        id: Uuid,
        question_index: usize,
        answer: &str,
    ) -> Result<SubmitOutcome, SessionError> {
        self.record_answer(Some(actor), id, question_index, answer.trim(), Trigger::Explicit)
            .await
    }

    /// Expiry path: identical to submitting the time-expired sentinel.
    pub async fn handle_timeout(&self, event: TimerExpired) -> Result<SubmitOutcome, SessionError> {
        let id = event.candidate_id;
        match self
            .record_answer(None, id, event.question_index, TIME_EXPIRED_ANSWER, Trigger::Timeout)
            .await
        {
            Err(SessionError::NotFound(_)) => {
                debug!("Expiry for deleted candidate {id}; ignoring");
                Ok(SubmitOutcome::Ignored)
            }
            outcome => outcome,
        }
    }

    async fn record_answer(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        question_index: usize,
        answer_text: &str,
        trigger: Trigger,
    ) -> Result<SubmitOutcome, SessionError> {
        let Some(_in_flight) = self.submitting.try_acquire(id) else {
            debug!("Answer for candidate {id} already in flight; ignoring {trigger:?}");
            return Ok(SubmitOutcome::Ignored);
        };

        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        if let Some(actor) = actor {
            ensure_owner(actor, current)?;
        }

        if current.status != CandidateStatus::Interviewing {
            return match trigger {
                Trigger::Timeout => Ok(SubmitOutcome::Ignored),
                Trigger::Explicit => Err(invalid("submit an answer", current)),
            };
        }
        if current.current_question != question_index {
            debug!(
                "Stale {trigger:?} for candidate {id}: question {question_index}, current is {}",
                current.current_question
            );
            return Ok(SubmitOutcome::Ignored);
        }
        let Some(question) = current.current_question().cloned() else {
            return match trigger {
                Trigger::Timeout => Ok(SubmitOutcome::Ignored),
                Trigger::Explicit => Err(SessionError::Validation(
                    "no question is awaiting an answer".to_string(),
                )),
            };
        };

        let remaining = match trigger {
            Trigger::Timeout => 0,
            Trigger::Explicit => self
                .with_timer(id, |t| (t.question_index() == question_index).then(|| t.remaining()))
                .flatten()
                .or(current.time_remaining)
                .unwrap_or(question.time_limit),
        };
        let time_spent = question.time_limit.saturating_sub(remaining);

        let outcome = self
            .score_and_advance(current, &question, answer_text, time_spent)
            .await;
        if outcome.is_err() && trigger == Trigger::Explicit {
            // The in-flight guard drops an expiry that lands during this submission.
            self.arm_timer(id, question_index, &question, Some(remaining));
        }
        outcome
    }

    /// Scores the answer to `question`, then either starts the next question or
    /// closes the interview. Nothing is kept if any step fails.
    async fn score_and_advance(
        &self,
        current: &mut Candidate,
        question: &Question,
        answer_text: &str,
        time_spent: u32,
    ) -> Result<SubmitOutcome, SessionError> {
        let id = current.id;
        let question_index = current.current_question;
        let evaluation = self
            .intelligence
            .score_answer(question, answer_text, time_spent, &current.answers)
            .await?;

        let mut updated = current.clone();
        updated.answers.push(Answer {
            question_id: question.id.clone(),
            answer: answer_text.to_string(),
            time_spent,
            score: clamp_score(evaluation.score, MAX_ANSWER_SCORE),
            feedback: evaluation.feedback,
        });

        let next = question_index + 1;
        if next < updated.questions.len() {
            let limit = updated.questions[next].time_limit;
            updated.current_question = next;
            updated.time_remaining = Some(limit);
            self.commit(current, updated).await?;
            self.start_timer(id, next, Countdown::new(limit));
            info!("Candidate {id} answered question {next}; question {} started", next + 1);
            return Ok(SubmitOutcome::Advanced(current.clone()));
        }

        let fields = CandidateFields::from_candidate(&updated);
        let summary = self
            .intelligence
            .summarize_interview(&fields, &updated.questions, &updated.answers)
            .await?;
        let estimate = estimate_overall_score(&updated.answers);
        let score = summary
            .overall_score
            .map(|s| clamp_score(s, MAX_OVERALL_SCORE))
            .unwrap_or(estimate);

        let ended = Utc::now();
        let session = InterviewSession {
            id: Uuid::new_v4(),
            questions: updated.questions.clone(),
            answers: updated.answers.clone(),
            score,
            summary: summary.summary.clone(),
            start_time: updated.start_time.unwrap_or(ended),
            end_time: Some(ended),
            status: SessionOutcome::Completed,
            profile: updated.profile,
        };
        archive_session(&mut updated, session);
        updated.status = CandidateStatus::Completed;
        updated.score = score;
        updated.summary = summary.summary;
        updated.end_time = Some(ended);
        updated.time_remaining = Some(0);
        self.commit(current, updated).await?;
        self.stop_timer(id);

        info!("Candidate {id} completed the interview: {score}/100 (local estimate {estimate})");
        Ok(SubmitOutcome::Completed(current.clone()))
    }

    // ── Restart / resume / delete ─────────────────────────────────────────────

    /// Archives a run that made progress as `incomplete`, then returns the record
    /// to `uploading`. History and stats are kept.
    pub async fn start_new(&self, actor: &Actor, id: Uuid) -> Result<Candidate, SessionError> {
        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        ensure_owner(actor, current)?;

        let mut updated = current.clone();
        if current.is_in_progress() {
            let ended = Utc::now();
            archive_session(
                &mut updated,
                InterviewSession {
                    id: Uuid::new_v4(),
                    questions: current.questions.clone(),
                    answers: current.answers.clone(),
                    score: estimate_overall_score(&current.answers),
                    summary: String::new(),
                    start_time: current.start_time.unwrap_or(ended),
                    end_time: Some(ended),
                    status: SessionOutcome::Incomplete,
                    profile: current.profile,
                },
            );
            info!(
                "Archived unfinished run of candidate {id} at question {}",
                current.current_question + 1
            );
        }
        reset_run(&mut updated);

        self.commit(current, updated).await?;
        self.stop_timer(id);
        self.store
            .set_current_candidate(current.user_id, Some(id))
            .await?;
        Ok(current.clone())
    }

    /// The caller's most recent interview that was started but not finished.
    pub async fn resumable(&self, actor: &Actor) -> Result<Option<Candidate>, SessionError> {
        let candidates = self.store.list_for_user(actor.user_id).await?;
        Ok(candidates.into_iter().find(Candidate::is_in_progress))
    }

    /// Picks an in-progress interview back up after a reload, re-arming its timer
    /// from the frozen remaining time.
    pub async fn resume_session(&self, actor: &Actor, id: Uuid) -> Result<Candidate, SessionError> {
        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        ensure_owner(actor, current)?;
        if !current.is_in_progress() {
            return Err(invalid("resume", current));
        }

        let updated = current.clone();
        self.commit(current, updated).await?;
        self.store
            .set_current_candidate(actor.user_id, Some(id))
            .await?;

        if current.status == CandidateStatus::Interviewing {
            let index = current.current_question;
            if let Some(question) = current.current_question() {
                self.arm_timer(id, index, question, current.time_remaining);
            }
        }
        info!("Candidate {id} resumed after reload");
        Ok(self.with_live_remaining(current.clone()))
    }

    /// Removes the record and leaves an empty slot behind, so anything queued on
    /// this candidate finds it gone.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), SessionError> {
        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        if !actor.can_access(current.user_id) {
            return Err(SessionError::Forbidden);
        }
        if !self.store.delete(id).await? {
            warn!("Candidate {id} was already absent from the store");
        }
        *slot = None;
        self.stop_timer(id);
        info!("Deleted candidate {id}");
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Candidate, SessionError> {
        let mut slot = self.lock(id).await?;
        let current = occupied(&mut slot, id)?;
        if !actor.can_access(current.user_id) {
            return Err(SessionError::Forbidden);
        }
        Ok(self.with_live_remaining(current.clone()))
    }

    pub async fn current(&self, actor: &Actor) -> Result<Option<Candidate>, SessionError> {
        let Some(id) = self.store.current_candidate(actor.user_id).await? else {
            return Ok(None);
        };
        match self.get(actor, id).await {
            Ok(candidate) => Ok(Some(candidate)),
            Err(SessionError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Interviewers see every candidate; interviewees only their own.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Candidate>, SessionError> {
        let candidates = match actor.role {
            Role::Interviewer => self.store.list_all().await?,
            Role::Interviewee => self.store.list_for_user(actor.user_id).await?,
        };
        Ok(candidates)
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    async fn slot(&self, id: Uuid) -> Result<Slot, SessionError> {
        let cached = self.live_lock().get(&id).cloned();
        if let Some(slot) = cached {
            return Ok(slot);
        }
        self.evict_idle();
        let candidate = self
            .store
            .get(id)
            .await?
            .ok_or(SessionError::NotFound(id))?;
        let slot = Arc::clone(
            self.live_lock()
                .entry(id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(Some(candidate)))),
        );
        Ok(slot)
    }

    /// Waits for exclusive access to the candidate's slot. Pair with `occupied`.
    async fn lock(&self, id: Uuid) -> Result<OwnedMutexGuard<Option<Candidate>>, SessionError> {
        Ok(self.slot(id).await?.lock_owned().await)
    }

    /// Drops slots that no operation holds and whose candidate has no countdown.
    /// New handles are only cloned under the map lock, so a count of one means
    /// nobody can be using or waiting on the slot.
    fn evict_idle(&self) {
        let timed: HashSet<Uuid> = self.timers_lock().keys().copied().collect();
        let mut live = self.live_lock();
        let before = live.len();
        live.retain(|id, slot| Arc::strong_count(slot) > 1 || timed.contains(id));
        let evicted = before - live.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle candidate slots; {} remain", live.len());
        }
    }

    /// Persists `updated` and, only if that succeeds, makes it the live record.
    async fn commit(&self, live: &mut Candidate, mut updated: Candidate) -> Result<(), SessionError> {
        updated.touch();
        self.store.upsert(&updated).await?;
        *live = updated;
        Ok(())
    }

    fn start_timer(&self, id: Uuid, question_index: usize, countdown: Countdown) {
        let timer = QuestionTimer::start(id, question_index, countdown, self.expired_tx.clone());
        // Replacing drops, and so aborts, the previous question's timer.
        self.timers_lock().insert(id, timer);
    }

    fn stop_timer(&self, id: Uuid) {
        if let Some(timer) = self.timers_lock().remove(&id) {
            let spent = timer.stop();
            debug!(
                "Stopped question {} timer for candidate {id} after {spent}s",
                timer.question_index() + 1
            );
        }
    }

    /// Keeps question `index` counting down. An existing timer for it is resumed;
    /// otherwise, or when it already ran out, a fresh one starts from what is
    /// left. A countdown at zero fires on its first tick, so an expiry that was
    /// swallowed while paused or mid-submission is delivered again.
    fn arm_timer(&self, id: Uuid, index: usize, question: &Question, stored: Option<u32>) {
        let existing = self
            .with_timer(id, |t| {
                (t.question_index() == index).then(|| (t.resume(), t.remaining()))
            })
            .flatten();
        let remaining = match existing {
            Some((true, _)) => return,
            Some((false, left)) => left,
            None => stored.unwrap_or(question.time_limit),
        };
        if remaining == 0 {
            debug!("Question {} of candidate {id} is out of time; re-arming expiry", index + 1);
        }
        self.start_timer(id, index, Countdown::with_remaining(question.time_limit, remaining));
    }

    fn with_timer<R>(&self, id: Uuid, f: impl FnOnce(&QuestionTimer) -> R) -> Option<R> {
        self.timers_lock().get(&id).map(f)
    }

    fn with_live_remaining(&self, mut candidate: Candidate) -> Candidate {
        if candidate.status == CandidateStatus::Interviewing {
            let index = candidate.current_question;
            if let Some(remaining) = self
                .with_timer(candidate.id, |t| (t.question_index() == index).then(|| t.remaining()))
                .flatten()
            {
                candidate.time_remaining = Some(remaining);
            }
        }
        candidate
    }

    fn live_lock(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn timers_lock(&self) -> MutexGuard<'_, HashMap<Uuid, QuestionTimer>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The record behind a locked slot, or `NotFound` if it was deleted while the
/// caller waited.
fn occupied(slot: &mut Option<Candidate>, id: Uuid) -> Result<&mut Candidate, SessionError> {
    slot.as_mut().ok_or(SessionError::NotFound(id))
}

fn ensure_owner(actor: &Actor, candidate: &Candidate) -> Result<(), SessionError> {
    if actor.user_id == candidate.user_id {
        Ok(())
    } else {
        Err(SessionError::Forbidden)
    }
}

fn invalid(action: &'static str, candidate: &Candidate) -> SessionError {
    SessionError::InvalidTransition {
        action,
        status: candidate.status.as_str(),
    }
}

fn apply_intake(candidate: &mut Candidate, resume_text: &str, fields: CandidateFields) {
    candidate.resume_text = resume_text.to_string();
    candidate.name = fields.name.trim().to_string();
    candidate.email = fields.email.trim().to_string();
    candidate.phone = fields.phone.trim().to_string();
    candidate.skills = clean_list(fields.skills);
    candidate.experience = clean_list(fields.experience);
    candidate.education = clean_list(fields.education);
    candidate.missing_info = clean_list(fields.missing_info);
    candidate.status = if candidate.has_contact_info() && candidate.missing_info.is_empty() {
        CandidateStatus::Interviewing
    } else {
        CandidateStatus::InfoCollection
    };
}

fn reset_run(candidate: &mut Candidate) {
    candidate.status = CandidateStatus::Uploading;
    candidate.session_id = Uuid::new_v4();
    candidate.profile = None;
    candidate.current_question = 0;
    candidate.questions.clear();
    candidate.answers.clear();
    candidate.score = 0;
    candidate.summary.clear();
    candidate.start_time = None;
    candidate.end_time = None;
    candidate.time_remaining = None;
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Enforces exactly six questions with positive limits and unique ids, filling
/// blank ids as `q1`..`q6`.
fn normalize_questions(mut questions: Vec<Question>) -> Result<Vec<Question>, IntelligenceError> {
    if questions.len() != QUESTIONS_PER_INTERVIEW {
        return Err(IntelligenceError::Malformed(format!(
            "expected {QUESTIONS_PER_INTERVIEW} questions, got {}",
            questions.len()
        )));
    }
    if let Some(q) = questions.iter().find(|q| q.time_limit == 0) {
        return Err(IntelligenceError::Malformed(format!(
            "question '{}' has no time limit",
            q.question
        )));
    }

    for (i, q) in questions.iter_mut().enumerate() {
        if q.id.trim().is_empty() {
            q.id = format!("q{}", i + 1);
        }
    }
    let mut ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != questions.len() {
        for (i, q) in questions.iter_mut().enumerate() {
            q.id = format!("q{}", i + 1);
        }
    }
    Ok(questions)
}
