//! LLM-backed `IntelligenceProvider`.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::intelligence::fallback::parse_resume_heuristically;
use crate::intelligence::prompts::{
    EXTRACT_PROMPT_TEMPLATE, QUESTIONS_PROMPT_TEMPLATE, SCORE_PROMPT_TEMPLATE,
    SUMMARY_PROMPT_TEMPLATE,
};
use crate::intelligence::{
    AnswerEvaluation, CandidateFields, IntelligenceError, IntelligenceProvider, InterviewSummary,
};
use crate::llm_client::prompts::{INTERVIEWER_SYSTEM, JSON_ONLY_SYSTEM, SCORING_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::candidate::{Answer, Difficulty, InterviewProfile, Question};
use crate::session::stats::estimate_overall_score;

/// Characters of each earlier answer quoted back to the scorer for context.
const PREVIOUS_ANSWER_EXCERPT: usize = 100;

pub struct LlmIntelligence {
    llm: LlmClient,
}

impl LlmIntelligence {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl IntelligenceProvider for LlmIntelligence {
    async fn extract_candidate_fields(
        &self,
        resume_text: &str,
    ) -> Result<CandidateFields, IntelligenceError> {
        let prompt = EXTRACT_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
        match self
            .llm
            .call_json::<CandidateFields>(&prompt, JSON_ONLY_SYSTEM)
            .await
        {
            Ok(fields) => Ok(fields),
            Err(e) => {
                warn!("Resume extraction via model failed, using heuristic parser: {e}");
                Ok(parse_resume_heuristically(resume_text))
            }
        }
    }

    async fn generate_questions(
        &self,
        fields: &CandidateFields,
        profile: InterviewProfile,
    ) -> Result<Vec<Question>, IntelligenceError> {
        let prompt = build_questions_prompt(fields, profile);
        let questions: Vec<Question> = self.llm.call_json(&prompt, INTERVIEWER_SYSTEM).await?;
        info!(
            "Model returned {} questions for profile {}",
            questions.len(),
            profile.as_str()
        );
        Ok(questions)
    }

    async fn score_answer(
        &self,
        question: &Question,
        answer: &str,
        seconds_spent: u32,
        previous_answers: &[Answer],
    ) -> Result<AnswerEvaluation, IntelligenceError> {
        let prompt = build_score_prompt(question, answer, seconds_spent, previous_answers);
        Ok(self.llm.call_json(&prompt, INTERVIEWER_SYSTEM).await?)
    }

    async fn summarize_interview(
        &self,
        fields: &CandidateFields,
        questions: &[Question],
        answers: &[Answer],
    ) -> Result<InterviewSummary, IntelligenceError> {
        if answers.is_empty() {
            return Err(IntelligenceError::Malformed(
                "cannot summarize an interview with no answers".to_string(),
            ));
        }
        let prompt = build_summary_prompt(fields, questions, answers);
        Ok(self.llm.call_json(&prompt, INTERVIEWER_SYSTEM).await?)
    }
}

fn difficulty_label(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "easy",
        Difficulty::Medium => "medium",
        Difficulty::Hard => "hard",
    }
}

fn build_questions_prompt(fields: &CandidateFields, profile: InterviewProfile) -> String {
    QUESTIONS_PROMPT_TEMPLATE
        .replace("{profile}", profile.as_str())
        .replace("{focus}", profile.focus())
        .replace("{name}", &fields.name)
        .replace("{skills}", &fields.skills.join(", "))
        .replace("{experience}", &fields.experience.join("; "))
        .replace("{education}", &fields.education.join("; "))
}

fn build_score_prompt(
    question: &Question,
    answer: &str,
    seconds_spent: u32,
    previous_answers: &[Answer],
) -> String {
    let previous_context = if previous_answers.is_empty() {
        String::new()
    } else {
        let excerpts = previous_answers
            .iter()
            .map(|a| {
                let excerpt: String = a.answer.chars().take(PREVIOUS_ANSWER_EXCERPT).collect();
                format!("Q: {} - A: {excerpt}...", a.question_id)
            })
            .collect::<Vec<_>>()
            .join("; ");
        format!("Previous answers for context: {excerpts}")
    };

    SCORE_PROMPT_TEMPLATE
        .replace("{question}", &question.question)
        .replace("{difficulty}", difficulty_label(question.difficulty))
        .replace("{keywords}", &question.expected_keywords.join(", "))
        .replace("{time_limit}", &question.time_limit.to_string())
        .replace("{time_spent}", &seconds_spent.to_string())
        .replace("{previous_context}", &previous_context)
        .replace("{scoring_instruction}", SCORING_INSTRUCTION)
        .replace("{answer}", answer)
}

fn build_summary_prompt(
    fields: &CandidateFields,
    questions: &[Question],
    answers: &[Answer],
) -> String {
    let average =
        answers.iter().map(|a| f64::from(a.score)).sum::<f64>() / answers.len().max(1) as f64;
    let overall = estimate_overall_score(answers);

    let transcript = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = answers.iter().find(|a| a.question_id == q.id);
            format!(
                "Q{} ({}): {}\nAnswer: {}\nScore: {}/10\nTime: {}s",
                i + 1,
                difficulty_label(q.difficulty),
                q.question,
                answer.map(|a| a.answer.as_str()).unwrap_or("No answer"),
                answer.map(|a| a.score).unwrap_or(0),
                answer.map(|a| a.time_spent).unwrap_or(0),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    SUMMARY_PROMPT_TEMPLATE
        .replace("{name}", &fields.name)
        .replace("{skills}", &fields.skills.join(", "))
        .replace("{experience}", &fields.experience.join("; "))
        .replace("{average}", &format!("{average:.1}"))
        .replace("{overall}", &overall.to_string())
        .replace("{transcript}", &transcript)
}
