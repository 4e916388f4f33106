use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    entity::{Question, Quiz, QuizAnswer, QuizResult},
    grading::QuestionDraft,
};

pub const DEFAULT_MAX_ATTEMPTS: i32 = 1;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizCreateBody {
    pub title: String,
    pub description: Option<String>,
    pub timer_minutes: Option<i32>,
    pub max_attempts: Option<i32>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizUpdateBody {
    pub title: String,
    pub description: String,
    pub timer_minutes: Option<i32>,
    pub max_attempts: i32,
    pub is_published: bool,
}

/// Shared shape checks for quiz bodies.
pub fn validate_quiz_fields(
    title: &str,
    timer_minutes: Option<i32>,
    max_attempts: i32,
) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err(String::from("title must not be empty"));
    }
    if timer_minutes.is_some_and(|m| m < 1) {
        return Err(String::from("timer must be at least one minute"));
    }
    if max_attempts < 1 {
        return Err(String::from("max_attempts must be at least 1"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuestionBody {
    pub text: String,
    /// `multiple_choice`, `true_false` or `short_answer`
    pub question_type: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: Option<i32>,
}

impl From<QuestionBody> for QuestionDraft {
    fn from(body: QuestionBody) -> Self {
        QuestionDraft {
            text: body.text,
            question_type: body.question_type,
            options: body.options,
            correct_answer: body.correct_answer,
            points: body.points,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub text: String,
    pub question_type: String,
    pub options: Vec<String>,
    pub points: i32,
    pub position: i32,
    /// Only shown to the course owner and admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl QuestionResponse {
    pub fn new(question: &Question, reveal_answer: bool) -> Self {
        Self {
            id: question.id(),
            text: question.text().to_string(),
            question_type: question.question_type().to_string(),
            options: question.options().to_vec(),
            points: question.points(),
            position: question.position(),
            correct_answer: reveal_answer.then(|| question.correct_answer().to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizResponse {
    pub quiz: Quiz,
    pub questions: Vec<QuestionResponse>,
    pub attempts_used: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub answer: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitBody {
    pub answers: Vec<SubmittedAnswer>,
}

impl SubmitBody {
    /// Answers keyed by question; a repeated question keeps its last answer.
    pub fn into_map(self) -> HashMap<Uuid, String> {
        self.answers
            .into_iter()
            .map(|a| (a.question_id, a.answer))
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizResultResponse {
    pub result: QuizResult,
    pub answers: Vec<QuizAnswer>,
}

impl QuizResultResponse {
    /// Pairs each result with its answers.
    pub fn group(results: Vec<QuizResult>, answers: Vec<QuizAnswer>) -> Vec<Self> {
        let mut by_result: HashMap<Uuid, Vec<QuizAnswer>> = HashMap::new();
        for answer in answers {
            by_result.entry(answer.result_id()).or_default().push(answer);
        }

        results
            .into_iter()
            .map(|result| Self {
                answers: by_result.remove(&result.id()).unwrap_or_default(),
                result,
            })
            .collect()
    }
}
