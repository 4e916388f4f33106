//! Quiz question validation and grading.
//!
//! Everything here is pure: handlers load questions, call [`grade`] and
//! persist the returned [`Grade`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(Self::MultipleChoice),
            "true_false" => Ok(Self::TrueFalse),
            "short_answer" => Ok(Self::ShortAnswer),
            other => Err(format!("unknown question type `{other}`")),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question as submitted by an author, before validation.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub text: String,
    pub question_type: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: Option<i32>,
}

/// Question that passed [`validate_question`], normalized for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidQuestion {
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub points: i32,
}

pub const MAX_POINTS: i32 = 1000;

pub fn validate_question(draft: QuestionDraft) -> Result<ValidQuestion, String> {
    let text = draft.text.trim().to_string();
    if text.is_empty() {
        return Err(String::from("question text must not be empty"));
    }

    let question_type = draft.question_type.parse::<QuestionType>()?;
    let points = draft.points.unwrap_or(1);
    if !(1..=MAX_POINTS).contains(&points) {
        return Err(format!("points must be between 1 and {MAX_POINTS}"));
    }

    let correct = draft.correct_answer.trim().to_string();

    let (options, correct_answer) = match question_type {
        QuestionType::MultipleChoice => {
            let mut options: Vec<String> = Vec::with_capacity(draft.options.len());
            for option in draft.options.into_iter().map(|o| o.trim().to_string()) {
                if option.is_empty() {
                    return Err(String::from("options must not be empty"));
                }
                if options.contains(&option) {
                    return Err(format!("duplicate option `{option}`"));
                }
                options.push(option);
            }

            if options.len() < 2 {
                return Err(String::from(
                    "multiple choice questions need at least 2 options",
                ));
            }
            if !options.contains(&correct) {
                return Err(String::from("correct answer must be one of the options"));
            }
            (options, correct)
        }
        QuestionType::TrueFalse => {
            let correct = correct.to_ascii_lowercase();
            if correct != "true" && correct != "false" {
                return Err(String::from(
                    "true/false questions take `true` or `false` as the answer",
                ));
            }
            (vec![String::from("true"), String::from("false")], correct)
        }
        QuestionType::ShortAnswer => {
            if correct.is_empty() {
                return Err(String::from("correct answer must not be empty"));
            }
            (Vec::new(), correct)
        }
    };

    Ok(ValidQuestion {
        text,
        question_type,
        options,
        correct_answer,
        points,
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn answer_matches(question_type: QuestionType, correct: &str, given: &str) -> bool {
    match question_type {
        QuestionType::MultipleChoice => correct.trim() == given.trim(),
        QuestionType::TrueFalse => correct.trim().eq_ignore_ascii_case(given.trim()),
        QuestionType::ShortAnswer => {
            collapse_whitespace(&correct.to_lowercase())
                == collapse_whitespace(&given.to_lowercase())
        }
    }
}

/// The parts of a stored question grading needs.
#[derive(Debug, Clone)]
pub struct GradableQuestion {
    pub id: Uuid,
    pub question_type: QuestionType,
    pub correct_answer: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub student_answer: String,
    pub is_correct: bool,
    pub points_obtained: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub score: i32,
    pub total_points: i32,
    pub percentage: f64,
    pub answers: Vec<GradedAnswer>,
}

pub fn percentage(score: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = score as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Grades `answers` (question id -> raw answer) against `questions`.
///
/// Unanswered questions are recorded with an empty answer and zero points;
/// answers to questions outside the quiz are ignored.
pub fn grade(questions: &[GradableQuestion], answers: &HashMap<Uuid, String>) -> Grade {
    let mut score: i64 = 0;
    let mut total_points: i64 = 0;
    let mut graded = Vec::with_capacity(questions.len());

    for question in questions {
        total_points += i64::from(question.points);

        let given = answers.get(&question.id).cloned().unwrap_or_default();
        let is_correct = !given.trim().is_empty()
            && answer_matches(question.question_type, &question.correct_answer, &given);
        let points_obtained = if is_correct { question.points } else { 0 };
        score += i64::from(points_obtained);

        graded.push(GradedAnswer {
            question_id: question.id,
            student_answer: given,
            is_correct,
            points_obtained,
        });
    }

    Grade {
        score: saturate(score),
        total_points: saturate(total_points),
        percentage: percentage(score, total_points),
        answers: graded,
    }
}
