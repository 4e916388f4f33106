use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{
        DatabaseError, DatabaseResult, ModelManager, ResourceType, ResourceTyped,
        entity::Quiz, grading::Grade, is_unique_violation,
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizResult {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    score: i32,
    total_points: i32,
    percentage: f64,
    attempt_number: i32,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAnswer {
    id: Uuid,
    result_id: Uuid,
    question_id: Uuid,
    student_answer: String,
    is_correct: bool,
    points_obtained: i32,
}

/// A result joined with who took which quiz, for the course grade book.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct GradeRow {
    pub result_id: Uuid,
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub score: i32,
    pub total_points: i32,
    pub percentage: f64,
    pub attempt_number: i32,
    pub submitted_at: DateTime<Utc>,
}

impl ResourceTyped for QuizResult {
    fn get_resource_type() -> ResourceType {
        ResourceType::QuizResult
    }
}

impl QuizResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn total_points(&self) -> i32 {
        self.total_points
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    pub async fn count_attempts(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_results WHERE user_id = $1 AND quiz_id = $2",
        )
        .bind(actor.user_id())
        .bind(quiz_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Stores a graded attempt with its answers.
    ///
    /// The attempt number is derived inside the transaction; a concurrent
    /// submission for the same attempt trips the unique constraint and is
    /// reported as [`DatabaseError::Conflict`].
    #[tracing::instrument(skip(mm, actor, quiz, grade), fields(user = %actor.user_id(), quiz = %quiz.id()))]
    pub async fn submit(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        quiz: &Quiz,
        grade: &Grade,
    ) -> DatabaseResult<(Self, Vec<QuizAnswer>)> {
        let mut tx = mm.begin().await?;

        let used: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_results WHERE user_id = $1 AND quiz_id = $2",
        )
        .bind(actor.user_id())
        .bind(quiz.id())
        .fetch_one(&mut *tx)
        .await?;

        if used >= quiz.max_attempts() as i64 {
            return Err(DatabaseError::MaxAttemptsReached);
        }

        let inserted = sqlx::query_as(
            r#"
            INSERT INTO quiz_results (id, user_id, quiz_id, score, total_points, percentage, attempt_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(quiz.id())
        .bind(grade.score)
        .bind(grade.total_points)
        .bind(grade.percentage)
        .bind(used as i32 + 1)
        .fetch_one(&mut *tx)
        .await;

        let result: Self = match inserted {
            Err(e) if is_unique_violation(&e) => return Err(DatabaseError::Conflict),
            other => other?,
        };

        let mut answers = Vec::with_capacity(grade.answers.len());
        for answer in &grade.answers {
            let row: QuizAnswer = sqlx::query_as(
                r#"
                INSERT INTO quiz_answers (id, result_id, question_id, student_answer, is_correct, points_obtained)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(result.id)
            .bind(answer.question_id)
            .bind(&answer.student_answer)
            .bind(answer.is_correct)
            .bind(answer.points_obtained)
            .fetch_one(&mut *tx)
            .await?;
            answers.push(row);
        }

        tx.commit().await?;
        tracing::info!(
            score = result.score,
            total = result.total_points,
            attempt = result.attempt_number,
            "quiz submitted"
        );
        Ok((result, answers))
    }

    pub async fn all_by_user_quiz(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM quiz_results WHERE user_id = $1 AND quiz_id = $2 ORDER BY attempt_number",
        )
        .bind(actor.user_id())
        .bind(quiz_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    pub async fn grades_by_course(
        mm: &ModelManager,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<GradeRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                r.id AS result_id,
                q.id AS quiz_id,
                q.title AS quiz_title,
                u.id AS user_id,
                u.full_name,
                u.phone_number,
                r.score,
                r.total_points,
                r.percentage,
                r.attempt_number,
                r.submitted_at
            FROM quiz_results r
            JOIN quizzes q ON q.id = r.quiz_id
            JOIN users u ON u.id = r.user_id
            WHERE q.course_id = $1
            ORDER BY q.position, u.full_name, r.attempt_number
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

impl QuizAnswer {
    pub fn result_id(&self) -> Uuid {
        self.result_id
    }

    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub async fn all_by_results(
        mm: &ModelManager,
        result_ids: &[Uuid],
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM quiz_answers WHERE result_id = ANY($1)")
            .bind(result_ids)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }
}
