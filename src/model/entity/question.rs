use crate::model::access::HasOwner;
use crate::model::entity::Quiz;
use crate::model::grading::{GradableQuestion, QuestionType, ValidQuestion};
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    quiz_id: Uuid,
    text: String,
    question_type: String,
    options: Vec<String>,
    correct_answer: String,
    points: i32,
    position: i32,
}

#[derive(Debug)]
pub struct QuestionCreate {
    pub quiz_id: Uuid,
    pub question: ValidQuestion,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn question_type(&self) -> &str {
        &self.question_type
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Rows are only written through [`crate::model::grading::validate_question`],
    /// so an unknown type means the table was edited by hand.
    pub fn gradable(&self) -> DatabaseResult<GradableQuestion> {
        let question_type = self
            .question_type
            .parse::<QuestionType>()
            .map_err(DatabaseError::Invalid)?;

        Ok(GradableQuestion {
            id: self.id,
            question_type,
            correct_answer: self.correct_answer.clone(),
            points: self.points,
        })
    }
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let q = data.question;
        let result = sqlx::query_as(
            r#"
            INSERT INTO questions (id, quiz_id, text, question_type, options, correct_answer, points, position)
            VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM questions WHERE quiz_id = $2)
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.quiz_id)
        .bind(&q.text)
        .bind(q.question_type.as_str())
        .bind(&q.options)
        .bind(&q.correct_answer)
        .bind(q.points)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let q = data.question;
        let result = sqlx::query_as(
            r#"
            UPDATE questions
            SET text = $1, question_type = $2, options = $3, correct_answer = $4, points = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&q.text)
        .bind(q.question_type.as_str())
        .bind(&q.options)
        .bind(&q.correct_answer)
        .bind(q.points)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM questions ORDER BY quiz_id, position LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Question {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let quiz = Quiz::find_by_id(mm, actor, self.quiz_id)
            .await?
            .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))?;
        quiz.get_owner_id(mm, actor).await
    }
}

impl Question {
    pub async fn all_by_quiz(mm: &ModelManager, quiz_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as("SELECT * FROM questions WHERE quiz_id = $1 ORDER BY position")
            .bind(quiz_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }

    pub async fn count_by_quiz(mm: &ModelManager, quiz_id: Uuid) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
            .bind(quiz_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}
