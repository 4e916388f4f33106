use crate::model::access::HasOwner;
use crate::model::entity::Course;
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Quiz {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    position: i32,
    is_published: bool,
    timer_minutes: Option<i32>,
    max_attempts: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct QuizCreate {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub timer_minutes: Option<i32>,
    pub max_attempts: i32,
    pub is_published: bool,
}

impl ResourceTyped for Quiz {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Quiz
    }
}

impl Quiz {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn timer_minutes(&self) -> Option<i32> {
        self.timer_minutes
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }
}

#[async_trait]
impl CrudRepository<Quiz, QuizCreate, Uuid> for Quiz {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO quizzes (id, course_id, title, description, position, is_published, timer_minutes, max_attempts)
            VALUES (
                $1, $2, $3, $4,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM quizzes WHERE course_id = $2),
                $5, $6, $7
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.is_published)
        .bind(data.timer_minutes)
        .bind(data.max_attempts)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            UPDATE quizzes
            SET title = $1, description = $2, is_published = $3, timer_minutes = $4, max_attempts = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.is_published)
        .bind(data.timer_minutes)
        .bind(data.max_attempts)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quizzes WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE id = $1")
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
            "SELECT * FROM quizzes ORDER BY course_id, position LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Quiz {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Course::find_by_id(mm, actor, self.course_id)
            .await?
            .map(|c| c.owner_id())
            .ok_or(DatabaseError::SqlxError(sqlx::Error::RowNotFound))
    }
}

impl Quiz {
    pub async fn all_by_course(
        mm: &ModelManager,
        course_id: Uuid,
        published_only: bool,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM quizzes
            WHERE course_id = $1 AND (is_published OR NOT $2)
            ORDER BY position, created_at
            "#,
        )
        .bind(course_id)
        .bind(published_only)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
