use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::entity::Course;
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Chapter {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: String,
    video_url: Option<String>,
    position: i32,
    is_published: bool,
    is_free: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ChapterCreate {
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub is_published: bool,
    pub is_free: bool,
}

impl ResourceTyped for Chapter {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Chapter
    }
}

impl Chapter {
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

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn is_free(&self) -> bool {
        self.is_free
    }
}

#[async_trait]
impl CrudRepository<Chapter, ChapterCreate, Uuid> for Chapter {
    /// Appends the chapter after the current last one.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ChapterCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO chapters (id, course_id, title, description, video_url, position, is_published, is_free)
            VALUES (
                $1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM chapters WHERE course_id = $2),
                $6, $7
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.video_url)
        .bind(data.is_published)
        .bind(data.is_free)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ChapterCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            UPDATE chapters
            SET title = $1, description = $2, video_url = $3, is_published = $4, is_free = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.video_url)
        .bind(data.is_published)
        .bind(data.is_free)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM chapters WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM chapters WHERE id = $1")
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
            "SELECT * FROM chapters ORDER BY course_id, position LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapters")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Chapter, ChapterCreate, Uuid);

#[async_trait]
impl HasOwner for Chapter {
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

impl Chapter {
    pub async fn all_by_course(
        mm: &ModelManager,
        course_id: Uuid,
        published_only: bool,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM chapters
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

    pub async fn count_published(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chapters WHERE course_id = $1 AND is_published",
        )
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Next published chapter of the same course, by position.
    pub async fn next_published(&self, mm: &ModelManager) -> DatabaseResult<Option<Uuid>> {
        let id = sqlx::query_scalar(
            r#"
            SELECT id FROM chapters
            WHERE course_id = $1 AND is_published AND position > $2
            ORDER BY position ASC
            LIMIT 1
            "#,
        )
        .bind(self.course_id)
        .bind(self.position)
        .fetch_optional(mm.executor())
        .await?;
        Ok(id)
    }

    /// Applies `(chapter_id, position)` pairs in one transaction.
    ///
    /// Any id outside `course_id` aborts the whole reorder with [`DatabaseError::Invalid`].
    #[tracing::instrument(skip(mm, positions))]
    pub async fn reorder(
        mm: &ModelManager,
        course_id: Uuid,
        positions: &[(Uuid, i32)],
    ) -> DatabaseResult<()> {
        let mut tx = mm.begin().await?;

        for (chapter_id, position) in positions {
            let result =
                sqlx::query("UPDATE chapters SET position = $1 WHERE id = $2 AND course_id = $3")
                    .bind(position)
                    .bind(chapter_id)
                    .bind(course_id)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(DatabaseError::Invalid(format!(
                    "chapter {chapter_id} does not belong to this course"
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
