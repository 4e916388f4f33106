use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, Page, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    image_url: Option<String>,
    price: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CourseCreate {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub is_published: bool,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    /// Owner and admins see and edit everything in the course.
    pub fn is_managed_by(&self, actor: &AuthenticatedUser) -> bool {
        actor.is_admin() || self.owner_id == actor.user_id()
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO courses (id, owner_id, title, description, image_url, price, is_published) VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.price)
        .bind(data.is_published)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    /// Ownership never changes through an update; `data.owner_id` is ignored.
    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            UPDATE courses
            SET title = $1, description = $2, image_url = $3, price = $4, is_published = $5, updated_at = now()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.price)
        .bind(data.is_published)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.owner_id)
    }
}

impl Course {
    /// Published catalog, newest first, optionally filtered by a case-insensitive title fragment.
    pub async fn page_published(
        mm: &ModelManager,
        title: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Page<Self>> {
        let pattern = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("%{}%", t.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")));

        let items = sqlx::query_as(
            r#"
            SELECT * FROM courses
            WHERE is_published AND ($1::TEXT IS NULL OR title ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM courses WHERE is_published AND ($1::TEXT IS NULL OR title ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(mm.executor())
        .await?;

        Ok(Page::new(items, total, limit, offset))
    }

    /// Courses the actor authors; admins get every course.
    pub async fn all_managed(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM courses WHERE $1 OR owner_id = $2 ORDER BY created_at DESC",
        )
        .bind(actor.is_admin())
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }

    pub async fn find_by_title(mm: &ModelManager, title: &str) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as("SELECT * FROM courses WHERE title = $1 ORDER BY created_at LIMIT 1")
            .bind(title)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }

    /// Unpublishes the course once it has no published chapter left.
    /// Returns whether the course was unpublished by this call.
    pub async fn unpublish_if_empty(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE courses SET is_published = FALSE, updated_at = now()
            WHERE id = $1
              AND is_published
              AND NOT EXISTS (
                SELECT 1 FROM chapters WHERE course_id = $1 AND is_published
              )
            "#,
        )
        .bind(course_id)
        .execute(mm.executor())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
