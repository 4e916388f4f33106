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
pub struct Attachment {
    id: Uuid,
    course_id: Uuid,
    name: String,
    url: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AttachmentCreate {
    pub course_id: Uuid,
    pub name: String,
    pub url: String,
}

impl ResourceTyped for Attachment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Attachment
    }
}

impl Attachment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CrudRepository<Attachment, AttachmentCreate, Uuid> for Attachment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AttachmentCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO attachments (id, course_id, name, url) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.name)
        .bind(&data.url)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AttachmentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE attachments SET name = $1, url = $2 WHERE id = $3")
            .bind(&data.name)
            .bind(&data.url)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.name = data.name;
        self.url = data.url;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM attachments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM attachments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM attachments ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Attachment {
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

impl Attachment {
    pub async fn all_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM attachments WHERE course_id = $1 ORDER BY created_at",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
