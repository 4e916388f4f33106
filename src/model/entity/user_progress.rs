use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult};
use crate::web::AuthenticatedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserProgress {
    id: Uuid,
    user_id: Uuid,
    chapter_id: Uuid,
    is_completed: bool,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for UserProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::UserProgress
    }
}

impl UserProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn chapter_id(&self) -> Uuid {
        self.chapter_id
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }
}

/// Per-course completion counts for one user; only published chapters count.
#[derive(Debug, Clone, FromRow)]
pub struct CourseProgressRow {
    pub course_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub total_chapters: i64,
    pub completed_chapters: i64,
}

impl UserProgress {
    /// One row per `(user, chapter)`; repeated calls overwrite the flag.
    pub async fn upsert(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        chapter_id: Uuid,
        is_completed: bool,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO user_progress (id, user_id, chapter_id, is_completed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, chapter_id)
            DO UPDATE SET is_completed = EXCLUDED.is_completed, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(chapter_id)
        .bind(is_completed)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn is_chapter_completed(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        chapter_id: Uuid,
    ) -> DatabaseResult<bool> {
        let done: Option<bool> = sqlx::query_scalar(
            "SELECT is_completed FROM user_progress WHERE user_id = $1 AND chapter_id = $2",
        )
        .bind(actor.user_id())
        .bind(chapter_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(done.unwrap_or(false))
    }

    /// Completed chapter ids of one course, for marking chapter lists.
    pub async fn completed_in_course(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT up.chapter_id
            FROM user_progress up
            JOIN chapters c ON c.id = up.chapter_id
            WHERE up.user_id = $1 AND c.course_id = $2 AND up.is_completed
            "#,
        )
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(ids)
    }

    /// `(completed, total)` published chapters of `course_id` for the actor.
    pub async fn course_counts(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(up.id) FILTER (WHERE up.is_completed) AS completed,
                COUNT(c.id) AS total
            FROM chapters c
            LEFT JOIN user_progress up
                ON up.chapter_id = c.id AND up.user_id = $1
            WHERE c.course_id = $2 AND c.is_published
            "#,
        )
        .bind(actor.user_id())
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(counts)
    }

    /// Progress over every course the actor has purchased.
    pub async fn dashboard(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<CourseProgressRow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                co.id AS course_id,
                co.title,
                co.image_url,
                COUNT(c.id) AS total_chapters,
                COUNT(up.id) FILTER (WHERE up.is_completed) AS completed_chapters
            FROM purchases p
            JOIN courses co ON co.id = p.course_id
            LEFT JOIN chapters c
                ON c.course_id = co.id AND c.is_published
            LEFT JOIN user_progress up
                ON up.chapter_id = c.id AND up.user_id = p.user_id
            WHERE p.user_id = $1
            GROUP BY co.id, co.title, co.image_url, p.created_at
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
