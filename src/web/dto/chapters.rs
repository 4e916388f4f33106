use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::Chapter;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChapterCreateBody {
    pub title: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChapterUpdateBody {
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub is_free: bool,
    pub is_published: bool,
}

impl ChapterUpdateBody {
    /// Publishing needs a description and a video.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(String::from("title must not be empty"));
        }
        if self.is_published {
            if self.description.trim().is_empty() {
                return Err(String::from("a published chapter needs a description"));
            }
            if self.video_url.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(String::from("a published chapter needs a video"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReorderItem {
    pub id: Uuid,
    pub position: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ProgressBody {
    pub is_completed: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    /// `None` while the chapter is locked
    pub video_url: Option<String>,
    pub position: i32,
    pub is_free: bool,
    pub is_published: bool,
    pub locked: bool,
    pub is_completed: bool,
    pub next_chapter_id: Option<Uuid>,
}

impl ChapterResponse {
    pub fn new(
        chapter: Chapter,
        unlocked: bool,
        is_completed: bool,
        next_chapter_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: chapter.id(),
            course_id: chapter.course_id(),
            title: chapter.title().to_string(),
            description: chapter.description().to_string(),
            video_url: if unlocked {
                chapter.video_url().map(str::to_string)
            } else {
                None
            },
            position: chapter.position(),
            is_free: chapter.is_free(),
            is_published: chapter.is_published(),
            locked: !unlocked,
            is_completed,
            next_chapter_id,
        }
    }
}
