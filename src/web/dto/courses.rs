use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Attachment, Chapter, Course, Quiz};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    /// Case-insensitive title fragment
    pub title: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CourseListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CourseCreateBody {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CourseUpdateBody {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub is_published: bool,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChapterSummary {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub is_free: bool,
    pub is_published: bool,
    pub is_completed: bool,
}

impl ChapterSummary {
    pub fn new(chapter: &Chapter, completed: &[Uuid]) -> Self {
        Self {
            id: chapter.id(),
            title: chapter.title().to_string(),
            position: chapter.position(),
            is_free: chapter.is_free(),
            is_published: chapter.is_published(),
            is_completed: completed.contains(&chapter.id()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizSummary {
    pub id: Uuid,
    pub title: String,
    pub position: i32,
    pub is_published: bool,
    pub max_attempts: i32,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id(),
            title: quiz.title().to_string(),
            position: quiz.position(),
            is_published: quiz.is_published(),
            max_attempts: quiz.max_attempts(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub chapters: Vec<ChapterSummary>,
    pub quizzes: Vec<QuizSummary>,
    /// Present only for buyers, the owner and admins
    pub attachments: Option<Vec<Attachment>>,
    pub is_purchased: bool,
    /// Completed published chapters, percent
    pub progress: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AttachmentBody {
    pub name: String,
    pub url: String,
}
