use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{entity::CourseProgressRow, progress::progress_percentage};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub completed_chapters: i64,
    pub total_chapters: i64,
    pub progress: i32,
}

impl From<CourseProgressRow> for CourseProgress {
    fn from(row: CourseProgressRow) -> Self {
        Self {
            progress: progress_percentage(row.completed_chapters, row.total_chapters),
            course_id: row.course_id,
            title: row.title,
            image_url: row.image_url,
            completed_chapters: row.completed_chapters,
            total_chapters: row.total_chapters,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub completed: Vec<CourseProgress>,
    pub in_progress: Vec<CourseProgress>,
}

impl From<Vec<CourseProgressRow>> for DashboardResponse {
    fn from(rows: Vec<CourseProgressRow>) -> Self {
        let (completed, in_progress) = rows
            .into_iter()
            .map(CourseProgress::from)
            .partition(|c| c.progress == 100);

        Self {
            completed,
            in_progress,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(title: &str, completed: i64, total: i64) -> CourseProgressRow {
        CourseProgressRow {
            course_id: Uuid::new_v4(),
            title: title.to_string(),
            image_url: None,
            total_chapters: total,
            completed_chapters: completed,
        }
    }

    #[test]
    fn dashboard_splits_on_full_completion() {
        let dashboard = DashboardResponse::from(vec![
            row("Algebra", 3, 3),
            row("Physics", 1, 4),
            row("Empty", 0, 0),
        ]);

        assert_eq!(dashboard.completed.len(), 1);
        assert_eq!(dashboard.completed[0].title, "Algebra");
        assert_eq!(dashboard.in_progress.len(), 2);
        assert_eq!(dashboard.in_progress[0].progress, 25);
        assert_eq!(dashboard.in_progress[1].progress, 0);
    }
}
