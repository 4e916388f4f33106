mod access;
pub use access::{HasOwner, check_access, has_course_access};

mod database;
pub use database::DbConnection;

pub mod entity;
pub mod grading;
pub mod progress;

mod error;
pub use error::{DatabaseError, DatabaseResult, is_unique_violation};

mod repo;
pub use repo::{CrudRepository, Page, PaginatableRepository, ResourceType, ResourceTyped};

use sqlx::{PgPool, Postgres, Transaction};

#[derive(Debug, Clone)]
pub struct ModelManager {
    database: DbConnection,
}

impl ModelManager {
    pub fn new(conn: DbConnection) -> Self {
        Self { database: conn }
    }

    pub fn executor(&self) -> &PgPool {
        self.database.pool()
    }

    /// Starts a transaction; dropping it without `commit` rolls back.
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        Ok(self.database.pool().begin().await?)
    }
}
