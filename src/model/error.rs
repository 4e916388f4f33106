use thiserror::Error;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("balance is too low for this purchase")]
    InsufficientBalance,
    #[error("course is already purchased")]
    AlreadyPurchased,
    #[error("purchase code does not exist")]
    CodeNotFound,
    #[error("purchase code is already used")]
    CodeAlreadyUsed,
    #[error("maximum number of quiz attempts reached")]
    MaxAttemptsReached,
    #[error("conflicting concurrent write")]
    Conflict,
    #[error("invalid data: {0}")]
    Invalid(String),
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
