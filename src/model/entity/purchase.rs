use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, prelude::FromRow};
use uuid::Uuid;

use crate::{
    model::{
        DatabaseError, DatabaseResult, ModelManager, ResourceType, ResourceTyped,
        entity::{BalanceTransaction, Course},
        is_unique_violation,
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseSource {
    Balance,
    Code,
    Grant,
}

impl PurchaseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Code => "code",
            Self::Grant => "grant",
        }
    }
}

/// Access to a course. At most one row per `(user_id, course_id)`.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Purchase {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    source: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Purchase {
    fn get_resource_type() -> ResourceType {
        ResourceType::Purchase
    }
}

impl Purchase {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Inserts on an open connection; a duplicate maps to [`DatabaseError::AlreadyPurchased`].
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        course_id: Uuid,
        source: PurchaseSource,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO purchases (id, user_id, course_id, source) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(course_id)
        .bind(source.as_str())
        .fetch_one(conn)
        .await;

        match result {
            Err(e) if is_unique_violation(&e) => Err(DatabaseError::AlreadyPurchased),
            other => Ok(other?),
        }
    }

    pub async fn exists(mm: &ModelManager, user_id: Uuid, course_id: Uuid) -> DatabaseResult<bool> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM purchases WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(found)
    }

    /// Buys `course` for the actor with their wallet.
    ///
    /// The purchase row, the conditional debit and the ledger row commit together.
    /// The debit only applies while `balance >= price`, so concurrent purchases
    /// can never drive the balance negative and a second purchase of the same
    /// course hits the unique constraint.
    #[tracing::instrument(skip(mm, actor, course), fields(user = %actor.user_id(), course = %course.id()))]
    pub async fn buy_with_balance(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course: &Course,
    ) -> DatabaseResult<Self> {
        if !course.is_published() {
            return Err(DatabaseError::Invalid(String::from(
                "course is not available for purchase",
            )));
        }
        if course.owner_id() == actor.user_id() {
            return Err(DatabaseError::Invalid(String::from(
                "you cannot buy your own course",
            )));
        }

        let mut tx = mm.begin().await?;

        let purchase =
            Self::insert(&mut tx, actor.user_id(), course.id(), PurchaseSource::Balance).await?;

        if course.price() > 0 {
            let debited = sqlx::query(
                "UPDATE users SET balance = balance - $1 WHERE id = $2 AND balance >= $1",
            )
            .bind(course.price())
            .bind(actor.user_id())
            .execute(&mut *tx)
            .await?;

            if debited.rows_affected() == 0 {
                tracing::info!("purchase rejected, balance too low");
                return Err(DatabaseError::InsufficientBalance);
            }

            BalanceTransaction::record(
                &mut tx,
                actor.user_id(),
                -course.price(),
                BalanceTransaction::KIND_PURCHASE,
                &format!("Purchase of course \"{}\"", course.title()),
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!("course purchased");
        Ok(purchase)
    }

    /// Gives access without charging.
    #[tracing::instrument(skip(mm))]
    pub async fn grant(mm: &ModelManager, user_id: Uuid, course_id: Uuid) -> DatabaseResult<Self> {
        let mut conn = mm.executor().acquire().await?;
        Self::insert(&mut conn, user_id, course_id, PurchaseSource::Grant).await
    }

    /// Removes access. Returns whether a purchase existed.
    #[tracing::instrument(skip(mm))]
    pub async fn revoke(mm: &ModelManager, user_id: Uuid, course_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM purchases WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .execute(mm.executor())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
