use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, prelude::FromRow};
use uuid::Uuid;

use crate::model::{DatabaseResult, ModelManager, ResourceType, ResourceTyped};

/// Ledger row. Deposits are positive, purchases negative.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct BalanceTransaction {
    id: Uuid,
    user_id: Uuid,
    amount: i64,
    kind: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for BalanceTransaction {
    fn get_resource_type() -> ResourceType {
        ResourceType::BalanceTransaction
    }
}

impl BalanceTransaction {
    pub const KIND_DEPOSIT: &'static str = "deposit";
    pub const KIND_PURCHASE: &'static str = "purchase";

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Inserts a ledger row on an open connection, usually inside a transaction.
    pub async fn record(
        conn: &mut PgConnection,
        user_id: Uuid,
        amount: i64,
        kind: &str,
        description: &str,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            "INSERT INTO balance_transactions (id, user_id, amount, kind, description) VALUES ($1,$2,$3,$4,$5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount)
        .bind(kind)
        .bind(description)
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    pub async fn all_by_user(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM balance_transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
