use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{BalanceTransaction, Purchase, PurchaseCode};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GenerateCodesBody {
    pub count: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RedeemBody {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RedeemResponse {
    pub code: PurchaseCode,
    pub purchase: Purchase,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BalanceResponse {
    pub balance: i64,
    pub transactions: Vec<BalanceTransaction>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreditBody {
    /// Minor currency units, must be positive
    pub amount: i64,
    pub description: Option<String>,
}

pub const DEFAULT_CREDIT_DESCRIPTION: &str = "Balance top-up";

impl CreditBody {
    pub fn description(&self) -> &str {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_CREDIT_DESCRIPTION)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GrantBody {
    pub user_id: Uuid,
    pub course_id: Uuid,
}
