use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    auth::{generate_code, normalize_code},
    model::{
        DatabaseError, DatabaseResult, ModelManager, ResourceType, ResourceTyped,
        entity::{Purchase, purchase::PurchaseSource},
    },
    web::AuthenticatedUser,
};

pub const MAX_CODES_PER_BATCH: i64 = 100;
const GENERATE_ATTEMPTS: usize = 8;

/// Single-use token that grants access to one course.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct PurchaseCode {
    id: Uuid,
    code: String,
    course_id: Uuid,
    created_by: Option<Uuid>,
    is_used: bool,
    used_by: Option<Uuid>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for PurchaseCode {
    fn get_resource_type() -> ResourceType {
        ResourceType::PurchaseCode
    }
}

impl PurchaseCode {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn is_used(&self) -> bool {
        self.is_used
    }

    pub fn used_by(&self) -> Option<Uuid> {
        self.used_by
    }

    /// Generates `count` fresh codes for `course_id` in one transaction.
    #[tracing::instrument(skip(mm, actor), fields(actor = %actor.user_id()))]
    pub async fn generate(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
        count: i64,
    ) -> DatabaseResult<Vec<Self>> {
        if !(1..=MAX_CODES_PER_BATCH).contains(&count) {
            return Err(DatabaseError::Invalid(format!(
                "count must be between 1 and {MAX_CODES_PER_BATCH}"
            )));
        }

        let mut tx = mm.begin().await?;
        let mut codes = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let mut inserted: Option<Self> = None;
            for _ in 0..GENERATE_ATTEMPTS {
                inserted = sqlx::query_as(
                    r#"
                    INSERT INTO purchase_codes (id, code, course_id, created_by)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (code) DO NOTHING
                    RETURNING *
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(generate_code())
                .bind(course_id)
                .bind(actor.user_id())
                .fetch_optional(&mut *tx)
                .await?;

                if inserted.is_some() {
                    break;
                }
                tracing::debug!("purchase code collision, retrying");
            }

            match inserted {
                Some(code) => codes.push(code),
                None => {
                    return Err(DatabaseError::Invalid(String::from(
                        "unable to generate a unique code",
                    )));
                }
            }
        }

        tx.commit().await?;
        tracing::info!(count = codes.len(), "purchase codes generated");
        Ok(codes)
    }

    pub async fn all_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            "SELECT * FROM purchase_codes WHERE course_id = $1 ORDER BY created_at DESC, code",
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }

    /// Marks the code used and grants its course to the actor, atomically.
    ///
    /// The code is claimed with a conditional update, so two concurrent redemptions
    /// cannot both succeed. If the actor already owns the course the transaction
    /// rolls back and the code stays available.
    #[tracing::instrument(skip(mm, actor, raw), fields(user = %actor.user_id()))]
    pub async fn redeem(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        raw: &str,
    ) -> DatabaseResult<(Self, Purchase)> {
        let code = normalize_code(raw);
        if code.is_empty() {
            return Err(DatabaseError::CodeNotFound);
        }

        let mut tx = mm.begin().await?;

        let claimed: Option<Self> = sqlx::query_as(
            r#"
            UPDATE purchase_codes
            SET is_used = TRUE, used_by = $2, used_at = now()
            WHERE code = $1 AND NOT is_used
            RETURNING *
            "#,
        )
        .bind(&code)
        .bind(actor.user_id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(claimed) = claimed else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM purchase_codes WHERE code = $1)")
                    .bind(&code)
                    .fetch_one(&mut *tx)
                    .await?;

            return Err(if exists {
                DatabaseError::CodeAlreadyUsed
            } else {
                DatabaseError::CodeNotFound
            });
        };

        let purchase =
            Purchase::insert(&mut tx, actor.user_id(), claimed.course_id, PurchaseSource::Code)
                .await?;

        tx.commit().await?;
        tracing::info!(course = %claimed.course_id, "purchase code redeemed");
        Ok((claimed, purchase))
    }
}
