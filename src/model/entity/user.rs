use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::entity::BalanceTransaction;
use crate::model::repo::ResourceTyped;
use crate::model::{DatabaseError, is_unique_violation};
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

/// Upper bound of a wallet balance.
pub const MAX_BALANCE: i64 = 1_000_000_000_000;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: uuid::Uuid,
    phone_number: String,
    full_name: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
    balance: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UserEntityCreateUpdate {
    pub phone_number: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: UserRole,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, uuid::Uuid> for UserEntity {
    /// Fails with [`DatabaseError::Conflict`] when the phone number is taken.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO users (id, phone_number, full_name, password_hash, role) VALUES ($1,$2,$3,$4,$5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.phone_number)
        .bind(&data.full_name)
        .bind(&data.password_hash)
        .bind(data.role.to_string())
        .fetch_one(mm.executor())
        .await;

        match result {
            Err(e) if is_unique_violation(&e) => Err(DatabaseError::Conflict),
            other => Ok(other?),
        }
    }

    /// Updates the profile fields; role, balance and password are left alone.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("UPDATE users SET phone_number = $1, full_name = $2 WHERE id = $3")
            .bind(&data.phone_number)
            .bind(&data.full_name)
            .bind(self.id)
            .execute(mm.executor())
            .await;

        if let Err(e) = &result {
            if is_unique_violation(e) {
                return Err(DatabaseError::Conflict);
            }
        }
        result?;

        self.phone_number = data.phone_number;
        self.full_name = data.full_name;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for UserEntity {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    pub async fn find_by_phone(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        phone_number: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn set_role(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        role: UserRole,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.to_string())
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.role = role.to_string();
        Ok(self)
    }

    /// Adds `amount` to the user's balance and records a deposit, atomically.
    ///
    /// Returns `None` when the user does not exist.
    #[tracing::instrument(skip(mm, actor, description), fields(actor = %actor.user_id()))]
    pub async fn credit_balance(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        user_id: Uuid,
        amount: i64,
        description: &str,
    ) -> DatabaseResult<Option<Self>> {
        if amount <= 0 {
            return Err(DatabaseError::Invalid(String::from(
                "amount must be positive",
            )));
        }
        if amount > MAX_BALANCE {
            return Err(DatabaseError::Invalid(format!(
                "amount must not exceed {MAX_BALANCE}"
            )));
        }

        let mut tx = mm.begin().await?;

        let user: Option<Self> = sqlx::query_as(
            "UPDATE users SET balance = balance + $1 WHERE id = $2 AND balance <= $3 - $1 RETURNING *",
        )
        .bind(amount)
        .bind(user_id)
        .bind(MAX_BALANCE)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists {
                tracing::info!("credit rejected, balance would exceed the limit");
                return Err(DatabaseError::Invalid(format!(
                    "balance must not exceed {MAX_BALANCE}"
                )));
            }
            return Ok(None);
        };

        BalanceTransaction::record(
            &mut tx,
            user_id,
            amount,
            BalanceTransaction::KIND_DEPOSIT,
            description,
        )
        .await?;

        tx.commit().await?;
        tracing::info!(new_balance = user.balance, "balance credited");
        Ok(Some(user))
    }

    /// Creates the configured admin account or promotes the existing one.
    #[tracing::instrument(skip(mm, password_hash))]
    pub async fn ensure_admin(
        mm: &ModelManager,
        phone_number: &str,
        full_name: &str,
        password_hash: String,
    ) -> DatabaseResult<Self> {
        let admin = AuthenticatedUser::admin();
        if let Some(found) = Self::find_by_phone(mm, &admin, phone_number).await? {
            if found.role() == UserRole::Admin {
                return Ok(found);
            }
            tracing::info!("promoting existing account to admin");
            return found.set_role(mm, &admin, UserRole::Admin).await;
        }

        tracing::info!("creating admin account");
        Self::create(
            mm,
            &admin,
            UserEntityCreateUpdate {
                phone_number: phone_number.to_string(),
                full_name: full_name.to_string(),
                password_hash,
                role: UserRole::Admin,
            },
        )
        .await
    }
}
