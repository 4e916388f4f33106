use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{BalanceTransaction, Course, Purchase, PurchaseCode, UserEntity},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::commerce::{BalanceResponse, CreditBody, GrantBody, RedeemBody, RedeemResponse},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/codes/redeem", post(codes_redeem_handler))
        .route("/balance", get(balance_get_handler))
        .route("/admin/users/{id}/balance", post(admin_credit_handler))
        .route("/admin/purchases", post(admin_grant_handler))
        .route(
            "/admin/purchases/{user_id}/{course_id}",
            delete(admin_revoke_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/codes/redeem",
    description = "Redeems a purchase code for the caller",
    request_body = RedeemBody,
    responses(
        (status = 200, description = "Code redeemed, course unlocked", body = RedeemResponse),
        (status = 400, description = "Code already used", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Code does not exist", body = ErrorResponse),
        (status = 409, description = "Course already purchased", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "commerce"
)]
async fn codes_redeem_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<RedeemBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let (code, purchase) = PurchaseCode::redeem(state.pool(), user, &payload.code)
        .await
        .map_err(|e| WebError::from_database(PurchaseCode::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(RedeemResponse { code, purchase })))
}

#[utoipa::path(
    get,
    path = "/api/v1/balance",
    description = "The caller's balance with the transaction history, newest first",
    responses(
        (status = 200, description = "Wallet state", body = BalanceResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "commerce"
)]
async fn balance_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::auth_required())?;
    let transactions = BalanceTransaction::all_by_user(state.pool(), user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(BalanceTransaction::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(BalanceResponse {
            balance: found.balance(),
            transactions,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/balance",
    description = "Credits a user's balance and records a deposit",
    request_body = CreditBody,
    params(
        ("user_id" = Uuid, Path, description = "ID of the user to credit")
    ),
    responses(
        (status = 200, description = "Balance credited", body = UserEntity),
        (status = 400, description = "Amount must be positive", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_credit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreditBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff()?;

    let credited =
        UserEntity::credit_balance(state.pool(), user, id, payload.amount, payload.description())
            .await
            .map_err(|e| WebError::from_database(BalanceTransaction::get_resource_type(), e))?
            .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;

    Ok((StatusCode::OK, Json(credited)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/purchases",
    description = "Grants course access without charging",
    request_body = GrantBody,
    responses(
        (status = 200, description = "Access granted", body = Purchase),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "User or course not found", body = ErrorResponse),
        (status = 409, description = "User already has the course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
#[tracing::instrument(skip(ctx, state))]
async fn admin_grant_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<GrantBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    UserEntity::find_by_id(state.pool(), user, payload.user_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(UserEntity::get_resource_type()))?;
    Course::find_by_id(state.pool(), user, payload.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let purchase = Purchase::grant(state.pool(), payload.user_id, payload.course_id)
        .await
        .map_err(|e| WebError::from_database(Purchase::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(purchase)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/purchases/{user_id}/{course_id}",
    description = "Revokes course access",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user"),
        ("course_id" = Uuid, Path, description = "ID of the course"),
    ),
    responses(
        (status = 200, description = "Access revoked"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "No such purchase", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
#[tracing::instrument(skip(ctx, state))]
async fn admin_revoke_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    ctx.admin_user()?;

    let revoked = Purchase::revoke(state.pool(), user_id, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Purchase::get_resource_type(), e))?;
    if !revoked {
        return Err(WebError::resource_not_found(Purchase::get_resource_type()));
    }

    Ok(StatusCode::OK)
}
