use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::delete,
};
use uuid::Uuid;

use crate::{
    model::{CrudRepository, ResourceTyped, check_access, entity::Attachment},
    web::{AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares},
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{id}", delete(attachments_delete_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    delete,
    path = "/api/v1/attachments/{attachment_id}",
    description = "Removes an attachment from its course",
    params(
        ("attachment_id" = Uuid, Path, description = "ID of the attachment")
    ),
    responses(
        (status = 200, description = "Attachment deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Attachment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "attachments"
)]
async fn attachments_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = Attachment::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Attachment::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Attachment::get_resource_type()))?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Attachment::get_resource_type(), e))?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Attachment::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
