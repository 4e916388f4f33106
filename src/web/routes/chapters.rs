use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access, has_course_access,
        entity::{Chapter, ChapterCreate, Course, UserProgress},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::chapters::{ChapterResponse, ChapterUpdateBody, ProgressBody},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(chapters_get_handler)
                .put(chapters_update_handler)
                .delete(chapters_delete_handler),
        )
        .route("/{id}/progress", put(chapters_progress_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Chapter with its course, hidden unless both are published or `viewer` manages the course.
async fn visible_chapter(
    state: &AppState,
    viewer: Option<&AuthenticatedUser>,
    id: Uuid,
) -> WebResult<(Chapter, Course, bool)> {
    let lookup = AuthenticatedUser::admin();
    let chapter = Chapter::find_by_id(state.pool(), &lookup, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Chapter::get_resource_type()))?;

    let course = Course::find_by_id(state.pool(), &lookup, chapter.course_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Chapter::get_resource_type()))?;

    let manages = viewer.is_some_and(|u| course.is_managed_by(u));
    if !manages && !(chapter.is_published() && course.is_published()) {
        return Err(WebError::resource_not_found(Chapter::get_resource_type()));
    }

    Ok((chapter, course, manages))
}

async fn owned_chapter(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Chapter> {
    let chapter = Chapter::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Chapter::get_resource_type()))?;

    check_access(state.pool(), user, &chapter, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Chapter::get_resource_type(), e))?;

    Ok(chapter)
}

#[utoipa::path(
    get,
    path = "/api/v1/chapters/{chapter_id}",
    description = "Chapter detail; the video is withheld until the chapter is free or the course is purchased",
    params(
        ("chapter_id" = Uuid, Path, description = "ID of the chapter")
    ),
    responses(
        (status = 200, description = "Chapter found", body = ChapterResponse),
        (status = 404, description = "Chapter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "chapters"
)]
async fn chapters_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let viewer = ctx.maybe_user();
    let (chapter, course, manages) = visible_chapter(&state, viewer, id).await?;

    let (unlocked, is_completed) = match viewer {
        Some(user) => {
            let unlocked = manages
                || chapter.is_free()
                || has_course_access(state.pool(), user, &course)
                    .await
                    .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
            let is_completed = UserProgress::is_chapter_completed(state.pool(), user, id)
                .await
                .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;
            (unlocked, is_completed)
        }
        None => (chapter.is_free(), false),
    };

    let next_chapter_id = chapter
        .next_published(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(ChapterResponse::new(chapter, unlocked, is_completed, next_chapter_id)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/chapters/{chapter_id}",
    description = "Updates a chapter; unpublishing the last published chapter unpublishes the course",
    request_body = ChapterUpdateBody,
    params(
        ("chapter_id" = Uuid, Path, description = "ID of the chapter")
    ),
    responses(
        (status = 200, description = "Chapter updated", body = Chapter),
        (status = 400, description = "Chapter cannot be published", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Chapter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "chapters"
)]
#[tracing::instrument(skip(ctx, state, payload))]
async fn chapters_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChapterUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate().map_err(WebError::bad_request)?;
    let chapter = owned_chapter(&state, user, id).await?;

    let data = ChapterCreate {
        course_id: chapter.course_id(),
        title: payload.title.trim().to_string(),
        description: payload.description,
        video_url: payload
            .video_url
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        is_published: payload.is_published,
        is_free: payload.is_free,
    };

    let updated = chapter
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;

    if !updated.is_published() {
        let unpublished = Course::unpublish_if_empty(state.pool(), updated.course_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
        if unpublished {
            tracing::info!(course = %updated.course_id(), "course unpublished, no published chapters left");
        }
    }

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/chapters/{chapter_id}",
    description = "Deletes a chapter; the course is unpublished when no published chapter remains",
    params(
        ("chapter_id" = Uuid, Path, description = "ID of the chapter")
    ),
    responses(
        (status = 200, description = "Chapter deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Chapter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "chapters"
)]
#[tracing::instrument(skip(ctx, state))]
async fn chapters_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let chapter = owned_chapter(&state, user, id).await?;
    let course_id = chapter.course_id();

    chapter
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;

    let unpublished = Course::unpublish_if_empty(state.pool(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if unpublished {
        tracing::info!(course = %course_id, "course unpublished, no published chapters left");
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/api/v1/chapters/{chapter_id}/progress",
    description = "Marks the chapter completed or not for the caller",
    request_body = ProgressBody,
    params(
        ("chapter_id" = Uuid, Path, description = "ID of the chapter")
    ),
    responses(
        (status = 200, description = "Progress saved", body = UserProgress),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Chapter is locked", body = ErrorResponse),
        (status = 404, description = "Chapter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "progress"
)]
async fn chapters_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let (chapter, course, manages) = visible_chapter(&state, Some(user), id).await?;

    let unlocked = manages
        || chapter.is_free()
        || has_course_access(state.pool(), user, &course)
            .await
            .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if !unlocked {
        return Err(WebError::resource_forbidden(Chapter::get_resource_type()));
    }

    let progress = UserProgress::upsert(state.pool(), user, chapter.id(), payload.is_completed)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(progress)))
}
