use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped, has_course_access,
        entity::{
            Attachment, AttachmentCreate, Chapter, ChapterCreate, Course, CourseCreate, GradeRow,
            Purchase, PurchaseCode, Quiz, QuizCreate, QuizResult, UserProgress,
        },
        progress::progress_percentage,
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            chapters::{ChapterCreateBody, ReorderItem},
            commerce::GenerateCodesBody,
            courses::{
                AttachmentBody, ChapterSummary, CourseCreateBody, CourseDetailResponse,
                CourseListQuery, CourseUpdateBody, QuizSummary,
            },
            quizzes::{DEFAULT_MAX_ATTEMPTS, QuizCreateBody, validate_quiz_fields},
        },
        error::ErrorResponse,
        middlewares,
        routes::managed_course,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route("/mine", get(courses_mine_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .route("/{id}/purchase", post(courses_purchase_handler))
        .route(
            "/{id}/codes",
            get(courses_codes_list_handler).post(courses_codes_generate_handler),
        )
        .route("/{id}/grades", get(courses_grades_handler))
        .route("/{id}/chapters", post(courses_chapter_create_handler))
        .route("/{id}/chapters/reorder", put(courses_chapter_reorder_handler))
        .route("/{id}/attachments", post(courses_attachment_create_handler))
        .route("/{id}/quizzes", post(courses_quiz_create_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    description = "Pages through the published catalog",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_list_handler(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> WebResult<impl IntoResponse> {
    let page = Course::page_published(
        state.pool(),
        query.title.as_deref(),
        query.limit(),
        query.offset(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/mine",
    description = "Courses authored by the caller, every course for admins",
    responses(
        (status = 200, description = "Authored courses", body = Vec<Course>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_mine_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff()?;
    let courses = Course::all_managed(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    description = "Creates an unpublished course owned by the caller",
    request_body = CourseCreateBody,
    responses(
        (status = 200, description = "Course created", body = Course),
        (status = 400, description = "Invalid course data", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Teachers and admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
#[tracing::instrument(skip_all)]
async fn courses_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.staff()?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(WebError::bad_request("title must not be empty"));
    }
    let price = payload.price.unwrap_or(0);
    if price < 0 {
        return Err(WebError::bad_request("price must not be negative"));
    }

    let data = CourseCreate {
        owner_id: user.user_id(),
        title,
        description: payload.description.unwrap_or_default(),
        image_url: payload.image_url,
        price,
        is_published: false,
    };

    let created = Course::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!(course = %created.id(), "course created");
    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    description = "Course detail with its chapters, quizzes and the caller's progress",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseDetailResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let fetch_err = |e: DatabaseError| WebError::resource_fetch_error(Course::get_resource_type(), e);
    let viewer = ctx.maybe_user();

    let course = Course::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(fetch_err)?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let manages = viewer.is_some_and(|u| course.is_managed_by(u));
    if !course.is_published() && !manages {
        return Err(WebError::resource_not_found(Course::get_resource_type()));
    }

    let chapters = Chapter::all_by_course(state.pool(), id, !manages)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;
    let quizzes = Quiz::all_by_course(state.pool(), id, !manages)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    let (is_purchased, has_access, completed, progress) = match viewer {
        Some(user) => {
            let is_purchased = Purchase::exists(state.pool(), user.user_id(), id)
                .await
                .map_err(fetch_err)?;
            let has_access = has_course_access(state.pool(), user, &course)
                .await
                .map_err(fetch_err)?;
            let completed = UserProgress::completed_in_course(state.pool(), user, id)
                .await
                .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;
            let (done, total) = UserProgress::course_counts(state.pool(), user, id)
                .await
                .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;
            (is_purchased, has_access, completed, progress_percentage(done, total))
        }
        None => (false, false, Vec::new(), 0),
    };

    let attachments = if has_access {
        Some(
            Attachment::all_by_course(state.pool(), id)
                .await
                .map_err(|e| WebError::resource_fetch_error(Attachment::get_resource_type(), e))?,
        )
    } else {
        None
    };

    let response = CourseDetailResponse {
        chapters: chapters
            .iter()
            .map(|c| ChapterSummary::new(c, &completed))
            .collect(),
        quizzes: quizzes.iter().map(QuizSummary::from).collect(),
        attachments,
        is_purchased,
        progress,
        course,
    };

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    description = "Updates course fields and publication state",
    request_body = CourseUpdateBody,
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Course cannot be published or data is invalid", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
#[tracing::instrument(skip(ctx, state, payload))]
async fn courses_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(WebError::bad_request("title must not be empty"));
    }
    if payload.price < 0 {
        return Err(WebError::bad_request("price must not be negative"));
    }

    if payload.is_published {
        if payload.description.trim().is_empty() {
            return Err(WebError::bad_request("a published course needs a description"));
        }
        let published = Chapter::count_published(state.pool(), id)
            .await
            .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;
        if published == 0 {
            return Err(WebError::bad_request(
                "a published course needs at least one published chapter",
            ));
        }
    }

    let data = CourseCreate {
        owner_id: course.owner_id(),
        title,
        description: payload.description,
        image_url: payload.image_url,
        price: payload.price,
        is_published: payload.is_published,
    };

    let updated = course
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    description = "Deletes the course with all of its content",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
#[tracing::instrument(skip(ctx, state))]
async fn courses_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/purchase",
    description = "Buys the course with the caller's balance",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course purchased", body = Purchase),
        (status = 400, description = "Insufficient balance, own or unpublished course", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course already purchased", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "commerce"
)]
async fn courses_purchase_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Course::get_resource_type()))?;

    let purchase = Purchase::buy_with_balance(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::from_database(Purchase::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(purchase)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/codes",
    description = "Generates a batch of single-use purchase codes",
    request_body = GenerateCodesBody,
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Codes generated", body = Vec<PurchaseCode>),
        (status = 400, description = "Count out of range", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "commerce"
)]
async fn courses_codes_generate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GenerateCodesBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let codes = PurchaseCode::generate(state.pool(), user, course.id(), payload.count)
        .await
        .map_err(|e| WebError::from_database(PurchaseCode::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(codes)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/codes",
    description = "Lists purchase codes of the course with their usage",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Codes of the course", body = Vec<PurchaseCode>),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "commerce"
)]
async fn courses_codes_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let codes = PurchaseCode::all_by_course(state.pool(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(PurchaseCode::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(codes)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/grades",
    description = "Every quiz result in the course",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Grade book", body = Vec<GradeRow>),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn courses_grades_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let grades = QuizResult::grades_by_course(state.pool(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizResult::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(grades)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/chapters",
    description = "Appends an unpublished chapter to the course",
    request_body = ChapterCreateBody,
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Chapter created", body = Chapter),
        (status = 400, description = "Title is empty", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "chapters"
)]
async fn courses_chapter_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChapterCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(WebError::bad_request("title must not be empty"));
    }

    let data = ChapterCreate {
        course_id: course.id(),
        title,
        description: String::new(),
        video_url: None,
        is_published: false,
        is_free: false,
    };

    let created = Chapter::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}/chapters/reorder",
    description = "Moves chapters to new positions in one transaction",
    request_body = Vec<ReorderItem>,
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Chapters reordered", body = Vec<Chapter>),
        (status = 400, description = "A chapter belongs to another course", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "chapters"
)]
async fn courses_chapter_reorder_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Vec<ReorderItem>>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let positions: Vec<(Uuid, i32)> = payload.iter().map(|i| (i.id, i.position)).collect();
    Chapter::reorder(state.pool(), course.id(), &positions)
        .await
        .map_err(|e| WebError::from_database(Chapter::get_resource_type(), e))?;

    let chapters = Chapter::all_by_course(state.pool(), course.id(), false)
        .await
        .map_err(|e| WebError::resource_fetch_error(Chapter::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(chapters)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/attachments",
    description = "Adds a downloadable resource to the course",
    request_body = AttachmentBody,
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Attachment created", body = Attachment),
        (status = 400, description = "Name or url is empty", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "attachments"
)]
async fn courses_attachment_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AttachmentBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let name = payload.name.trim().to_string();
    let url = payload.url.trim().to_string();
    if name.is_empty() || url.is_empty() {
        return Err(WebError::bad_request("attachment needs a name and a url"));
    }

    let created = Attachment::create(
        state.pool(),
        user,
        AttachmentCreate {
            course_id: course.id(),
            name,
            url,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Attachment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/quizzes",
    description = "Adds an unpublished quiz to the course",
    request_body = QuizCreateBody,
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Quiz created", body = Quiz),
        (status = 400, description = "Invalid quiz data", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn courses_quiz_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = managed_course(&state, user, id).await?;

    let max_attempts = payload.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
    validate_quiz_fields(&payload.title, payload.timer_minutes, max_attempts)
        .map_err(WebError::bad_request)?;

    let data = QuizCreate {
        course_id: course.id(),
        title: payload.title.trim().to_string(),
        description: payload.description.unwrap_or_default(),
        timer_minutes: payload.timer_minutes,
        max_attempts,
        is_published: false,
    };

    let created = Quiz::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}
