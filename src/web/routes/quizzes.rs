use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{Course, Question, QuestionCreate, Quiz, QuizAnswer, QuizCreate, QuizResult},
        grading::{self, GradableQuestion, validate_question},
        has_course_access,
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::quizzes::{
            QuestionBody, QuestionResponse, QuizResponse, QuizResultResponse, QuizUpdateBody,
            SubmitBody, validate_quiz_fields,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(quizzes_get_handler)
                .put(quizzes_update_handler)
                .delete(quizzes_delete_handler),
        )
        .route("/{id}/questions", post(quizzes_question_create_handler))
        .route("/{id}/submit", post(quizzes_submit_handler))
        .route("/{id}/results", get(quizzes_results_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

pub fn question_routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            put(questions_update_handler).delete(questions_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_quiz(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Quiz> {
    Quiz::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))
}

async fn owned_quiz(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Quiz> {
    let quiz = find_quiz(state, user, id).await?;
    check_access(state.pool(), user, &quiz, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Quiz::get_resource_type(), e))?;
    Ok(quiz)
}

async fn owned_question(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Question> {
    let question = Question::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Question::get_resource_type()))?;

    check_access(state.pool(), user, &question, user.user_id())
        .await
        .map_err(|e| WebError::from_database(Question::get_resource_type(), e))?;
    Ok(question)
}

/// Course of `quiz` and whether `user` manages it.
async fn quiz_course(
    state: &AppState,
    user: &AuthenticatedUser,
    quiz: &Quiz,
) -> WebResult<(Course, bool)> {
    let course = Course::find_by_id(state.pool(), user, quiz.course_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or(WebError::resource_not_found(Quiz::get_resource_type()))?;
    let manages = course.is_managed_by(user);
    Ok((course, manages))
}

/// Students only reach published quizzes of courses they own. A purchase
/// keeps working after the course itself is unpublished.
async fn ensure_taker(
    state: &AppState,
    user: &AuthenticatedUser,
    quiz: &Quiz,
    course: &Course,
) -> WebResult<()> {
    if !quiz.is_published() {
        return Err(WebError::resource_not_found(Quiz::get_resource_type()));
    }

    let allowed = has_course_access(state.pool(), user, course)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    if !allowed {
        return Err(WebError::resource_forbidden(Quiz::get_resource_type()));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{quiz_id}",
    description = "Quiz with its questions; correct answers are only shown to the course owner and admins",
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz found", body = QuizResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Course is not purchased", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn quizzes_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(&state, user, id).await?;
    let (course, manages) = quiz_course(&state, user, &quiz).await?;
    if !manages {
        ensure_taker(&state, user, &quiz, &course).await?;
    }

    let questions = Question::all_by_quiz(state.pool(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
    let attempts_used = QuizResult::count_attempts(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizResult::get_resource_type(), e))?;

    let response = QuizResponse {
        questions: questions
            .iter()
            .map(|q| QuestionResponse::new(q, manages))
            .collect(),
        attempts_used,
        quiz,
    };

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/v1/quizzes/{quiz_id}",
    description = "Updates a quiz; publishing needs at least one question",
    request_body = QuizUpdateBody,
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz updated", body = Quiz),
        (status = 400, description = "Invalid quiz data", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn quizzes_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_quiz_fields(&payload.title, payload.timer_minutes, payload.max_attempts)
        .map_err(WebError::bad_request)?;
    let quiz = owned_quiz(&state, user, id).await?;

    if payload.is_published {
        let questions = Question::count_by_quiz(state.pool(), id)
            .await
            .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
        if questions == 0 {
            return Err(WebError::bad_request(
                "a published quiz needs at least one question",
            ));
        }
    }

    let data = QuizCreate {
        course_id: quiz.course_id(),
        title: payload.title.trim().to_string(),
        description: payload.description,
        timer_minutes: payload.timer_minutes,
        max_attempts: payload.max_attempts,
        is_published: payload.is_published,
    };

    let updated = quiz
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quizzes/{quiz_id}",
    description = "Deletes a quiz with its questions and results",
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn quizzes_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = owned_quiz(&state, user, id).await?;

    quiz.delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{quiz_id}/questions",
    description = "Appends a question to the quiz",
    request_body = QuestionBody,
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Question created", body = Question),
        (status = 400, description = "Invalid question", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn quizzes_question_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let question = validate_question(payload.into()).map_err(WebError::bad_request)?;
    let quiz = owned_quiz(&state, user, id).await?;

    let created = Question::create(
        state.pool(),
        user,
        QuestionCreate {
            quiz_id: quiz.id(),
            question,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/{question_id}",
    description = "Replaces a question",
    request_body = QuestionBody,
    params(
        ("question_id" = Uuid, Path, description = "ID of the question")
    ),
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 400, description = "Invalid question", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn questions_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let valid = validate_question(payload.into()).map_err(WebError::bad_request)?;
    let question = owned_question(&state, user, id).await?;

    let data = QuestionCreate {
        quiz_id: question.quiz_id(),
        question: valid,
    };
    let updated = question
        .update(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/{question_id}",
    description = "Removes a question from its quiz",
    params(
        ("question_id" = Uuid, Path, description = "ID of the question")
    ),
    responses(
        (status = 200, description = "Question deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Question not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn questions_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let question = owned_question(&state, user, id).await?;

    question
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{quiz_id}/submit",
    description = "Grades the caller's answers and stores the attempt",
    request_body = SubmitBody,
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Attempt graded", body = QuizResultResponse),
        (status = 400, description = "No attempts left", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Course is not purchased", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 409, description = "Another attempt was submitted concurrently", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
#[tracing::instrument(skip(ctx, state, payload))]
async fn quizzes_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(&state, user, id).await?;
    let (course, _) = quiz_course(&state, user, &quiz).await?;
    ensure_taker(&state, user, &quiz, &course).await?;

    let questions = Question::all_by_quiz(state.pool(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;
    let gradable = questions
        .iter()
        .map(Question::gradable)
        .collect::<Result<Vec<GradableQuestion>, DatabaseError>>()
        .map_err(|e| WebError::resource_fetch_error(Question::get_resource_type(), e))?;

    let grade = grading::grade(&gradable, &payload.into_map());

    let (result, answers) = QuizResult::submit(state.pool(), user, &quiz, &grade)
        .await
        .map_err(|e| WebError::from_database(QuizResult::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(QuizResultResponse { result, answers })))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{quiz_id}/results",
    description = "The caller's attempts at the quiz with per-question answers",
    params(
        ("quiz_id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Attempts, oldest first", body = Vec<QuizResultResponse>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "quizzes"
)]
async fn quizzes_results_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(&state, user, id).await?;

    let results = QuizResult::all_by_user_quiz(state.pool(), user, quiz.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizResult::get_resource_type(), e))?;
    let ids: Vec<Uuid> = results.iter().map(QuizResult::id).collect();
    let answers = QuizAnswer::all_by_results(state.pool(), &ids)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizResult::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(QuizResultResponse::group(results, answers))))
}
