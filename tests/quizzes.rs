mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, id_of, json_body, setup_server, setup_test_db, signin_admin_action,
    signin_student_action, signin_teacher_action, with_published_course,
};

fn quiz_path(ctx: &common::FlowContext, suffix: &str) -> String {
    format!("/api/v1/quizzes/{}{suffix}", id_of(ctx, "quiz"))
}

fn quiz_update(is_published: bool) -> Value {
    json!({
        "title": "Borrowing check",
        "description": "Three points",
        "timer_minutes": 10,
        "max_attempts": 1,
        "is_published": is_published,
    })
}

/// Teacher creates an unpublished quiz (`quiz`) with a two point multiple
/// choice question (`mc_question`) and a one point short answer (`short_question`).
fn with_quiz(flow: Flow) -> Flow {
    flow.step(signin_teacher_action())
        .step(
            Action::new("quiz_create", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/quizzes", id_of(ctx, "course")))
                .with_body(json!({ "title": "Borrowing check", "max_attempts": 1 }))
                .with_save_as("quiz")
                .assert_body(|body| {
                    let quiz = json_body(body);
                    assert_eq!(quiz["is_published"], false);
                    assert_eq!(quiz["max_attempts"], 1);
                }),
        )
        // publishing an empty quiz is refused
        .step(
            Action::new("quiz_publish_empty", "PUT", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .with_body(quiz_update(true))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("question_invalid", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/questions"))
                .with_body(json!({
                    "text": "Pick one",
                    "question_type": "multiple_choice",
                    "options": ["a", "b"],
                    "correct_answer": "c",
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("question_too_many_points", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/questions"))
                .with_body(json!({
                    "text": "Worth a fortune",
                    "question_type": "short_answer",
                    "correct_answer": "yes",
                    "points": 2_000_000_000,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("question_mc", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/questions"))
                .with_body(json!({
                    "text": "Who frees memory?",
                    "question_type": "multiple_choice",
                    "options": ["the owner", "the garbage collector"],
                    "correct_answer": "the owner",
                    "points": 2,
                }))
                .with_save_as("mc_question"),
        )
        .step(
            Action::new("question_short", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/questions"))
                .with_body(json!({
                    "text": "What rejects dangling references?",
                    "question_type": "short_answer",
                    "correct_answer": "borrow checker",
                }))
                .with_save_as("short_question")
                .assert_body(|body| assert_eq!(json_body(body)["points"], 1)),
        )
}

#[tokio::test]
async fn route_quiz_authoring_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_quiz(with_published_course(Flow::new(), 100))
        .step(
            Action::new("quiz_get_owner", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .assert_body(|body| {
                    let quiz = json_body(body);
                    assert_eq!(quiz["questions"].as_array().map(Vec::len), Some(2));
                    assert_eq!(quiz["questions"][0]["correct_answer"], "the owner");
                }),
        )
        .step(
            Action::new("question_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/questions/{}", id_of(ctx, "short_question"))
                })
                .with_body(json!({
                    "text": "Is Rust memory safe?",
                    "question_type": "true_false",
                    "correct_answer": "TRUE",
                }))
                .assert_body(|body| {
                    let question = json_body(body);
                    assert_eq!(question["correct_answer"], "true");
                    assert_eq!(question["options"], json!(["true", "false"]));
                }),
        )
        .step(
            Action::new("question_delete", "DELETE", "dynamic").with_dyn_path(|ctx| {
                format!("/api/v1/questions/{}", id_of(ctx, "short_question"))
            }),
        )
        // unpublished quizzes stay hidden from students
        .step(signin_student_action())
        .step(
            Action::new("quiz_get_student_draft", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("question_create_student", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/questions"))
                .with_body(json!({
                    "text": "Sneaky",
                    "question_type": "short_answer",
                    "correct_answer": "yes",
                }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_teacher_action())
        .step(
            Action::new("quiz_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "")),
        )
        .step(
            Action::new("quiz_get_deleted", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_taking_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_quiz(with_published_course(Flow::new(), 100))
        .step(
            Action::new("quiz_publish", "PUT", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .with_body(quiz_update(true))
                .assert_body(|body| assert_eq!(json_body(body)["is_published"], true)),
        )
        .step(signin_student_action())
        .step(
            Action::new("quiz_get_not_purchased", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("quiz_submit_not_purchased", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/submit"))
                .with_body(json!({ "answers": [] }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action())
        .step(
            Action::new("grant", "POST", "/api/v1/admin/purchases").with_dyn_body(|ctx| {
                json!({ "user_id": id_of(ctx, "student"), "course_id": id_of(ctx, "course") })
            }),
        )
        .step(signin_student_action())
        .step(
            Action::new("quiz_get_student", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .assert_body(|body| {
                    let quiz = json_body(body);
                    assert_eq!(quiz["attempts_used"], 0);
                    let questions = quiz["questions"].as_array().cloned().unwrap_or_default();
                    assert_eq!(questions.len(), 2);
                    assert!(questions.iter().all(|q| q.get("correct_answer").is_none()));
                }),
        )
        .step(
            Action::new("quiz_submit", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/submit"))
                .with_dyn_body(|ctx| {
                    json!({
                        "answers": [
                            { "question_id": id_of(ctx, "mc_question"), "answer": "the owner" },
                            { "question_id": id_of(ctx, "short_question"), "answer": "the compiler" },
                        ]
                    })
                })
                .assert_body(|body| {
                    let submitted = json_body(body);
                    assert_eq!(submitted["result"]["score"], 2);
                    assert_eq!(submitted["result"]["total_points"], 3);
                    assert_eq!(submitted["result"]["percentage"], 66.67);
                    assert_eq!(submitted["result"]["attempt_number"], 1);
                    assert_eq!(submitted["answers"].as_array().map(Vec::len), Some(2));
                }),
        )
        .step(
            Action::new("quiz_submit_again", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/submit"))
                .with_body(json!({ "answers": [] }))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert_eq!(json_body(body)["error"], "maxAttemptsReached")),
        )
        .step(
            Action::new("quiz_results", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/results"))
                .assert_body(|body| {
                    let results = json_body(body);
                    assert_eq!(results.as_array().map(Vec::len), Some(1));
                    let answers = results[0]["answers"].as_array().cloned().unwrap_or_default();
                    assert_eq!(answers.iter().filter(|a| a["is_correct"] == true).count(), 1);
                }),
        )
        .step(
            Action::new("grades_student", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/grades", id_of(ctx, "course")))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_teacher_action())
        .step(
            Action::new("grades", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/grades", id_of(ctx, "course")))
                .assert_body(|body| {
                    let grades = json_body(body);
                    assert_eq!(grades.as_array().map(Vec::len), Some(1));
                    assert_eq!(grades[0]["full_name"], "Sara Student");
                    assert_eq!(grades[0]["quiz_title"], "Borrowing check");
                    assert_eq!(grades[0]["score"], 2);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_survives_course_unpublish_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_quiz(with_published_course(Flow::new(), 100))
        .step(
            Action::new("quiz_publish", "PUT", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .with_body(quiz_update(true)),
        )
        .step(signin_admin_action())
        .step(
            Action::new("grant", "POST", "/api/v1/admin/purchases").with_dyn_body(|ctx| {
                json!({ "user_id": id_of(ctx, "student"), "course_id": id_of(ctx, "course") })
            }),
        )
        .step(signin_teacher_action())
        .step(
            Action::new("course_unpublish", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "course")))
                .with_body(json!({
                    "title": "Rust 101",
                    "description": "Ownership and borrowing",
                    "price": 100,
                    "image_url": null,
                    "is_published": false,
                }))
                .assert_body(|body| assert_eq!(json_body(body)["is_published"], false)),
        )
        .step(signin_student_action())
        .step(
            Action::new("quiz_get_purchaser", "GET", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, ""))
                .assert_body(|body| assert_eq!(json_body(body)["attempts_used"], 0)),
        )
        .step(
            Action::new("quiz_submit_purchaser", "POST", "dynamic")
                .with_dyn_path(|ctx| quiz_path(ctx, "/submit"))
                .with_body(json!({ "answers": [] }))
                .assert_body(|body| assert_eq!(json_body(body)["result"]["score"], 0)),
        )
        .run(&mut server, pool)
        .await;
}
