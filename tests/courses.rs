mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, id_of, json_body, setup_server, setup_test_db, signin_teacher_action,
    signup_action, with_published_course,
};

#[tokio::test]
async fn route_course_authoring_is_role_gated_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("+202000000001", "Plain Student", "password"))
        .step(
            Action::new("course_create", "POST", "/api/v1/courses")
                .with_body(json!({ "title": "Not allowed" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("courses_mine", "GET", "/api/v1/courses/mine")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("course_create_anonymous", "POST", "/api/v1/courses")
                .with_clear_cookies(true)
                .with_body(json!({ "title": "Not allowed" }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_publish_rules_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 0)
        .step(signin_teacher_action())
        .step(
            Action::new("course_create", "POST", "/api/v1/courses")
                .with_body(json!({ "title": "Draft course", "price": 500 }))
                .with_save_as("draft"),
        )
        .step(
            Action::new("course_negative_price", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "draft")))
                .with_body(json!({
                    "title": "Draft course",
                    "description": "Has a description",
                    "price": -1,
                    "is_published": false,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // no published chapter yet
        .step(
            Action::new("course_publish_empty", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "draft")))
                .with_body(json!({
                    "title": "Draft course",
                    "description": "Has a description",
                    "price": 500,
                    "is_published": true,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("chapter_create", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/chapters", id_of(ctx, "draft")))
                .with_body(json!({ "title": "Only chapter" }))
                .with_save_as("only_chapter"),
        )
        // a chapter without a video cannot be published
        .step(
            Action::new("chapter_publish_no_video", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/chapters/{}", id_of(ctx, "only_chapter")))
                .with_body(json!({
                    "title": "Only chapter",
                    "description": "Something to watch",
                    "video_url": null,
                    "is_free": false,
                    "is_published": true,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("chapter_publish", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/chapters/{}", id_of(ctx, "only_chapter")))
                .with_body(json!({
                    "title": "Only chapter",
                    "description": "Something to watch",
                    "video_url": "https://cdn.example.com/only.mp4",
                    "is_free": false,
                    "is_published": true,
                })),
        )
        // a published course needs a description
        .step(
            Action::new("course_publish_no_description", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "draft")))
                .with_body(json!({
                    "title": "Draft course",
                    "description": " ",
                    "price": 500,
                    "is_published": true,
                }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("course_publish", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "draft")))
                .with_body(json!({
                    "title": "Draft course",
                    "description": "Has a description",
                    "price": 500,
                    "is_published": true,
                }))
                .assert_body(|body| assert_eq!(json_body(body)["is_published"], true)),
        )
        // unpublishing the last published chapter takes the course down
        .step(
            Action::new("chapter_unpublish", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/chapters/{}", id_of(ctx, "only_chapter")))
                .with_body(json!({
                    "title": "Only chapter",
                    "description": "Something to watch",
                    "video_url": "https://cdn.example.com/only.mp4",
                    "is_free": false,
                    "is_published": false,
                })),
        )
        .step(
            Action::new("course_get_owner", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "draft")))
                .assert_body(|body| {
                    let detail = json_body(body);
                    assert_eq!(detail["course"]["is_published"], false);
                    // owners see unpublished chapters
                    assert_eq!(detail["chapters"].as_array().map(Vec::len), Some(1));
                }),
        )
        .step(
            Action::new("course_get_anonymous", "GET", "dynamic")
                .with_clear_cookies(true)
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "draft")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_catalog_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 100)
        .step(signin_teacher_action())
        .step(
            Action::new("course_create", "POST", "/api/v1/courses")
                .with_body(json!({ "title": "Hidden draft" })),
        )
        .step(
            Action::new("courses_mine", "GET", "/api/v1/courses/mine").assert_body(|body| {
                assert_eq!(json_body(body).as_array().map(Vec::len), Some(2));
            }),
        )
        .step(
            Action::new("catalog", "GET", "/api/v1/courses")
                .with_clear_cookies(true)
                .assert_body(|body| {
                    let page = json_body(body);
                    assert_eq!(page["total"], 1);
                    assert_eq!(page["items"][0]["title"], "Rust 101");
                }),
        )
        .step(
            Action::new("catalog_search", "GET", "/api/v1/courses")
                .with_param("title", "rust")
                .assert_body(|body| assert_eq!(json_body(body)["total"], 1)),
        )
        .step(
            Action::new("catalog_search_miss", "GET", "/api/v1/courses")
                .with_param("title", "haskell")
                .assert_body(|body| assert_eq!(json_body(body)["total"], 0)),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_chapter_locking_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 100)
        .step(
            Action::new("course_get_student", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "course")))
                .assert_body(|body| {
                    let detail = json_body(body);
                    assert_eq!(detail["is_purchased"], false);
                    assert!(detail["attachments"].is_null());
                    assert_eq!(detail["chapters"].as_array().map(Vec::len), Some(2));
                    assert_eq!(detail["progress"], 0);
                }),
        )
        .step(
            Action::new("free_chapter", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/chapters/{}", id_of(ctx, "free_chapter")))
                .assert_body(|body| {
                    let chapter = json_body(body);
                    assert_eq!(chapter["locked"], false);
                    assert_eq!(chapter["video_url"], "https://cdn.example.com/intro.mp4");
                    assert!(chapter["next_chapter_id"].is_string());
                }),
        )
        .step(
            Action::new("paid_chapter", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/chapters/{}", id_of(ctx, "paid_chapter")))
                .assert_body(|body| {
                    let chapter = json_body(body);
                    assert_eq!(chapter["locked"], true);
                    assert!(chapter["video_url"].is_null());
                    assert!(chapter["next_chapter_id"].is_null());
                }),
        )
        .step(
            Action::new("paid_progress", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/chapters/{}/progress", id_of(ctx, "paid_chapter"))
                })
                .with_body(json!({ "is_completed": true }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("free_progress", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/chapters/{}/progress", id_of(ctx, "free_chapter"))
                })
                .with_body(json!({ "is_completed": true }))
                .assert_body(|body| assert_eq!(json_body(body)["is_completed"], true)),
        )
        .step(
            Action::new("course_progress", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "course")))
                .assert_body(|body| assert_eq!(json_body(body)["progress"], 50)),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_chapter_reorder_and_attachments_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 100)
        .step(signin_teacher_action())
        .step(
            Action::new("reorder", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/chapters/reorder", id_of(ctx, "course"))
                })
                .with_dyn_body(|ctx| {
                    json!([
                        { "id": id_of(ctx, "paid_chapter"), "position": 1 },
                        { "id": id_of(ctx, "free_chapter"), "position": 2 },
                    ])
                })
                .assert_body(|body| {
                    let chapters = json_body(body);
                    assert_eq!(chapters[0]["title"], "Ownership");
                    assert_eq!(chapters[1]["title"], "Intro");
                }),
        )
        .step(
            Action::new("reorder_foreign", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/chapters/reorder", id_of(ctx, "course"))
                })
                .with_body(json!([
                    { "id": "00000000-0000-0000-0000-000000000001", "position": 3 },
                ]))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("attachment_create", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/attachments", id_of(ctx, "course")))
                .with_body(json!({ "name": "Cheatsheet", "url": "https://cdn.example.com/cheat.pdf" }))
                .with_save_as("attachment"),
        )
        .step(
            Action::new("course_get_owner", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "course")))
                .assert_body(|body| {
                    let detail = json_body(body);
                    assert_eq!(detail["attachments"][0]["name"], "Cheatsheet");
                }),
        )
        .step(
            Action::new("attachment_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/attachments/{}", id_of(ctx, "attachment"))),
        )
        .step(
            Action::new("attachment_delete_again", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/attachments/{}", id_of(ctx, "attachment")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}
