mod common;
use axum::http::StatusCode;
use axum_test::TestResponse;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, credit_action, id_of, json_body, publish_chapter_action, setup_server,
    setup_test_db, signin_admin_action, signin_student_action, signin_teacher_action,
    signup_action, with_published_course,
};

fn purchase_action() -> Action {
    Action::new("purchase", "POST", "dynamic")
        .with_dyn_path(|ctx| format!("/api/v1/courses/{}/purchase", id_of(ctx, "course")))
}

fn redeem_action(code_key: &'static str) -> Action {
    Action::new("redeem", "POST", "/api/v1/codes/redeem").with_dyn_body(move |ctx| {
        json!({ "code": ctx.get(code_key)[0]["code"] })
    })
}

fn error_code(body: &str) -> String {
    json_body(body)["error"].as_str().unwrap_or_default().to_string()
}

/// Exactly one response succeeded. Returns the other one.
fn single_winner(first: TestResponse, second: TestResponse) -> TestResponse {
    let winners = [&first, &second]
        .iter()
        .filter(|resp| resp.status_code() == StatusCode::OK)
        .count();
    assert_eq!(winners, 1, "expected exactly one request to succeed");

    if first.status_code() == StatusCode::OK {
        second
    } else {
        first
    }
}

#[tokio::test]
async fn route_purchase_with_balance_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 100)
        .step(
            purchase_action()
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert_eq!(error_code(body), "insufficientBalance")),
        )
        .step(signin_admin_action())
        .step(
            credit_action("student", 0)
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(credit_action("student", 150).assert_body(|body| {
            assert_eq!(json_body(body)["balance"], 150);
        }))
        .step(credit_action("student", i64::MAX).with_expect(StatusCode::BAD_REQUEST))
        // 150 already on the wallet, this would cross the cap
        .step(credit_action("student", 1_000_000_000_000).with_expect(StatusCode::BAD_REQUEST))
        .step(signin_student_action())
        .step(purchase_action().assert_body(|body| {
            assert_eq!(json_body(body)["source"], "balance");
        }))
        .step(
            Action::new("balance", "GET", "/api/v1/balance").assert_body(|body| {
                let wallet = json_body(body);
                assert_eq!(wallet["balance"], 50);

                let transactions = wallet["transactions"].as_array().cloned().unwrap_or_default();
                assert_eq!(transactions.len(), 2);
                assert!(transactions
                    .iter()
                    .any(|t| t["kind"] == "deposit" && t["amount"] == 150 && t["description"] == "Cash deposit"));
                assert!(transactions
                    .iter()
                    .any(|t| t["kind"] == "purchase" && t["amount"] == -100));
            }),
        )
        .step(
            purchase_action()
                .with_expect(StatusCode::CONFLICT)
                .assert_body(|body| assert_eq!(error_code(body), "alreadyPurchased")),
        )
        .step(
            Action::new("course_get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "course")))
                .assert_body(|body| {
                    let detail = json_body(body);
                    assert_eq!(detail["is_purchased"], true);
                    assert!(detail["attachments"].is_array());
                }),
        )
        .step(
            Action::new("paid_chapter", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/chapters/{}", id_of(ctx, "paid_chapter")))
                .assert_body(|body| {
                    let chapter = json_body(body);
                    assert_eq!(chapter["locked"], false);
                    assert_eq!(chapter["video_url"], "https://cdn.example.com/ownership.mp4");
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_owner_cannot_buy_own_course_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 0)
        .step(signin_teacher_action())
        .step(purchase_action().with_expect(StatusCode::BAD_REQUEST))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_purchase_codes_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 100)
        // students cannot mint codes
        .step(
            Action::new("codes_generate_student", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/codes", id_of(ctx, "course")))
                .with_body(json!({ "count": 1 }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_teacher_action())
        .step(
            Action::new("codes_generate_too_many", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/codes", id_of(ctx, "course")))
                .with_body(json!({ "count": 101 }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("codes_generate_zero", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/codes", id_of(ctx, "course")))
                .with_body(json!({ "count": 0 }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("codes_generate", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/codes", id_of(ctx, "course")))
                .with_body(json!({ "count": 2 }))
                .with_save_as("codes")
                .assert_body(|body| {
                    let codes = json_body(body);
                    let codes = codes.as_array().cloned().unwrap_or_default();
                    assert_eq!(codes.len(), 2);
                    assert_ne!(codes[0]["code"], codes[1]["code"]);
                    for code in &codes {
                        assert_eq!(code["code"].as_str().map(str::len), Some(12));
                        assert_eq!(code["is_used"], false);
                    }
                }),
        )
        .step(signin_student_action())
        .step(
            Action::new("redeem_unknown", "POST", "/api/v1/codes/redeem")
                .with_body(json!({ "code": "NOSUCHCODE00" }))
                .with_expect(StatusCode::NOT_FOUND)
                .assert_body(|body| assert_eq!(error_code(body), "codeNotFound")),
        )
        .step(redeem_action("codes").assert_body(|body| {
            let redeemed = json_body(body);
            assert_eq!(redeemed["code"]["is_used"], true);
            assert_eq!(redeemed["purchase"]["source"], "code");
        }))
        .step(
            redeem_action("codes")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert_eq!(error_code(body), "codeAlreadyUsed")),
        )
        // the course is already owned, the second code must survive
        .step(
            Action::new("redeem_second", "POST", "/api/v1/codes/redeem")
                .with_dyn_body(|ctx| json!({ "code": ctx.get("codes")[1]["code"] }))
                .with_expect(StatusCode::CONFLICT)
                .assert_body(|body| assert_eq!(error_code(body), "alreadyPurchased")),
        )
        .step(signin_teacher_action())
        .step(
            Action::new("codes_list", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/codes", id_of(ctx, "course")))
                .assert_body(|body| {
                    let codes = json_body(body);
                    let used = codes
                        .as_array()
                        .map(|c| c.iter().filter(|c| c["is_used"] == true).count());
                    assert_eq!(used, Some(1));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_admin_grant_and_revoke_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    with_published_course(Flow::new(), 100)
        .step(
            Action::new("grant_student", "POST", "/api/v1/admin/purchases")
                .with_dyn_body(|ctx| {
                    json!({ "user_id": id_of(ctx, "student"), "course_id": id_of(ctx, "course") })
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(signin_admin_action())
        .step(
            Action::new("grant", "POST", "/api/v1/admin/purchases")
                .with_dyn_body(|ctx| {
                    json!({ "user_id": id_of(ctx, "student"), "course_id": id_of(ctx, "course") })
                })
                .assert_body(|body| assert_eq!(json_body(body)["source"], "grant")),
        )
        .step(
            Action::new("grant_again", "POST", "/api/v1/admin/purchases")
                .with_dyn_body(|ctx| {
                    json!({ "user_id": id_of(ctx, "student"), "course_id": id_of(ctx, "course") })
                })
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("grant_unknown_course", "POST", "/api/v1/admin/purchases")
                .with_dyn_body(|ctx| {
                    json!({
                        "user_id": id_of(ctx, "student"),
                        "course_id": "00000000-0000-0000-0000-000000000001",
                    })
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("revoke", "DELETE", "dynamic").with_dyn_path(|ctx| {
                format!(
                    "/api/v1/admin/purchases/{}/{}",
                    id_of(ctx, "student"),
                    id_of(ctx, "course")
                )
            }),
        )
        .step(
            Action::new("revoke_again", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/admin/purchases/{}/{}",
                        id_of(ctx, "student"),
                        id_of(ctx, "course")
                    )
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_concurrent_purchases_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let ctx = with_published_course(Flow::new(), 100)
        .step(signin_teacher_action())
        .step(
            Action::new("course_create", "POST", "/api/v1/courses")
                .with_body(json!({
                    "title": "Rust 102",
                    "description": "Traits and generics",
                    "price": 100,
                }))
                .with_save_as("second_course"),
        )
        .step(
            Action::new("chapter_create", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}/chapters", id_of(ctx, "second_course"))
                })
                .with_body(json!({ "title": "Traits" }))
                .with_save_as("second_chapter"),
        )
        .step(publish_chapter_action("second_chapter", "Traits", true))
        .step(
            Action::new("course_publish", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "second_course")))
                .with_body(json!({
                    "title": "Rust 102",
                    "description": "Traits and generics",
                    "price": 100,
                    "image_url": null,
                    "is_published": true,
                })),
        )
        .step(signin_admin_action())
        .step(credit_action("student", 150))
        .step(signin_student_action())
        .play(&mut server)
        .await;

    // enough balance for one course only
    let first_path = format!("/api/v1/courses/{}/purchase", id_of(&ctx, "course"));
    let second_path = format!("/api/v1/courses/{}/purchase", id_of(&ctx, "second_course"));
    let (first, second) = tokio::join!(
        async { server.post(&first_path).await },
        async { server.post(&second_path).await },
    );

    let loser = single_winner(first, second);
    loser.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(loser.json::<Value>()["error"], "insufficientBalance");

    let wallet = server.get("/api/v1/balance").await.json::<Value>();
    assert_eq!(wallet["balance"], 50);
    assert_eq!(wallet["transactions"].as_array().map(Vec::len), Some(2));

    drop(pool);
}

#[tokio::test]
async fn route_concurrent_redeem_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let mut other = setup_server(&pool).await;

    let ctx = with_published_course(Flow::new(), 100)
        .step(signin_teacher_action())
        .step(
            Action::new("codes_generate", "POST", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}/codes", id_of(ctx, "course")))
                .with_body(json!({ "count": 1 }))
                .with_save_as("codes"),
        )
        .step(signin_student_action())
        .play(&mut server)
        .await;

    Flow::new()
        .step(signup_action("+201000000003", "Omar Student", "omar-pass"))
        .play(&mut other)
        .await;

    let body = json!({ "code": ctx.get("codes")[0]["code"] });
    let (first, second) = tokio::join!(
        async { server.post("/api/v1/codes/redeem").json(&body).await },
        async { other.post("/api/v1/codes/redeem").json(&body).await },
    );

    let loser = single_winner(first, second);
    loser.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(loser.json::<Value>()["error"], "codeAlreadyUsed");

    drop(pool);
}
