use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::user_signup_handler,
        crate::web::routes::account::user_signin_handler,
        crate::web::routes::account::user_signout_handler,
        crate::web::routes::account::user_me_handler,
        crate::web::routes::account::user_verify_handler,
        crate::web::routes::account::user_list_handler,
        crate::web::routes::account::user_update_handler,
        crate::web::routes::account::user_role_handler,
        crate::web::routes::account::user_delete_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_mine_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::courses::courses_purchase_handler,
        crate::web::routes::courses::courses_codes_generate_handler,
        crate::web::routes::courses::courses_codes_list_handler,
        crate::web::routes::courses::courses_grades_handler,
        crate::web::routes::courses::courses_chapter_create_handler,
        crate::web::routes::courses::courses_chapter_reorder_handler,
        crate::web::routes::courses::courses_attachment_create_handler,
        crate::web::routes::courses::courses_quiz_create_handler,
        crate::web::routes::chapters::chapters_get_handler,
        crate::web::routes::chapters::chapters_update_handler,
        crate::web::routes::chapters::chapters_delete_handler,
        crate::web::routes::chapters::chapters_progress_handler,
        crate::web::routes::attachments::attachments_delete_handler,
        crate::web::routes::quizzes::quizzes_get_handler,
        crate::web::routes::quizzes::quizzes_update_handler,
        crate::web::routes::quizzes::quizzes_delete_handler,
        crate::web::routes::quizzes::quizzes_question_create_handler,
        crate::web::routes::quizzes::quizzes_submit_handler,
        crate::web::routes::quizzes::quizzes_results_handler,
        crate::web::routes::quizzes::questions_update_handler,
        crate::web::routes::quizzes::questions_delete_handler,
        crate::web::routes::commerce::codes_redeem_handler,
        crate::web::routes::commerce::balance_get_handler,
        crate::web::routes::commerce::admin_credit_handler,
        crate::web::routes::commerce::admin_grant_handler,
        crate::web::routes::commerce::admin_revoke_handler,
        crate::web::routes::progress::progress_dashboard_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Registration, sessions and user management"),
        (name = "courses", description = "Course catalog and authoring"),
        (name = "chapters", description = "Chapter content and ordering"),
        (name = "attachments", description = "Course resources"),
        (name = "quizzes", description = "Quizzes, questions and grading"),
        (name = "commerce", description = "Purchases, codes and balance"),
        (name = "progress", description = "Learning progress"),
        (name = "admin", description = "Staff-only operations"),
    )
)]
pub struct ApiDoc;
