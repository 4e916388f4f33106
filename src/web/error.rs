use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationRoleRequired")]
    AuthenticationRoleRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}")]
    ResourceConflict { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },
}

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("CommerceInsufficientBalance")]
    InsufficientBalance,
    #[error("CommerceAlreadyPurchased")]
    AlreadyPurchased,
    #[error("CommerceCodeNotFound")]
    CodeNotFound,
    #[error("CommerceCodeAlreadyUsed")]
    CodeAlreadyUsed,
    #[error("CommerceMaxAttemptsReached")]
    MaxAttemptsReached,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ValidationBadRequest: {0}")]
    BadRequest(String),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }

    pub fn client_code(&self) -> &'static str {
        "internalError"
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => String::from(
                "Registration error, user with this phone number already exists.",
            ),
        }
    }

    pub fn client_code(&self) -> &'static str {
        match self {
            Self::RegistrationUserConflict => "phoneNumberTaken",
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationRoleRequired => StatusCode::FORBIDDEN,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationRoleRequired => {
                String::from("Authentication error, your role is not allowed to do this.")
            }
            Self::AuthenticationInvalidCredentials => String::from(
                "Authentication error, user not found or password is invalid.",
            ),
        }
    }

    pub fn client_code(&self) -> &'static str {
        match self {
            Self::AuthenticationCookieInvalid { .. } => "sessionInvalid",
            Self::AuthenticationRequired => "unauthorized",
            Self::AuthenticationRoleRequired => "forbidden",
            Self::AuthenticationInvalidCredentials => "invalidCredentials",
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceConflict { .. } => {
                String::from("Resource error, resource was modified concurrently.")
            }
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
        }
    }

    pub fn client_code(&self) -> &'static str {
        match self {
            Self::ResourceNotFound { .. } => "notFound",
            Self::ResourceForbidden { .. } => "forbidden",
            Self::ResourceConflict { .. } => "conflict",
            Self::ResourceFetchError { .. } => "internalError",
        }
    }
}

impl CommerceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InsufficientBalance => StatusCode::BAD_REQUEST,
            Self::AlreadyPurchased => StatusCode::CONFLICT,
            Self::CodeNotFound => StatusCode::NOT_FOUND,
            Self::CodeAlreadyUsed => StatusCode::BAD_REQUEST,
            Self::MaxAttemptsReached => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::InsufficientBalance => String::from("Your balance is too low for this purchase."),
            Self::AlreadyPurchased => String::from("You already own this course."),
            Self::CodeNotFound => String::from("This code does not exist."),
            Self::CodeAlreadyUsed => String::from("This code has already been used."),
            Self::MaxAttemptsReached => {
                String::from("You have used all attempts for this quiz.")
            }
        }
    }

    pub fn client_code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance => "insufficientBalance",
            Self::AlreadyPurchased => "alreadyPurchased",
            Self::CodeNotFound => "codeNotFound",
            Self::CodeAlreadyUsed => "codeAlreadyUsed",
            Self::MaxAttemptsReached => "maxAttemptsReached",
        }
    }
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::BadRequest(reason) => format!("Bad request, {reason}."),
        }
    }

    pub fn client_code(&self) -> &'static str {
        "badRequest"
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("CommerceError - {0}")]
    CommerceError(#[from] CommerceError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    /// Maps model-layer failures onto client errors, falling back to a fetch error.
    pub fn from_database(r#type: ResourceType, error: DatabaseError) -> Self {
        match error {
            DatabaseError::Forbidden => Self::resource_forbidden(r#type),
            DatabaseError::Conflict => Self::ResourceError(ResourceError::ResourceConflict {
                resource_type: r#type,
            }),
            DatabaseError::InsufficientBalance => CommerceError::InsufficientBalance.into(),
            DatabaseError::AlreadyPurchased => CommerceError::AlreadyPurchased.into(),
            DatabaseError::CodeNotFound => CommerceError::CodeNotFound.into(),
            DatabaseError::CodeAlreadyUsed => CommerceError::CodeAlreadyUsed.into(),
            DatabaseError::MaxAttemptsReached => CommerceError::MaxAttemptsReached.into(),
            DatabaseError::Invalid(reason) => Self::bad_request(reason),
            other => Self::resource_fetch_error(r#type, other),
        }
    }

    pub fn bad_request<S: Into<String>>(reason: S) -> Self {
        Self::ValidationError(ValidationError::BadRequest(reason.into()))
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn role_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRoleRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::CommerceError(e) => e.status_code(),
            Self::ValidationError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::CommerceError(e) => e.client_display(),
            Self::ValidationError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }

    pub fn client_code(&self) -> &'static str {
        match self {
            Self::ResourceError(e) => e.client_code(),
            Self::RegistrationError(e) => e.client_code(),
            Self::AuthenticationError(e) => e.client_code(),
            Self::CommerceError(e) => e.client_code(),
            Self::ValidationError(e) => e.client_code(),
            Self::ServerError(e) => e.client_code(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// Stable machine-readable key, e.g. `codeAlreadyUsed`
    pub error: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();

        let body = ErrorResponse {
            message: self.client_display(),
            error: self.client_code().to_string(),
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
