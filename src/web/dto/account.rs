use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    pub phone_number: String,
    pub full_name: String,
    pub password: String,
}

pub const MIN_PASSWORD_LENGTH: usize = 6;

impl SignupBody {
    pub fn validate(&self) -> Result<(), String> {
        if self.phone_number.trim().is_empty() {
            return Err(String::from("phone number must not be empty"));
        }
        if self.full_name.trim().is_empty() {
            return Err(String::from("full name must not be empty"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters long"
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserUpdateBody {
    pub phone_number: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RoleUpdateBody {
    /// One of `student`, `teacher`, `admin`
    pub role: String,
}
