use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{CryptError, CryptResult};

pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn for_user(user_id: Uuid) -> Self {
        let exp = (chrono::Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS)).timestamp();
        Self {
            sub: user_id.to_string(),
            exp,
        }
    }

    pub fn user_id(&self) -> CryptResult<Uuid> {
        self.sub
            .parse::<Uuid>()
            .map_err(|_| CryptError::InvalidSubject(self.sub.clone()))
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let header = Header::default();
    let key = EncodingKey::from_secret(key.as_ref());

    let token = jsonwebtoken::encode(&header, &claims, &key)?;
    Ok(token)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(key.as_ref());

    let claims = jsonwebtoken::decode::<UserClaims>(token, &key, &validation)?;
    Ok(claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_carries_subject() {
        let id = uuid::Uuid::new_v4();
        let token = generate_token(UserClaims::for_user(id), "key").unwrap();
        let data = process_token(&token, "key").unwrap();
        assert_eq!(data.claims.sub, id.to_string());
        assert_eq!(data.claims.user_id().unwrap(), id);
    }

    #[test]
    fn foreign_subject_rejected() {
        let claims = UserClaims {
            sub: String::from("admin"),
            exp: 0,
        };
        assert!(matches!(
            claims.user_id(),
            Err(CryptError::InvalidSubject(_))
        ));
    }

    #[test]
    fn wrong_key_rejected() {
        let token = generate_token(UserClaims::for_user(uuid::Uuid::new_v4()), "key").unwrap();
        assert!(process_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let claims = UserClaims {
            sub: uuid::Uuid::new_v4().to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(2)).timestamp(),
        };
        let token = generate_token(claims, "key").unwrap();
        let err = process_token(&token, "key").unwrap_err();
        assert_eq!(
            err.kind(),
            &jsonwebtoken::errors::ErrorKind::ExpiredSignature
        );
    }
}
