use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use serde::{Deserialize, Serialize};

pub mod types;

use types::{AccessToken, TokenClaims};

impl<T: Serialize> TokenClaims<T> {
    pub fn generate_token(data: T, duration: Duration, secret: &str) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = TokenClaims {
            iat: now.timestamp(),
            exp: (now + duration).timestamp(),
            token: data,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }
}

pub fn decode_token<T>(token: &str, secret: &str) -> Result<TokenData<TokenClaims<T>>, JwtError>
where
    T: for<'de> Deserialize<'de>,
{
    decode::<TokenClaims<T>>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
}

pub fn generate_access_token(data: AccessToken, secret: &str) -> Result<String, JwtError> {
    TokenClaims::<AccessToken>::generate_token(data, Duration::days(1), secret)
}

pub fn decode_access_token(
    token: &str,
    secret: &str,
) -> Result<TokenData<TokenClaims<AccessToken>>, JwtError> {
    decode_token(token, secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn access_token_round_trips_subject() {
        let id = Uuid::new_v4();
        let token = generate_access_token(AccessToken { id }, SECRET).unwrap();

        let decoded = decode_access_token(&token, SECRET).unwrap();
        assert_eq!(decoded.claims.token.id, id);
        assert!(decoded.claims.exp > decoded.claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(AccessToken { id: Uuid::new_v4() }, SECRET).unwrap();
        assert!(decode_access_token(&token, "another-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = TokenClaims::generate_token(
            AccessToken { id: Uuid::new_v4() },
            Duration::hours(-2),
            SECRET,
        )
        .unwrap();

        assert!(decode_access_token(&token, SECRET).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_access_token("not-a-jwt", SECRET).is_err());
    }
}
