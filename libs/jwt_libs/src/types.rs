use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenClaims<T> {
    pub iat: i64,
    pub exp: i64,
    pub token: T,
}

/// Subject of an access token. Only the user id travels in the token, the
/// rest of the identity is resolved from the user store on every request.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub id: Uuid,
}
