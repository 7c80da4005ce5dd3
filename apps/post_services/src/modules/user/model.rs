use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Acting identity attached to an authenticated request. The credential
/// column of the user record is never loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserPayload {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
}
