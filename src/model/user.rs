use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Public view of an account. Credential material never leaves the store.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "john@email.com")]
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
}
