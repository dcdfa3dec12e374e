use axum::{Extension, Json};
use serde::Serialize;

use almoner_auth::principal::Principal;
use almoner_core::models::user::{Permission, UserAccount};

#[derive(Serialize)]
pub struct Me {
    pub user: UserAccount,
    pub permissions: Vec<Permission>,
}

/// The caller's account and effective permissions.
pub async fn current_user(Extension(principal): Extension<Principal>) -> Json<Me> {
    let permissions = principal.permissions();
    Json(Me {
        user: principal.user,
        permissions,
    })
}
