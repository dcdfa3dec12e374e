use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use almoner_core::models::activity::Actor;
use almoner_core::models::user::{Permission, UserAccount};

use crate::error::AuthError;
use crate::jwt::TokenVerifier;
use crate::users::UserDirectory;

/// The authenticated user behind a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub user: UserAccount,
}

impl Principal {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn actor(&self) -> Actor {
        self.user.actor()
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.user.can(permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), AuthError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden { permission })
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.can(*p))
            .collect()
    }
}

/// Resolves bearer tokens to registered, active users.
#[derive(Clone)]
pub struct Authenticator {
    verifier: TokenVerifier,
    users: UserDirectory,
}

impl Authenticator {
    pub fn new(verifier: TokenVerifier, users: UserDirectory) -> Self {
        Self { verifier, users }
    }

    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.verifier.verify(token)?;
        let user = self
            .users
            .find_by_subject(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::UnknownSubject(claims.sub.clone()))?
            .into_inner();

        if !user.active {
            return Err(AuthError::Inactive(user.username));
        }
        debug!(user_id = %user.id, "authenticated");
        Ok(Principal { user })
    }
}
