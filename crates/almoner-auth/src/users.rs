use std::sync::Arc;

use jiff::{Timestamp, Zoned};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use almoner_audit::events::{self, AuditEvent};
use almoner_audit::trail::AuditTrail;
use almoner_core::keys;
use almoner_core::models::activity::{ActivityAction, Actor, ResourceType};
use almoner_core::models::department::Department;
use almoner_core::models::user::{Role, UserAccount};
use almoner_core::validation::{ValidationError, ValidationErrors, validate_all};
use almoner_storage::claim;
use almoner_storage::error::StorageError;
use almoner_storage::json;
use almoner_storage::repository::{Repository, Versioned};
use almoner_storage::store::{DocumentStore, Precondition};
use almoner_storage::unit_of_work::{CommitReceipt, UnitOfWork};

use crate::error::AuthError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub subject: String,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department_id: Option<Uuid>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department_id: Option<Uuid>,
}

/// Ids of the active administrators, kept at [`keys::ADMIN_ROSTER`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct AdminRoster {
    administrators: Vec<Uuid>,
}

/// Staff accounts, stored one document per user.
#[derive(Clone)]
pub struct UserDirectory {
    users: Repository<UserAccount>,
    departments: Repository<Department>,
    store: Arc<dyn DocumentStore>,
    trail: AuditTrail,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, trail: AuditTrail) -> Self {
        Self {
            users: Repository::new(Arc::clone(&store)),
            departments: Repository::new(Arc::clone(&store)),
            store,
            trail,
        }
    }

    pub async fn register(
        &self,
        actor: &Actor,
        new: NewUser,
    ) -> Result<Versioned<UserAccount>, AuthError> {
        let now = Timestamp::now();
        let account = UserAccount {
            id: Uuid::new_v4(),
            subject: new.subject.trim().to_string(),
            username: new.username.trim().to_string(),
            display_name: new.display_name.trim().to_string(),
            email: new.email,
            department_id: new.department_id,
            roles: dedup_roles(new.roles),
            active: true,
            created_at: now,
            updated_at: now,
        };
        validate_all(&account, today())?;
        self.check_department(account.department_id).await?;

        let subject_key = keys::subject_claim(&account.subject);
        let username_key = keys::username_claim(&account.username);
        if claim::owner(self.store.as_ref(), &subject_key).await?.is_some() {
            return Err(subject_taken(&account));
        }
        if claim::owner(self.store.as_ref(), &username_key).await?.is_some() {
            return Err(username_taken(&account));
        }

        let event = AuditEvent::new(ActivityAction::Create, ResourceType::User, actor)
            .resource(account.id)
            .summary(format!("registered user {}", account.username))
            .with_details(json!({ "roles": account.roles }));

        let mut uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.insert(&account)?;
        uow.claim(subject_key, account.id)?;
        uow.claim(username_key, account.id)?;
        self.stage_roster(&mut uow, None, &account).await?;
        let record = self.trail.stage(&mut uow, event)?;
        let receipt = commit(uow, &account).await?;
        events::emit(&record);

        info!(user_id = %account.id, username = %account.username, "user registered");
        let etag = receipt.etag_of(&account).unwrap_or_default().to_string();
        Ok(Versioned {
            value: account,
            etag,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Versioned<UserAccount>, AuthError> {
        self.users
            .find(id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(id.to_string()))
    }

    /// Every account, sorted by username.
    pub async fn list(&self) -> Result<Vec<Versioned<UserAccount>>, AuthError> {
        let mut users = self.users.list().await?;
        users.sort_by_key(|u| u.value.username.to_lowercase());
        Ok(users)
    }

    /// Resolve a token subject through its claim, without listing accounts.
    pub async fn find_by_subject(
        &self,
        subject: &str,
    ) -> Result<Option<Versioned<UserAccount>>, AuthError> {
        self.find_claimed(&keys::subject_claim(subject)).await
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Versioned<UserAccount>>, AuthError> {
        self.find_claimed(&keys::username_claim(username.trim()))
            .await
    }

    async fn find_claimed(&self, key: &str) -> Result<Option<Versioned<UserAccount>>, AuthError> {
        match claim::owner(self.store.as_ref(), key).await? {
            Some(id) => Ok(self.users.find(id).await?),
            None => Ok(None),
        }
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        update: ProfileUpdate,
    ) -> Result<Versioned<UserAccount>, AuthError> {
        let current = self.get(id).await?.into_inner();
        let mut account = current.clone();
        account.display_name = update.display_name.trim().to_string();
        account.email = update.email;
        account.department_id = update.department_id;
        validate_all(&account, today())?;
        self.check_department(account.department_id).await?;

        let event = AuditEvent::new(ActivityAction::Update, ResourceType::User, actor)
            .resource(id)
            .summary(format!("updated profile of {}", account.username));
        self.save(&current, account, etag, event).await
    }

    /// Replace a user's roles. Duplicates are dropped.
    pub async fn set_roles(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
        roles: Vec<Role>,
    ) -> Result<Versioned<UserAccount>, AuthError> {
        let current = self.get(id).await?.into_inner();
        let mut account = current.clone();
        account.roles = dedup_roles(roles);

        let event = AuditEvent::new(ActivityAction::RoleChange, ResourceType::User, actor)
            .resource(id)
            .summary(format!("changed roles of {}", account.username))
            .with_details(json!({ "from": current.roles, "to": account.roles }));
        self.save(&current, account, etag, event).await
    }

    pub async fn deactivate(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
    ) -> Result<Versioned<UserAccount>, AuthError> {
        let current = self.get(id).await?.into_inner();
        let mut account = current.clone();
        account.active = false;

        let event = AuditEvent::new(ActivityAction::Deactivate, ResourceType::User, actor)
            .resource(id)
            .summary(format!("deactivated {}", account.username));
        self.save(&current, account, etag, event).await
    }

    pub async fn activate(
        &self,
        actor: &Actor,
        id: Uuid,
        etag: &str,
    ) -> Result<Versioned<UserAccount>, AuthError> {
        let current = self.get(id).await?.into_inner();
        let mut account = current.clone();
        account.active = true;

        let event = AuditEvent::new(ActivityAction::Activate, ResourceType::User, actor)
            .resource(id)
            .summary(format!("activated {}", account.username));
        self.save(&current, account, etag, event).await
    }

    /// Active users holding `role`, sorted by username.
    pub async fn users_in_role(&self, role: Role) -> Result<Vec<UserAccount>, AuthError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(Versioned::into_inner)
            .filter(|u| u.active && u.has_role(role))
            .collect())
    }

    pub async fn roles_for(&self, id: Uuid) -> Result<Vec<Role>, AuthError> {
        Ok(self.get(id).await?.value.roles)
    }

    async fn save(
        &self,
        before: &UserAccount,
        mut account: UserAccount,
        etag: &str,
        event: AuditEvent,
    ) -> Result<Versioned<UserAccount>, AuthError> {
        account.updated_at = Timestamp::now();

        let mut uow = UnitOfWork::new(Arc::clone(&self.store));
        uow.replace(&account, etag)?;
        self.stage_roster(&mut uow, Some(before), &account).await?;
        let record = self.trail.stage(&mut uow, event)?;
        let receipt = commit(uow, &account).await?;
        events::emit(&record);

        let etag = receipt.etag_of(&account).unwrap_or_default().to_string();
        Ok(Versioned {
            value: account,
            etag,
        })
    }

    /// Stage a roster rewrite when `after` joins or leaves the active
    /// administrators. Refuses to leave the roster empty.
    ///
    /// The rewrite is conditional on the roster's ETag, so of two concurrent
    /// changes to the administrator set only one commits.
    async fn stage_roster(
        &self,
        uow: &mut UnitOfWork,
        before: Option<&UserAccount>,
        after: &UserAccount,
    ) -> Result<(), AuthError> {
        let was_admin = before.is_some_and(is_active_admin);
        let is_admin = is_active_admin(after);
        if was_admin == is_admin {
            return Ok(());
        }

        let (mut roster, precondition) = self.load_roster().await?;
        roster.administrators.retain(|id| *id != after.id);
        if is_admin {
            roster.administrators.push(after.id);
        } else if roster.administrators.is_empty() {
            return Err(AuthError::LastAdministrator);
        }
        uow.put_json(keys::ADMIN_ROSTER, &roster, precondition)?;
        Ok(())
    }

    async fn load_roster(&self) -> Result<(AdminRoster, Precondition), AuthError> {
        match json::find_json::<AdminRoster>(self.store.as_ref(), keys::ADMIN_ROSTER).await? {
            Some((roster, etag)) => Ok((roster, Precondition::IfMatch(etag))),
            None => {
                // No roster yet: seed it from the accounts.
                let administrators = self
                    .users
                    .list()
                    .await?
                    .into_iter()
                    .filter(|u| is_active_admin(&u.value))
                    .map(|u| u.value.id)
                    .collect();
                Ok((AdminRoster { administrators }, Precondition::IfAbsent))
            }
        }
    }

    async fn check_department(&self, department_id: Option<Uuid>) -> Result<(), AuthError> {
        let Some(id) = department_id else {
            return Ok(());
        };
        if self.departments.find(id).await?.is_some() {
            Ok(())
        } else {
            Err(AuthError::Validation(ValidationErrors(vec![
                ValidationError::new("department_id", "unknown department"),
            ])))
        }
    }
}

fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut unique = Vec::with_capacity(roles.len());
    for role in roles {
        if !unique.contains(&role) {
            unique.push(role);
        }
    }
    unique
}

fn is_active_admin(account: &UserAccount) -> bool {
    account.active && account.has_role(Role::Administrator)
}

/// Commit a user change, reporting a lost uniqueness race as a duplicate.
async fn commit(uow: UnitOfWork, account: &UserAccount) -> Result<CommitReceipt, AuthError> {
    uow.commit().await.map_err(|e| match e {
        StorageError::PreconditionFailed { key } if key.starts_with(keys::SUBJECT_CLAIMS) => {
            subject_taken(account)
        }
        StorageError::PreconditionFailed { key } if key.starts_with(keys::USERNAME_CLAIMS) => {
            username_taken(account)
        }
        other => other.into(),
    })
}

fn subject_taken(account: &UserAccount) -> AuthError {
    AuthError::Duplicate(format!("subject {} is already registered", account.subject))
}

fn username_taken(account: &UserAccount) -> AuthError {
    AuthError::Duplicate(format!("username {} is taken", account.username))
}

fn today() -> jiff::civil::Date {
    Zoned::now().date()
}
