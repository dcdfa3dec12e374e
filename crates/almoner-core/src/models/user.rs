use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::Document;
use super::activity::Actor;
use crate::keys;

/// A staff account. Credentials live with the identity provider; `subject`
/// is the provider's stable user identifier (`sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserAccount {
    pub id: Uuid,
    pub subject: String,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub department_id: Option<Uuid>,
    pub roles: Vec<Role>,
    pub active: bool,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Document for UserAccount {
    const COLLECTION: &'static str = keys::USERS;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl UserAccount {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Inactive accounts hold no permissions, whatever their roles.
    pub fn can(&self, permission: Permission) -> bool {
        self.active && self.roles.iter().any(|role| role.grants(permission))
    }

    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            name: self.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Administrator,
    SocialWorker,
    DepartmentStaff,
    Auditor,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Administrator,
        Role::SocialWorker,
        Role::DepartmentStaff,
        Role::Auditor,
    ];

    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Administrator => &Permission::ALL,
            Role::SocialWorker => &[
                ViewPatients,
                EditPatients,
                ArchivePatients,
                ViewAssignments,
                RequestAssignments,
                WorkAssignments,
                ViewDepartments,
                ExportRecords,
            ],
            Role::DepartmentStaff => &[
                ViewPatients,
                ViewAssignments,
                RequestAssignments,
                ViewDepartments,
            ],
            Role::Auditor => &[
                ViewPatients,
                ViewAssignments,
                ViewDepartments,
                ViewUsers,
                ViewActivity,
            ],
        }
    }

    pub fn grants(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::SocialWorker => "social_worker",
            Role::DepartmentStaff => "department_staff",
            Role::Auditor => "auditor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Permission {
    ViewPatients,
    EditPatients,
    ArchivePatients,
    DeletePatients,
    ViewAssignments,
    RequestAssignments,
    WorkAssignments,
    ViewDepartments,
    ManageDepartments,
    ViewUsers,
    ManageUsers,
    ViewActivity,
    ExportRecords,
    ManageSystem,
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Permission::ViewPatients,
        Permission::EditPatients,
        Permission::ArchivePatients,
        Permission::DeletePatients,
        Permission::ViewAssignments,
        Permission::RequestAssignments,
        Permission::WorkAssignments,
        Permission::ViewDepartments,
        Permission::ManageDepartments,
        Permission::ViewUsers,
        Permission::ManageUsers,
        Permission::ViewActivity,
        Permission::ExportRecords,
        Permission::ManageSystem,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewPatients => "view_patients",
            Permission::EditPatients => "edit_patients",
            Permission::ArchivePatients => "archive_patients",
            Permission::DeletePatients => "delete_patients",
            Permission::ViewAssignments => "view_assignments",
            Permission::RequestAssignments => "request_assignments",
            Permission::WorkAssignments => "work_assignments",
            Permission::ViewDepartments => "view_departments",
            Permission::ManageDepartments => "manage_departments",
            Permission::ViewUsers => "view_users",
            Permission::ManageUsers => "manage_users",
            Permission::ViewActivity => "view_activity",
            Permission::ExportRecords => "export_records",
            Permission::ManageSystem => "manage_system",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
