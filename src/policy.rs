//! Role-based authorization policy.
//!
//! Every handler states the permission it needs through
//! [`UserClaims::require`](crate::models::user::UserClaims::require); the
//! role → permission table below is the only place access rules live.

use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// List and view tools and activities
    ReadInventory,
    /// Create, update and delete tools and activities
    WriteInventory,
    /// Produce HTML and spreadsheet reports
    ExportReports,
    /// List and view other users
    ReadUsers,
    /// Create, edit, delete users and change roles
    ManageUsers,
}

impl Permission {
    pub fn denial_message(&self) -> &'static str {
        match self {
            Permission::ReadInventory => "Insufficient rights to read inventory",
            Permission::WriteInventory => "Insufficient rights to modify inventory",
            Permission::ExportReports => "Insufficient rights to export reports",
            Permission::ReadUsers => "Insufficient rights to read users",
            Permission::ManageUsers => "Superadmin privileges required",
        }
    }
}

impl Role {
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ReadInventory | Permission::ExportReports => true,
            Permission::WriteInventory | Permission::ReadUsers => *self >= Role::Admin,
            Permission::ManageUsers => *self == Role::Superadmin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_is_read_only() {
        assert!(Role::Viewer.allows(Permission::ReadInventory));
        assert!(Role::Viewer.allows(Permission::ExportReports));
        assert!(!Role::Viewer.allows(Permission::WriteInventory));
        assert!(!Role::Viewer.allows(Permission::ReadUsers));
        assert!(!Role::Viewer.allows(Permission::ManageUsers));
    }

    #[test]
    fn test_admin_manages_inventory_not_users() {
        assert!(Role::Admin.allows(Permission::WriteInventory));
        assert!(Role::Admin.allows(Permission::ReadUsers));
        assert!(!Role::Admin.allows(Permission::ManageUsers));
    }

    #[test]
    fn test_superadmin_allows_everything() {
        for permission in [
            Permission::ReadInventory,
            Permission::WriteInventory,
            Permission::ExportReports,
            Permission::ReadUsers,
            Permission::ManageUsers,
        ] {
            assert!(Role::Superadmin.allows(permission));
        }
    }
}
