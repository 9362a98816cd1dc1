//! Role ladder and admin-operation authorization table
//!
//! Routes are gated by an ordered role enum; admin console operations are
//! whitelisted explicitly so an unknown operation is rejected rather than
//! silently allowed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform roles, ordered by privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Role {
    /// No authentication - waitlist and health endpoints only
    Public = 0,
    /// Authenticated member - sprint, forum, directory, merch
    #[default]
    Member = 1,
    /// Admin - role/content management console
    Admin = 2,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Public => write!(f, "public"),
            Role::Member => write!(f, "member"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl Role {
    /// Parse a role from its wire form (JWT claims, admin requests)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Role::Public),
            "member" => Some(Role::Member),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Admin console operations, enumerated so the authorization table is
/// exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminOperation {
    ListMembers,
    ChangeRole,
    ChangeStatus,
    DeleteMember,
    CreateVideo,
    DeleteVideo,
    DeleteThread,
}

/// Get the required role for an admin console operation
pub fn required_role(operation: AdminOperation) -> Role {
    match operation {
        AdminOperation::ListMembers
        | AdminOperation::ChangeRole
        | AdminOperation::ChangeStatus
        | AdminOperation::DeleteMember
        | AdminOperation::CreateVideo
        | AdminOperation::DeleteVideo
        | AdminOperation::DeleteThread => Role::Admin,
    }
}

/// Check if an operation is allowed for the given role
pub fn is_operation_allowed(operation: AdminOperation, role: Role) -> bool {
    role >= required_role(operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Member);
        assert!(Role::Member > Role::Public);
    }

    #[test]
    fn test_admin_operations_denied_to_members() {
        assert!(!is_operation_allowed(AdminOperation::ListMembers, Role::Member));
        assert!(!is_operation_allowed(AdminOperation::ChangeRole, Role::Member));
        assert!(!is_operation_allowed(AdminOperation::CreateVideo, Role::Member));
        assert!(!is_operation_allowed(AdminOperation::DeleteVideo, Role::Member));
        assert!(!is_operation_allowed(AdminOperation::DeleteThread, Role::Member));
        assert!(!is_operation_allowed(AdminOperation::DeleteThread, Role::Public));
    }

    #[test]
    fn test_admin_operations_allowed_to_admins() {
        assert!(is_operation_allowed(AdminOperation::ListMembers, Role::Admin));
        assert!(is_operation_allowed(AdminOperation::DeleteVideo, Role::Admin));
    }

    #[test]
    fn test_role_parse_round_trip() {
        for role in [Role::Public, Role::Member, Role::Admin] {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }
}
