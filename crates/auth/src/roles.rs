//! RBAC roles.
//!
//! Roles form a closed set: a principal's capabilities are decided entirely
//! by which of these it holds within its institute. A principal may hold
//! zero, one, or many roles at once.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use instihub_core::DomainError;

/// Application role, granted per principal by privileged setup/creation
/// flows and never directly editable by the principal itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    InstituteAdmin,
    Teacher,
    Student,
    Parent,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::InstituteAdmin => "institute_admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "institute_admin" => Ok(Role::InstituteAdmin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}

/// The set of roles held by one principal.
///
/// The derived predicates are pure functions of the set contents: computing
/// them twice over the same set always yields identical results, and nothing
/// is cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn is_institute_admin(&self) -> bool {
        self.contains(Role::InstituteAdmin)
    }

    pub fn is_teacher(&self) -> bool {
        self.contains(Role::Teacher)
    }

    pub fn is_student(&self) -> bool {
        self.contains(Role::Student)
    }

    pub fn is_parent(&self) -> bool {
        self.contains(Role::Parent)
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Role>> for RoleSet {
    fn from(roles: Vec<Role>) -> Self {
        roles.into_iter().collect()
    }
}
