//! Tenant-scoped domain records.
//!
//! These are the semantic records behind the hosted schema: every record
//! except `Institute` carries the `InstituteId` it belongs to, and all
//! queries for non-super-admin callers are filtered by that id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{BatchId, CourseId, InstituteId, PrincipalId};

/// User-facing identity record, one per principal.
///
/// `institute_id` is `None` until tenant setup completes and is immutable
/// once set (no cross-tenant reassignment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: PrincipalId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub institute_id: Option<InstituteId>,
    pub is_active: bool,
}

/// The tenant: owns profiles, students, teachers, courses, batches, fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institute {
    pub id: InstituteId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a student record.
///
/// Students are never hard-deleted; leaving the institute marks them `Left`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Left,
}

/// Per-student detail record (one per student profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetail {
    pub profile_id: PrincipalId,
    pub institute_id: InstituteId,
    pub course_id: Option<CourseId>,
    pub batch_id: Option<BatchId>,
    pub registration_number: Option<String>,
    pub roll_number: Option<String>,
    pub status: StudentStatus,
    pub is_verified: bool,
    pub is_blocked: bool,
    pub blocked_reason: Option<String>,
    pub total_fee: f64,
    pub paid_fee: f64,
}

impl StudentDetail {
    /// Outstanding fee, computed on read.
    ///
    /// Never stored: deriving it here removes a class of consistency bugs
    /// between the total/paid/pending columns.
    pub fn pending_fee(&self) -> f64 {
        (self.total_fee - self.paid_fee).max(0.0)
    }
}

/// Per-teacher detail record (one per teacher profile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherDetail {
    pub profile_id: PrincipalId,
    pub institute_id: InstituteId,
    pub employee_id: String,
    pub qualification: Option<String>,
    pub subjects: Vec<String>,
    pub salary: f64,
    pub is_active: bool,
}
