use instihub_core::PrincipalId;

/// Authenticated caller for a request.
///
/// Derived from the bearer token by the auth middleware; must be present on
/// all protected routes. Authorization (roles, tenant match) happens in the
/// provisioning layer against the directory, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    principal_id: PrincipalId,
    email: String,
}

impl CallerContext {
    pub fn new(principal_id: PrincipalId, email: String) -> Self {
        Self {
            principal_id,
            email,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
