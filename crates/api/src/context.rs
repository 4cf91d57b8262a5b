use warden_auth::Principal;
use warden_core::UserId;

/// Principal context for a request, inserted by the authentication step.
///
/// Lives only in the request's extensions; dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn principal_id(&self) -> UserId {
        self.principal.id
    }
}
