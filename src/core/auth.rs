//! Authenticated principal as seen by the query engine
//!
//! Authentication itself happens upstream; the auth layer inserts an
//! [`AuthContext`] into the request extensions and the engine only reads the
//! tenant from it.

use crate::core::error::RequestError;
use crate::core::tenant::TenantId;
use uuid::Uuid;

/// Authorization context extracted from a request
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// Authenticated user
    User {
        user_id: Uuid,
        tenant_id: TenantId,
        roles: Vec<String>,
    },

    /// Service-to-service communication
    Service {
        service_name: String,
        tenant_id: Option<TenantId>,
    },

    /// System administrator, not bound to an account
    Admin { admin_id: Uuid },

    /// No authentication (public access)
    Anonymous,
}

impl AuthContext {
    /// Get tenant_id from context if available
    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            AuthContext::User { tenant_id, .. } => Some(*tenant_id),
            AuthContext::Service { tenant_id, .. } => *tenant_id,
            AuthContext::Admin { .. } => None,
            AuthContext::Anonymous => None,
        }
    }

    /// The tenant every query of this request must be scoped to
    pub fn require_tenant(&self) -> Result<TenantId, RequestError> {
        self.tenant_id().ok_or(RequestError::MissingTenant)
    }

    /// Get user_id if available
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::User { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_carries_tenant() {
        let tenant = TenantId::from(Uuid::new_v4());
        let context = AuthContext::User {
            user_id: Uuid::new_v4(),
            tenant_id: tenant,
            roles: vec!["pilot".to_string()],
        };
        assert_eq!(context.require_tenant().ok(), Some(tenant));
        assert!(context.user_id().is_some());
    }

    #[test]
    fn test_service_without_tenant() {
        let context = AuthContext::Service {
            service_name: "reporting".to_string(),
            tenant_id: None,
        };
        assert!(matches!(
            context.require_tenant(),
            Err(RequestError::MissingTenant)
        ));
    }

    #[test]
    fn test_anonymous_and_admin_have_no_tenant() {
        assert!(AuthContext::Anonymous.tenant_id().is_none());
        let admin = AuthContext::Admin {
            admin_id: Uuid::new_v4(),
        };
        assert!(admin.tenant_id().is_none());
        assert!(admin.user_id().is_none());
    }
}
