use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::models::UserRole;

/// Principal resolved by the auth middleware and carried in request extensions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owner-or-admin check used by per-order operations
    pub fn can_access_order_of(&self, owner_id: Uuid) -> bool {
        self.id == owner_id || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn admin_can_access_any_order() {
        let admin = user(UserRole::Admin);
        assert!(admin.can_access_order_of(Uuid::new_v4()));
    }

    #[test]
    fn photographer_can_only_access_own_orders() {
        let photographer = user(UserRole::Photographer);
        assert!(photographer.can_access_order_of(photographer.id));
        assert!(!photographer.can_access_order_of(Uuid::new_v4()));
    }
}
