//! Authenticated user record.

use serde::{Deserialize, Serialize};

use super::{UserId, UserRole};

/// The user the backend resolved for the current bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthUser {
    /// Route this user lands on after login.
    #[must_use]
    pub const fn destination(&self) -> &'static str {
        self.role.destination()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_user() {
        let user: AuthUser =
            serde_json::from_str(r#"{"id":3,"name":"Ada Obi","role":"teacher"}"#).unwrap();
        assert_eq!(user.id, UserId::new(3));
        assert_eq!(user.role, UserRole::Teacher);
        assert!(user.email.is_none());
        assert_eq!(user.destination(), "/teacher/dashboard");
    }

    #[test]
    fn test_unknown_role_still_deserializes() {
        let user: AuthUser =
            serde_json::from_str(r#"{"id":4,"name":"Sam","role":"bursar"}"#).unwrap();
        assert_eq!(user.destination(), "/");
    }
}
