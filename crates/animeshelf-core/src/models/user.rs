//! Account models exchanged with the auth backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User identifier. The backend may send a numeric id or a string
/// (document ids), so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{}", id),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Name to greet the user with, falling back to the username.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

/// Success body of login, register and current-user calls: `{ user }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub user: Option<User>,
}

/// Login payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration payload. The confirmation field lives only in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_envelope() {
        let envelope: UserEnvelope =
            serde_json::from_str(r#"{"user":{"id":1,"username":"ann"}}"#).expect("valid user json");
        let user = envelope.user.expect("user present");
        assert_eq!(user.id, UserId::Numeric(1));
        assert_eq!(user.username, "ann");
        assert_eq!(user.display_name(), "ann");
        assert!(user.email.is_none());
    }

    #[test]
    fn test_parse_document_id() {
        let json = r#"{"_id":"65f1c0ffee","username":"mika","name":"Mika","email":"mika@example.test"}"#;
        let user: User = serde_json::from_str(json).expect("valid user json");
        assert_eq!(user.id.to_string(), "65f1c0ffee");
        assert_eq!(user.display_name(), "Mika");
    }

    #[test]
    fn test_envelope_without_user() {
        let envelope: UserEnvelope = serde_json::from_str("{}").expect("empty object");
        assert!(envelope.user.is_none());
    }

    #[test]
    fn test_registration_has_no_confirmation_field() {
        let registration = Registration {
            name: "Ann".to_string(),
            username: "ann".to_string(),
            email: "ann@example.test".to_string(),
            password: "correct horse".to_string(),
        };
        let value = serde_json::to_value(&registration).expect("serializes");
        let keys: Vec<&str> = value.as_object().expect("object").keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 4);
        assert!(!keys.contains(&"confirmPassword"));
        assert!(!keys.contains(&"confirm_password"));
    }
}
