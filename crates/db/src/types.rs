use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Funnel state of a contact record. `pending` until an admin acts on it;
/// the other three are terminal for this field.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VisitStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "visited")]
    Visited,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "declined")]
    Declined,
}

/// `overdue` exists for client-side bookkeeping only; the server never sets
/// it from deadline comparisons.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AdmissionType {
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Open role category. `admin` and `caller` carry privileges; anything else
/// is a custom role routed to the generic dashboard. Stored as raw TEXT, so
/// this is deliberately not a closed active enum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Caller,
    Custom(String),
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_caller(&self) -> bool {
        matches!(self, Role::Caller)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Caller => "caller",
            Role::Custom(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            "caller" => Role::Caller,
            _ => Role::Custom(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_custom_strings() {
        let role = Role::from("registrar".to_string());
        assert_eq!(role, Role::Custom("registrar".to_string()));
        assert_eq!(String::from(role), "registrar");
    }

    #[test]
    fn role_recognizes_privileged_values() {
        assert!(Role::from("admin".to_string()).is_admin());
        assert!(Role::from("caller".to_string()).is_caller());
        assert!(!Role::from("counselor".to_string()).is_admin());
    }

    #[test]
    fn visit_status_serializes_lowercase() {
        let json = serde_json::to_string(&VisitStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        let parsed: VisitStatus = serde_json::from_str("\"declined\"").unwrap();
        assert_eq!(parsed, VisitStatus::Declined);
    }
}
