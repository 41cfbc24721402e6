use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Supervisor = 3,
    TeamMember = 4,
    Accounts = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Supervisor),
            4 => Some(Role::TeamMember),
            5 => Some(Role::Accounts),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleInfo {
    #[schema(example = 3)]
    pub id: u8,
    #[schema(example = "supervisor")]
    pub name: String,
}

pub fn all_roles() -> Vec<RoleInfo> {
    Role::iter()
        .map(|role| RoleInfo {
            id: role.id(),
            name: role.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for role in Role::iter() {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(6), None);
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Role::TeamMember.to_string(), "team_member");
        assert_eq!(Role::TeamMember.as_ref(), "team_member");
        assert_eq!(
            serde_json::to_value(Role::TeamMember).unwrap(),
            serde_json::json!("team_member")
        );
        assert_eq!(all_roles().len(), 5);
    }
}
