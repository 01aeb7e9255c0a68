use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr, EnumIter,
)]
pub enum Role {
    #[serde(rename = "super_admin")]
    #[strum(serialize = "super_admin")]
    SuperAdmin,
    #[serde(rename = "team_admin_a")]
    #[strum(serialize = "team_admin_a")]
    TeamAdminA,
    #[serde(rename = "team_admin_b")]
    #[strum(serialize = "team_admin_b")]
    TeamAdminB,
    #[serde(rename = "employee_a")]
    #[strum(serialize = "employee_a")]
    EmployeeA,
    #[serde(rename = "employee_b")]
    #[strum(serialize = "employee_b")]
    EmployeeB,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr, EnumIter,
)]
pub enum Team {
    #[serde(rename = "teamA")]
    #[strum(serialize = "teamA")]
    TeamA,
    #[serde(rename = "teamB")]
    #[strum(serialize = "teamB")]
    TeamB,
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    None,
}

impl Role {
    /// The unit a role belongs to. Global admins belong to no team.
    pub fn team(self) -> Team {
        match self {
            Role::SuperAdmin => Team::None,
            Role::TeamAdminA | Role::EmployeeA => Team::TeamA,
            Role::TeamAdminB | Role::EmployeeB => Team::TeamB,
        }
    }

    pub fn is_global_admin(self) -> bool {
        self == Role::SuperAdmin
    }

    pub fn is_team_admin(self) -> bool {
        matches!(self, Role::TeamAdminA | Role::TeamAdminB)
    }

    pub fn is_admin(self) -> bool {
        self.is_global_admin() || self.is_team_admin()
    }

    pub fn is_employee(self) -> bool {
        matches!(self, Role::EmployeeA | Role::EmployeeB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn every_role_belongs_to_exactly_one_tier() {
        for role in Role::iter() {
            let tiers = [role.is_global_admin(), role.is_team_admin(), role.is_employee()];
            assert_eq!(tiers.iter().filter(|t| **t).count(), 1, "{role}");
        }
    }

    #[test]
    fn role_team_mapping() {
        assert_eq!(Role::SuperAdmin.team(), Team::None);
        assert_eq!(Role::TeamAdminA.team(), Team::TeamA);
        assert_eq!(Role::EmployeeB.team(), Team::TeamB);
    }

    #[test]
    fn wire_names_match_between_serde_and_strum() {
        for role in Role::iter() {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_ref()));
            assert_eq!(Role::from_str(role.as_ref()).unwrap(), role);
        }
        assert_eq!(Team::from_str("teamA").unwrap(), Team::TeamA);
        assert!(Team::from_str("teamC").is_err());
    }
}
