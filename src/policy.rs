//! Team-scoped authorization.
//!
//! Every list/update boundary goes through this module:
//! - a global admin sees and modifies everything,
//! - a team admin sees and modifies rows tagged with their own team,
//! - an employee only reads rows they own.
//!
//! The check is a plain field comparison per request. Handlers turn a
//! [`Decision::Deny`] into a 403 before touching the store.

use crate::{auth::auth::AuthUser, error::ApiError, model::role::Team};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Access {
    /// Viewing a record. Owners are allowed.
    Read,
    /// Status transitions and personnel edits. Admins only.
    Manage,
}

/// The part of a record the rule looks at.
#[derive(Debug, Copy, Clone)]
pub struct Resource<'a> {
    pub team: Team,
    pub owner_id: Option<&'a str>,
}

impl<'a> Resource<'a> {
    pub fn team(team: Team) -> Self {
        Self { team, owner_id: None }
    }

    pub fn owned(team: Team, owner_id: &'a str) -> Self {
        Self {
            team,
            owner_id: Some(owner_id),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// Maps a denial to a 403 carrying `message`.
    pub fn or_forbidden(self, message: &str) -> Result<(), ApiError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(ApiError::forbidden(message)),
        }
    }
}

pub fn authorize(actor: &AuthUser, access: Access, resource: Resource<'_>) -> Decision {
    if actor.role.is_global_admin() {
        return Decision::Allow;
    }

    // `none` is never a team an admin can claim
    if actor.role.is_team_admin() && resource.team != Team::None && actor.team == resource.team {
        return Decision::Allow;
    }

    if access == Access::Read && resource.owner_id == Some(actor.user_id.as_str()) {
        return Decision::Allow;
    }

    Decision::Deny
}

/// Which rows a list query may return for an actor.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Scope {
    All,
    Team(Team),
    Owner(String),
}

impl Scope {
    pub fn for_actor(actor: &AuthUser) -> Self {
        if actor.role.is_global_admin() {
            Scope::All
        } else if actor.role.is_team_admin() {
            Scope::Team(actor.team)
        } else {
            Scope::Owner(actor.user_id.clone())
        }
    }

    pub fn admits(&self, team: Team, owner_id: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Team(t) => *t == team,
            Scope::Owner(id) => id == owner_id,
        }
    }
}
