//! Login check and centre scope resolution against the user table.
//!
//! Passwords are compared as plain strings. The user table is a flat
//! credentials sheet, not a security boundary.

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

use crate::errors::BoardError;

use super::record::{normalize_centre, UserRecord};

const ALL_CENTRES: &str = "ALL";

/// Centres a signed-in user may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "centres", rename_all = "snake_case")]
pub enum CentreScope {
    /// Every centre, in the order it first appears in the status table.
    All,
    /// Normalised centre names in assignment order.
    Only(Vec<String>),
}

/// GraphQL-friendly projection of a scope.
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
pub struct ScopeInfo {
    pub all: bool,
    pub centres: Vec<String>,
}

impl From<&CentreScope> for ScopeInfo {
    fn from(scope: &CentreScope) -> Self {
        match scope {
            CentreScope::All => ScopeInfo {
                all: true,
                centres: Vec::new(),
            },
            CentreScope::Only(centres) => ScopeInfo {
                all: false,
                centres: centres.clone(),
            },
        }
    }
}

/// Check credentials and resolve the user's centre scope.
pub fn resolve(
    username: &str,
    password: &str,
    users: &[UserRecord],
) -> Result<CentreScope, BoardError> {
    let user = users
        .iter()
        .find(|u| u.username == username)
        .ok_or(BoardError::UnknownUser)?;

    if user.password.trim() != password.trim() {
        return Err(BoardError::InvalidPassword);
    }

    let centres = parse_centres(&user.centres);
    if centres.len() == 1 && centres[0] == ALL_CENTRES {
        return Ok(CentreScope::All);
    }
    if centres.is_empty() {
        return Err(BoardError::NoAuthorizedCentres);
    }
    Ok(CentreScope::Only(centres))
}

/// Split on `,` or `;`, normalise, drop blanks and duplicates.
pub fn parse_centres(field: &str) -> Vec<String> {
    let mut centres: Vec<String> = Vec::new();
    for token in field.split([',', ';']) {
        let centre = normalize_centre(token);
        if !centre.is_empty() && !centres.contains(&centre) {
            centres.push(centre);
        }
    }
    centres
}
