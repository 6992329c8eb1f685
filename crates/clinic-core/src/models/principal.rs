//! Authenticated callers as supplied by the session layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Pharmacist,
    Administrator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Pharmacist => "pharmacist",
            Role::Administrator => "administrator",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            "pharmacist" => Some(Role::Pharmacist),
            "administrator" | "admin" => Some(Role::Administrator),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The caller of a use-case. Trusted as given; the core never authenticates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: String,
    /// Display name (used as the practitioner name on new slots)
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn doctor(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Doctor)
    }

    pub fn patient(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Patient)
    }

    pub fn pharmacist(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Pharmacist)
    }

    pub fn administrator(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Administrator)
    }
}
