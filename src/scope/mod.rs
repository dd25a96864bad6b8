//! Scope-filtered queries.
//!
//! `Scope::All` is honoured only for Admin callers; everything else sees the
//! records it owns.

use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[default]
    Usuario,
}

impl Role {
    /// Unknown or missing roles fail closed to `Usuario`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(r) if r.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Usuario,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Usuario => "Usuario",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    User,
    All,
}

impl Scope {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("all") => Self::All,
            _ => Self::User,
        }
    }

    /// The scope actually applied for `role`.
    pub fn effective(self, role: Role) -> Self {
        match (self, role) {
            (Self::All, Role::Admin) => Self::All,
            _ => Self::User,
        }
    }
}

/// Records that have an owning identity.
pub trait Owned {
    fn owner(&self) -> &str;
}

impl<T: Owned> Owned for crate::mapping::Located<T> {
    fn owner(&self) -> &str {
        self.record.owner()
    }
}

pub fn same_identity(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && a.to_lowercase() == b.trim().to_lowercase()
}

pub fn filter_by_scope<T: Owned>(records: Vec<T>, identity: &str, scope: Scope, role: Role) -> Vec<T> {
    match scope.effective(role) {
        Scope::All => records,
        Scope::User => {
            if identity.trim().is_empty() {
                debug!("Empty identity, returning no records");
                return Vec::new();
            }
            records
                .into_iter()
                .filter(|r| same_identity(r.owner(), identity))
                .collect()
        }
    }
}
