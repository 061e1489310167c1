//! Row-level access control for the `events` table.
//!
//! Policies mirror the ones installed in the database by the migrations.
//! They are evaluated in the service before any store call, so the in-memory
//! store behaves exactly like the Postgres store under RLS.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::utils::error::AppError;

pub mod caller;

pub use caller::{ApiKeys, Caller};

/// Identity a request runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anon,
    Authenticated,
}

impl Role {
    /// Name of the matching database role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anon => "anon",
            Role::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Select => "SELECT",
            Command::Insert => "INSERT",
            Command::Update => "UPDATE",
            Command::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Predicate of a policy, evaluated against the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Always,
    RoleIs(Role),
}

impl Check {
    pub fn evaluate(&self, role: Role) -> bool {
        match self {
            Check::Always => true,
            Check::RoleIs(required) => *required == role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: &'static str,
    pub command: Command,
    pub check: Check,
}

/// Which policy set the deployment runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyMode {
    #[default]
    QuickStart,
    Production,
}

impl PolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyMode::QuickStart => "quick-start",
            PolicyMode::Production => "production",
        }
    }
}

impl FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick-start" | "quickstart" | "default" => Ok(PolicyMode::QuickStart),
            "production" | "hardened" => Ok(PolicyMode::Production),
            other => Err(format!(
                "unknown access policy '{}', expected 'quick-start' or 'production'",
                other
            )),
        }
    }
}

pub const PUBLIC_READ: &str = "Allow public read access";
pub const PUBLIC_INSERT: &str = "Allow public insert access";
pub const AUTHENTICATED_INSERT: &str = "Allow authenticated insert access";

#[derive(Debug, Clone)]
pub struct PolicySet {
    mode: PolicyMode,
    policies: Vec<Policy>,
}

impl PolicySet {
    pub fn for_mode(mode: PolicyMode) -> Self {
        match mode {
            PolicyMode::QuickStart => Self::quick_start(),
            PolicyMode::Production => Self::production(),
        }
    }

    /// Open reads and open inserts.
    pub fn quick_start() -> Self {
        Self {
            mode: PolicyMode::QuickStart,
            policies: vec![
                Policy {
                    name: PUBLIC_READ,
                    command: Command::Select,
                    check: Check::Always,
                },
                Policy {
                    name: PUBLIC_INSERT,
                    command: Command::Insert,
                    check: Check::Always,
                },
            ],
        }
    }

    /// Open reads, inserts only for authenticated callers.
    pub fn production() -> Self {
        Self {
            mode: PolicyMode::Production,
            policies: vec![
                Policy {
                    name: PUBLIC_READ,
                    command: Command::Select,
                    check: Check::Always,
                },
                Policy {
                    name: AUTHENTICATED_INSERT,
                    command: Command::Insert,
                    check: Check::RoleIs(Role::Authenticated),
                },
            ],
        }
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Policies are permissive: any matching policy grants the command.
    /// A command with no policy at all is denied.
    pub fn permits(&self, command: Command, role: Role) -> bool {
        self.policies
            .iter()
            .filter(|policy| policy.command == command)
            .any(|policy| policy.check.evaluate(role))
    }

    /// Names of the policies in this set that govern `command`.
    pub fn policy_names(&self, command: Command) -> Vec<&'static str> {
        self.policies()
            .iter()
            .filter(|policy| policy.command == command)
            .map(|policy| policy.name)
            .collect()
    }

    /// True when the policies installed in the database for `command` are
    /// exactly the ones this set expects, regardless of order.
    pub fn agrees_with_installed(&self, command: Command, installed: &[String]) -> bool {
        let mut expected = self.policy_names(command);
        let mut installed: Vec<&str> = installed.iter().map(String::as_str).collect();
        expected.sort_unstable();
        installed.sort_unstable();
        expected == installed
    }

    pub fn authorize(&self, command: Command, role: Role) -> Result<(), AppError> {
        if self.permits(command, role) {
            return Ok(());
        }

        tracing::debug!(%command, %role, mode = self.mode.as_str(), "Policy check failed");
        Err(AppError::Forbidden(format!(
            "Permission denied: {} on events is not allowed for role '{}'",
            command, role
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_start_allows_anonymous_reads_and_inserts() {
        let set = PolicySet::quick_start();
        assert!(set.authorize(Command::Select, Role::Anon).is_ok());
        assert!(set.authorize(Command::Insert, Role::Anon).is_ok());
        assert!(set.authorize(Command::Insert, Role::Authenticated).is_ok());
    }

    #[test]
    fn test_production_requires_authenticated_insert() {
        let set = PolicySet::production();
        assert!(matches!(
            set.authorize(Command::Insert, Role::Anon),
            Err(AppError::Forbidden(_))
        ));
        assert!(set.authorize(Command::Insert, Role::Authenticated).is_ok());
        assert!(set.authorize(Command::Select, Role::Anon).is_ok());
    }

    #[test]
    fn test_update_and_delete_fail_closed() {
        for set in [PolicySet::quick_start(), PolicySet::production()] {
            for role in [Role::Anon, Role::Authenticated] {
                assert!(!set.permits(Command::Update, role));
                assert!(!set.permits(Command::Delete, role));
            }
        }
    }

    #[test]
    fn test_production_replaces_only_the_insert_policy() {
        let names: Vec<_> = PolicySet::production()
            .policies()
            .iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec![PUBLIC_READ, AUTHENTICATED_INSERT]);
    }

    #[test]
    fn test_installed_policies_are_compared_by_name() {
        let hardened = vec![AUTHENTICATED_INSERT.to_string()];
        let public = vec![PUBLIC_INSERT.to_string()];

        assert!(PolicySet::production().agrees_with_installed(Command::Insert, &hardened));
        assert!(!PolicySet::quick_start().agrees_with_installed(Command::Insert, &hardened));
        assert!(PolicySet::quick_start().agrees_with_installed(Command::Insert, &public));
        assert!(!PolicySet::production().agrees_with_installed(Command::Insert, &[]));
    }

    #[test]
    fn test_policy_mode_parsing() {
        assert_eq!(
            "quick-start".parse::<PolicyMode>().unwrap(),
            PolicyMode::QuickStart
        );
        assert_eq!(
            " Production ".parse::<PolicyMode>().unwrap(),
            PolicyMode::Production
        );
        assert!("open".parse::<PolicyMode>().is_err());
    }
}
