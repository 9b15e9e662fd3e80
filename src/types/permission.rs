use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Operation class of a bridge call.
///
/// Actions may mutate host-owned state; getters only read the host's
/// in-memory state (active network, active account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Action,
    Getter,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Getter => "getter",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Host-store path addressed by a bridge call.
///
/// This is the closed vocabulary of operations the host exposes to the
/// extension. Each target has exactly one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Target {
    #[serde(rename = "db/SELECT")]
    DbSelect,
    #[serde(rename = "db/INSERT")]
    DbInsert,
    #[serde(rename = "db/UPDATE")]
    DbUpdate,
    #[serde(rename = "db/DELETE")]
    DbDelete,
    #[serde(rename = "network/repositoryFactory")]
    RepositoryFactory,
    #[serde(rename = "account/currentSignerAddress")]
    CurrentSignerAddress,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Self::DbSelect,
        Self::DbInsert,
        Self::DbUpdate,
        Self::DbDelete,
        Self::RepositoryFactory,
        Self::CurrentSignerAddress,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DbSelect => "db/SELECT",
            Self::DbInsert => "db/INSERT",
            Self::DbUpdate => "db/UPDATE",
            Self::DbDelete => "db/DELETE",
            Self::RepositoryFactory => "network/repositoryFactory",
            Self::CurrentSignerAddress => "account/currentSignerAddress",
        }
    }

    /// Returns the operation kind the host dispatches this target under.
    #[must_use]
    pub const fn kind(self) -> OperationKind {
        match self {
            Self::DbSelect | Self::DbInsert | Self::DbUpdate | Self::DbDelete => {
                OperationKind::Action
            }
            Self::RepositoryFactory | Self::CurrentSignerAddress => OperationKind::Getter,
        }
    }

    /// Converts a host-store path to its target.
    pub fn parse(s: &str) -> Option<Target> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnknownTarget(s.to_string()))
    }
}

/// One entry of the permission manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub target: Target,
    pub description: String,
}

impl PermissionDeclaration {
    pub fn new(
        name: impl Into<String>,
        target: Target,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: target.kind(),
            target,
            description: description.into(),
        }
    }

    /// Returns true if this declaration covers a call of `kind` against `target`.
    #[must_use]
    pub fn covers(&self, kind: OperationKind, target: Target) -> bool {
        self.kind == kind && self.target == target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind() {
        assert_eq!(Target::DbSelect.kind(), OperationKind::Action);
        assert_eq!(Target::DbDelete.kind(), OperationKind::Action);
        assert_eq!(Target::RepositoryFactory.kind(), OperationKind::Getter);
        assert_eq!(Target::CurrentSignerAddress.kind(), OperationKind::Getter);
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(Target::parse("db/INSERT"), Some(Target::DbInsert));
        assert_eq!(
            "network/repositoryFactory".parse::<Target>().unwrap(),
            Target::RepositoryFactory
        );
        assert_eq!(Target::parse("db/insert"), None);
        assert!(matches!(
            "db/TRUNCATE".parse::<Target>(),
            Err(Error::UnknownTarget(t)) if t == "db/TRUNCATE"
        ));
    }

    #[test]
    fn test_target_serializes_as_host_path() {
        for target in Target::ALL {
            let json = serde_json::to_value(target).unwrap();
            assert_eq!(json, serde_json::json!(target.as_str()));
        }
    }

    #[test]
    fn test_declaration_wire_fields() {
        let decl = PermissionDeclaration::new(
            "ninjazzz.readCatches",
            Target::DbSelect,
            "read caught ninjas",
        );
        let json = serde_json::to_value(&decl).unwrap();
        assert_eq!(json["type"], "action");
        assert_eq!(json["target"], "db/SELECT");
        assert!(decl.covers(OperationKind::Action, Target::DbSelect));
        assert!(!decl.covers(OperationKind::Getter, Target::DbSelect));
    }
}
