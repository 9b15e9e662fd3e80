use std::fmt;

use tracing::info;

use crate::error::Result;
use crate::manifest::PluginManifest;
use crate::types::{OperationKind, PermissionDeclaration, Target};

/// Bitmask of targets granted to an extension at install time.
///
/// The operation kind is implied by the target, so a call is only allowed
/// when its kind matches the target's kind as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrantSet(u8);

impl GrantSet {
    pub const NONE: GrantSet = GrantSet(0);

    #[must_use]
    pub const fn of(target: Target) -> GrantSet {
        GrantSet(1 << target as u8)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn has(self, target: Target) -> bool {
        let bit = Self::of(target).0;
        self.0 & bit == bit
    }

    #[must_use]
    pub const fn union(self, other: GrantSet) -> GrantSet {
        GrantSet(self.0 | other.0)
    }

    #[must_use]
    pub const fn difference(self, other: GrantSet) -> GrantSet {
        GrantSet(self.0 & !other.0)
    }

    #[must_use]
    pub fn targets(self) -> Vec<Target> {
        Target::ALL.into_iter().filter(|t| self.has(*t)).collect()
    }
}

impl fmt::Display for GrantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.targets().into_iter().map(Target::as_str).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// The capabilities one installed extension holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grants {
    extension_id: String,
    allowed: GrantSet,
}

impl Grants {
    /// An installation with nothing granted yet.
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            extension_id: extension_id.into(),
            allowed: GrantSet::NONE,
        }
    }

    /// Installs `manifest`, granting every declaration `approve` accepts.
    ///
    /// The manifest is validated first; an invalid manifest grants nothing.
    pub fn install<F>(
        extension_id: impl Into<String>,
        manifest: &PluginManifest,
        approve: F,
    ) -> Result<Self>
    where
        F: Fn(&PermissionDeclaration) -> bool,
    {
        manifest.validate()?;

        let mut grants = Self::new(extension_id);
        for permission in &manifest.permissions {
            if approve(permission) {
                grants.grant(permission.target);
            } else {
                info!(
                    extension_id = %grants.extension_id,
                    permission = %permission.name,
                    "permission declined at install"
                );
            }
        }
        info!(extension_id = %grants.extension_id, granted = %grants.allowed, "extension installed");
        Ok(grants)
    }

    /// Installs `manifest` with every declared permission granted.
    pub fn install_all(extension_id: impl Into<String>, manifest: &PluginManifest) -> Result<Self> {
        Self::install(extension_id, manifest, |_| true)
    }

    pub fn grant(&mut self, target: Target) {
        self.allowed = self.allowed.union(GrantSet::of(target));
    }

    pub fn revoke(&mut self, target: Target) {
        self.allowed = self.allowed.difference(GrantSet::of(target));
    }

    #[must_use]
    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    #[must_use]
    pub fn granted(&self) -> GrantSet {
        self.allowed
    }

    /// Returns true if `extension_id` may call `target` as `kind`.
    #[must_use]
    pub fn allows(&self, extension_id: &str, kind: OperationKind, target: Target) -> bool {
        self.extension_id == extension_id && kind == target.kind() && self.allowed.has(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_set_bits() {
        let set = GrantSet::of(Target::DbSelect).union(GrantSet::of(Target::DbInsert));
        assert!(set.has(Target::DbSelect));
        assert!(set.has(Target::DbInsert));
        assert!(!set.has(Target::DbDelete));
        assert_eq!(set.difference(GrantSet::of(Target::DbSelect)).targets(), vec![Target::DbInsert]);
        assert_eq!(set.to_string(), "db/SELECT, db/INSERT");
    }

    #[test]
    fn test_install_all_grants_every_declaration() {
        let manifest = PluginManifest::ninjazzz();
        let grants = Grants::install_all("ext", &manifest).unwrap();
        for target in Target::ALL {
            assert!(grants.allows("ext", target.kind(), target));
        }
    }

    #[test]
    fn test_install_with_declined_permission() {
        let manifest = PluginManifest::ninjazzz();
        let grants =
            Grants::install("ext", &manifest, |p| p.target != Target::DbDelete).unwrap();
        assert!(grants.allows("ext", OperationKind::Action, Target::DbInsert));
        assert!(!grants.allows("ext", OperationKind::Action, Target::DbDelete));
    }

    #[test]
    fn test_allows_checks_identity_and_kind() {
        let mut grants = Grants::new("ext");
        grants.grant(Target::RepositoryFactory);
        assert!(grants.allows("ext", OperationKind::Getter, Target::RepositoryFactory));
        assert!(!grants.allows("other", OperationKind::Getter, Target::RepositoryFactory));
        assert!(!grants.allows("ext", OperationKind::Action, Target::RepositoryFactory));

        grants.revoke(Target::RepositoryFactory);
        assert!(!grants.allows("ext", OperationKind::Getter, Target::RepositoryFactory));
    }

    #[test]
    fn test_install_rejects_invalid_manifest() {
        let mut manifest = PluginManifest::ninjazzz();
        manifest.permissions[0].kind = OperationKind::Getter;
        assert!(Grants::install_all("ext", &manifest).is_err());
    }
}
