use serde::{Deserialize, Serialize};

/// Declares a logical table the extension keeps in the host's persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDescriptor {
    pub storage_key: String,
    pub primary_key: String,
    pub description: String,
}

impl StorageDescriptor {
    pub fn new(
        storage_key: impl Into<String>,
        primary_key: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            storage_key: storage_key.into(),
            primary_key: primary_key.into(),
            description: description.into(),
        }
    }

    /// Returns true if the storage key lives under the `namespace.` prefix.
    #[must_use]
    pub fn is_namespaced(&self, namespace: &str) -> bool {
        self.storage_key
            .strip_prefix(namespace)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|table| !table.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_descriptor_wire_fields() {
        let desc = StorageDescriptor::new("ninjazzz.catches", "id", "caught ninjas");
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["storageKey"], "ninjazzz.catches");
        assert_eq!(json["primaryKey"], "id");
    }

    #[test]
    fn test_is_namespaced() {
        let desc = StorageDescriptor::new("ninjazzz.catches", "id", "");
        assert!(desc.is_namespaced("ninjazzz"));
        assert!(!desc.is_namespaced("ninja"));
        assert!(!StorageDescriptor::new("ninjazzz.", "id", "").is_namespaced("ninjazzz"));
        assert!(!StorageDescriptor::new("catches", "id", "").is_namespaced("ninjazzz"));
    }
}
