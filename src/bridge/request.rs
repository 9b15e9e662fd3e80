use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::message::{ErrorCode, ErrorDescriptor};
use crate::types::{OperationKind, Target};

/// Table operation named inside a `db/*` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOperation {
    Select,
    Insert,
    Update,
    Delete,
}

impl TableOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    #[must_use]
    pub const fn target(self) -> Target {
        match self {
            Self::Select => Target::DbSelect,
            Self::Insert => Target::DbInsert,
            Self::Update => Target::DbUpdate,
            Self::Delete => Target::DbDelete,
        }
    }
}

/// Payload shared by every `db/*` target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub table: String,
    pub operation: TableOperation,
    #[serde(default)]
    pub data: Value,
}

/// A typed bridge call: one variant per target the host exposes.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    /// Rows whose fields equal every entry of `filter`.
    Select {
        table: String,
        filter: Map<String, Value>,
    },
    Insert {
        table: String,
        record: Map<String, Value>,
    },
    /// Merges `record` into the row with the same primary key.
    Update {
        table: String,
        record: Map<String, Value>,
    },
    Delete {
        table: String,
        filter: Map<String, Value>,
    },
    RepositoryFactory,
    CurrentSignerAddress,
}

impl HostRequest {
    #[must_use]
    pub fn target(&self) -> Target {
        match self {
            Self::Select { .. } => Target::DbSelect,
            Self::Insert { .. } => Target::DbInsert,
            Self::Update { .. } => Target::DbUpdate,
            Self::Delete { .. } => Target::DbDelete,
            Self::RepositoryFactory => Target::RepositoryFactory,
            Self::CurrentSignerAddress => Target::CurrentSignerAddress,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.target().kind()
    }

    /// Builds the opaque payload that travels with the bridge message.
    #[must_use]
    pub fn into_payload(self) -> Option<Value> {
        let (table, operation, data) = match self {
            Self::Select { table, filter } => (table, TableOperation::Select, filter),
            Self::Insert { table, record } => (table, TableOperation::Insert, record),
            Self::Update { table, record } => (table, TableOperation::Update, record),
            Self::Delete { table, filter } => (table, TableOperation::Delete, filter),
            Self::RepositoryFactory | Self::CurrentSignerAddress => return None,
        };

        Some(json!({
            "table": table,
            "operation": operation.as_str(),
            "data": data,
        }))
    }

    /// Decodes a received (target, payload) pair back into a typed request.
    pub fn from_parts(target: Target, payload: Option<&Value>) -> Result<Self, ErrorDescriptor> {
        let table_payload = || -> Result<(String, Map<String, Value>), ErrorDescriptor> {
            let payload = payload.ok_or_else(|| {
                ErrorDescriptor::new(ErrorCode::BadRequest, format!("{target} requires a payload"))
            })?;
            let parsed: TablePayload = serde_json::from_value(payload.clone()).map_err(|e| {
                ErrorDescriptor::new(ErrorCode::BadRequest, format!("invalid {target} payload: {e}"))
            })?;
            if parsed.operation.target() != target {
                return Err(ErrorDescriptor::new(
                    ErrorCode::BadRequest,
                    format!(
                        "operation '{}' does not match target {target}",
                        parsed.operation.as_str()
                    ),
                ));
            }
            let data = match parsed.data {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    return Err(ErrorDescriptor::new(
                        ErrorCode::BadRequest,
                        format!("{target} data must be an object, got {other}"),
                    ));
                }
            };
            Ok((parsed.table, data))
        };

        Ok(match target {
            Target::DbSelect => {
                let (table, filter) = table_payload()?;
                Self::Select { table, filter }
            }
            Target::DbInsert => {
                let (table, record) = table_payload()?;
                Self::Insert { table, record }
            }
            Target::DbUpdate => {
                let (table, record) = table_payload()?;
                Self::Update { table, record }
            }
            Target::DbDelete => {
                let (table, filter) = table_payload()?;
                Self::Delete { table, filter }
            }
            Target::RepositoryFactory => Self::RepositoryFactory,
            Target::CurrentSignerAddress => Self::CurrentSignerAddress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_select_payload_shape() {
        let request = HostRequest::Select {
            table: "ninjazzz.catches".to_string(),
            filter: object(json!({"owner": "abc"})),
        };
        assert_eq!(request.kind(), OperationKind::Action);
        assert_eq!(
            request.into_payload().unwrap(),
            json!({"table": "ninjazzz.catches", "operation": "select", "data": {"owner": "abc"}})
        );
    }

    #[test]
    fn test_getters_have_no_payload() {
        assert_eq!(HostRequest::RepositoryFactory.into_payload(), None);
        assert_eq!(
            HostRequest::CurrentSignerAddress.kind(),
            OperationKind::Getter
        );
    }

    #[test]
    fn test_from_parts_decodes_payload() {
        let request = HostRequest::Insert {
            table: "ninjazzz.catches".to_string(),
            record: object(json!({"id": "abcd1234", "owner": "x"})),
        };
        let payload = request.clone().into_payload();
        let decoded = HostRequest::from_parts(Target::DbInsert, payload.as_ref()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_from_parts_rejects_mismatched_operation() {
        let payload = json!({"table": "t", "operation": "delete", "data": {}});
        let err = HostRequest::from_parts(Target::DbSelect, Some(&payload)).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert!(err.message.contains("delete"));
    }

    #[test]
    fn test_from_parts_requires_payload_for_tables() {
        let err = HostRequest::from_parts(Target::DbSelect, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(
            HostRequest::from_parts(Target::RepositoryFactory, None).unwrap(),
            HostRequest::RepositoryFactory
        );
    }

    #[test]
    fn test_from_parts_rejects_non_object_data() {
        let payload = json!({"table": "t", "operation": "select", "data": [1, 2]});
        assert!(HostRequest::from_parts(Target::DbSelect, Some(&payload)).is_err());
    }
}
