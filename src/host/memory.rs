use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{Grants, Host};
use crate::bridge::{BridgeRequest, BridgeResponse, ErrorCode, ErrorDescriptor, HostRequest};
use crate::error::Result;
use crate::manifest::PluginManifest;
use crate::types::{NetworkDescriptor, StorageDescriptor};

type HostResult<T> = std::result::Result<T, ErrorDescriptor>;

struct Table {
    primary_key: String,
    rows: Vec<Map<String, Value>>,
}

impl Table {
    fn position(&self, key: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(&self.primary_key) == Some(key))
    }
}

fn matches(row: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(k, v)| row.get(k) == Some(v))
}

/// A self-contained host that keeps tables in memory.
///
/// It enforces install-time grants and the declared table set the way a
/// wallet host does, which makes it suitable for local development and
/// tests. Rows are returned in insertion order.
pub struct MemoryHost {
    grants: Grants,
    tables: Mutex<HashMap<String, Table>>,
    network: Mutex<Option<NetworkDescriptor>>,
    signer: Mutex<Option<String>>,
}

impl MemoryHost {
    pub fn new(grants: Grants, storages: &[StorageDescriptor]) -> Self {
        let tables = storages
            .iter()
            .map(|s| {
                (
                    s.storage_key.clone(),
                    Table {
                        primary_key: s.primary_key.clone(),
                        rows: Vec::new(),
                    },
                )
            })
            .collect();

        Self {
            grants,
            tables: Mutex::new(tables),
            network: Mutex::new(None),
            signer: Mutex::new(None),
        }
    }

    /// Installs `manifest` for `extension_id` with every permission granted.
    pub fn install(extension_id: impl Into<String>, manifest: &PluginManifest) -> Result<Self> {
        let grants = Grants::install_all(extension_id, manifest)?;
        Ok(Self::new(grants, &manifest.storages))
    }

    #[must_use]
    pub fn with_network(self, network: NetworkDescriptor) -> Self {
        self.set_network(Some(network));
        self
    }

    #[must_use]
    pub fn with_signer(self, address: impl Into<String>) -> Self {
        self.set_signer(Some(address.into()));
        self
    }

    /// Switches the active node, as when the wallet user changes network.
    pub fn set_network(&self, network: Option<NetworkDescriptor>) {
        *lock(&self.network) = network;
    }

    /// Switches the active signer account.
    pub fn set_signer(&self, address: Option<String>) {
        *lock(&self.signer) = address;
    }

    #[must_use]
    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    /// Snapshot of a table's rows in insertion order.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Map<String, Value>> {
        lock(&self.tables)
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Writes a row directly, bypassing grants. Replaces a row with the same key.
    pub fn seed(&self, table: &str, row: Map<String, Value>) {
        let mut tables = lock(&self.tables);
        let Some(table) = tables.get_mut(table) else {
            warn!(table, "seeding an undeclared table ignored");
            return;
        };
        match row.get(&table.primary_key).and_then(|k| table.position(k)) {
            Some(index) => table.rows[index] = row,
            None => table.rows.push(row),
        }
    }

    fn dispatch(&self, request: &BridgeRequest) -> HostResult<Value> {
        if !self.grants.allows(
            &request.extension_identifier,
            request.operation_kind,
            request.target,
        ) {
            return Err(ErrorDescriptor::new(
                ErrorCode::PermissionDenied,
                format!(
                    "{} {} is not granted to {}",
                    request.operation_kind, request.target, request.extension_identifier
                ),
            ));
        }

        match HostRequest::from_parts(request.target, request.payload.as_ref())? {
            HostRequest::Select { table, filter } => self.select(&table, &filter),
            HostRequest::Insert { table, record } => self.insert(&table, record),
            HostRequest::Update { table, record } => self.update(&table, record),
            HostRequest::Delete { table, filter } => self.delete(&table, &filter),
            HostRequest::RepositoryFactory => {
                let network = lock(&self.network).clone().ok_or_else(|| {
                    ErrorDescriptor::new(ErrorCode::OperationFailed, "no active network")
                })?;
                serde_json::to_value(network)
                    .map_err(|e| ErrorDescriptor::new(ErrorCode::OperationFailed, e.to_string()))
            }
            HostRequest::CurrentSignerAddress => {
                let address = lock(&self.signer).clone().ok_or_else(|| {
                    ErrorDescriptor::new(ErrorCode::OperationFailed, "no active signer")
                })?;
                Ok(json!({ "address": address }))
            }
        }
    }

    fn with_table<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Table) -> HostResult<T>,
    ) -> HostResult<T> {
        let mut tables = lock(&self.tables);
        let table = tables.get_mut(name).ok_or_else(|| {
            ErrorDescriptor::new(
                ErrorCode::OperationFailed,
                format!("table '{name}' is not declared by the extension"),
            )
        })?;
        f(table)
    }

    fn select(&self, table: &str, filter: &Map<String, Value>) -> HostResult<Value> {
        self.with_table(table, |t| {
            let rows: Vec<Value> = t
                .rows
                .iter()
                .filter(|row| matches(row, filter))
                .map(|row| json!({ "values": row }))
                .collect();
            debug!(table, rows = rows.len(), "select");
            Ok(Value::Array(rows))
        })
    }

    fn insert(&self, table: &str, record: Map<String, Value>) -> HostResult<Value> {
        self.with_table(table, |t| {
            let key = primary_key(t, &record)?;
            if t.position(key).is_some() {
                return Err(ErrorDescriptor::new(
                    ErrorCode::Conflict,
                    format!("{} {key} already exists", t.primary_key),
                ));
            }
            debug!(table, key = %key, "insert");
            let echo = Value::Object(record.clone());
            t.rows.push(record);
            Ok(echo)
        })
    }

    fn update(&self, table: &str, record: Map<String, Value>) -> HostResult<Value> {
        self.with_table(table, |t| {
            let key = primary_key(t, &record)?;
            let index = t.position(key).ok_or_else(|| {
                ErrorDescriptor::new(
                    ErrorCode::OperationFailed,
                    format!("no row with {} {key}", t.primary_key),
                )
            })?;
            debug!(table, key = %key, "update");
            let row = &mut t.rows[index];
            row.extend(record);
            Ok(Value::Object(row.clone()))
        })
    }

    fn delete(&self, table: &str, filter: &Map<String, Value>) -> HostResult<Value> {
        if filter.is_empty() {
            return Err(ErrorDescriptor::new(
                ErrorCode::BadRequest,
                "delete requires a non-empty filter",
            ));
        }
        self.with_table(table, |t| {
            let before = t.rows.len();
            t.rows.retain(|row| !matches(row, filter));
            let deleted = before - t.rows.len();
            debug!(table, deleted, "delete");
            Ok(json!({ "deleted": deleted }))
        })
    }
}

fn primary_key<'a>(table: &Table, record: &'a Map<String, Value>) -> HostResult<&'a Value> {
    record
        .get(&table.primary_key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| {
            ErrorDescriptor::new(
                ErrorCode::BadRequest,
                format!("record is missing primary key '{}'", table.primary_key),
            )
        })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Host for MemoryHost {
    fn handle(&self, request: &BridgeRequest) -> BridgeResponse {
        match self.dispatch(request) {
            Ok(value) => BridgeResponse::ok(value),
            Err(error) => {
                debug!(op = %request.target, code = ?error.code, message = %error.message, "request refused");
                error.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{CATCHES_TABLE, EXTENSION_ID};
    use crate::types::{OperationKind, Target};

    fn host() -> MemoryHost {
        MemoryHost::install(EXTENSION_ID, &PluginManifest::ninjazzz()).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn table_call(target: Target, operation: &str, data: Value) -> BridgeRequest {
        BridgeRequest {
            extension_identifier: EXTENSION_ID.to_string(),
            operation_kind: OperationKind::Action,
            target,
            payload: Some(json!({"table": CATCHES_TABLE, "operation": operation, "data": data})),
        }
    }

    #[test]
    fn test_insert_then_select_with_filter() {
        let host = host();
        let r = host.handle(&table_call(Target::DbInsert, "insert", json!({"id": "b", "owner": "x"})));
        assert_eq!(r.response, json!({"id": "b", "owner": "x"}));
        host.handle(&table_call(Target::DbInsert, "insert", json!({"id": "a", "owner": "y"})));

        let all = host.handle(&table_call(Target::DbSelect, "select", json!({})));
        assert_eq!(all.response.as_array().unwrap().len(), 2);

        let mine = host.handle(&table_call(Target::DbSelect, "select", json!({"owner": "x"})));
        assert_eq!(mine.response, json!([{"values": {"id": "b", "owner": "x"}}]));
    }

    #[test]
    fn test_duplicate_primary_key_conflicts() {
        let host = host();
        host.handle(&table_call(Target::DbInsert, "insert", json!({"id": "a"})));
        let r = host.handle(&table_call(Target::DbInsert, "insert", json!({"id": "a"})));
        assert_eq!(r.error.unwrap().code, ErrorCode::Conflict);
        assert_eq!(host.rows(CATCHES_TABLE).len(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let host = host();
        host.seed(CATCHES_TABLE, object(json!({"id": "a", "owner": "x", "level": 1})));

        let r = host.handle(&table_call(Target::DbUpdate, "update", json!({"id": "a", "level": 2})));
        assert_eq!(r.response["level"], 2);
        assert_eq!(r.response["owner"], "x");

        let missing = host.handle(&table_call(Target::DbUpdate, "update", json!({"id": "zz"})));
        assert_eq!(missing.error.unwrap().code, ErrorCode::OperationFailed);

        let r = host.handle(&table_call(Target::DbDelete, "delete", json!({"owner": "x"})));
        assert_eq!(r.response, json!({"deleted": 1}));
        assert!(host.rows(CATCHES_TABLE).is_empty());

        let r = host.handle(&table_call(Target::DbDelete, "delete", json!({})));
        assert_eq!(r.error.unwrap().code, ErrorCode::BadRequest);
    }

    #[test]
    fn test_undeclared_table_fails() {
        let host = host();
        let request = BridgeRequest {
            payload: Some(json!({"table": "other.table", "operation": "select", "data": {}})),
            ..table_call(Target::DbSelect, "select", json!({}))
        };
        let r = host.handle(&request);
        assert!(r.error.unwrap().message.contains("other.table"));
    }

    #[test]
    fn test_ungranted_target_is_denied() {
        let manifest = PluginManifest::ninjazzz();
        let grants = Grants::install(EXTENSION_ID, &manifest, |p| p.target != Target::DbDelete).unwrap();
        let host = MemoryHost::new(grants, &manifest.storages);

        let r = host.handle(&table_call(Target::DbDelete, "delete", json!({"id": "a"})));
        assert_eq!(r.error.unwrap().code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_foreign_extension_is_denied() {
        let host = host();
        let request = BridgeRequest {
            extension_identifier: "@someone/else".to_string(),
            ..table_call(Target::DbSelect, "select", json!({}))
        };
        assert_eq!(host.handle(&request).error.unwrap().code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_getters() {
        let host = host();
        let getter = |target| BridgeRequest {
            extension_identifier: EXTENSION_ID.to_string(),
            operation_kind: OperationKind::Getter,
            target,
            payload: None,
        };

        let r = host.handle(&getter(Target::RepositoryFactory));
        assert_eq!(r.error.unwrap().code, ErrorCode::OperationFailed);

        let host = host
            .with_network(NetworkDescriptor {
                url: "http://localhost:3000".to_string(),
                websocket_url: "ws://localhost:3000/ws".to_string(),
            })
            .with_signer("TATNE7Q5BITMUTRRN6IB4I7FLSDRDWZA37JGO5Q");

        let r = host.handle(&getter(Target::RepositoryFactory));
        assert_eq!(
            r.response,
            json!({"url": "http://localhost:3000", "websocketUrl": "ws://localhost:3000/ws"})
        );
        let r = host.handle(&getter(Target::CurrentSignerAddress));
        assert_eq!(r.response["address"], "TATNE7Q5BITMUTRRN6IB4I7FLSDRDWZA37JGO5Q");
    }
}
