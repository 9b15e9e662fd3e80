use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::ids::{ID_LENGTH, random_id};
use crate::bridge::{BridgeClient, HostRequest, Transport};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::manifest::CATCHES_TABLE;
use crate::types::{CatchRecord, Row, Target};

/// Reads and writes caught ninjas in the host's `ninjazzz.catches` table.
pub struct CatchStorage<T> {
    bridge: Arc<BridgeClient<T>>,
    table: String,
    insert_attempts: u32,
}

impl<T: Transport> CatchStorage<T> {
    pub fn new(bridge: Arc<BridgeClient<T>>) -> Self {
        Self::from_config(bridge, &BridgeConfig::default())
    }

    pub fn from_config(bridge: Arc<BridgeClient<T>>, config: &BridgeConfig) -> Self {
        Self {
            bridge,
            table: CATCHES_TABLE.to_string(),
            insert_attempts: config.insert_attempts.max(1),
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Lists catches, optionally restricted to one owner.
    ///
    /// The result is always sorted ascending by `id`, whatever order the
    /// host returns rows in. An empty owner means no filter.
    pub async fn list(&self, owner: Option<&str>) -> Result<Vec<CatchRecord>> {
        let mut filter = Map::new();
        if let Some(owner) = owner.filter(|o| !o.is_empty()) {
            filter.insert("owner".to_string(), Value::String(owner.to_string()));
        }

        let value = self
            .bridge
            .request(HostRequest::Select {
                table: self.table.clone(),
                filter,
            })
            .await?;

        let rows: Vec<Row<CatchRecord>> = match value {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other)
                .map_err(|e| Error::invalid_response(Target::DbSelect, e))?,
        };

        let mut records: Vec<CatchRecord> = rows.into_iter().map(|row| row.values).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(owner = owner.unwrap_or_default(), rows = records.len(), "catches listed");
        Ok(records)
    }

    /// Stores a new catch under a freshly generated 8-character id.
    ///
    /// Any `id` in `fields` is replaced. When the host reports the id as
    /// taken, a new one is drawn, up to the configured number of attempts.
    /// Returns the host's echo, which may be empty.
    pub async fn create(&self, mut fields: Map<String, Value>) -> Result<Option<CatchRecord>> {
        if fields.remove("id").is_some() {
            warn!("caller-supplied id ignored, catches get a generated id");
        }

        let mut attempt = 1;
        loop {
            let id = random_id(ID_LENGTH);
            let mut record = Map::new();
            record.insert("id".to_string(), Value::String(id.clone()));
            record.extend(fields.clone());

            let result = self
                .bridge
                .request(HostRequest::Insert {
                    table: self.table.clone(),
                    record,
                })
                .await;

            match result {
                Ok(echo) => {
                    debug!(%id, "catch stored");
                    return Ok(parse_echo(echo));
                }
                Err(e) if e.is_conflict() && attempt < self.insert_attempts => {
                    warn!(%id, attempt, "generated id already taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn parse_echo(echo: Value) -> Option<CatchRecord> {
    match echo {
        Value::Null => None,
        other => match serde_json::from_value(other) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "insert echo is not a catch record");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_echo() {
        assert_eq!(parse_echo(Value::Null), None);
        assert_eq!(parse_echo(json!(true)), None);
        let record = parse_echo(json!({"id": "abcd1234", "owner": "x"})).unwrap();
        assert_eq!(record.id, "abcd1234");
    }
}
