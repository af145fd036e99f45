use crate::api::StatementResponse;
use crate::gateway::StoreGateway;
use docbridge_core::{DocbridgeError, DocbridgeResult};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Bounded server-side wait for statement completion.
const STATEMENT_WAIT_TIMEOUT: &str = "30s";

/// Rows returned by a successful query, keyed by column name.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRows {
    /// Result rows as column-name → value maps.
    pub rows: Vec<HashMap<String, serde_json::Value>>,
    /// Server-assigned statement identifier.
    pub statement_id: Option<String>,
    /// The warehouse the statement ran on.
    pub warehouse_id: String,
}

impl StoreGateway {
    /// Executes a SQL statement synchronously.
    ///
    /// When no warehouse is given the first one from the listing is used;
    /// no warehouses at all is an error. A statement that completes in a
    /// non-success state surfaces the remote-reported message, without
    /// retry.
    pub async fn execute_query(
        &self,
        sql: &str,
        warehouse_id: Option<&str>,
    ) -> DocbridgeResult<QueryRows> {
        let warehouse_id = match warehouse_id {
            Some(id) => id.to_string(),
            None => {
                let warehouses = self.api().list_warehouses().await?;
                let first = warehouses.into_iter().next().ok_or_else(|| {
                    DocbridgeError::Statement("no SQL warehouses available".to_string())
                })?;
                info!(warehouse_id = %first.id, "using default warehouse");
                first.id
            }
        };

        let response = self
            .api()
            .execute_statement(&warehouse_id, sql, STATEMENT_WAIT_TIMEOUT)
            .await?;

        let state = response
            .status
            .as_ref()
            .map(|s| s.state.as_str())
            .unwrap_or("UNKNOWN");

        if state != "SUCCEEDED" {
            let mut message = format!("query failed with state {state}");
            if let Some(remote) = response
                .status
                .as_ref()
                .and_then(|s| s.error.as_ref())
                .and_then(|e| e.message.as_deref())
            {
                message.push_str(&format!(": {remote}"));
            }
            if let Some(id) = response.statement_id.as_deref() {
                message.push_str(&format!(" (statement {id})"));
            }
            return Err(DocbridgeError::Statement(message));
        }

        let rows = map_rows(&response);
        info!(
            warehouse_id = %warehouse_id,
            rows = rows.len(),
            "query executed"
        );
        Ok(QueryRows {
            rows,
            statement_id: response.statement_id,
            warehouse_id,
        })
    }
}

/// Recovers column names from whichever schema location the response
/// populates. Which API version emits which shape is unclear, so both are
/// preserved.
fn column_names(response: &StatementResponse) -> Option<Vec<String>> {
    let schema = response
        .result
        .as_ref()
        .and_then(|r| r.schema.as_ref())
        .or_else(|| response.manifest.as_ref().and_then(|m| m.schema.as_ref()))?;
    if schema.columns.is_empty() {
        return None;
    }
    Some(schema.columns.iter().map(|c| c.name.clone()).collect())
}

fn map_rows(response: &StatementResponse) -> Vec<HashMap<String, serde_json::Value>> {
    let Some(data) = response.result.as_ref().and_then(|r| r.data_array.as_ref()) else {
        return Vec::new();
    };

    let columns = column_names(response).unwrap_or_else(|| {
        // Neither schema location is populated: fall back to positional
        // generic names sized to the first row.
        data.first()
            .map(|row| (0..row.len()).map(|i| format!("col_{i}")).collect())
            .unwrap_or_default()
    });

    data.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, value)| {
                    let name = columns
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("col_{i}"));
                    (name, value.clone())
                })
                .collect()
        })
        .collect()
}
