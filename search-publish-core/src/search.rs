//! Single match-query search over published documents.

use serde_json::{json, Value};
use tracing::{error, info};

use crate::contract::SearchCluster;
use crate::error::TransportError;

/// Field searched when the caller does not name one.
pub const DEFAULT_FIELD: &str = "body";

pub fn match_query(field: &str, text: &str) -> Value {
    json!({ "query": { "match": { field: text } } })
}

/// Searches `field` (default `body`) for `text`, in `index` or in every index.
/// Returns the cluster's raw response.
pub async fn find<C>(
    cluster: &C,
    text: &str,
    field: Option<&str>,
    index: Option<&str>,
) -> Result<Value, TransportError>
where
    C: SearchCluster + ?Sized,
{
    let field = field.unwrap_or(DEFAULT_FIELD);
    let indexes: Vec<String> = index.map(str::to_string).into_iter().collect();
    let query = match_query(field, text);

    match cluster.search(&indexes, &query).await {
        Ok(results) => {
            info!(field, index = ?index, "Search completed");
            Ok(results)
        }
        Err(e) => {
            error!(field, index = ?index, error = ?e, "Search failed");
            Err(e)
        }
    }
}
