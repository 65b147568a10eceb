//! MetaboAnalyst compound-mapping client
//!
//! Sends all measured names in a single `mapcompounds` request and turns the
//! response into [`IdentifierRecord`]s. The service answers with a
//! column-oriented JSON object (`{"query": [...], "kegg_id": [...]}`); a
//! row-oriented array is accepted as well.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::identifiers::{
    clean, normalize_chebi, normalize_hmdb, normalize_kegg, normalize_numeric, IdentifierRecord,
};

use super::error::ServiceError;

/// Separator MetaboAnalyst expects between names in `queryList`.
const QUERY_SEPARATOR: &str = ";";

#[derive(Debug, Serialize)]
struct MapCompoundsRequest<'a> {
    #[serde(rename = "queryList")]
    query_list: String,
    #[serde(rename = "inputType")]
    input_type: &'a str,
}

/// Blocking client for the `mapcompounds` endpoint.
#[derive(Debug, Clone)]
pub struct MetaboAnalystClient {
    client: reqwest::blocking::Client,
    url: Url,
}

#[bon::bon]
impl MetaboAnalystClient {
    /// Creates a client for the given endpoint URL.
    #[builder]
    pub fn new(
        #[builder(into)] url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        let url = Url::parse(&url)
            .map_err(|e| ServiceError::InvalidUrl(url.clone(), e.to_string()))?;

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url,
        })
    }
}

impl MetaboAnalystClient {
    /// Maps metabolite names to ChEBI, KEGG, HMDB, PubChem and METLIN identifiers.
    ///
    /// # Arguments
    ///
    /// * `names` - The metabolite names to resolve
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<IdentifierRecord>)` - One record per row of the service response
    /// * `Err(ServiceError)` - The request failed or the response could not be parsed
    pub fn map_compounds(&self, names: &[String]) -> Result<Vec<IdentifierRecord>, ServiceError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        log::info!("Mapping {} names with MetaboAnalyst", names.len());

        let request = MapCompoundsRequest {
            query_list: names.join(QUERY_SEPARATOR),
            input_type: "name",
        };

        let response = self
            .client
            .post(self.url.as_str())
            .header("cache-control", "no-cache")
            .json(&request)
            .send()?
            .error_for_status()?;

        let body = response.text()?;
        let records = parse_response(&body)?;

        log::info!("MetaboAnalyst returned {} records", records.len());
        Ok(records)
    }
}

/// Parses a `mapcompounds` response body.
pub fn parse_response(body: &str) -> Result<Vec<IdentifierRecord>, ServiceError> {
    let value: Value = serde_json::from_str(body)?;

    let rows: Vec<HashMap<String, Value>> = match value {
        Value::Object(columns) => columns_to_rows(columns)?,
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map.into_iter().collect()),
                other => Err(ServiceError::UnexpectedResponse(format!(
                    "expected an object per row, got {other}"
                ))),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(ServiceError::UnexpectedResponse(format!(
                "expected an object or array, got {other}"
            )))
        }
    };

    Ok(rows.iter().filter_map(row_to_record).collect())
}

fn columns_to_rows(
    columns: serde_json::Map<String, Value>,
) -> Result<Vec<HashMap<String, Value>>, ServiceError> {
    let mut arrays = HashMap::new();
    for (name, column) in columns {
        match column {
            Value::Array(values) => {
                arrays.insert(name, values);
            }
            other => {
                return Err(ServiceError::UnexpectedResponse(format!(
                    "column '{name}' is not an array: {other}"
                )))
            }
        }
    }

    let height = arrays
        .get("query")
        .map(Vec::len)
        .ok_or_else(|| ServiceError::UnexpectedResponse("missing 'query' column".to_string()))?;

    Ok((0..height)
        .map(|i| {
            arrays
                .iter()
                .filter_map(|(name, values)| values.get(i).map(|v| (name.clone(), v.clone())))
                .collect()
        })
        .collect())
}

fn row_to_record(row: &HashMap<String, Value>) -> Option<IdentifierRecord> {
    let field = |name: &str| row.get(name).and_then(value_to_string);
    let query = field("query")?;

    Some(IdentifierRecord {
        query,
        hit: field("hit"),
        hmdb: field("hmdb_id").and_then(|v| normalize_hmdb(&v)),
        kegg: field("kegg_id").and_then(|v| normalize_kegg(&v)),
        pubchem: field("pubchem_id").and_then(|v| normalize_numeric(&v)),
        chebi: field("chebi_id").and_then(|v| normalize_chebi(&v)),
        metlin: field("metlin_id").and_then(|v| normalize_numeric(&v)),
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => clean(text).map(str::to_string),
        Value::Number(number) => normalize_numeric(&number.to_string()),
        _ => None,
    }
}
