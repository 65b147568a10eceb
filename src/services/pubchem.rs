//! PubChem synonym lookups
//!
//! Each measured name is looked up on its own through PUG REST
//! (`compound/name/{name}/synonyms/JSON`). Lookups are best effort: a name
//! PubChem does not know, a timeout or a malformed answer is recorded and
//! skipped so that one bad name never stops the run.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::report::{Report, Stage};

use super::error::ServiceError;

#[derive(Debug, Deserialize)]
struct SynonymResponse {
    #[serde(rename = "InformationList")]
    information_list: InformationList,
}

#[derive(Debug, Deserialize)]
struct InformationList {
    #[serde(rename = "Information", default)]
    information: Vec<Information>,
}

#[derive(Debug, Deserialize)]
struct Information {
    #[serde(rename = "CID")]
    cid: Option<u64>,
    #[serde(rename = "Synonym", default)]
    synonyms: Vec<String>,
}

/// Synonyms PubChem knows for a measured name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymRecord {
    /// The name that was looked up.
    pub name: String,
    /// PubChem compound id of the first matching compound.
    pub cid: Option<u64>,
    pub synonyms: Vec<String>,
}

/// Blocking PUG REST client.
#[derive(Debug, Clone)]
pub struct PubChemClient {
    client: reqwest::blocking::Client,
    base_url: Url,
}

#[bon::bon]
impl PubChemClient {
    /// Creates a client rooted at the PUG REST base URL, e.g.
    /// `https://pubchem.ncbi.nlm.nih.gov/rest/pug`.
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        let base = Url::parse(&base_url)
            .map_err(|e| ServiceError::InvalidUrl(base_url.clone(), e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl(
                base_url,
                "cannot be used as a base URL".to_string(),
            ));
        }

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base,
        })
    }
}

impl PubChemClient {
    /// Builds the synonym URL for `name`, percent-encoding it as a single path segment.
    fn synonyms_url(&self, name: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::InvalidUrl(
                    self.base_url.to_string(),
                    "cannot be used as a base URL".to_string(),
                )
            })?
            .pop_if_empty()
            .extend(["compound", "name", name, "synonyms", "JSON"]);
        Ok(url)
    }

    /// Looks up the synonyms of a single name.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(SynonymRecord))` - PubChem knows the name
    /// * `Ok(None)` - PubChem answered 404 for the name
    /// * `Err(ServiceError)` - The request or the response failed
    pub fn synonyms(&self, name: &str) -> Result<Option<SynonymRecord>, ServiceError> {
        let url = self.synonyms_url(name)?;
        log::debug!("GET {url}");

        let response = self.client.get(url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.error_for_status()?.text()?;
        let parsed: SynonymResponse = serde_json::from_str(&body)?;

        let mut information = parsed.information_list.information.into_iter();
        let Some(first) = information.next() else {
            return Ok(None);
        };

        let mut synonyms = first.synonyms;
        for other in information {
            for synonym in other.synonyms {
                if !synonyms.contains(&synonym) {
                    synonyms.push(synonym);
                }
            }
        }

        Ok(Some(SynonymRecord {
            name: name.to_string(),
            cid: first.cid,
            synonyms,
        }))
    }

    /// Looks up every name in turn, skipping the ones that fail.
    ///
    /// Misses are recorded as info, failures as warnings in `report`.
    pub fn lookup_all(&self, names: &[String], report: &mut Report) -> Vec<SynonymRecord> {
        let progress = ProgressBar::new(names.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        progress.set_message("PubChem synonyms");

        let mut records = Vec::new();
        for name in names {
            match self.synonyms(name) {
                Ok(Some(record)) => {
                    log::debug!("{} synonyms for {name}", record.synonyms.len());
                    records.push(record);
                }
                Ok(None) => report.info(Stage::Synonyms, name, "not found in PubChem"),
                Err(e) => report.warn(Stage::Synonyms, name, e.to_string()),
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        log::info!(
            "Found PubChem synonyms for {} of {} names",
            records.len(),
            names.len()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn client(server: &MockServer) -> PubChemClient {
        PubChemClient::builder()
            .base_url(server.url("/rest/pug"))
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build client")
    }

    #[test]
    fn test_synonyms() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/pug/compound/name/glucose/synonyms/JSON");
            then.status(200).json_body(json!({
                "InformationList": {
                    "Information": [
                        {"CID": 5793, "Synonym": ["D-Glucose", "Dextrose", "glucose"]}
                    ]
                }
            }));
        });

        let record = client(&server)
            .synonyms("glucose")
            .expect("Failed to query synonyms")
            .expect("Expected a record");

        mock.assert();
        assert_eq!(record.cid, Some(5793));
        assert_eq!(record.synonyms, vec!["D-Glucose", "Dextrose", "glucose"]);
    }

    #[test]
    fn test_names_are_percent_encoded() {
        let server = MockServer::start();
        let pubchem = client(&server);
        let url = pubchem.synonyms_url("2-keto butyric/acid").unwrap();
        assert!(url
            .as_str()
            .ends_with("/rest/pug/compound/name/2-keto%20butyric%2Facid/synonyms/JSON"));
    }

    #[test]
    fn test_not_found_is_none() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/pug/compound/name/notacompound/synonyms/JSON");
            then.status(404).json_body(json!({
                "Fault": {"Code": "PUGREST.NotFound", "Message": "No CID found"}
            }));
        });

        let record = client(&server).synonyms("notacompound").unwrap();
        mock.assert();
        assert!(record.is_none());
    }

    #[test]
    fn test_lookup_all_skips_failures() {
        let server = MockServer::start();
        let found = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/pug/compound/name/lactate/synonyms/JSON");
            then.status(200).json_body(json!({
                "InformationList": {"Information": [{"CID": 91435, "Synonym": ["Lactate"]}]}
            }));
        });
        let missing = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/pug/compound/name/unknown/synonyms/JSON");
            then.status(404);
        });
        let broken = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/pug/compound/name/broken/synonyms/JSON");
            then.status(200).body("not json");
        });

        let names = vec![
            "lactate".to_string(),
            "unknown".to_string(),
            "broken".to_string(),
        ];
        let mut report = Report::new();
        let records = client(&server).lookup_all(&names, &mut report);

        found.assert();
        missing.assert();
        broken.assert();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "lactate");
        assert_eq!(report.len(), 2);
        assert_eq!(report.warnings(), 1);
    }
}
