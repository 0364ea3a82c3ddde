//! Server-side filter rule management.
//!
//! The provider stores the rule set remotely; this module only mutates it
//! through the rules endpoint. The composite [`RuleManager::reset_rules`]
//! is the startup sequence: list, batch-delete, recreate.

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;

// -- Wire types -------------------------------------------------------------

/// A rule as returned by the server. `id` is server-assigned and only ever
/// present on rules read back from the rules endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub id: String,
    pub value: String,
    pub tag: String,
}

/// A client-authored rule submitted for creation: the filter expression and
/// a label. No `id`; the server assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub value: String,
    pub tag: String,
}

/// Response shape of a "list rules" call. A missing `data` key means the
/// remote set is empty and deserializes to `None`; the `meta` envelope is
/// ignored entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub data: Option<Vec<Rule>>,
}

impl RuleSet {
    /// True when the server reported no rules (absent or empty `data`).
    pub fn is_empty(&self) -> bool {
        self.data.as_ref().map_or(true, |rules| rules.is_empty())
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DeletePayload {
    delete: DeleteIds,
}

#[derive(Debug, PartialEq, Serialize)]
struct DeleteIds {
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AddPayload<'a> {
    add: &'a [RuleSpec],
}

/// Build the batch-delete body for a rule set, or `None` when there is
/// nothing to delete. Pure; the no-op short circuit lives here.
pub fn delete_payload(rules: &RuleSet) -> Option<DeletePayload> {
    let rules = rules.data.as_ref()?;
    if rules.is_empty() {
        return None;
    }
    let ids = rules.iter().map(|rule| rule.id.clone()).collect();
    Some(DeletePayload {
        delete: DeleteIds { ids },
    })
}

// -- Manager ----------------------------------------------------------------

/// Client for the rules endpoint. Holds the immutable header set built at
/// startup; every call clones it onto the request.
pub struct RuleManager {
    client: Client,
    headers: HeaderMap,
    rules_url: String,
}

impl RuleManager {
    pub fn new(headers: HeaderMap, rules_url: impl Into<String>) -> Self {
        RuleManager {
            client: Client::new(),
            headers,
            rules_url: rules_url.into(),
        }
    }

    /// Fetch the current remote rule set.
    ///
    /// Requires HTTP 200; any other status becomes [`Error::Api`] carrying
    /// the status and body. A body without a `data` key is a valid empty
    /// result, not an error.
    pub async fn get_rules(&self) -> Result<RuleSet, Error> {
        let response = self
            .client
            .get(&self.rules_url)
            .headers(self.headers.clone())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::from_response(response).await);
        }

        Ok(response.json::<RuleSet>().await?)
    }

    /// Batch-delete every rule in `rules`.
    ///
    /// Returns `Ok(false)` without touching the network when the set is
    /// empty; otherwise issues exactly one POST and returns `Ok(true)` on
    /// HTTP 200. Not safe to retry blindly (ids may have shifted), so
    /// callers must re-fetch before retrying.
    pub async fn delete_rules(&self, rules: &RuleSet) -> Result<bool, Error> {
        let Some(payload) = delete_payload(rules) else {
            return Ok(false);
        };

        let response = self
            .client
            .post(&self.rules_url)
            .headers(self.headers.clone())
            .json(&payload)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::from_response(response).await);
        }

        Ok(true)
    }

    /// Create the given rules on the server.
    ///
    /// The provider answers creation with HTTP 201; a 200 here is a
    /// failure, asymmetric from the other calls but part of the protocol.
    /// Returns `Ok(false)` without a network call when `specs` is empty.
    pub async fn set_rules(&self, specs: &[RuleSpec]) -> Result<bool, Error> {
        if specs.is_empty() {
            return Ok(false);
        }

        let response = self
            .client
            .post(&self.rules_url)
            .headers(self.headers.clone())
            .json(&AddPayload { add: specs })
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(Error::from_response(response).await);
        }

        Ok(true)
    }

    /// The startup reset: list, delete everything listed, recreate `specs`.
    ///
    /// Strictly sequential, no rollback. If creation fails after a
    /// successful delete the remote set is left empty; the error is
    /// surfaced, not masked.
    pub async fn reset_rules(&self, specs: &[RuleSpec]) -> Result<(), Error> {
        let existing = self.get_rules().await?;
        let count = existing.data.as_ref().map_or(0, Vec::len);
        info!(existing = count, "fetched remote rule set");

        if self.delete_rules(&existing).await? {
            info!(deleted = count, "cleared remote rule set");
        }

        if self.set_rules(specs).await? {
            info!(installed = specs.len(), "installed filter rules");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruleset_missing_data_key_is_empty() {
        let set: RuleSet = serde_json::from_str(r#"{"meta":{"result_count":0}}"#).expect("deser");
        assert!(set.data.is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn test_ruleset_with_rules_deserializes() {
        let set: RuleSet =
            serde_json::from_str(r#"{"data":[{"id":"1","value":"a","tag":"x"}],"meta":{}}"#)
                .expect("deser");
        let rules = set.data.as_ref().expect("data");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "1");
        assert_eq!(rules[0].value, "a");
        assert_eq!(rules[0].tag, "x");
        assert!(!set.is_empty());
    }

    #[test]
    fn test_ruleset_explicit_empty_data_is_empty() {
        let set: RuleSet = serde_json::from_str(r#"{"data":[]}"#).expect("deser");
        assert!(set.is_empty());
    }

    #[test]
    fn test_delete_payload_none_for_missing_data() {
        assert!(delete_payload(&RuleSet::default()).is_none());
    }

    #[test]
    fn test_delete_payload_none_for_empty_data() {
        let set = RuleSet { data: Some(vec![]) };
        assert!(delete_payload(&set).is_none());
    }

    #[test]
    fn test_delete_payload_collects_all_ids() {
        let set: RuleSet = serde_json::from_str(
            r#"{"data":[{"id":"1","value":"a","tag":"x"},{"id":"2","value":"b","tag":"y"}]}"#,
        )
        .expect("deser");
        let payload = delete_payload(&set).expect("payload");
        let json = serde_json::to_string(&payload).expect("serialize");
        assert_eq!(json, r#"{"delete":{"ids":["1","2"]}}"#);
    }

    #[test]
    fn test_delete_payload_single_rule_exact_body() {
        let set: RuleSet =
            serde_json::from_str(r#"{"data":[{"id":"1","value":"a","tag":"x"}]}"#).expect("deser");
        let payload = delete_payload(&set).expect("payload");
        assert_eq!(
            serde_json::to_string(&payload).expect("serialize"),
            r#"{"delete":{"ids":["1"]}}"#
        );
    }

    #[test]
    fn test_rule_spec_serializes_value_and_tag_only() {
        let spec = RuleSpec {
            value: "lang:en".to_string(),
            tag: "english".to_string(),
        };
        let json = serde_json::to_string(&spec).expect("serialize");
        assert_eq!(json, r#"{"value":"lang:en","tag":"english"}"#);
    }

    #[test]
    fn test_add_payload_shape() {
        let specs = vec![RuleSpec {
            value: "a".to_string(),
            tag: "x".to_string(),
        }];
        let json = serde_json::to_string(&AddPayload { add: &specs }).expect("serialize");
        assert_eq!(json, r#"{"add":[{"value":"a","tag":"x"}]}"#);
    }

    #[tokio::test]
    async fn test_delete_rules_empty_set_skips_network() {
        // Unroutable URL: if a request were attempted this would error.
        let manager = RuleManager::new(HeaderMap::new(), "http://0.0.0.0:0/rules");
        let deleted = manager.delete_rules(&RuleSet::default()).await.expect("no-op");
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_set_rules_empty_specs_skips_network() {
        let manager = RuleManager::new(HeaderMap::new(), "http://0.0.0.0:0/rules");
        let created = manager.set_rules(&[]).await.expect("no-op");
        assert!(!created);
    }
}
