//! Client for the authenticated caption list endpoint

use crate::http::JsonClient;
use keyhoist_core::config::CaptionsConfig;
use keyhoist_core::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// One caption as returned by the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Caption {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub module: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub caption: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fetches the caption list with a bearer token
pub struct CaptionClient {
    http: JsonClient,
    endpoint: String,
    token: String,
}

impl CaptionClient {
    pub fn new(config: &CaptionsConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            Error::config("captions.endpoint is required for the captions command".to_string())
        })?;
        let token = config.token.clone().ok_or_else(|| {
            Error::config(
                "Caption token required. Set captions.token or KEYHOIST_CAPTIONS_TOKEN env var"
                    .to_string(),
            )
        })?;

        info!("Initializing caption client for {endpoint}");
        Ok(Self {
            http: JsonClient::new(config.timeout_secs, config.retry_attempts)?,
            endpoint,
            token,
        })
    }

    /// Override the initial retry backoff
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.http = self.http.with_backoff(backoff);
        self
    }

    pub async fn fetch(&self) -> Result<Vec<Caption>> {
        let captions: Vec<Caption> = self
            .http
            .get_json(&self.endpoint, Some(self.token.as_str()))
            .await?;
        info!("Fetched {} captions", captions.len());
        Ok(captions)
    }
}

/// Group captions by module, modules sorted, captions in response order
pub fn group_by_module(captions: Vec<Caption>) -> BTreeMap<String, Vec<Caption>> {
    let mut grouped: BTreeMap<String, Vec<Caption>> = BTreeMap::new();
    for caption in captions {
        grouped.entry(caption.module.clone()).or_default().push(caption);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_caption_shapes() {
        let captions: Vec<Caption> = serde_json::from_str(
            r#"[
                { "id": 7, "module": "Inspection", "label": "roomTitle", "caption": "Room", "language": "en" },
                { "id": "x-1", "module": null, "label": "a", "caption": null, "language": "de" }
            ]"#,
        )
        .unwrap();
        assert_eq!(captions[0].id, "7");
        assert_eq!(captions[1].module, "");
        assert_eq!(captions[1].caption, "");
    }

    #[test]
    fn test_group_by_module() {
        let caption = |id: &str, module: &str| Caption {
            id: id.to_string(),
            module: module.to_string(),
            label: String::new(),
            caption: String::new(),
            language: "en".to_string(),
        };
        let grouped = group_by_module(vec![
            caption("1", "Work"),
            caption("2", "Inspection"),
            caption("3", "Work"),
        ]);
        let modules: Vec<&String> = grouped.keys().collect();
        assert_eq!(modules, vec!["Inspection", "Work"]);
        let ids: Vec<&str> = grouped["Work"].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_missing_endpoint_or_token() {
        let config = CaptionsConfig::default();
        assert!(matches!(CaptionClient::new(&config), Err(Error::Config(_))));

        let config = CaptionsConfig {
            endpoint: Some("http://localhost/captions".to_string()),
            ..CaptionsConfig::default()
        };
        assert!(matches!(CaptionClient::new(&config), Err(Error::Config(_))));
    }
}
