use serde::Deserialize;
use serde_json::Value;

/// Outcome of a `_bulk` call as reported inside the response body.
#[derive(Debug, Clone, Default)]
pub struct BulkSummary {
    took: u64,
    errors: bool,
    items: u64,
    failed: u64,
    first_failure: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    errors: bool,
    items: Vec<Value>,
}

impl BulkSummary {
    /// `None` when the body is not a bulk response (e.g. an error page).
    pub fn parse(body: &str) -> Option<Self> {
        let raw: RawBulkResponse = serde_json::from_str(body).ok()?;

        let mut failed = 0u64;
        let mut first_failure = None;
        for item in &raw.items {
            // each item is {"<action>": {"status": .., "error": {..}}}
            let Some(result) = item.as_object().and_then(|o| o.values().next()) else {
                continue;
            };
            if let Some(error) = result.get("error") {
                failed += 1;
                if first_failure.is_none() {
                    first_failure = Some(describe_error(error));
                }
            }
        }

        Some(Self {
            took: raw.took,
            errors: raw.errors,
            items: raw.items.len() as u64,
            failed,
            first_failure,
        })
    }

    pub fn get_took(&self) -> u64 {
        self.took
    }
    pub fn has_errors(&self) -> bool {
        self.errors || self.failed > 0
    }
    pub fn get_items(&self) -> u64 {
        self.items
    }
    pub fn get_failed(&self) -> u64 {
        self.failed
    }
    pub fn get_first_failure(&self) -> Option<&String> {
        self.first_failure.as_ref()
    }
}

fn describe_error(error: &Value) -> String {
    match (error["type"].as_str(), error["reason"].as_str()) {
        (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
        (Some(kind), None) => kind.to_string(),
        _ => error.to_string(),
    }
}
