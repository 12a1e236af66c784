use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display-ready analysis, persisted under `resultData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub image_url: String,
    pub danger: Vec<String>,
    pub caution: Vec<String>,
    pub safe: Vec<String>,
    #[serde(rename = "_metadata", default)]
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub date: Option<String>,
    pub user_type: Option<String>,
    pub is_vegan: Option<bool>,
    #[serde(default)]
    pub number_forbidden: u64,
    pub is_caution: Option<bool>,
    #[serde(default)]
    pub number_caution: u64,
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub raw: Value,
}

impl AnalysisResult {
    /// Rebuilds a result from whatever was stored, replacing anything that is
    /// not a list of strings with an empty list.
    pub fn from_stored(value: &Value) -> Self {
        Self {
            image_url: value
                .get("imageUrl")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            danger: string_list(value.get("danger")),
            caution: string_list(value.get("caution")),
            safe: string_list(value.get("safe")),
            metadata: value
                .get("_metadata")
                .cloned()
                .and_then(|m| serde_json::from_value(m).ok())
                .unwrap_or_default(),
        }
    }
}

/// Array-coerces a JSON field: non-arrays become empty, non-string
/// elements are skipped.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
