use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::dto::{string_list, AnalysisMetadata, AnalysisResult};
use super::extractor::IngredientExtractor;

/// Maps a raw backend response onto danger / caution / safe buckets.
#[derive(Clone)]
pub struct ResultTransformer {
    extractor: Arc<dyn IngredientExtractor>,
}

impl ResultTransformer {
    pub fn new(extractor: impl IngredientExtractor + 'static) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }

    /// Never fails: anything missing or malformed becomes an empty list.
    /// The image url is left empty for the caller to fill in.
    pub fn transform(&self, backend: &Value) -> AnalysisResult {
        if !backend.is_object() {
            warn!(kind = json_kind(backend), "backend response is not an object");
            return AnalysisResult::default();
        }

        let danger = match backend.get("found_forbidden") {
            Some(v) => string_list(Some(v)),
            None => string_list(backend.get("detected_non_vegan_ingredients")),
        };
        let caution = string_list(backend.get("found_caution"));
        let ocr_text = backend.get("ocr_text").and_then(Value::as_str);

        let safe = match backend.get("found_safe") {
            Some(Value::Array(_)) => string_list(backend.get("found_safe")),
            _ => self.derive_safe(ocr_text, &danger, &caution),
        };

        AnalysisResult {
            image_url: String::new(),
            danger,
            caution,
            safe,
            metadata: metadata(backend, ocr_text),
        }
    }

    fn derive_safe(&self, ocr_text: Option<&str>, danger: &[String], caution: &[String]) -> Vec<String> {
        let flagged: Vec<String> = danger
            .iter()
            .chain(caution)
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        self.extractor
            .extract(ocr_text)
            .into_iter()
            .filter(|token| {
                let lower = token.to_lowercase();
                !flagged.iter().any(|f| lower.contains(f.as_str()))
            })
            .collect()
    }
}

fn metadata(backend: &Value, ocr_text: Option<&str>) -> AnalysisMetadata {
    let str_field = |k: &str| backend.get(k).and_then(Value::as_str).map(str::to_string);
    let bool_field = |k: &str| backend.get(k).and_then(Value::as_bool);
    let count_field = |k: &str| backend.get(k).and_then(Value::as_u64).unwrap_or(0);

    AnalysisMetadata {
        date: str_field("Date"),
        user_type: str_field("user_type"),
        is_vegan: bool_field("is_vegan"),
        number_forbidden: count_field("number_forbidden"),
        is_caution: bool_field("is_caution"),
        number_caution: count_field("number_caution"),
        ocr_text: ocr_text.filter(|t| !t.is_empty()).map(str::to_string),
        raw: backend.clone(),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
