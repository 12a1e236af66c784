use lazy_static::lazy_static;
use regex::Regex;

pub const MAX_INGREDIENTS: usize = 15;
pub const MAX_TOKEN_CHARS: usize = 30;

/// Turns OCR text into a candidate ingredient list. Best effort: never fails,
/// returns an empty list when nothing usable is found.
pub trait IngredientExtractor: Send + Sync {
    fn extract(&self, ocr_text: Option<&str>) -> Vec<String>;
}

/// Splits the text after an "ingredients:" style label on commas,
/// semicolons and parentheses.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabelSplitExtractor;

lazy_static! {
    static ref LABEL_RE: Regex = Regex::new(r"(?i)(ingredients|성분|원재료|구성품)\s*[:：]").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"[,;()]").unwrap();
    static ref NUMERIC_RE: Regex = Regex::new(r"^[0-9%]+$").unwrap();
}

impl IngredientExtractor for LabelSplitExtractor {
    fn extract(&self, ocr_text: Option<&str>) -> Vec<String> {
        let Some(text) = ocr_text else {
            return Vec::new();
        };

        let body = match LABEL_RE.find(text) {
            Some(m) => &text[m.end()..],
            None => text,
        };

        SEPARATOR_RE
            .split(body)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter(|t| t.chars().count() <= MAX_TOKEN_CHARS)
            .filter(|t| !NUMERIC_RE.is_match(t))
            .take(MAX_INGREDIENTS)
            .map(str::to_string)
            .collect()
    }
}
