use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::Page;
use crate::analysis::AnalysisResult;
use crate::state::AppState;
use crate::storage::{keys, StorageError};

pub const CORRUPT_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Unsafe,
    Caution,
    Safe,
}

impl Verdict {
    pub fn of(result: &AnalysisResult) -> Self {
        if !result.danger.is_empty() {
            Verdict::Unsafe
        } else if !result.caution.is_empty() {
            Verdict::Caution
        } else {
            Verdict::Safe
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Unsafe => "This product is not safe to eat.",
            Verdict::Caution => "Eat with caution.",
            Verdict::Safe => "This product is safe to eat.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxKind {
    Danger,
    Caution,
    Safe,
}

impl BoxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoxKind::Danger => "danger",
            BoxKind::Caution => "caution",
            BoxKind::Safe => "safe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientBox {
    pub kind: BoxKind,
    pub ingredients: Vec<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultReport {
    pub verdict: Verdict,
    pub boxes: Vec<IngredientBox>,
    pub result: AnalysisResult,
}

impl ResultReport {
    pub fn new(result: AnalysisResult) -> Self {
        let make = |kind, items: &Vec<String>| IngredientBox {
            kind,
            ingredients: items.clone(),
            enabled: !items.is_empty(),
        };
        Self {
            verdict: Verdict::of(&result),
            boxes: vec![
                make(BoxKind::Danger, &result.danger),
                make(BoxKind::Caution, &result.caution),
                make(BoxKind::Safe, &result.safe),
            ],
            result,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ResultView {
    Show(ResultReport),
    Redirect {
        to: Page,
        after: Duration,
        message: String,
    },
}

/// Reads the stored analysis once and clears it.
pub async fn open(st: &AppState) -> Result<ResultView, StorageError> {
    let Some(raw) = st.storage.get_item(keys::RESULT_DATA).await? else {
        warn!("no stored analysis result");
        return Ok(ResultView::Redirect {
            to: Page::Index,
            after: Duration::ZERO,
            message: "No analysis result available.".into(),
        });
    };
    st.storage.remove_item(keys::RESULT_DATA).await?;

    let value: Value = match serde_json::from_str(&raw) {
        Ok(v @ Value::Object(_)) => v,
        Ok(other) => {
            error!(kind = ?other, "stored analysis result is not an object");
            return Ok(corrupted());
        }
        Err(e) => {
            error!(error = %e, "stored analysis result is corrupted");
            return Ok(corrupted());
        }
    };

    let result = AnalysisResult::from_stored(&value);
    info!(
        danger = result.danger.len(),
        caution = result.caution.len(),
        safe = result.safe.len(),
        "showing analysis result"
    );
    Ok(ResultView::Show(ResultReport::new(result)))
}

fn corrupted() -> ResultView {
    ResultView::Redirect {
        to: Page::Index,
        after: CORRUPT_REDIRECT_DELAY,
        message: "Stored result is corrupted.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            image_url: "data:image/jpeg;base64,AA==".into(),
            danger: vec!["gelatin".into(), "milk".into()],
            caution: vec!["natural flavor".into()],
            safe: vec!["water".into(), "sugar".into(), "salt".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn persisted_result_reloads_identically_and_is_consumed() {
        let st = AppState::fake();
        storage::set_json(st.storage.as_ref(), keys::RESULT_DATA, &sample())
            .await
            .unwrap();

        let ResultView::Show(report) = open(&st).await.unwrap() else {
            panic!("expected a report");
        };
        assert_eq!(report.result.danger, sample().danger);
        assert_eq!(report.result.caution, sample().caution);
        assert_eq!(report.result.safe, sample().safe);
        assert_eq!(report.verdict, Verdict::Unsafe);

        assert!(st.storage.get_item(keys::RESULT_DATA).await.unwrap().is_none());
        assert!(matches!(
            open(&st).await.unwrap(),
            ResultView::Redirect { after: Duration::ZERO, .. }
        ));
    }

    #[tokio::test]
    async fn corrupted_record_redirects_with_delay() {
        let st = AppState::fake();
        st.storage.set_item(keys::RESULT_DATA, "{not json").await.unwrap();

        assert_eq!(
            open(&st).await.unwrap(),
            ResultView::Redirect {
                to: Page::Index,
                after: CORRUPT_REDIRECT_DELAY,
                message: "Stored result is corrupted.".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_lists_default_to_empty() {
        let st = AppState::fake();
        st.storage
            .set_item(keys::RESULT_DATA, r#"{"imageUrl":"x","danger":null}"#)
            .await
            .unwrap();

        let ResultView::Show(report) = open(&st).await.unwrap() else {
            panic!("expected a report");
        };
        assert_eq!(report.verdict, Verdict::Safe);
        assert!(report.boxes.iter().all(|b| !b.enabled));
    }

    #[test]
    fn caution_verdict_when_only_caution() {
        let result = AnalysisResult {
            caution: vec!["palm oil".into()],
            ..Default::default()
        };
        let report = ResultReport::new(result);
        assert_eq!(report.verdict, Verdict::Caution);
        assert_eq!(report.verdict.message(), "Eat with caution.");
        assert!(!report.boxes[0].enabled);
        assert!(report.boxes[1].enabled);
    }
}
