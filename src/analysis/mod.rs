pub mod dto;
pub mod extractor;
pub mod transformer;

pub use dto::AnalysisResult;
pub use extractor::{IngredientExtractor, LabelSplitExtractor};
pub use transformer::ResultTransformer;
