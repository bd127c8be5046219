pub mod json;
pub mod pipeline;
pub mod prompt;
pub mod streaming;
pub mod types;

pub use pipeline::ExtractionPipeline;
pub use streaming::{
    NullProgressSink, ProgressEvent, ProgressSink, StreamScanner, StreamingExtractor,
    ThinkingPhase,
};
pub use types::{DetectedItem, Ingredient, PortionAnalysis, RecipeResult};
