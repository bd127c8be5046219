#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod extract;
pub mod media;
pub mod providers;

pub use bundle::{Assembler, ContentBundle, ExtractionContext};
pub use config::ExtractorConfig;
pub use error::{MirepoixError, Result};
pub use extract::{ExtractionPipeline, RecipeResult, StreamingExtractor, ThinkingPhase};
pub use providers::FailoverClient;
