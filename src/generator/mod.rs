pub mod cache;
pub mod gemini;
pub mod speech;

use thiserror::Error;

use crate::http::HttpError;
use crate::library::ScenarioContent;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("malformed study guide: {0}")]
    Malformed(String),
}

/// Produces a study guide for a scenario name.
pub trait ScenarioGenerator {
    fn generate(&self, scenario: &str) -> Result<ScenarioContent, GenerateError>;
}
