//! Error types for the page model construction layer.
//!
//! Uses [`thiserror`] for ergonomic error derivation. The redaction engine
//! itself never returns these — it reports outcomes as booleans and
//! [`RedactOutcome`](crate::redactor::RedactOutcome) variants — but building
//! fonts and images out of lopdf dictionaries can fail.

use thiserror::Error;

/// Error type for constructing page model objects from PDF dictionaries.
#[derive(Debug, Error)]
pub enum EditError {
    /// Error resolving font or width information.
    #[error("font error: {0}")]
    Font(String),

    /// Error reading an image dictionary or stream.
    #[error("image error: {0}")]
    Image(String),

    /// Error from the underlying PDF object layer.
    #[error("PDF object error: {0}")]
    Object(#[from] lopdf::Error),
}
