//! Error types for the intake interview.
//!
//! Rejected submissions and stale timers are not errors; they surface as
//! [`crate::interview::Outcome::Rejected`]. What remains are configuration
//! defects, reported eagerly before a session exists.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A prompt script that breaks the script invariants.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Script has no prompts")]
    Empty,

    #[error("Prompt {index} is blank")]
    BlankPrompt { index: usize },

    #[error("Closing message is blank")]
    BlankClosing,

    #[error("Script has no section boundaries; the first must start at prompt 0")]
    MissingFirstSection,

    #[error("First section starts at prompt {starts_at}, expected 0")]
    FirstSectionNotAtZero { starts_at: usize },

    #[error("Section {slot} has a blank id")]
    BlankSectionId { slot: usize },

    #[error("Section {section_id} is defined more than once")]
    DuplicateSection { section_id: String },

    #[error("Section {section_id} starts at prompt {starts_at}, not after the previous section")]
    SectionsOutOfOrder { section_id: String, starts_at: usize },

    #[error("Section {section_id} starts at prompt {starts_at} but the script has {len} prompts")]
    SectionPastEnd {
        section_id: String,
        starts_at: usize,
        len: usize,
    },

    #[error("Failed to parse script: {0}")]
    Parse(String),

    #[error("Failed to read script {path}: {reason}")]
    Read { path: String, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
