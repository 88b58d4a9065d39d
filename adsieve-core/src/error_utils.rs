use crate::error::*;
use std::cell::Cell;
use std::fmt::Display;
use tracing::{error, warn};

/// Stable codes and structured logging shared by every error type in the
/// workspace.
pub trait ErrorExt: Display {
    /// Upper-snake identifier that does not change with the message text.
    fn error_code(&self) -> &'static str;

    /// Whether the same input may succeed on a later reconciliation pass.
    fn is_retryable(&self) -> bool;

    fn log_error(&self) -> &Self {
        error!(code = self.error_code(), retryable = self.is_retryable(), "{}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = self.error_code(), retryable = self.is_retryable(), "{}", self);
        self
    }
}

impl ErrorExt for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            CoreError::Storage(_) => "STORAGE",
            CoreError::Extraction(_) => "EXTRACTION",
            CoreError::Config(_) => "CONFIG",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Storage(e) => e.is_retryable(),
            CoreError::Extraction(e) => e.is_retryable(),
            CoreError::Config(e) => e.is_retryable(),
            CoreError::InvalidInput { .. } => false,
        }
    }

    fn log_error(&self) -> &Self {
        let detail = match self {
            CoreError::Storage(e) => e.error_code(),
            CoreError::Extraction(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::InvalidInput { .. } => self.error_code(),
        };
        error!(
            code = self.error_code(),
            detail,
            retryable = self.is_retryable(),
            "{}",
            self
        );
        self
    }
}

impl ErrorExt for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            StorageError::Parse { .. } => "STORAGE_PARSE",
            StorageError::Read { .. } => "STORAGE_READ",
            StorageError::Write { .. } => "STORAGE_WRITE",
            StorageError::Io(_) => "STORAGE_IO",
        }
    }

    fn is_retryable(&self) -> bool {
        // A corrupt payload stays corrupt until it is overwritten
        !matches!(self, StorageError::Parse { .. })
    }
}

impl ErrorExt for ExtractionError {
    fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::NotRendered { .. } => "EXTRACTION_NOT_RENDERED",
            ExtractionError::NotAnAd { .. } => "EXTRACTION_NOT_AN_AD",
            ExtractionError::MissingId => "EXTRACTION_MISSING_ID",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::NotRendered { .. })
    }
}

impl ErrorExt for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::InvalidFormat { .. } => "CONFIG_INVALID_FORMAT",
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }
}

/// Sink for failures the engine absorbs instead of returning. Keeps a tally
/// so callers can tell whether anything went wrong during a session.
#[derive(Debug)]
pub struct ErrorReporter {
    errors: Cell<usize>,
    warnings: Cell<usize>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            errors: Cell::new(0),
            warnings: Cell::new(0),
        }
    }

    pub fn report_error(&self, error: &CoreError) {
        self.errors.set(self.errors.get() + 1);
        error.log_error();
    }

    pub fn report_warning(&self, error: &CoreError) {
        self.warnings.set(self.warnings.get() + 1);
        error.log_warn();
    }

    pub fn errors(&self) -> usize {
        self.errors.get()
    }

    pub fn warnings(&self) -> usize {
        self.warnings.get()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
