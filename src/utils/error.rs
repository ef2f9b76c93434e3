use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid VIN '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Inconsistent row length: row {row} has {actual} values but {expected} columns are defined")]
    InconsistentRowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed input: {message}")]
    MalformedInput { message: String },

    #[error("Document store unavailable at {location}: {message}")]
    StoreUnavailable { location: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Store,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_)
            | EtlError::InvalidIdentifier { .. }
            | EtlError::InconsistentRowLength { .. }
            | EtlError::MalformedInput { .. }
            | EtlError::ProcessingError { .. } => ErrorCategory::Input,
            EtlError::StoreUnavailable { .. } => ErrorCategory::Store,
            EtlError::IoError(_) | EtlError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            // 儲存端沒有重試機制，直接視為致命錯誤
            ErrorCategory::Store | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::IoError(_) => "Check that the file exists and that you have permission to read and write it",
            EtlError::SerializationError(_) => "Make sure the input is valid JSON in the expected shape",
            EtlError::CsvError(_) => "Retry with --format table or --format json",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
            EtlError::InvalidIdentifier { .. } => {
                "Enter the first 10 characters of the VIN, e.g. 5YJ3E1EA7J"
            }
            EtlError::InconsistentRowLength { .. } => {
                "Fix the export, or rerun with --short-rows pad-null to fill missing values with null"
            }
            EtlError::MalformedInput { .. } => {
                "The input must contain meta.view.columns and a data array of rows"
            }
            EtlError::StoreUnavailable { .. } => {
                "Run `evdash import <FILE>` to create the collection, or point --data-dir at an existing one"
            }
            EtlError::ProcessingError { .. } => "Rerun with --verbose for more detail",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::IoError(e) => format!("File access failed: {}", e),
            EtlError::SerializationError(e) => format!("Could not read JSON data: {}", e),
            EtlError::InconsistentRowLength {
                row,
                expected,
                actual,
            } => format!(
                "Row {} has {} values, expected {} (one per column)",
                row, actual, expected
            ),
            EtlError::StoreUnavailable { location, .. } => {
                format!("The vehicle collection at {} could not be opened", location)
            }
            other => other.to_string(),
        }
    }

    /// 對應 CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
