use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("could not parse data file: {0}")]
    Schema(String),

    #[error("invalid data file: {0}")]
    Validation(String),

    #[error("no readings recorded for {0}")]
    NoData(NaiveDate),

    #[error("no submission found for {0}")]
    NoSubmission(NaiveDate),

    #[error("there is no entry {0} in the list")]
    NoSuchEntry(usize),

    #[error("reading refers to unknown symptom '{0}'")]
    UnknownSymptom(String),

    #[error("invalid value '{value}' for {symptom}: expected 0-10 or '-' for no answer")]
    FormValidation { symptom: String, value: String },

    #[error("io error at {path}: {message}")]
    Io { path: String, message: String },
}

impl TrackerError {
    pub fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        TrackerError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Errors that mean "nothing to show" rather than a broken operation.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            TrackerError::NoData(_) | TrackerError::NoSubmission(_) | TrackerError::NoSuchEntry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
