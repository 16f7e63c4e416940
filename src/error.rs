use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no topics configured: add subjects and topics before generating a plan")]
    NoTopicsConfigured,

    #[error("session {0} is already completed")]
    AlreadyCompleted(i64),

    #[error("invalid {field}: {value} (expected 0-100)")]
    InvalidScore { field: &'static str, value: i64 },

    #[error("not logged in: run `studyplan login <name>` or pass --user")]
    NotAuthenticated,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

// Constraint failures surface separately so callers can tell bad input from a broken store.
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                Error::ConstraintViolation(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => Error::Persistence(err),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
