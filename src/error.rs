use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Row {0} is out of range (1-30)")]
    InvalidRow(u32),

    #[error("Column {0} is out of range (1-15)")]
    InvalidColumn(u32),

    #[error("Unknown cell placement: {0}")]
    InvalidPlacement(String),

    #[error("Invalid date key: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time-in: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Unknown service code: {0}")]
    UnknownService(String),

    #[error("Service {code} has unsupported duration of {minutes} minutes")]
    UnsupportedDuration { code: String, minutes: u32 },

    #[error("{worker} cannot perform service {code}. Available services: {}", valid.join(", "))]
    SkillMismatch {
        worker: String,
        code: String,
        valid: Vec<String>,
    },

    #[error("Worker not found: {0}")]
    WorkerNotFound(String),

    #[error("Worker already exists: {0}")]
    WorkerExists(String),

    #[error("Worker name must not be empty")]
    EmptyWorkerName,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
