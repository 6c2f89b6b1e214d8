use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not open the chart: {0}")]
    Open(#[from] opener::OpenError),

    #[error("plotting error: {0}")]
    Plot(String),

    #[error("invalid interval {0:?}, expected one of day, week, month")]
    InvalidInterval(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for TrendError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        TrendError::Plot(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;
