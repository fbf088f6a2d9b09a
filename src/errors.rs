use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("places directory error: {0}")]
    Upstream(String),
    #[error("menu fetch error: {0}")]
    Fetch(String),
    #[error("summarizer error: {0}")]
    Generation(String),
    #[error("could not resolve a place identifier for {0}")]
    Resolution(String),
    #[error("{0}")]
    Config(String),
}

impl AppError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        AppError::Upstream(err.to_string())
    }

    pub fn fetch(err: impl std::fmt::Display) -> Self {
        AppError::Fetch(err.to_string())
    }

    pub fn generation(err: impl std::fmt::Display) -> Self {
        AppError::Generation(err.to_string())
    }
}
