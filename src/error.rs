use thiserror::Error;

/// Controller-facing error taxonomy.
///
/// Fetch and mail failures inside a running tick never surface here; the tick
/// boundary logs and swallows them. These variants are what the embedding
/// surface (HTTP layer, CLI, tests) sees from the watch controllers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] zhihu_client::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
