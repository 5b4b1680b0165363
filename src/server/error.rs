use axum::{
    http::StatusCode,
    response::{IntoResponse, Response}
};
use log::{error, warn};

use balance_ledger::{backend::BackendError, page::AppError, LedgerError};

/// Why a page could not be served.
#[derive(Debug)]
pub(crate) enum ServerError {
    /// No route matches the requested path.
    NotFound(String),
    /// Loading or updating the page failed.
    Page(AppError)
}

impl ServerError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Page(AppError::Ledger(LedgerError::Store(BackendError::QuotaExceeded { .. }))) =>
                StatusCode::INSUFFICIENT_STORAGE,
            Self::Page(AppError::NotLoaded) => StatusCode::CONFLICT,
            Self::Page(_) => StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NotFound(uri) => format!("No page at {}", uri),
            Self::Page(AppError::Ledger(LedgerError::CorruptStore { key, .. })) =>
                format!("Stored ledger data is unreadable ({})", key),
            Self::Page(AppError::Ledger(LedgerError::Store(BackendError::QuotaExceeded { .. }))) =>
                "Ledger storage is full, the transfer was not saved".to_owned(),
            Self::Page(err) => format!("Internal error: {}", err)
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::NotFound(uri) => warn!("no route for {}", uri),
            Self::Page(err) => error!("request failed: {}", err)
        }
        (status, self.message()).into_response()
    }
}

impl From<AppError> for ServerError {
    fn from(err: AppError) -> Self {
        Self::Page(err)
    }
}
