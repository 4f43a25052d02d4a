//! HTTP error translation for the discovery API.

use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{DiscError, EntryValidationError, ErrorKind};

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpMessage {
    pub code: u16,
    pub message: String,
}

impl HttpMessage {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
        }
    }
}

fn chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&e| e.source())
}

fn is_validation(err: &(dyn StdError + 'static)) -> bool {
    err.is::<EntryValidationError>()
        || matches!(err.downcast_ref::<DiscError>(), Some(DiscError::Validation(_)))
}

fn find_validation<'a>(
    err: &'a (dyn StdError + 'static),
) -> Option<&'a (dyn StdError + 'static)> {
    chain(err).find(|e| is_validation(*e))
}

fn find_kind(err: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    chain(err).find_map(|e| e.downcast_ref::<DiscError>().and_then(DiscError::kind))
}

/// Map an error to the status and body sent to the client.
///
/// A validation error anywhere in the source chain wins over any sentinel,
/// and its own message is sent. Errors with no known kind become a 500 with
/// a generic message; their text only reaches the log.
#[must_use]
pub fn translate(err: &(dyn StdError + 'static)) -> (StatusCode, HttpMessage) {
    let (status, message) = if let Some(invalid) = find_validation(err) {
        (StatusCode::UNPROCESSABLE_ENTITY, invalid.to_string())
    } else {
        let kind = find_kind(err).unwrap_or(ErrorKind::Unexpected);
        (kind.status(), kind.message().to_string())
    };

    if status != StatusCode::NOT_FOUND {
        tracing::warn!("{}: {err}", status.as_u16());
    }

    (status, HttpMessage::new(status, message))
}

/// Handler error rendered through [`translate`].
#[derive(Debug)]
pub struct ApiError(Box<dyn StdError + Send + Sync>);

impl<E> From<E> for ApiError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self(Box::new(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = translate(&*self.0);
        (status, Json(body)).into_response()
    }
}
