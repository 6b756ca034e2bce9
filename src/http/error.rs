use std::io;

use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tracing::error;

use super::mime::TEXT_PLAIN;

#[derive(thiserror::Error, Debug)]
pub enum RouteError {
    // Path traversal attempt
    #[error("bad request")]
    BadRequest(),
    #[error("file not found")]
    NotFound(),
    // Resolved path is a directory
    #[error("internal server error")]
    InternalError(),
    // Disk read or compression took longer than the request timeout
    #[error("request timed out")]
    Timeout(),
    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

impl From<io::Error> for RouteError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => RouteError::NotFound(),
            _ => RouteError::Any(err.into()),
        }
    }
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        use RouteError::*;

        match self {
            BadRequest() => StatusCode::BAD_REQUEST,
            NotFound() => StatusCode::NOT_FOUND,
            InternalError() | Any(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Timeout() => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn body(&self) -> &'static str {
        use RouteError::*;

        match self {
            BadRequest() => "Bad Request",
            NotFound() => "404 - File Not Found",
            InternalError() | Any(_) => "500 - Internal Server Error",
            Timeout() => "504 - Gateway Timeout",
        }
    }
}

// Tell axum how to convert `RouteError` into a response.
impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        if let RouteError::Any(err) = &self {
            error!("{err:?}");
        }
        let mut res = (self.status(), self.body()).into_response();
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
        res
    }
}

pub type RouteResult<T, E = RouteError> = Result<T, E>;
