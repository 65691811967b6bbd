//! HTTP error mapping for the JSON/API surface.
//!
//! The router is the single place where an error kind becomes a status
//! code. API callers get the status and a stable error kind only; internal
//! error text never leaks on this surface (the HTML surface renders it,
//! see `render::error_page`).

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::errors::Error;

#[derive(Debug)]
pub struct ApiError(pub Error);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn kind(&self) -> &'static str {
        match self.0 {
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::UnknownProvider(_) => "unknown_provider",
            Error::Backend(_) => "backend_error",
            Error::Internal(_) | Error::Config(_) | Error::Io { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(ErrorBody { error: self.kind() })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError(Error::bad_request("x")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(Error::unknown_provider("x")).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(Error::unauthorized("x")).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError(Error::internal("x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError(Error::backend("x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kind_never_carries_internal_text() {
        let err = ApiError(Error::backend("vault exploded at 10.0.0.1"));
        assert_eq!(err.kind(), "backend_error");
    }
}
