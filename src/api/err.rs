//! The error type of all resolvers.
//!
//! Clients only see a coarse kind (in the `extensions` of the GraphQL error)
//! and a message. Details of store errors end up in the log instead.

use juniper::{FieldError, IntoFieldError, ScalarValue, graphql_value};
use std::fmt;

use crate::prelude::*;


pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub(crate) struct ApiError {
    kind: ApiErrorKind,
    msg: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// An argument cannot be used, e.g. a malformed ID.
    InvalidInput,

    /// Something went wrong on our side, e.g. the store failed or returned
    /// an unusable record.
    InternalServerError,
}

impl ApiError {
    pub(crate) fn invalid_input(msg: impl fmt::Display) -> Self {
        Self { kind: ApiErrorKind::InvalidInput, msg: msg.to_string() }
    }

    pub(crate) fn internal(msg: impl fmt::Display) -> Self {
        Self { kind: ApiErrorKind::InternalServerError, msg: msg.to_string() }
    }

    pub(crate) fn kind(&self) -> ApiErrorKind {
        self.kind
    }
}

impl ApiErrorKind {
    /// The value of `extensions.kind` in the response.
    pub(crate) fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            ApiErrorKind::InvalidInput => "Invalid input",
            ApiErrorKind::InternalServerError => "Internal server error",
        };
        write!(f, "{prefix}: {}", self.msg)
    }
}

impl From<tokio_postgres::Error> for ApiError {
    fn from(src: tokio_postgres::Error) -> Self {
        // The only place that still knows the details.
        error!("Store query failed: {src}");
        debug!("Store error details: {src:#?}");
        Self::internal(format_args!("DB error: {src}"))
    }
}

impl<S: ScalarValue> IntoFieldError<S> for ApiError {
    fn into_field_error(self) -> FieldError<S> {
        FieldError::new(self.to_string(), graphql_value!({ "kind": (self.kind.code()) }))
    }
}


#[cfg(test)]
mod tests {
    use juniper::{DefaultScalarValue, IntoFieldError, graphql_value};
    use super::{ApiError, ApiErrorKind};

    #[test]
    fn field_error_carries_kind() {
        let err = ApiError::invalid_input("malformed ID");
        assert_eq!(err.kind(), ApiErrorKind::InvalidInput);

        let field_err = IntoFieldError::<DefaultScalarValue>::into_field_error(err);
        assert_eq!(field_err.message(), "Invalid input: malformed ID");
        assert_eq!(field_err.extensions(), &graphql_value!({ "kind": "INVALID_INPUT" }));
    }

    #[test]
    fn internal_message() {
        let err = ApiError::internal(format_args!("record {} is broken", 3));
        assert_eq!(err.to_string(), "Internal server error: record 3 is broken");
        assert_eq!(err.kind().code(), "INTERNAL_SERVER_ERROR");
    }
}
