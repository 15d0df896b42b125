use std::time::Duration;

use reqwest::StatusCode;

use crate::{
    jsonrpc::{self, INTERNAL_ERROR_CODE, SERVER_ERROR_CODE},
    reqwest_error::{MiddlewareError, ReqwestError},
};

/// Message reported to callers when the endpoint could not be reached or
/// answered with something other than a batch response.
pub const CONNECTION_UNAVAILABLE_MESSAGE: &str = "Network connection unavailable";

/// An error that occurs while constructing a
/// [`BatchingProvider`](crate::BatchingProvider).
#[derive(Debug, thiserror::Error)]
pub enum ProviderCreationError {
    /// The endpoint URL could not be parsed.
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint URL is not reachable over HTTP.
    #[error("Unsupported URL scheme '{scheme}' in '{url}'. Only http and https endpoints are supported.")]
    UnsupportedScheme {
        /// The scheme of the URL
        scheme: String,
        /// The URL
        url: String,
    },

    /// A configured HTTP header name or value is invalid.
    #[error("Invalid HTTP header '{name}': {message}")]
    InvalidHeader {
        /// The header name
        name: String,
        /// Description of the problem
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(ReqwestError),
}

/// Failure of a batch exchange. These never reach callers as errors; they are
/// folded into a [`jsonrpc::Error`] that every request of the batch resolves
/// with.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DispatchError {
    /// The batch could not be serialized.
    #[error(transparent)]
    InvalidJsonRequest(serde_json::Error),

    /// The batch could not be sent to the remote node.
    #[error(transparent)]
    FailedToSend(MiddlewareError),

    /// The server returned a non-success status code.
    #[error("Network error: {0}")]
    HttpStatus(StatusCode),

    /// The remote node failed to reply with the body of the response.
    #[error("The response text was corrupted: {0}.")]
    CorruptedResponse(ReqwestError),

    /// The response body is not JSON.
    #[error("Response '{response}' is not valid JSON, due to error: '{error}'")]
    InvalidResponse {
        /// The response text
        response: String,
        /// The parse error
        error: serde_json::Error,
    },

    /// The server answered the batch with a single error object instead of
    /// an array.
    #[error("The batch was rejected: {0}")]
    BatchRejected(jsonrpc::Error),

    /// The response is JSON, but neither an array nor an error object.
    #[error("Expected a batch response array, received: '{0}'")]
    UnexpectedResponse(String),

    /// The exchange did not complete in time.
    #[error("Batch request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
}

impl DispatchError {
    /// The error that every request of the failed batch resolves with.
    pub fn to_jsonrpc_error(&self) -> jsonrpc::Error {
        match self {
            DispatchError::HttpStatus(_) => jsonrpc::Error::new(SERVER_ERROR_CODE, self.to_string()),
            DispatchError::BatchRejected(error) => jsonrpc::Error {
                code: INTERNAL_ERROR_CODE,
                message: CONNECTION_UNAVAILABLE_MESSAGE.to_string(),
                data: serde_json::to_value(error).ok(),
            },
            DispatchError::Timeout(_) => jsonrpc::Error::new(INTERNAL_ERROR_CODE, self.to_string()),
            DispatchError::InvalidJsonRequest(_)
            | DispatchError::FailedToSend(_)
            | DispatchError::CorruptedResponse(_)
            | DispatchError::InvalidResponse { .. }
            | DispatchError::UnexpectedResponse(_) => jsonrpc::Error {
                code: INTERNAL_ERROR_CODE,
                message: CONNECTION_UNAVAILABLE_MESSAGE.to_string(),
                data: Some(serde_json::Value::String(self.to_string())),
            },
        }
    }
}
