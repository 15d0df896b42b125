use serde::{Deserialize, Serialize};

/// Error code used for a non-success HTTP status of the batch request.
pub const SERVER_ERROR_CODE: i64 = -32000;
/// Error code used for failures of the transport itself.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Represents JSON-RPC 2.0 success response.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Response<T> {
    /// JSON-RPC version
    #[serde(rename = "jsonrpc")]
    pub version: Version,
    /// The request ID.
    pub id: Id,
    /// Success or error data
    #[serde(flatten)]
    pub data: ResponseData<T>,
}

/// Represents a JSON-RPC request.
///
/// `params` is omitted from the serialized form when absent.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Request {
    /// JSON-RPC version
    #[serde(rename = "jsonrpc")]
    pub version: Version,
    /// The request ID.
    pub id: Id,
    /// The name of the method.
    pub method: String,
    /// The method's parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl Request {
    /// Constructs a JSON-RPC 2.0 request with a numeric id.
    pub fn new(id: u64, method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            version: Version::V2_0,
            id: Id::Num(id),
            method: method.into(),
            params,
        }
    }
}

/// The object form of a call: `{ method, params }` without envelope fields.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RequestArguments {
    /// The name of the method.
    pub method: String,
    /// The method's parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

/// Positional or named parameters of a request.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Params {
    /// Positional parameters
    Array(Vec<serde_json::Value>),
    /// Named parameters
    Object(serde_json::Map<String, serde_json::Value>),
}

impl From<Vec<serde_json::Value>> for Params {
    fn from(value: Vec<serde_json::Value>) -> Self {
        Self::Array(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Params {
    fn from(value: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Object(value)
    }
}

/// Error returned by [`Params::try_from`] for JSON values that are neither an
/// array nor an object.
#[derive(Debug, thiserror::Error)]
#[error("JSON-RPC params must be an array or an object, found: {0}")]
pub struct InvalidParams(pub serde_json::Value);

impl TryFrom<serde_json::Value> for Params {
    type Error = InvalidParams;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Array(values) => Ok(Self::Array(values)),
            serde_json::Value::Object(map) => Ok(Self::Object(map)),
            value => Err(InvalidParams(value)),
        }
    }
}

/// Represents JSON-RPC 2.0 error.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, thiserror::Error)]
#[error("The response reported error `{code}`: `{message}`. (optional data: {data:?})")]
pub struct Error {
    /// error code
    pub code: i64,
    /// error message
    pub message: String,
    /// optional additional data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Error {
    /// Constructs an error without additional data.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Constructs an internal error (`-32603`).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR_CODE, message)
    }
}

/// Represents JSON-RPC request/response id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// numeric id
    Num(u64),
    /// string id
    Str(String),
    /// `null`, as sent by callers that don't care about correlation
    Null,
}

/// A JSON-RPC response payload, without the envelope.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ResponseData<T> {
    /// JSON-RPC error response
    Error {
        /// Error
        error: Error,
    },
    /// JSON-RPC success response
    Success {
        /// Result
        result: T,
    },
}

impl<T> ResponseData<T> {
    /// Returns a [`Result`] where `Success` is mapped to `Ok` and `Error` to
    /// `Err`.
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            ResponseData::Success { result } => Ok(result),
            ResponseData::Error { error } => Err(error),
        }
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, ResponseData::Error { .. })
    }

    /// Maps a `ResponseData<T>` to `ResponseData<U>` by applying a function to
    /// a contained `Success` value, leaving an `Error` value untouched.
    pub fn map<U, F>(self, f: F) -> ResponseData<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            ResponseData::Success { result } => ResponseData::Success { result: f(result) },
            ResponseData::Error { error } => ResponseData::Error { error },
        }
    }
}

impl<T> From<Result<T, Error>> for ResponseData<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(result) => ResponseData::Success { result },
            Err(error) => ResponseData::Error { error },
        }
    }
}

/// Represents JSON-RPC version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Version {
    /// Version 2.0
    #[serde(rename = "2.0")]
    V2_0,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_without_params_omits_field() -> anyhow::Result<()> {
        let request = Request::new(7, "eth_blockNumber", None);

        assert_eq!(
            serde_json::to_value(&request)?,
            json!({ "jsonrpc": "2.0", "id": 7, "method": "eth_blockNumber" })
        );

        Ok(())
    }

    #[test]
    fn request_with_object_params() -> anyhow::Result<()> {
        let params = Params::try_from(json!({ "address": "0x00" }))?;
        let request = Request::new(1, "eth_getLogs", Some(params));

        assert_eq!(
            serde_json::to_value(&request)?,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "eth_getLogs",
                "params": { "address": "0x00" },
            })
        );

        Ok(())
    }

    #[test]
    fn params_reject_scalars() {
        let error = Params::try_from(json!("0x1")).expect_err("scalar params are invalid");
        assert_eq!(error.0, json!("0x1"));
    }

    #[test]
    fn legacy_request_with_null_id() -> anyhow::Result<()> {
        let request: Request = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": null,
            "method": "eth_gasPrice",
            "params": [],
        }))?;

        assert_eq!(request.id, Id::Null);
        assert_eq!(request.params, Some(Params::Array(Vec::new())));

        Ok(())
    }

    #[test]
    fn error_response_serialization() -> anyhow::Result<()> {
        let response = Response::<serde_json::Value> {
            version: Version::V2_0,
            id: Id::Str("abc".to_string()),
            data: ResponseData::Error {
                error: Error::internal("Network connection unavailable"),
            },
        };

        assert_eq!(
            serde_json::to_value(&response)?,
            json!({
                "jsonrpc": "2.0",
                "id": "abc",
                "error": { "code": -32603, "message": "Network connection unavailable" },
            })
        );

        Ok(())
    }

    #[test]
    fn response_data_into_result() {
        let success = ResponseData::Success { result: 1u64 };
        assert_eq!(success.into_result(), Ok(1));

        let error = ResponseData::<u64>::Error {
            error: Error::new(SERVER_ERROR_CODE, "x"),
        };
        assert!(error.is_error());
        assert_eq!(error.into_result(), Err(Error::new(-32000, "x")));
    }
}
