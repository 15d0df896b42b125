use std::{collections::HashMap, time::Duration};

use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    error::DispatchError,
    fallback,
    jsonrpc::{self, ResponseData},
};

/// A request that has been enqueued but not yet answered, together with the
/// handle through which its caller is resolved.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    id: u64,
    request: jsonrpc::Request,
    responder: oneshot::Sender<ResponseData<Value>>,
}

impl PendingRequest {
    pub fn new(
        id: u64,
        request: jsonrpc::Request,
        responder: oneshot::Sender<ResponseData<Value>>,
    ) -> Self {
        Self {
            id,
            request,
            responder,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves the request with its item of the batch response. Errors
    /// reported by the node go through the fallback policy.
    pub fn resolve(self, data: ResponseData<Value>) {
        let data = match data {
            ResponseData::Error { error } => {
                fallback::resolve_upstream_error(&self.request.method, error)
            }
            success @ ResponseData::Success { .. } => success,
        };

        self.respond(data);
    }

    /// Resolves the request with a transport-level error. No fallback is
    /// applied.
    pub fn fail(self, error: jsonrpc::Error) {
        self.respond(ResponseData::Error { error });
    }

    fn respond(self, data: ResponseData<Value>) {
        if self.responder.send(data).is_err() {
            log::debug!(
                "Caller of '{}' (id {}) stopped waiting for the response",
                self.request.method,
                self.id
            );
        }
    }
}

/// Sends the batch as a single request and resolves every request in it.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip_all, fields(batch_size = batch.len()))
)]
pub(crate) async fn dispatch_batch(
    client: &ClientWithMiddleware,
    url: &url::Url,
    timeout: Duration,
    batch: Vec<PendingRequest>,
) {
    log::debug!("Dispatching batch of {} request(s) to {url}", batch.len());

    let outcome = tokio::time::timeout(timeout, exchange(client, url, &batch))
        .await
        .unwrap_or(Err(DispatchError::Timeout(timeout)));

    match outcome {
        Ok(items) => correlate(batch, items),
        Err(error) => {
            log::warn!("Batch request to {url} failed: {error}");

            let error = error.to_jsonrpc_error();
            for pending in batch {
                pending.fail(error.clone());
            }
        }
    }
}

async fn exchange(
    client: &ClientWithMiddleware,
    url: &url::Url,
    batch: &[PendingRequest],
) -> Result<Vec<Value>, DispatchError> {
    let requests: Vec<&jsonrpc::Request> = batch.iter().map(|pending| &pending.request).collect();
    let body = serde_json::to_string(&requests).map_err(DispatchError::InvalidJsonRequest)?;

    let response = client
        .post(url.clone())
        .body(body)
        .send()
        .await
        .map_err(|error| DispatchError::FailedToSend(error.into()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DispatchError::HttpStatus(status));
    }

    let text = response
        .text()
        .await
        .map_err(|error| DispatchError::CorruptedResponse(error.into()))?;

    parse_batch_response(text)
}

fn parse_batch_response(response: String) -> Result<Vec<Value>, DispatchError> {
    let value: Value = match serde_json::from_str(&response) {
        Ok(value) => value,
        Err(error) => return Err(DispatchError::InvalidResponse { response, error }),
    };

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => {
            let rejection = object
                .remove("error")
                .and_then(|error| serde_json::from_value::<jsonrpc::Error>(error).ok());

            Err(rejection.map_or(
                DispatchError::UnexpectedResponse(response),
                DispatchError::BatchRejected,
            ))
        }
        _ => Err(DispatchError::UnexpectedResponse(response)),
    }
}

/// Splits a response item into its id and payload. Returns `None` for items
/// that cannot be correlated or carry neither a result nor an error.
fn parse_response_item(item: Value) -> Option<(u64, ResponseData<Value>)> {
    let Value::Object(mut object) = item else {
        return None;
    };

    let id = object.get("id").and_then(Value::as_u64)?;

    // An error takes precedence over a result if a node sends both.
    if let Some(error) = object.remove("error") {
        let error = serde_json::from_value(error.clone()).unwrap_or_else(|_parse_error| {
            jsonrpc::Error {
                code: jsonrpc::INTERNAL_ERROR_CODE,
                message: "Malformed error object".to_string(),
                data: Some(error),
            }
        });

        return Some((id, ResponseData::Error { error }));
    }

    object
        .remove("result")
        .map(|result| (id, ResponseData::Success { result }))
}

/// Hands each response item to the request with the same id.
///
/// Unknown ids and repeated ids are ignored. Requests that don't receive an
/// item are resolved with an internal error instead of waiting forever.
fn correlate(batch: Vec<PendingRequest>, items: Vec<Value>) {
    let mut pending_by_id: HashMap<u64, PendingRequest> = batch
        .into_iter()
        .map(|pending| (pending.id(), pending))
        .collect();

    for item in items {
        let Some((id, data)) = parse_response_item(item.clone()) else {
            log::warn!("Skipping malformed batch response item: {item}");
            continue;
        };

        match pending_by_id.remove(&id) {
            Some(pending) => pending.resolve(data),
            None => log::debug!("Ignoring response for unknown or already resolved id {id}"),
        }
    }

    for (id, pending) in pending_by_id {
        log::warn!("Batch response did not contain an item for request id {id}");
        pending.fail(missing_response_error(id));
    }
}

pub(crate) fn missing_response_error(id: u64) -> jsonrpc::Error {
    jsonrpc::Error::internal(format!("No response for request id {id}"))
}
