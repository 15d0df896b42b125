use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use parking_lot::Mutex;
use reqwest::Client as HttpClient;
use reqwest_middleware::{ClientBuilder as HttpClientBuilder, ClientWithMiddleware};
#[cfg(feature = "tracing")]
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;
use tokio::{
    runtime,
    sync::{mpsc, oneshot},
};

use crate::{
    config::{ChainId, ProviderConfig},
    dispatch::{self, PendingRequest},
    error::ProviderCreationError,
    jsonrpc::{self, Params, RequestArguments, ResponseData},
};

/// Answered from local state, without a network call.
const CHAIN_ID_METHOD: &str = "eth_chainId";

/// A JSON-RPC transport for a single endpoint that coalesces requests issued
/// within [`ProviderConfig::batch_wait`] into one HTTP round trip.
///
/// Requests never fail. Errors reported by the node for read-only methods are
/// replaced by a sentinel (see [`crate::fallback`]) and transport failures
/// resolve every request of the affected batch with a JSON-RPC error.
///
/// Cloning is cheap and clones share the same batch.
#[derive(Clone, Debug)]
pub struct BatchingProvider {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    chain_id: ChainId,
    url: url::Url,
    batch_wait: Duration,
    batch_timeout: Duration,
    client: ClientWithMiddleware,
    runtime: runtime::Handle,
    state: Mutex<BatchState>,
}

#[derive(Debug)]
struct BatchState {
    next_id: u64,
    /// Feeds the batch owned by the scheduled flush. Present iff a flush is
    /// scheduled.
    scheduled_flush: Option<mpsc::UnboundedSender<PendingRequest>>,
}

impl BatchingProvider {
    /// Always `false`; wallet libraries probe this to detect injected
    /// providers.
    pub const IS_METAMASK: bool = false;

    /// Creates a provider for the endpoint. Flushes are spawned on `runtime`.
    pub fn new(
        runtime: runtime::Handle,
        config: ProviderConfig,
    ) -> Result<Self, ProviderCreationError> {
        let ProviderConfig {
            chain_id,
            url,
            batch_wait,
            batch_timeout,
            http_headers,
        } = config;

        let url: url::Url = url.parse()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderCreationError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                url: url.to_string(),
            });
        }

        let mut headers = http_headers.map_or_else(|| Ok(HeaderMap::new()), header_map)?;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&format!("mrpc {}", env!("CARGO_PKG_VERSION")))
                .expect("Version string is valid header value"),
        );

        let client = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|error| ProviderCreationError::HttpClient(error.into()))?;

        #[cfg(feature = "tracing")]
        let client = HttpClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build();
        #[cfg(not(feature = "tracing"))]
        let client = HttpClientBuilder::new(client).build();

        Ok(Self {
            inner: Arc::new(Inner {
                chain_id,
                url,
                batch_wait,
                batch_timeout,
                client,
                runtime,
                state: Mutex::new(BatchState {
                    next_id: 1,
                    scheduled_flush: None,
                }),
            }),
        })
    }

    /// The chain served by this provider.
    pub fn chain_id(&self) -> ChainId {
        self.inner.chain_id
    }

    /// The endpoint URL.
    pub fn url(&self) -> &url::Url {
        &self.inner.url
    }

    /// The endpoint's host, including the port if one is specified.
    pub fn host(&self) -> String {
        let host = self.inner.url.host_str().unwrap_or_default();
        match self.inner.url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// The endpoint's path.
    pub fn path(&self) -> &str {
        self.inner.url.path()
    }

    /// How long requests are accumulated before a batch is dispatched.
    pub fn batch_wait(&self) -> Duration {
        self.inner.batch_wait
    }

    /// Enqueues a call and returns a future that resolves with its response.
    ///
    /// The call is part of the current batch as soon as this function
    /// returns, even if the returned future is never polled. `eth_chainId` is
    /// answered immediately without consuming an id.
    pub fn request(&self, method: impl Into<String>, params: Option<Params>) -> PendingResponse {
        let method = method.into();
        if method == CHAIN_ID_METHOD {
            return PendingResponse::ready(ResponseData::Success {
                result: Value::String(format!("0x{:x}", self.inner.chain_id)),
            });
        }

        let (responder, receiver) = oneshot::channel();

        let id = {
            let mut state = self.inner.state.lock();

            let id = state.next_id;
            state.next_id += 1;

            let request = jsonrpc::Request::new(id, method, params);
            let pending = PendingRequest::new(id, request, responder);

            let batch = match state.scheduled_flush.take() {
                Some(batch) if !batch.is_closed() => batch,
                _ => self.schedule_flush(),
            };
            if let Err(mpsc::error::SendError(pending)) = batch.send(pending) {
                log::error!(
                    "Batch for request id {} was closed before it was dispatched",
                    pending.id()
                );
            }
            state.scheduled_flush = Some(batch);

            id
        };

        PendingResponse::waiting(id, receiver)
    }

    /// Object form of [`BatchingProvider::request`].
    pub fn request_with(&self, arguments: RequestArguments) -> PendingResponse {
        let RequestArguments { method, params } = arguments;
        self.request(method, params)
    }

    /// Handles a complete JSON-RPC request, echoing the caller's id in the
    /// response.
    pub async fn send(&self, request: jsonrpc::Request) -> jsonrpc::Response<Value> {
        let jsonrpc::Request {
            id, method, params, ..
        } = request;

        let data = self.request(method, params).await;

        jsonrpc::Response {
            version: jsonrpc::Version::V2_0,
            id,
            data,
        }
    }

    /// Legacy entry point that reports through a node-style callback.
    ///
    /// The first callback argument is always `None`; failures are carried in
    /// the response's `error` field.
    pub fn send_async<CallbackT>(&self, request: jsonrpc::Request, callback: CallbackT)
    where
        CallbackT: FnOnce(Option<jsonrpc::Error>, jsonrpc::Response<Value>) + Send + 'static,
    {
        let jsonrpc::Request {
            id, method, params, ..
        } = request;

        // Enqueue before spawning to preserve call order.
        let pending = self.request(method, params);

        self.inner.runtime.spawn(async move {
            let data = pending.await;
            callback(
                None,
                jsonrpc::Response {
                    version: jsonrpc::Version::V2_0,
                    id,
                    data,
                },
            );
        });
    }

    /// Spawns the flush for a new batch and returns the sender that feeds it.
    ///
    /// Must be called with the state lock held.
    fn schedule_flush(&self) -> mpsc::UnboundedSender<PendingRequest> {
        let (sender, batch) = mpsc::unbounded_channel();

        let inner = self.inner.clone();
        self.inner
            .runtime
            .spawn(async move { inner.flush_after_wait(batch).await });

        sender
    }
}

impl Inner {
    async fn flush_after_wait(self: Arc<Self>, mut batch: mpsc::UnboundedReceiver<PendingRequest>) {
        tokio::time::sleep(self.batch_wait).await;

        // Seal the batch. Requests from now on schedule a new flush.
        let sender = self.state.lock().scheduled_flush.take();
        drop(sender);

        let mut requests = Vec::new();
        while let Some(pending) = batch.recv().await {
            requests.push(pending);
        }

        if requests.is_empty() {
            return;
        }

        dispatch::dispatch_batch(&self.client, &self.url, self.batch_timeout, requests).await;
    }
}

fn header_map(headers: HashMap<String, String>) -> Result<HeaderMap, ProviderCreationError> {
    headers
        .into_iter()
        .map(|(name, value)| {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                ProviderCreationError::InvalidHeader {
                    name: name.clone(),
                    message: error.to_string(),
                }
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|error| {
                ProviderCreationError::InvalidHeader {
                    name: name.clone(),
                    message: error.to_string(),
                }
            })?;

            Ok((header_name, header_value))
        })
        .collect()
}

/// The completion handle of a [`BatchingProvider::request`].
#[derive(Debug)]
#[must_use = "the response is lost unless the future is awaited"]
pub struct PendingResponse {
    id: Option<u64>,
    state: PendingState,
}

#[derive(Debug)]
enum PendingState {
    Ready(Option<ResponseData<Value>>),
    Waiting(oneshot::Receiver<ResponseData<Value>>),
}

impl PendingResponse {
    fn ready(data: ResponseData<Value>) -> Self {
        Self {
            id: None,
            state: PendingState::Ready(Some(data)),
        }
    }

    fn waiting(id: u64, receiver: oneshot::Receiver<ResponseData<Value>>) -> Self {
        Self {
            id: Some(id),
            state: PendingState::Waiting(receiver),
        }
    }

    /// The JSON-RPC id assigned to the request, if it was batched.
    pub fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Future for PendingResponse {
    type Output = ResponseData<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match &mut self.state {
            PendingState::Ready(data) => {
                Poll::Ready(data.take().expect("PendingResponse polled after completion"))
            }
            PendingState::Waiting(receiver) => Pin::new(receiver).poll(cx).map(|result| {
                result.unwrap_or_else(|_closed| ResponseData::Error {
                    error: jsonrpc::Error::internal(format!(
                        "Request id {} was dropped before a response arrived",
                        id.unwrap_or_default()
                    )),
                })
            }),
        }
    }
}
