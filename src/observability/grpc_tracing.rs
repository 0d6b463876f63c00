//! gRPC Tracing Layer
//!
//! Tower middleware that wraps every provider call in a `grpc.server` span
//! carrying the service, method, outcome and duration.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tonic::codegen::http::{HeaderMap, Request, Response};
use tower::{Layer, Service};
use tracing::{debug, field, info_span, warn, Instrument, Span};

/// Tower layer that provides automatic tracing for gRPC services.
#[derive(Debug, Clone, Default)]
pub struct GrpcTracingLayer;

impl GrpcTracingLayer {
    /// Create a new gRPC tracing layer
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for GrpcTracingLayer {
    type Service = GrpcTracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcTracingService { inner }
    }
}

/// Service wrapper that instruments gRPC calls with tracing spans.
#[derive(Debug, Clone)]
pub struct GrpcTracingService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GrpcTracingService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let rpc = RpcPath::parse(request.uri().path());
        let span = info_span!(
            "grpc.server",
            rpc.system = "grpc",
            rpc.service = rpc.service,
            rpc.method = rpc.method,
            grpc.status = field::Empty,
            grpc.duration_ms = field::Empty,
        );

        // Drive the clone that was polled ready and leave a fresh one behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let started = Instant::now();
                let result = inner.call(request).await;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

                let status = match &result {
                    Ok(response) => header_status(response.headers()),
                    Err(_) => TRANSPORT_FAILURE,
                };
                let span = Span::current();
                span.record("grpc.duration_ms", elapsed_ms);
                span.record("grpc.status", status);

                if status == STATUS_OK {
                    debug!(elapsed_ms, "provider call completed");
                } else {
                    warn!(status, elapsed_ms, "provider call failed");
                }

                result
            }
            .instrument(span),
        )
    }
}

const STATUS_OK: &str = "0";
const TRANSPORT_FAILURE: &str = "transport";

/// `grpc-status` from the response headers
///
/// Handlers that fail before sending a body put the status in the headers.
/// Successful unary calls send it as a trailer, so an absent header counts as OK.
fn header_status(headers: &HeaderMap) -> &str {
    headers.get("grpc-status").and_then(|v| v.to_str().ok()).unwrap_or(STATUS_OK)
}

/// Service and method split out of a `/package.Service/Method` request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RpcPath<'a> {
    service: &'a str,
    method: &'a str,
}

impl<'a> RpcPath<'a> {
    const UNKNOWN: &'static str = "unknown";

    fn parse(path: &'a str) -> Self {
        let mut parts = path.trim_start_matches('/').splitn(2, '/');
        let service = parts.next().filter(|s| !s.is_empty()).unwrap_or(Self::UNKNOWN);
        let method = parts.next().filter(|m| !m.is_empty()).unwrap_or(Self::UNKNOWN);
        Self { service, method }
    }
}
