use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{Client, StatusCode};
use tower::{Layer, Service};

use crate::error::HttpError;
use crate::metrics::{Headers, PhaseEvent, PhaseTimer, Response};

use super::template::RequestTemplate;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

tokio::task_local! {
    static ACTIVE_TIMER: Arc<PhaseTimer>;
}

/// Issues one HTTP request. Implementations report lifecycle events to
/// `timer` as they observe them and may stamp `done` through
/// [`PhaseTimer::finish`] once the response head arrives. Otherwise the
/// caller stamps it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request described by `template`. Headers and body are
    /// returned only when `capture` is set.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or the response
    /// body cannot be read.
    async fn send(
        &self,
        template: &RequestTemplate,
        capture: bool,
        timer: Arc<PhaseTimer>,
    ) -> Result<Response, HttpError>;
}

/// Default transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new() -> Result<Self, HttpError> {
        let client = Client::builder()
            .dns_resolver(Arc::new(TimedResolver))
            .connector_layer(ConnectTimingLayer)
            .build()
            .map_err(|source| HttpError::BuildClientFailed { source })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        template: &RequestTemplate,
        capture: bool,
        timer: Arc<PhaseTimer>,
    ) -> Result<Response, HttpError> {
        let mut builder = self
            .client
            .request(template.method().clone(), template.url().clone())
            .headers(template.headers().clone())
            .timeout(template.timeout());
        if let Some(body) = template.body() {
            builder = builder.body(body.clone());
        }
        let request = builder
            .build()
            .map_err(|source| HttpError::BuildRequestFailed { source })?;

        let dispatched_at = Utc::now();
        let response = ACTIVE_TIMER
            .scope(Arc::clone(&timer), self.client.execute(request))
            .await
            .map_err(|source| HttpError::Send { source })?;
        // A pooled connection never reaches the connector.
        if !timer.has_recorded(PhaseEvent::GotConnection) {
            timer.record_at(PhaseEvent::GotConnection, dispatched_at);
        }
        timer.record(PhaseEvent::FirstByte);
        let _head_timing = timer.finish();

        let status = response.status();
        let mut result = Response::new(status.as_u16(), status_line(status));
        result.content_length = response.content_length();

        if capture {
            let mut headers = Headers::new();
            for (name, value) in response.headers() {
                headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
            }
            result.headers = headers;
            result.body = read_body(response).await?;
        } else {
            drain_body(response).await?;
        }
        Ok(result)
    }
}

/// Stamps connect start/done around reqwest's connector, which covers DNS,
/// TCP and TLS. A finished connect is also the moment the request got its
/// connection.
#[derive(Debug, Clone, Copy, Default)]
struct ConnectTimingLayer;

impl<S> Layer<S> for ConnectTimingLayer {
    type Service = ConnectTiming<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ConnectTiming { inner }
    }
}

#[derive(Debug, Clone)]
struct ConnectTiming<S> {
    inner: S,
}

impl<S, Target> Service<Target> for ConnectTiming<S>
where
    S: Service<Target> + 'static,
    S::Future: Send + 'static,
    Target: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, target: Target) -> Self::Future {
        let timer = ACTIVE_TIMER.try_with(Arc::clone).ok();
        if let Some(timer) = timer.as_ref() {
            timer.record(PhaseEvent::ConnectStart);
        }
        let connecting = self.inner.call(target);
        async move {
            let connected = connecting.await;
            if let Some(timer) = timer.as_ref().filter(|_timer| connected.is_ok()) {
                timer.record(PhaseEvent::ConnectDone);
                timer.record(PhaseEvent::GotConnection);
            }
            connected
        }
        .boxed()
    }
}

fn status_line(status: StatusCode) -> String {
    status.canonical_reason().map_or_else(
        || status.as_str().to_owned(),
        |reason| format!("{} {}", status.as_str(), reason),
    )
}

async fn read_body(response: reqwest::Response) -> Result<String, HttpError> {
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|source| HttpError::ReadBody { source })?;
        body.extend_from_slice(&bytes);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

async fn drain_body(response: reqwest::Response) -> Result<(), HttpError> {
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let _bytes = chunk.map_err(|source| HttpError::ReadBody { source })?;
    }
    Ok(())
}

/// System resolver that stamps DNS start/done on the timer of the request
/// that triggered the lookup. Lookups outside a timed request are untimed.
#[derive(Debug, Clone, Copy)]
struct TimedResolver;

impl Resolve for TimedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let timer = ACTIVE_TIMER.try_with(Arc::clone).ok();
        let host = name.as_str().to_owned();
        Box::pin(async move {
            if let Some(timer) = timer.as_ref() {
                timer.record(PhaseEvent::DnsStart);
            }
            let lookup = tokio::net::lookup_host((host.as_str(), 0)).await;
            if let Some(timer) = timer.as_ref() {
                timer.record(PhaseEvent::DnsDone);
            }
            let addrs: Vec<SocketAddr> = lookup
                .map_err(|err| -> BoxError { Box::new(err) })?
                .collect();
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<Addrs, BoxError>(addrs)
        })
    }
}
