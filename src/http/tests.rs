use super::*;
use crate::error::{HttpError, RunError, ValidationError};
use crate::metrics::{PhaseEvent, PhaseTimer, Response};
use crate::shutdown_handlers::shutdown_channel;
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

struct FakeTransport {
    status: u16,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeTransport {
    fn responding(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            status: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        _template: &RequestTemplate,
        capture: bool,
        timer: Arc<PhaseTimer>,
    ) -> Result<Response, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(HttpError::Transport {
                message: "connection refused".to_owned(),
            });
        }
        timer.record(PhaseEvent::GotConnection);
        timer.record(PhaseEvent::FirstByte);
        let mut response = Response::new(self.status, format!("{} Test", self.status));
        if capture {
            response.body = "captured".to_owned();
        }
        Ok(response)
    }
}

fn template() -> Result<Arc<RequestTemplate>, String> {
    RequestTemplate::new("GET", "http://localhost:8080/health", Duration::from_secs(1))
        .map(Arc::new)
        .map_err(|err| err.to_string())
}

fn executor(transport: Arc<FakeTransport>) -> Result<RequestExecutor, String> {
    Ok(RequestExecutor::new(transport, template()?))
}

#[test]
fn template_normalizes_method_and_url() -> Result<(), String> {
    let template = RequestTemplate::new("post", "http://localhost", Duration::from_secs(5))
        .map_err(|err| err.to_string())?;
    if template.target() != "POST http://localhost/" {
        return Err(format!("Unexpected target: {}", template.target()));
    }
    if template.timeout() != Duration::from_secs(5) {
        return Err("Timeout not kept".to_owned());
    }
    Ok(())
}

#[test]
fn template_rejects_bad_method_and_url() -> Result<(), String> {
    match RequestTemplate::new("GE T", "http://localhost", Duration::from_secs(1)) {
        Err(HttpError::InvalidMethod { method }) if method == "GE T" => {}
        other => return Err(format!("Expected InvalidMethod, got {:?}", other)),
    }
    match RequestTemplate::new("GET", "not a url", Duration::from_secs(1)) {
        Err(HttpError::InvalidUrl { url, .. }) if url == "not a url" => Ok(()),
        other => Err(format!("Expected InvalidUrl, got {:?}", other)),
    }
}

#[test]
fn template_headers_replace_earlier_values() -> Result<(), String> {
    let template = RequestTemplate::new("GET", "http://localhost", Duration::from_secs(1))
        .and_then(|t| t.with_header("X-Token", "one"))
        .and_then(|t| t.with_header("x-token", "two"))
        .map_err(|err| err.to_string())?;
    let values: Vec<_> = template.headers().get_all("x-token").iter().collect();
    if values.len() != 1 || values.first().map(|v| v.as_bytes()) != Some(b"two".as_slice()) {
        return Err(format!("Unexpected header values: {:?}", values));
    }
    match RequestTemplate::new("GET", "http://localhost", Duration::from_secs(1))
        .and_then(|t| t.with_header("bad header", "x"))
    {
        Err(HttpError::InvalidHeaderName { header, .. }) if header == "bad header" => Ok(()),
        other => Err(format!("Expected InvalidHeaderName, got {:?}", other)),
    }
}

#[test]
fn body_source_prefers_file() -> Result<(), String> {
    let path = std::path::Path::new("payload.json");
    if BodySource::from_parts(Some(path), Some("inline")) != BodySource::File(path.to_path_buf()) {
        return Err("File should take precedence".to_owned());
    }
    if BodySource::from_parts(None, Some("inline")) != BodySource::Inline("inline".to_owned()) {
        return Err("Inline body expected".to_owned());
    }
    if BodySource::from_parts(None, Some("")) != BodySource::Empty {
        return Err("Empty inline body should be empty".to_owned());
    }
    Ok(())
}

#[test]
fn body_source_loads_file_once() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
        let path = dir.path().join("body.txt");
        std::fs::write(&path, "from file").map_err(|err| format!("write failed: {}", err))?;

        let body = BodySource::File(path)
            .load()
            .await
            .map_err(|err| err.to_string())?;
        if body != Some(Bytes::from_static(b"from file")) {
            return Err(format!("Unexpected body: {:?}", body));
        }

        let missing = BodySource::File(dir.path().join("missing.txt")).load().await;
        match missing {
            Err(HttpError::ReadBodyFile { .. }) => Ok(()),
            other => Err(format!("Expected ReadBodyFile, got {:?}", other)),
        }
    })
}

#[test]
fn rate_scheduler_rejects_zero_interval() -> Result<(), String> {
    match RateScheduler::new(Duration::ZERO) {
        Err(ValidationError::ZeroInterval) => {}
        other => return Err(format!("Expected ZeroInterval, got {:?}", other)),
    }
    match RateScheduler::from_rate(0, Duration::ZERO) {
        Err(ValidationError::ZeroInterval) => Ok(()),
        other => Err(format!("Expected ZeroInterval, got {:?}", other)),
    }
}

#[test]
fn rate_scheduler_frequency_takes_precedence() -> Result<(), String> {
    let scheduler = RateScheduler::from_rate(4, Duration::from_secs(3))
        .map_err(|err| err.to_string())?;
    if scheduler.interval() != Duration::from_millis(250) {
        return Err(format!("Unexpected interval: {:?}", scheduler.interval()));
    }
    let scheduler = RateScheduler::from_rate(0, Duration::from_secs(3))
        .map_err(|err| err.to_string())?;
    if scheduler.interval() != Duration::from_secs(3) {
        return Err(format!("Unexpected interval: {:?}", scheduler.interval()));
    }
    Ok(())
}

#[test]
fn fire_signal_keeps_one_pending_and_stops_on_shutdown() -> Result<(), String> {
    run_async_test(async {
        let (shutdown_tx, _) = shutdown_channel();
        let scheduler =
            RateScheduler::new(Duration::from_millis(10)).map_err(|err| err.to_string())?;
        let (fire, handle) = scheduler.start(&shutdown_tx);

        tokio::time::sleep(Duration::from_millis(80)).await;
        if fire.pending() > 1 {
            return Err(format!("Too many pending signals: {}", fire.pending()));
        }
        let fired = tokio::time::timeout(Duration::from_secs(1), fire.fired())
            .await
            .map_err(|_elapsed| "No signal fired".to_owned())?;
        if !fired {
            return Err("Signal closed early".to_owned());
        }

        drop(shutdown_tx.send(()));
        handle
            .await
            .map_err(|err| format!("Ticker panicked: {}", err))?;
        if fire.fired().await {
            return Err("Signal should be closed after shutdown".to_owned());
        }
        Ok(())
    })
}

#[test]
fn executor_returns_timing_with_done_last() -> Result<(), String> {
    run_async_test(async {
        let executor = executor(FakeTransport::responding(200))?;
        let result = executor.execute().await.map_err(|err| err.to_string())?;
        let done = result.timing.done.ok_or("done not set")?;
        let first_byte = result.timing.first_byte.ok_or("first byte not set")?;
        if done < first_byte {
            return Err("done recorded before first byte".to_owned());
        }
        if !result.response.body.is_empty() {
            return Err("Body should not be captured by default".to_owned());
        }
        Ok(())
    })
}

#[test]
fn executor_captures_when_asked() -> Result<(), String> {
    run_async_test(async {
        let executor = executor(FakeTransport::responding(200))?.capture(true);
        let result = executor.execute().await.map_err(|err| err.to_string())?;
        if result.response.body != "captured" {
            return Err(format!("Unexpected body: {}", result.response.body));
        }
        Ok(())
    })
}

#[test]
fn executor_fail_fast_rejects_failing_status() -> Result<(), String> {
    run_async_test(async {
        let relaxed = executor(FakeTransport::responding(503))?;
        let result = relaxed.execute().await.map_err(|err| err.to_string())?;
        if result.response.status_code != 503 {
            return Err("Failing status should be recorded".to_owned());
        }

        let strict = executor(FakeTransport::responding(503))?.fail_fast(true);
        match strict.execute().await {
            Err(RunError::FailFast { status_code: 503 }) => {}
            other => return Err(format!("Expected FailFast, got {:?}", other)),
        }

        let redirect = executor(FakeTransport::responding(302))?.fail_fast(true);
        redirect.execute().await.map_err(|err| err.to_string())?;
        Ok(())
    })
}

#[test]
fn executor_transport_error_is_fatal() -> Result<(), String> {
    run_async_test(async {
        let executor = executor(FakeTransport::failing())?;
        match executor.execute().await {
            Err(RunError::Transport { .. }) => Ok(()),
            other => Err(format!("Expected Transport error, got {:?}", other)),
        }
    })
}

#[test]
fn worker_pool_rejects_zero_concurrency() -> Result<(), String> {
    run_async_test(async {
        let (shutdown_tx, _) = shutdown_channel();
        let (result_tx, _result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let scheduler =
            RateScheduler::new(Duration::from_millis(10)).map_err(|err| err.to_string())?;
        let (fire, _handle) = scheduler.start(&shutdown_tx);
        let executor = Arc::new(executor(FakeTransport::responding(200))?);
        match WorkerPool::spawn(0, &executor, &fire, &shutdown_tx, &result_tx) {
            Err(ValidationError::ZeroConcurrency) => Ok(()),
            other => Err(format!("Expected ZeroConcurrency, got {:?}", other)),
        }
    })
}

#[test]
fn worker_pool_delivers_results_and_stops() -> Result<(), String> {
    run_async_test(async {
        let (shutdown_tx, _) = shutdown_channel();
        let (result_tx, mut result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let scheduler =
            RateScheduler::new(Duration::from_millis(2)).map_err(|err| err.to_string())?;
        let (fire, ticker) = scheduler.start(&shutdown_tx);
        let transport = FakeTransport::responding(200);
        let executor = Arc::new(RequestExecutor::new(transport.clone(), template()?));
        let pool = WorkerPool::spawn(3, &executor, &fire, &shutdown_tx, &result_tx)
            .map_err(|err| err.to_string())?;
        drop(result_tx);
        if pool.len() != 3 {
            return Err(format!("Unexpected worker count: {}", pool.len()));
        }

        let mut received: usize = 0;
        while received < 10 {
            let message = tokio::time::timeout(Duration::from_secs(2), result_rx.recv())
                .await
                .map_err(|_elapsed| "Timed out waiting for results".to_owned())?;
            match message {
                Some(WorkerMessage::Completed(_)) => received = received.saturating_add(1),
                other => return Err(format!("Unexpected message: {:?}", other)),
            }
        }

        drop(shutdown_tx.send(()));
        ticker
            .await
            .map_err(|err| format!("Ticker panicked: {}", err))?;
        while tokio::time::timeout(Duration::from_secs(2), result_rx.recv())
            .await
            .map_err(|_elapsed| "Workers did not stop".to_owned())?
            .is_some()
        {}
        if transport.calls.load(Ordering::SeqCst) < 10 {
            return Err("Transport was not called for every result".to_owned());
        }
        Ok(())
    })
}

#[test]
fn worker_pool_stop_wins_over_pending_fire() -> Result<(), String> {
    run_async_test(async {
        let (shutdown_tx, _) = shutdown_channel();
        let (result_tx, mut result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let fire = FireSignal::with_pending(3);
        let transport = FakeTransport::responding(200);
        let executor = Arc::new(RequestExecutor::new(transport.clone(), template()?));
        let _pool = WorkerPool::spawn(2, &executor, &fire, &shutdown_tx, &result_tx)
            .map_err(|err| err.to_string())?;
        drop(result_tx);
        shutdown_tx
            .send(())
            .map_err(|_err| "Failed to send stop".to_owned())?;

        let closed = tokio::time::timeout(Duration::from_secs(2), result_rx.recv())
            .await
            .map_err(|_elapsed| "Workers did not stop".to_owned())?;
        if let Some(message) = closed {
            return Err(format!("No request should follow a stop: {:?}", message));
        }
        if transport.calls.load(Ordering::SeqCst) != 0 {
            return Err("Transport was called after stop".to_owned());
        }
        if fire.pending() != 3 {
            return Err(format!("Pending fires were consumed: {}", fire.pending()));
        }
        Ok(())
    })
}

#[test]
fn worker_pool_reports_fatal_error() -> Result<(), String> {
    run_async_test(async {
        let (shutdown_tx, _) = shutdown_channel();
        let (result_tx, mut result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let scheduler =
            RateScheduler::new(Duration::from_millis(5)).map_err(|err| err.to_string())?;
        let (fire, _ticker) = scheduler.start(&shutdown_tx);
        let executor = Arc::new(executor(FakeTransport::failing())?);
        let _pool = WorkerPool::spawn(1, &executor, &fire, &shutdown_tx, &result_tx)
            .map_err(|err| err.to_string())?;

        let message = tokio::time::timeout(Duration::from_secs(2), result_rx.recv())
            .await
            .map_err(|_elapsed| "Timed out waiting for fatal error".to_owned())?;
        drop(shutdown_tx.send(()));
        match message {
            Some(WorkerMessage::Fatal(RunError::Transport { .. })) => Ok(()),
            other => Err(format!("Expected fatal transport error, got {:?}", other)),
        }
    })
}

async fn spawn_fixed_server(body: &'static str) -> Result<SocketAddr, String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("local_addr failed: {}", err))?;
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0_u8; 2048];
                drop(socket.read(&mut buf).await);
                let reply = format!(
                    "HTTP/1.1 201 Created\r\nContent-Length: {}\r\nX-Test: yes\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                drop(socket.write_all(reply.as_bytes()).await);
            });
        }
    });
    Ok(addr)
}

#[test]
fn reqwest_transport_captures_response() -> Result<(), String> {
    run_async_test(async {
        let addr = spawn_fixed_server("hello").await?;
        let transport = ReqwestTransport::new().map_err(|err| err.to_string())?;
        let template = RequestTemplate::new("GET", &format!("http://{}/", addr), Duration::from_secs(5))
            .map_err(|err| err.to_string())?;

        let timer = Arc::new(PhaseTimer::new());
        let response = transport
            .send(&template, true, Arc::clone(&timer))
            .await
            .map_err(|err| err.to_string())?;
        let timing = timer.finish();

        if response.status_code != 201 || response.status != "201 Created" {
            return Err(format!("Unexpected status: {}", response.status));
        }
        if response.body != "hello" {
            return Err(format!("Unexpected body: {}", response.body));
        }
        if response.headers.get("X-Test") != Some("yes") {
            return Err(format!("Missing header: {}", response.headers));
        }
        if timing.got_connection.is_none() || timing.first_byte.is_none() {
            return Err(format!("Missing phase events: {:?}", timing));
        }
        Ok(())
    })
}

#[test]
fn reqwest_transport_skips_body_without_capture() -> Result<(), String> {
    run_async_test(async {
        let addr = spawn_fixed_server("ignored").await?;
        let transport = ReqwestTransport::new().map_err(|err| err.to_string())?;
        let template = RequestTemplate::new("GET", &format!("http://{}/", addr), Duration::from_secs(5))
            .map_err(|err| err.to_string())?;
        let response = transport
            .send(&template, false, Arc::new(PhaseTimer::new()))
            .await
            .map_err(|err| err.to_string())?;
        if !response.body.is_empty() || !response.headers.is_empty() {
            return Err("Nothing should be captured".to_owned());
        }
        if response.content_length != Some(7) {
            return Err(format!("Unexpected content length: {:?}", response.content_length));
        }
        Ok(())
    })
}

#[test]
fn reqwest_transport_orders_phase_events() -> Result<(), String> {
    run_async_test(async {
        let addr = spawn_fixed_server("ordered").await?;
        let transport = ReqwestTransport::new().map_err(|err| err.to_string())?;
        let url = format!("http://localhost:{}/", addr.port());
        let template = RequestTemplate::new("GET", &url, Duration::from_secs(5))
            .map_err(|err| err.to_string())?;

        let timer = Arc::new(PhaseTimer::new());
        transport
            .send(&template, false, Arc::clone(&timer))
            .await
            .map_err(|err| err.to_string())?;
        let timing = timer.finish();

        let events = [
            ("connect_start", timing.connect_start),
            ("dns_start", timing.dns_start),
            ("dns_done", timing.dns_done),
            ("connect_done", timing.connect_done),
            ("got_connection", timing.got_connection),
            ("first_byte", timing.first_byte),
            ("done", timing.done),
        ];
        let mut previous: Option<(&str, chrono::DateTime<chrono::Utc>)> = None;
        for (name, at) in events {
            let at = at.ok_or_else(|| format!("{} was not recorded: {:?}", name, timing))?;
            if let Some((previous_name, previous_at)) = previous {
                if at < previous_at {
                    return Err(format!("{} precedes {}: {:?}", name, previous_name, timing));
                }
            }
            previous = Some((name, at));
        }

        let phases = [
            timing.dns_lookup(),
            timing.tcp_connect(),
            timing.tls_handshake(),
            timing.server_wait(),
            timing.transfer(),
        ];
        let phase_sum = phases
            .iter()
            .try_fold(Duration::ZERO, |sum, phase| sum.checked_add(*phase))
            .ok_or("Phase sum overflowed")?;
        if phase_sum > timing.total() {
            return Err(format!(
                "Phases add up to {:?}, more than total {:?}",
                phase_sum,
                timing.total()
            ));
        }
        Ok(())
    })
}

#[test]
fn reqwest_transport_stamps_done_at_response_head() -> Result<(), String> {
    run_async_test(async {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("local_addr failed: {}", err))?;
        let body_delay = Duration::from_millis(500);
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0_u8; 2048];
                drop(socket.read(&mut buf).await);
                let head = "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\n";
                drop(socket.write_all(head.as_bytes()).await);
                drop(socket.flush().await);
                tokio::time::sleep(body_delay).await;
                drop(socket.write_all(b"late").await);
            }
        });

        let transport = ReqwestTransport::new().map_err(|err| err.to_string())?;
        let template = RequestTemplate::new("GET", &format!("http://{}/", addr), Duration::from_secs(5))
            .map_err(|err| err.to_string())?;
        let timer = Arc::new(PhaseTimer::new());
        let started = std::time::Instant::now();
        transport
            .send(&template, false, Arc::clone(&timer))
            .await
            .map_err(|err| err.to_string())?;
        let elapsed = started.elapsed();
        let timing = timer.finish();

        if elapsed < body_delay {
            return Err(format!("Body was not drained: send took {:?}", elapsed));
        }
        if timing.total() >= body_delay {
            return Err(format!("Total {:?} includes the body download", timing.total()));
        }
        Ok(())
    })
}
