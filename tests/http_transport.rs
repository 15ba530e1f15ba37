//! HTTP transport against an in-process REST endpoint.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use serde_json::Value;
use serverroom_monitor::telemetry::{deliver, Delivery, HttpTransport, RetryPolicy, Transport};
use serverroom_monitor::{EnvironmentSample, PowerSource, TelemetrySample};

#[derive(Clone, Default)]
struct Endpoint {
    hits: Arc<AtomicU32>,
    /// Answer 500 to this many requests before accepting.
    reject_first: u32,
    delay: Duration,
    received: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn insert(
    State(ep): State<Endpoint>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    // ---
    let n = ep.hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(ep.delay).await;
    ep.received.lock().unwrap().push((headers, body));
    if n < ep.reject_first {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::CREATED
    }
}

async fn serve(ep: Endpoint) -> Result<String> {
    // ---
    let app = Router::new()
        .route("/rest/v1/telemetry", post(insert))
        .with_state(ep);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{}", addr))
}

fn sample() -> TelemetrySample {
    let env = EnvironmentSample {
        temperature_c: Some(31.2),
        humidity_pct: None,
        gas_alert: true,
    };
    TelemetrySample::new("pi-http", &env, false, PowerSource::Backup, true)
}

#[tokio::test]
async fn posts_row_with_auth_headers() -> Result<()> {
    // ---
    let ep = Endpoint::default();
    let base = serve(ep.clone()).await?;
    let transport = HttpTransport::new(&base, "service-key", Duration::from_secs(10))?;

    let resp = transport.post(&sample()).await?;
    assert_eq!(resp.status, 201);

    let received = ep.received.lock().unwrap();
    let (headers, body) = &received[0];
    assert_eq!(headers["apikey"], "service-key");
    assert_eq!(headers["authorization"], "Bearer service-key");
    assert_eq!(headers["prefer"], "return=minimal");
    assert_eq!(headers["content-type"], "application/json");

    assert_eq!(body["device_id"], "pi-http");
    assert_eq!(body["temperature_c"], 31.2);
    assert!(body["humidity_pct"].is_null());
    assert_eq!(body["gas_alert"], true);
    assert_eq!(body["grid_present"], false);
    assert_eq!(body["power_source"], "BACKUP");
    assert_eq!(body["alarm_active"], true);
    Ok(())
}

#[tokio::test]
async fn server_errors_are_retried() -> Result<()> {
    // ---
    let ep = Endpoint {
        reject_first: 2,
        ..Endpoint::default()
    };
    let base = serve(ep.clone()).await?;
    let transport = HttpTransport::new(&base, "service-key", Duration::from_secs(10))?;
    let policy = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    };

    let outcome = deliver(&transport, &policy, sample()).await;
    assert_eq!(outcome, Delivery::Delivered { attempts: 3 });
    assert_eq!(ep.hits.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn slow_endpoint_times_out() -> Result<()> {
    // ---
    let ep = Endpoint {
        delay: Duration::from_secs(2),
        ..Endpoint::default()
    };
    let base = serve(ep).await?;
    let transport = HttpTransport::new(&base, "service-key", Duration::from_millis(200))?;

    assert!(transport.post(&sample()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() -> Result<()> {
    // ---
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let transport =
        HttpTransport::new(&format!("http://{}", addr), "k", Duration::from_secs(1))?;
    assert!(transport.post(&sample()).await.is_err());
    Ok(())
}
