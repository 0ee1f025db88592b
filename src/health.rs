//! Liveness endpoint
//!
//! Small HTTP server a watchdog can probe: `/health` answers a plain
//! liveness string, `/status` reports uptime and per-cycle counters.

use anyhow::Result;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use log::info;
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared counters the bot updates as it works.
pub struct HealthState {
    started: Instant,
    cycles_completed: AtomicU64,
    signals_emitted: AtomicU64,
    delivery_failures: AtomicU64,
}

impl HealthState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            cycles_completed: AtomicU64::new(0),
            signals_emitted: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
        })
    }

    pub fn record_cycle(&self) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_signal(&self) {
        self.signals_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn status(&self) -> StatusBody {
        StatusBody {
            status: "running",
            uptime_seconds: self.started.elapsed().as_secs(),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            signals_emitted: self.signals_emitted.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    uptime_seconds: u64,
    cycles_completed: u64,
    signals_emitted: u64,
    delivery_failures: u64,
}

pub async fn serve(state: Arc<HealthState>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let make_service = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(route(req, &state)) }
            }))
        }
    });

    info!("health endpoint listening on {addr}");
    Server::bind(&addr).serve(make_service).await?;
    Ok(())
}

fn route(req: Request<Body>, state: &HealthState) -> Response<Body> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => Response::new(Body::from("SMC Sniper bot is alive!")),
        (&Method::GET, "/status") => {
            let body = serde_json::to_string(&state.status()).expect("status serializes");
            Response::builder()
                .header("content-type", "application/json")
                .body(Body::from(body))
                .expect("valid response")
        }
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("not found"))
            .expect("valid response"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let state = HealthState::new();
        state.record_cycle();
        state.record_cycle();
        state.record_signal();
        state.record_delivery_failure();

        let status = state.status();
        assert_eq!(status.cycles_completed, 2);
        assert_eq!(status.signals_emitted, 1);
        assert_eq!(status.delivery_failures, 1);
    }

    #[tokio::test]
    async fn routes_respond() {
        let state = HealthState::new();
        let ok = route(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
            &state,
        );
        assert_eq!(ok.status(), StatusCode::OK);

        let status = route(
            Request::builder()
                .method(Method::GET)
                .uri("/status")
                .body(Body::empty())
                .unwrap(),
            &state,
        );
        assert_eq!(status.status(), StatusCode::OK);

        let missing = route(
            Request::builder()
                .method(Method::GET)
                .uri("/nope")
                .body(Body::empty())
                .unwrap(),
            &state,
        );
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
