//! Visualization backends for the human and replay rendering modes.
//!
//! The renderer talks to a backend through [`VisBackend`]: start it with the
//! network operating ranges, push one frame per update, stop it on close.
//! [`NoopVis`] is the headless default; the `vis` feature adds [`HttpVis`],
//! which serves the pushed state over HTTP for a browser-based view.

use std::net::SocketAddr;

use super::RenderError;
use super::history::HistoryFrame;

/// A running visualization endpoint.
pub trait VisBackend {
    /// Starts the backend with the environment title and the rendered
    /// operating-range rows.
    ///
    /// Returns the network address the backend is reachable at, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Io`] if the backend cannot be brought up.
    fn start(&mut self, title: &str, specs: &[Vec<f64>]) -> Result<Option<SocketAddr>, RenderError>;

    /// Pushes one rendered frame.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] if the backend is not running.
    fn push(&mut self, frame: &HistoryFrame) -> Result<(), RenderError>;

    /// Tears the backend down. Idempotent.
    fn stop(&mut self);
}

/// Headless backend that swallows frames and counts them.
///
/// Used by tests and whenever the `vis` feature is off.
#[derive(Debug, Default)]
pub struct NoopVis {
    started: bool,
    /// Number of frames pushed since `start`.
    pub pushed: usize,
}

impl NoopVis {
    /// Creates a stopped headless backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisBackend for NoopVis {
    fn start(&mut self, _title: &str, _specs: &[Vec<f64>]) -> Result<Option<SocketAddr>, RenderError> {
        self.started = true;
        self.pushed = 0;
        Ok(None)
    }

    fn push(&mut self, _frame: &HistoryFrame) -> Result<(), RenderError> {
        if !self.started {
            return Err(RenderError::NotInitialized);
        }
        self.pushed += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
    }
}

/// Returns the default backend for live rendering: [`HttpVis`] when the `vis`
/// feature is enabled, [`NoopVis`] otherwise.
pub fn default_backend(port: u16) -> Box<dyn VisBackend> {
    #[cfg(feature = "vis")]
    {
        Box::new(http::HttpVis::new(port))
    }
    #[cfg(not(feature = "vis"))]
    {
        let _ = port;
        Box::new(NoopVis::new())
    }
}

#[cfg(feature = "vis")]
pub use http::HttpVis;

#[cfg(feature = "vis")]
mod http {
    //! HTTP view server: `GET /specs` for the network operating ranges,
    //! `GET /frame` for the most recently pushed frame.

    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex, mpsc};
    use std::thread::JoinHandle;

    use axum::Json;
    use axum::Router;
    use axum::extract::State;
    use axum::routing::get;
    use serde::Serialize;

    use super::super::{RenderError, TIME_FORMAT};
    use super::VisBackend;
    use crate::render::history::HistoryFrame;

    /// Network description served at `/specs`.
    #[derive(Debug, Clone, Serialize)]
    struct SpecsDoc {
        title: String,
        specs: Vec<Vec<f64>>,
    }

    /// One rendered frame served at `/frame`.
    #[derive(Debug, Clone, Serialize)]
    struct FrameDoc {
        time: String,
        state_values: Vec<Vec<f64>>,
        potential: Vec<f64>,
        costs: [f64; 2],
    }

    /// State shared with the request handlers. The specs are fixed at start;
    /// only the latest frame slot is written afterwards.
    struct Shared {
        specs: SpecsDoc,
        frame: Mutex<Option<FrameDoc>>,
    }

    async fn get_specs(State(shared): State<Arc<Shared>>) -> Json<SpecsDoc> {
        Json(shared.specs.clone())
    }

    async fn get_frame(State(shared): State<Arc<Shared>>) -> Json<Option<FrameDoc>> {
        let frame = shared.frame.lock().map(|g| g.clone()).unwrap_or(None);
        Json(frame)
    }

    fn router(shared: Arc<Shared>) -> Router {
        Router::new()
            .route("/specs", get(get_specs))
            .route("/frame", get(get_frame))
            .with_state(shared)
    }

    struct Running {
        addr: SocketAddr,
        shared: Arc<Shared>,
        shutdown: Option<tokio::sync::oneshot::Sender<()>>,
        handle: Option<JoinHandle<()>>,
    }

    /// Browser-facing view server running on a background runtime thread.
    pub struct HttpVis {
        port: u16,
        running: Option<Running>,
    }

    impl HttpVis {
        /// Creates a stopped server that will bind to `127.0.0.1:port`
        /// (port 0 picks a free port).
        pub fn new(port: u16) -> Self {
            Self {
                port,
                running: None,
            }
        }

        /// The bound address while running.
        pub fn address(&self) -> Option<SocketAddr> {
            self.running.as_ref().map(|r| r.addr)
        }
    }

    impl VisBackend for HttpVis {
        fn start(
            &mut self,
            title: &str,
            specs: &[Vec<f64>],
        ) -> Result<Option<SocketAddr>, RenderError> {
            if self.running.is_some() {
                return Ok(self.address());
            }

            let shared = Arc::new(Shared {
                specs: SpecsDoc {
                    title: title.to_string(),
                    specs: specs.to_vec(),
                },
                frame: Mutex::new(None),
            });

            let app = router(Arc::clone(&shared));
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
            let (addr_tx, addr_rx) = mpsc::channel::<std::io::Result<SocketAddr>>();
            let port = self.port;

            let handle = std::thread::spawn(move || {
                let rt = match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = addr_tx.send(Err(e));
                        return;
                    }
                };
                rt.block_on(async move {
                    let listener =
                        match tokio::net::TcpListener::bind(("127.0.0.1", port)).await {
                            Ok(l) => l,
                            Err(e) => {
                                let _ = addr_tx.send(Err(e));
                                return;
                            }
                        };
                    match listener.local_addr() {
                        Ok(addr) => {
                            let _ = addr_tx.send(Ok(addr));
                        }
                        Err(e) => {
                            let _ = addr_tx.send(Err(e));
                            return;
                        }
                    }
                    let _ = axum::serve(listener, app)
                        .with_graceful_shutdown(async {
                            let _ = shutdown_rx.await;
                        })
                        .await;
                });
            });

            let addr = addr_rx
                .recv()
                .map_err(|_| {
                    RenderError::Io(std::io::Error::other("view server thread exited early"))
                })??;

            self.running = Some(Running {
                addr,
                shared,
                shutdown: Some(shutdown_tx),
                handle: Some(handle),
            });
            Ok(Some(addr))
        }

        fn push(&mut self, frame: &HistoryFrame) -> Result<(), RenderError> {
            let running = self.running.as_ref().ok_or(RenderError::NotInitialized)?;
            let doc = FrameDoc {
                time: frame.time.format(TIME_FORMAT).to_string(),
                state_values: frame.state_values.clone(),
                potential: frame.potential.clone(),
                costs: frame.costs,
            };
            if let Ok(mut slot) = running.shared.frame.lock() {
                *slot = Some(doc);
            }
            Ok(())
        }

        fn stop(&mut self) {
            if let Some(mut running) = self.running.take() {
                if let Some(tx) = running.shutdown.take() {
                    let _ = tx.send(());
                }
                if let Some(handle) = running.handle.take() {
                    let _ = handle.join();
                }
            }
        }
    }

    impl Drop for HttpVis {
        fn drop(&mut self) {
            self.stop();
        }
    }

    #[cfg(test)]
    mod tests {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use chrono::NaiveDate;
        use tower::util::ServiceExt;

        use super::*;

        fn make_shared() -> Arc<Shared> {
            Arc::new(Shared {
                specs: SpecsDoc {
                    title: "Anm6".to_string(),
                    specs: vec![vec![-30.0, 0.0], vec![0.0, 30.0]],
                },
                frame: Mutex::new(None),
            })
        }

        #[tokio::test]
        async fn specs_returns_title_and_rows() {
            let app = router(make_shared());
            let req = Request::builder()
                .uri("/specs")
                .body(Body::empty())
                .unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);

            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["title"], "Anm6");
            assert_eq!(json["specs"].as_array().map(Vec::len), Some(2));
        }

        #[tokio::test]
        async fn frame_is_null_before_first_push() {
            let app = router(make_shared());
            let req = Request::builder()
                .uri("/frame")
                .body(Body::empty())
                .unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);

            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(json.is_null());
        }

        #[tokio::test]
        async fn frame_reflects_latest_push() {
            let shared = make_shared();
            let app = router(Arc::clone(&shared));

            let time = NaiveDate::from_ymd_opt(2035, 1, 1)
                .unwrap()
                .and_hms_opt(6, 30, 0)
                .unwrap();
            *shared.frame.lock().unwrap() = Some(FrameDoc {
                time: time.format(TIME_FORMAT).to_string(),
                state_values: vec![vec![1.0]],
                potential: vec![2.0],
                costs: [0.5, 0.0],
            });

            let req = Request::builder()
                .uri("/frame")
                .body(Body::empty())
                .unwrap();
            let resp = app.oneshot(req).await.unwrap();
            let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["time"], "2035-01-01 06:30:00");
            assert_eq!(json["costs"][0], 0.5);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame() -> HistoryFrame {
        HistoryFrame {
            time: NaiveDate::from_ymd_opt(2035, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            state_values: vec![vec![1.0]],
            potential: vec![0.0],
            costs: [0.0, 0.0],
        }
    }

    #[test]
    fn noop_counts_frames() {
        let mut vis = NoopVis::new();
        assert!(vis.start("Anm6", &[vec![1.0]]).unwrap().is_none());
        vis.push(&frame()).unwrap();
        vis.push(&frame()).unwrap();
        assert_eq!(vis.pushed, 2);
    }

    #[test]
    fn noop_push_before_start_fails() {
        let mut vis = NoopVis::new();
        let err = vis.push(&frame()).unwrap_err();
        assert!(matches!(err, RenderError::NotInitialized));
    }

    #[test]
    fn noop_restart_resets_count() {
        let mut vis = NoopVis::new();
        vis.start("Anm6", &[]).unwrap();
        vis.push(&frame()).unwrap();
        vis.stop();
        vis.start("Anm6", &[]).unwrap();
        assert_eq!(vis.pushed, 0);
    }
}
