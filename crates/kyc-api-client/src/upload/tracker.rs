//! Observable wrapper around the upload router.
//!
//! The percentage is simulated: neither upload strategy exposes transfer progress,
//! so a timer moves it toward 90% while the request is in flight, it snaps to 100%
//! when the request settles and falls back to 0% one second later.

use kyc_core::models::{UploadRequest, UploadResponse};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::router::UploadRouter;

const TICK: Duration = Duration::from_millis(200);
const MAX_STEP_PERCENT: f64 = 10.0;
const SIMULATED_CEILING_PERCENT: f64 = 90.0;
const RESET_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapshot {
    pub is_uploading: bool,
    pub progress: f64,
    pub last_result: Option<UploadResponse>,
    /// Increments with every upload started through the tracker
    pub attempt: u64,
}

#[derive(Clone)]
pub struct UploadTracker {
    router: UploadRouter,
    state: Arc<watch::Sender<UploadSnapshot>>,
}

impl UploadTracker {
    pub fn new(router: UploadRouter) -> Self {
        let (state, _) = watch::channel(UploadSnapshot::default());
        Self {
            router,
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> &UploadRouter {
        &self.router
    }

    pub fn is_uploading(&self) -> bool {
        self.state.borrow().is_uploading
    }

    /// Simulated percentage, see the module docs.
    pub fn progress(&self) -> f64 {
        self.state.borrow().progress
    }

    pub fn last_result(&self) -> Option<UploadResponse> {
        self.state.borrow().last_result.clone()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.state.subscribe()
    }

    pub async fn upload(&self, request: &UploadRequest) -> UploadResponse {
        let mut attempt = 0;
        self.state.send_modify(|s| {
            s.attempt += 1;
            attempt = s.attempt;
            s.is_uploading = true;
            s.progress = 0.0;
            s.last_result = None;
        });

        let in_flight = InFlight {
            state: self.state.clone(),
            attempt,
            ticker: tokio::spawn(simulate_progress(self.state.clone(), attempt)),
        };
        let result = self.router.upload_file(request).await;
        in_flight.ticker.abort();

        self.state.send_modify(|s| {
            s.is_uploading = false;
            s.progress = 100.0;
            s.last_result = Some(result.clone());
        });
        drop(in_flight);

        let state = self.state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESET_DELAY).await;
            state.send_if_modified(|s| {
                if s.attempt == attempt && !s.is_uploading {
                    s.progress = 0.0;
                    true
                } else {
                    false
                }
            });
        });

        result
    }
}

/// Stops the ticker and clears the uploading flag if the upload future is
/// dropped before the request settles.
struct InFlight {
    state: Arc<watch::Sender<UploadSnapshot>>,
    attempt: u64,
    ticker: JoinHandle<()>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.ticker.abort();
        let attempt = self.attempt;
        self.state.send_if_modified(|s| {
            if s.attempt == attempt && s.is_uploading {
                s.is_uploading = false;
                s.progress = 0.0;
                true
            } else {
                false
            }
        });
    }
}

async fn simulate_progress(state: Arc<watch::Sender<UploadSnapshot>>, attempt: u64) {
    let mut interval = tokio::time::interval(TICK);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let step = rand::random::<f64>() * MAX_STEP_PERCENT;
        let mut keep_going = false;
        state.send_if_modified(|s| {
            if s.attempt != attempt || !s.is_uploading || s.progress >= SIMULATED_CEILING_PERCENT
            {
                return false;
            }
            s.progress = (s.progress + step).min(SIMULATED_CEILING_PERCENT);
            keep_going = s.progress < SIMULATED_CEILING_PERCENT;
            true
        });
        if !keep_going {
            break;
        }
    }
}
