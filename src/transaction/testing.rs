//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::time::Instant;

use crate::transaction::error::TransportError;
use crate::transaction::transport::{OutboundRequest, RawResponse, Transport};

/// What the transport does for one attempt.
#[derive(Debug, Clone)]
pub enum Step {
    Respond(RawResponse),
    Fail(TransportError),
    /// Never answer within any sane per-request timeout.
    Stall,
}

impl Step {
    pub fn json(status: u16, body: &str) -> Self {
        Step::Respond(RawResponse::json(status_code(status), body))
    }

    pub fn text(status: u16, body: &str) -> Self {
        Step::Respond(RawResponse::text(status_code(status), body))
    }

    pub fn refused() -> Self {
        Step::Fail(TransportError::Connect("connection refused".into()))
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

/// Plays back a script of steps; the last step repeats forever.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    steps: Arc<Mutex<VecDeque<Step>>>,
    seen: Arc<Mutex<Vec<(OutboundRequest, Instant)>>>,
}

impl ScriptedTransport {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            seen: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.seen.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Time between consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        let seen = self.seen.lock().unwrap();
        seen.windows(2).map(|w| w[1].1 - w[0].1).collect()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().expect("script must not be empty")
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push((request, Instant::now()));
        match self.next_step() {
            Step::Respond(response) => Ok(response),
            Step::Fail(err) => Err(err),
            Step::Stall => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(TransportError::Connect("stalled".into()))
            }
        }
    }
}

/// Assert `actual` is `expected`, allowing for the timer's millisecond rounding.
pub fn assert_duration(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual - expected < Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

/// [`assert_duration`] over a sequence.
pub fn assert_durations(actual: &[Duration], expected: &[Duration]) {
    assert_eq!(actual.len(), expected.len(), "got {:?}", actual);
    for (a, e) in actual.iter().zip(expected) {
        assert_duration(*a, *e);
    }
}
