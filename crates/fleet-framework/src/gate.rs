//! # Failure Gate
//!
//! A three-state circuit breaker wrapped around every remote call a service makes.
//!
//! ```text
//! Closed   → Open:     failures in the rolling window ≥ threshold and failure rate ≥ configured rate
//! Open     → HalfOpen: cooldown elapsed (checked lazily by the next caller)
//! HalfOpen → Closed:   a trial call succeeds
//! HalfOpen → Open:     a trial call fails
//! ```
//!
//! The gate never retries. It decides whether to attempt, bounds the attempt with
//! `call_timeout`, and records the outcome. The breaker state is the only thing shared
//! between concurrent callers of one dependency.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "closed"),
            BreakerState::Open => write!(f, "open"),
            BreakerState::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Breaker thresholds and timeouts, injected from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum number of failures inside the window before the breaker may open.
    pub failure_threshold: u32,
    /// Share of failed calls inside the window (0.0..=1.0) required to open.
    pub failure_rate: f64,
    pub window_ms: u64,
    /// How long the breaker stays open before letting trial calls through.
    pub cooldown_ms: u64,
    pub half_open_max_calls: u32,
    /// Upper bound for a single call. Must be shorter than the window.
    pub call_timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_rate: 0.5,
            window_ms: 10_000,
            cooldown_ms: 5_000,
            half_open_max_calls: 1,
            call_timeout_ms: 2_000,
        }
    }
}

impl GateConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be at least 1".to_string());
        }
        if !(self.failure_rate > 0.0 && self.failure_rate <= 1.0) {
            return Err(format!("failure_rate {} outside (0, 1]", self.failure_rate));
        }
        if self.half_open_max_calls == 0 {
            return Err("half_open_max_calls must be at least 1".to_string());
        }
        if self.call_timeout_ms >= self.window_ms {
            return Err(format!(
                "call_timeout_ms ({}) must be shorter than window_ms ({})",
                self.call_timeout_ms, self.window_ms
            ));
        }
        Ok(())
    }
}

/// Why a gated call did not produce a value.
#[derive(Debug)]
pub enum GateError<E> {
    /// Rejected without attempting the operation.
    Open { gate: String },
    Timeout(Duration),
    Inner(E),
}

impl<E: fmt::Display> fmt::Display for GateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::Open { gate } => write!(f, "circuit '{gate}' is open (failing fast)"),
            GateError::Timeout(after) => write!(f, "call timed out after {after:?}"),
            GateError::Inner(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for GateError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GateError::Inner(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GateStats {
    pub state: BreakerState,
    pub attempted: u64,
    pub fast_failed: u64,
    pub window_failures: u32,
    pub window_calls: u32,
}

#[derive(Debug)]
struct GateInner {
    state: BreakerState,
    /// (when, failed) for calls completed while closed, oldest first.
    outcomes: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
}

impl GateInner {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&(at, _)) = self.outcomes.front() {
            if now.duration_since(at) >= window {
                self.outcomes.pop_front();
            } else {
                break;
            }
        }
    }

    fn failures(&self) -> u32 {
        self.outcomes.iter().filter(|(_, failed)| *failed).count() as u32
    }
}

/// Circuit breaker for one (service, dependency) pair.
#[derive(Debug)]
pub struct FailureGate {
    name: String,
    config: GateConfig,
    inner: Mutex<GateInner>,
    attempted: AtomicU64,
    fast_failed: AtomicU64,
}

/// Slot held while a call is in flight. A half-open trial that is dropped without an
/// outcome (caller cancelled) gives its slot back.
struct Permit<'a> {
    gate: &'a FailureGate,
    trial: bool,
    settled: bool,
}

impl Permit<'_> {
    fn succeed(mut self) {
        self.settled = true;
        self.gate.on_success(self.trial);
    }

    fn fail(mut self) {
        self.settled = true;
        self.gate.on_failure(self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.trial && !self.settled {
            let mut inner = self.gate.inner.lock();
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
    }
}

impl FailureGate {
    pub fn new(name: impl Into<String>, config: GateConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(GateInner {
                state: BreakerState::Closed,
                outcomes: VecDeque::new(),
                opened_at: None,
                trials_in_flight: 0,
            }),
            attempted: AtomicU64::new(0),
            fast_failed: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    pub fn stats(&self) -> GateStats {
        let inner = self.inner.lock();
        GateStats {
            state: inner.state,
            attempted: self.attempted.load(Ordering::Relaxed),
            fast_failed: self.fast_failed.load(Ordering::Relaxed),
            window_failures: inner.failures(),
            window_calls: inner.outcomes.len() as u32,
        }
    }

    /// Execute `operation` through the gate.
    ///
    /// Returns [`GateError::Open`] without calling `operation` when the breaker is open (or
    /// half-open with all trial slots taken), [`GateError::Timeout`] when the call exceeds
    /// `call_timeout`, and [`GateError::Inner`] when the operation itself fails.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, GateError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.acquire() else {
            self.fast_failed.fetch_add(1, Ordering::Relaxed);
            debug!(gate = %self.name, "Fast-fail");
            return Err(GateError::Open {
                gate: self.name.clone(),
            });
        };
        self.attempted.fetch_add(1, Ordering::Relaxed);

        let timeout = self.config.call_timeout();
        match tokio::time::timeout(timeout, operation()).await {
            Ok(Ok(value)) => {
                permit.succeed();
                Ok(value)
            }
            Ok(Err(e)) => {
                permit.fail();
                Err(GateError::Inner(e))
            }
            Err(_) => {
                permit.fail();
                Err(GateError::Timeout(timeout))
            }
        }
    }

    fn acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.inner.lock();
        let trial = match inner.state {
            BreakerState::Closed => false,
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.cooldown());
                if !cooled {
                    return None;
                }
                info!(gate = %self.name, "Open -> HalfOpen");
                inner.state = BreakerState::HalfOpen;
                inner.trials_in_flight = 1;
                true
            }
            BreakerState::HalfOpen => {
                if inner.trials_in_flight >= self.config.half_open_max_calls {
                    return None;
                }
                inner.trials_in_flight += 1;
                true
            }
        };
        Some(Permit {
            gate: self,
            trial,
            settled: false,
        })
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.inner.lock();
        if trial {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
        match inner.state {
            BreakerState::HalfOpen if trial => {
                info!(gate = %self.name, "HalfOpen -> Closed");
                inner.state = BreakerState::Closed;
                inner.outcomes.clear();
                inner.opened_at = None;
                inner.trials_in_flight = 0;
            }
            BreakerState::Closed => {
                let now = Instant::now();
                inner.outcomes.push_back((now, false));
                inner.prune(now, self.config.window());
            }
            _ => {}
        }
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        if trial {
            inner.trials_in_flight = inner.trials_in_flight.saturating_sub(1);
        }
        match inner.state {
            BreakerState::HalfOpen => {
                warn!(gate = %self.name, "Trial failed, HalfOpen -> Open");
                inner.state = BreakerState::Open;
                inner.opened_at = Some(now);
                inner.trials_in_flight = 0;
            }
            BreakerState::Closed => {
                inner.outcomes.push_back((now, true));
                inner.prune(now, self.config.window());
                let failures = inner.failures();
                let rate = f64::from(failures) / inner.outcomes.len() as f64;
                if failures >= self.config.failure_threshold && rate >= self.config.failure_rate {
                    error!(
                        gate = %self.name,
                        failures,
                        rate,
                        threshold = self.config.failure_threshold,
                        "Closed -> Open"
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                    inner.outcomes.clear();
                }
            }
            BreakerState::Open => {}
        }
    }

    /// Force the breaker back to closed and forget the window.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = BreakerState::Closed;
        inner.outcomes.clear();
        inner.opened_at = None;
        inner.trials_in_flight = 0;
    }
}

/// Hands out one shared [`FailureGate`] per dependency of a service.
#[derive(Debug)]
pub struct GateRegistry {
    service: String,
    config: GateConfig,
    gates: Mutex<HashMap<String, Arc<FailureGate>>>,
}

impl GateRegistry {
    pub fn new(service: impl Into<String>, config: GateConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            service: service.into(),
            config,
            gates: Mutex::new(HashMap::new()),
        })
    }

    pub fn gate(&self, dependency: &str) -> Arc<FailureGate> {
        self.gates
            .lock()
            .entry(dependency.to_string())
            .or_insert_with(|| {
                Arc::new(FailureGate::new(
                    format!("{}->{}", self.service, dependency),
                    self.config.clone(),
                ))
            })
            .clone()
    }
}
