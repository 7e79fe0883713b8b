//! Per-dependency circuit state for operators.
//!
//! A breaker counts consecutive failures of one dependent service. Once the
//! threshold is reached it reports the circuit as open on the
//! `menu_export_circuit_open` gauge; the next success closes it again. The
//! breakers only report: they never sleep or reject calls.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{info, warn};

use crate::metrics::set_circuit_open;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Set in [`CircuitBreaker`] state when the circuit is open.
const OPEN_BIT: u64 = 1 << 32;
const COUNT_MASK: u64 = OPEN_BIT - 1;

/// External dependency a render attempt relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Headless browser
    Renderer,
    /// Object storage
    Storage,
    /// Job store
    Database,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::Renderer,
        ServiceKind::Storage,
        ServiceKind::Database,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Renderer => "renderer",
            ServiceKind::Storage => "storage",
            ServiceKind::Database => "database",
        }
    }

    fn index(&self) -> usize {
        match self {
            ServiceKind::Renderer => 0,
            ServiceKind::Storage => 1,
            ServiceKind::Database => 2,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consecutive-failure breaker for one service.
///
/// Failure count and open flag share one word, so a breaker is never open
/// with a zero count.
#[derive(Debug)]
pub struct CircuitBreaker {
    service: ServiceKind,
    threshold: u32,
    state: AtomicU64,
}

impl CircuitBreaker {
    /// A threshold of zero is treated as one.
    pub fn new(service: ServiceKind, threshold: u32) -> Self {
        Self {
            service,
            threshold: threshold.max(1),
            state: AtomicU64::new(0),
        }
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) & OPEN_BIT != 0
    }

    pub fn failure_count(&self) -> u32 {
        (self.state.load(Ordering::Acquire) & COUNT_MASK) as u32
    }

    /// Record a failed call.
    ///
    /// Returns `true` if this failure opened the circuit.
    pub fn record_failure(&self) -> bool {
        let threshold = self.threshold;
        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let failures = ((state & COUNT_MASK) as u32).saturating_add(1);
                let open = if failures >= threshold { OPEN_BIT } else { state & OPEN_BIT };
                Some(open | u64::from(failures))
            })
            .unwrap_or_else(|state| state);

        if previous & OPEN_BIT != 0 {
            return false;
        }
        let failures = ((previous & COUNT_MASK) as u32).saturating_add(1);
        if failures < threshold {
            return false;
        }

        set_circuit_open(self.service.as_str(), true);
        warn!(
            service = %self.service,
            consecutive_failures = failures,
            "Circuit opened"
        );
        true
    }

    /// Record a successful call (resets failure count).
    pub fn record_success(&self) {
        let previous = self.state.swap(0, Ordering::AcqRel);
        if previous & OPEN_BIT != 0 {
            set_circuit_open(self.service.as_str(), false);
            info!(
                service = %self.service,
                consecutive_failures = previous & COUNT_MASK,
                "Circuit closed after recovery"
            );
        }
    }
}

/// One breaker per [`ServiceKind`], shareable across worker threads.
#[derive(Debug)]
pub struct CircuitRegistry {
    breakers: [CircuitBreaker; 3],
}

impl Default for CircuitRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl CircuitRegistry {
    pub fn new(threshold: u32) -> Self {
        Self {
            breakers: ServiceKind::ALL.map(|service| CircuitBreaker::new(service, threshold)),
        }
    }

    pub fn breaker(&self, service: ServiceKind) -> &CircuitBreaker {
        &self.breakers[service.index()]
    }

    pub fn record_failure(&self, service: ServiceKind) -> bool {
        self.breaker(service).record_failure()
    }

    pub fn record_success(&self, service: ServiceKind) {
        self.breaker(service).record_success()
    }

    pub fn is_open(&self, service: ServiceKind) -> bool {
        self.breaker(service).is_open()
    }

    /// Publish every breaker's current state, e.g. after the recorder is
    /// installed.
    pub fn publish(&self) {
        for breaker in &self.breakers {
            set_circuit_open(breaker.service.as_str(), breaker.is_open());
        }
    }
}
