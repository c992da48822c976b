use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Bounds the number of simultaneously running `crystal tool` subprocesses.
///
/// The compiler re-analyzes the whole project on every invocation, so rapid
/// successive requests (e.g. the user skimming through a file) would otherwise
/// pile up an unbounded number of compiler processes. The gate admits a new
/// invocation only while fewer than `limit` are in flight.
///
/// Admission is a single atomic check-and-increment, so two tasks racing for
/// the last slot can never both get in. The slot is held by an
/// [`AdmissionPermit`] and returned when the permit is dropped, on every
/// path, including spawn failures.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    active: AtomicUsize,
    limit: AtomicUsize,
}

impl AdmissionGate {
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(GateInner {
                active: AtomicUsize::new(0),
                limit: AtomicUsize::new(limit.max(1)),
            }),
        }
    }

    /// Try to claim a slot for a new invocation.
    ///
    /// Returns `None` when `limit` invocations are already in flight. The
    /// returned permit releases the slot on drop.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        let limit = self.inner.limit.load(Ordering::Acquire);
        self.inner
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                if active < limit { Some(active + 1) } else { None }
            })
            .ok()
            .map(|_| AdmissionPermit {
                gate: Arc::clone(&self.inner),
            })
    }

    /// Number of invocations currently holding a permit.
    pub fn active_count(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> usize {
        self.inner.limit.load(Ordering::Acquire)
    }

    /// Update the admission limit at runtime (from a settings change).
    ///
    /// Only gates *new* admissions: lowering the limit below the current
    /// in-flight count lets running invocations finish undisturbed.
    pub fn set_limit(&self, limit: usize) {
        self.inner.limit.store(limit.max(1), Ordering::Release);
    }
}

/// A claimed slot in the [`AdmissionGate`]. Dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<GateInner>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        // saturating: the counter must never wrap below zero even if a
        // permit outlives a gate reconfiguration.
        let _ = self
            .gate
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                Some(active.saturating_sub(1))
            });
    }
}

#[cfg(test)]
#[path = "../../tests/src/implementations/gate_tests.rs"]
mod tests;
