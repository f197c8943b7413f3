//! # Coordination state
//!
//! The only mutable state shared between the control and perception loops. Each field has a single
//! owning writer:
//!
//! - `stop_requested` is raised by the perception loop and cleared by the control loop when it
//!   consumes the request,
//! - `speed_dem_ms` is written only by the control loop, the perception loop records it alongside
//!   each decision,
//! - `terminate` may be raised by either loop on a fatal error or by the interrupt handler, and is
//!   never lowered.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State shared between the control and perception loops, normally held in an `Arc`.
#[derive(Debug)]
pub struct CoordState {
    stop_requested: AtomicBool,

    terminate: AtomicBool,

    /// Bits of the `f64` speed demand.
    speed_dem_ms: AtomicU64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CoordState {
    pub fn new(speed_dem_ms: f64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            terminate: AtomicBool::new(false),
            speed_dem_ms: AtomicU64::new(speed_dem_ms.to_bits()),
        }
    }

    /// Request that the vehicle stops.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Consume any pending stop request, returning true if there was one.
    ///
    /// A request is returned by exactly one call.
    pub fn take_stop_request(&self) -> bool {
        self.stop_requested.swap(false, Ordering::AcqRel)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Signal both loops to exit.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    pub fn set_speed_dem_ms(&self, speed_dem_ms: f64) {
        self.speed_dem_ms
            .store(speed_dem_ms.to_bits(), Ordering::Release);
    }

    pub fn speed_dem_ms(&self) -> f64 {
        f64::from_bits(self.speed_dem_ms.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_stop_request_consumed_once() {
        let coord = CoordState::new(0.65);

        assert!(!coord.take_stop_request());

        coord.request_stop();
        coord.request_stop();
        assert!(coord.is_stop_requested());
        assert!(coord.take_stop_request());
        assert!(!coord.take_stop_request());
    }

    #[test]
    fn test_speed_dem() {
        let coord = CoordState::new(0.65);
        assert_eq!(coord.speed_dem_ms(), 0.65);

        coord.set_speed_dem_ms(0.0);
        assert_eq!(coord.speed_dem_ms(), 0.0);
    }

    #[test]
    fn test_terminate_across_threads() {
        let coord = Arc::new(CoordState::new(0.0));
        let c = coord.clone();

        thread::spawn(move || c.terminate()).join().unwrap();

        assert!(coord.is_terminated());
    }
}
