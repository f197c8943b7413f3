//! # Telemetry Sink Interface
//!
//! Telemetry is purely observational, nothing sent to a sink feeds back into control.

use super::EqptError;

/// A consumer of sampled telemetry records of type `T`.
pub trait TmSink<T>: Send {
    fn send(&mut self, tm: &T) -> Result<(), EqptError>;
}

/// A sink which discards all telemetry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTmSink;

impl<T> TmSink<T> for NullTmSink {
    fn send(&mut self, _tm: &T) -> Result<(), EqptError> {
        Ok(())
    }
}
