//! # Equipment Interface
//!
//! This module defines the interface structures exchanged with the vehicle's equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod detect;
pub mod gps;
pub mod loc;
pub mod tm;
pub mod vehicle;

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Errors raised by equipment drivers.
///
/// Any of these returned by the vehicle I/O driver is treated as an unrecoverable hardware failure
/// by the control loop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EqptError {
    #[error("The equipment is not connected: {0}")]
    NotConnected(String),

    #[error("Equipment I/O failure: {0}")]
    IoFailure(String),

    #[error("Timed out waiting for the equipment")]
    Timeout,

    #[error("The equipment returned invalid data: {0}")]
    InvalidData(String),
}
