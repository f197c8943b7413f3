//! # Car Executable Parameters
//!
//! This module provides parameters for the car executable. Module parameters live with their
//! modules.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::{per_loop, sim};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
pub struct CarExecParams {
    /// Perception loop task parameters
    pub per_loop: per_loop::Params,

    /// Simulated world
    pub sim: sim::Params,
}
