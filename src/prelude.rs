#![allow(unused_imports)]

pub use tracing::{Level, debug, info, instrument, trace, warn};

pub use crate::error::{Result, SimulationError};
