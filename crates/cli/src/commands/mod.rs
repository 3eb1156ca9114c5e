//! Command implementations.

mod analyze;
mod collect;
mod diagnostics;
mod info;
mod stationarity;
mod validate;

pub use analyze::run_analyze;
pub use collect::run_collect;
pub use diagnostics::{run_timing, run_zeros};
pub use info::run_info;
pub use stationarity::run_stationarity;
pub use validate::run_validate;
