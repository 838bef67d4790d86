//! Rental Store Common
//!
//! Runtime plumbing shared by the rental store binaries:
//! - `logging` - tracing subscriber setup (text or JSON)
//! - `shutdown` - process signal handling for graceful shutdown

pub mod logging;
pub mod shutdown;

pub use logging::init_logging;
pub use shutdown::shutdown_signal;
