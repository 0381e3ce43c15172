//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Build backends (init) → First probe + schema (ready) → AppContext
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop health monitor → Close backends (closed)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, AppContext};
