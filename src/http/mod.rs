//! axum server for the interactive dashboard.
//!
//! ```text
//! GET  /         dashboard page (or an error page when the dataset fails to load)
//! POST /report   PDF report download
//! GET  /health   liveness
//! ```
//!
//! Loading, aggregation and rendering are blocking work and run on the
//! blocking thread pool, one request at a time per handler call.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::{AppState, Settings};
