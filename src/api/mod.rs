//! HTTP boundary for the drift engine.
//!
//! The dashboard posts an event batch and a guideline reference and gets the
//! `DriftAnalysisResult` JSON back. Routes are nested under `/api/`; every
//! request passes the audit logger, and CORS is open to the browser UI.
//!
//! The router is composable: `analysis_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::analysis_router;
pub use server::{start_analysis_server, AnalysisServer, ServerError, ServerSession};
pub use types::ApiContext;
