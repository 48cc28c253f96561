//! HTTP server layer for the IIIF gateway.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                 GET {prefix}/{*path}, GET /health               │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (requests, error bodies) │  │ (CORS, panics, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    handle_panic, health_handler, iiif_handler, iiif_root_handler, AppState, HealthResponse,
};
pub use routes::{create_router, RouterConfig};
