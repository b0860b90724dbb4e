//! Voice Agent Server
//!
//! HTTP + WebSocket Session Controller: wires streaming STT, the intent
//! classifier, the dispatcher, and TTS over one bidirectional channel per
//! connection, and exposes the REST surface over the same ledger and
//! conversation handles.

pub mod adapters;
pub mod auth;
pub mod error;
pub mod http;
pub mod metrics;
pub mod rate_limit;
pub mod session;
pub mod state;
pub mod websocket;

pub use auth::auth_middleware;
pub use error::ServerError;
pub use http::create_router;
pub use metrics::init_metrics;
pub use rate_limit::{RateLimitError, RateLimiter};
pub use session::{Session, SessionManager};
pub use state::AppState;
pub use websocket::ws_handler;
