//! Request-path middleware: anti-forgery guard, session context, and
//! security response headers.

pub mod audit;
pub mod auth;
pub mod csrf;
pub mod security_headers;

pub use audit::audit_log;
pub use auth::{session_context, CurrentUser};
pub use csrf::csrf_guard;
pub use security_headers::security_headers;
