//! Quill Auth Service Library
//!
//! Authentication and session security for the Quill assistant backend:
//! signed access/refresh session tokens, server-side revocation, double-submit
//! CSRF protection, and a two-factor challenge flow over password login.

pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;

pub use error::{AuthError, Result};

use crate::services::auth::AuthService;
use crate::services::two_fa::TwoFaService;

/// Shared application state handed to every handler and middleware layer.
///
/// All collaborators are injected at construction so tests can swap in
/// in-memory doubles; there is no process-global state.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub two_fa: TwoFaService,
    /// Whether cookies carry the `Secure` attribute (deployment-owned).
    pub cookie_secure: bool,
}
