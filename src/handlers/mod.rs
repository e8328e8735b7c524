pub mod auth;
pub mod two_fa;
