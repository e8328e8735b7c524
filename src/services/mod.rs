pub mod auth;
pub mod email;
pub mod two_fa;

pub use auth::{AuthService, LoginOutcome, SessionTokens};
pub use email::{CodeDelivery, MemoryCodeDelivery, SmtpCodeDelivery};
pub use two_fa::{TwoFaEnrollment, TwoFaService};
