/// Security primitives for the session core
///
/// - **password**: Argon2id credential hashing and verification
/// - **jwt**: signed access/refresh session tokens (HS256, injected secret)
/// - **token_revocation**: shared denylist of revoked token identifiers
/// - **totp**: time-based one-time codes for the second factor
/// - **secret_box**: at-rest encryption for stored TOTP secrets
pub mod jwt;
pub mod password;
pub mod secret_box;
pub mod token_revocation;
pub mod totp;

pub use jwt::{Claims, TokenIssuer, TokenType};
pub use password::{hash_password, verify_password};
pub use secret_box::SecretBox;
pub use token_revocation::{MemoryRevocationRegistry, RedisRevocationRegistry, RevocationRegistry};
