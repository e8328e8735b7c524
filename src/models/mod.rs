pub mod user;

pub use user::{
    ChangePasswordRequest, LoginRequest, NewUser, SignupRequest, TwoFaEnableRequest,
    TwoFaLoginVerifyRequest, TwoFaVerifyRequest, TwoFactorKind, User,
};
