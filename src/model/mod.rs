pub mod credential;
pub mod events;
pub mod lockout;
pub mod otp;
pub mod policy;
pub mod recovery;
pub mod session;
pub mod two_factor;
