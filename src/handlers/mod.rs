//! Request handlers, one module per resource.
//!
//! Handlers take `AuthUser` for identity, `IdPath`/`ApiJson`/`ApiQuery` for input,
//! and return `AppResult`, so every failure leaves through the same envelope.

pub mod auth;
pub mod booking;
pub mod hotel;
pub mod room;
pub mod user;

pub use auth::*;
pub use booking::*;
pub use hotel::*;
pub use room::*;
pub use user::*;
