//! Operator authentication
//!
//! Operator endpoints require a bearer JWT carrying the business the caller
//! belongs to; every storage access is then scoped by that `business_id`.
//! Public surfaces (display, kiosk, status page) never touch this module;
//! they are scoped by opaque tokens instead.

mod extractor;
mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
