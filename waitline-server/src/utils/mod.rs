//! Utility modules

pub mod error;
pub mod logger;
pub mod token;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult, ok};
pub use token::opaque_token;
