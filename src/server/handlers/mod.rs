//! HTTP request handlers.

mod retrieve;
mod submit;

pub use retrieve::retrieve;
pub use submit::submit;
