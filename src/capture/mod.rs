//! Capture agents and URL dispatch.
//!
//! A capture agent fetches the content behind a URL into a destination file.
//! Agents are bound to URL patterns in configuration order and the first
//! binding whose pattern matches a URL is the only one used for it.

mod agent;
mod dispatcher;
mod registry;

pub use agent::{CaptureAgent, CaptureError, ScriptAgent};
pub use dispatcher::{CaptureDispatcher, Captured};
pub use registry::{AgentBinding, AgentRegistry};
