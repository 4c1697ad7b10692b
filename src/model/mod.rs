//! Outbound calls to the remote model endpoint.
//!
//! - [`caller`]: retrying chat completion client
//! - [`errors`]: failure taxonomy of a model call
//! - [`types`]: wire types of the completion API

pub mod caller;
pub mod errors;
pub mod types;
