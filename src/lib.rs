//! consult-relay: HTTP relay between consultation clients and a remote LLM.
//!
//! Incoming text is wrapped in a system/user prompt, forwarded to an
//! OpenAI-style completion endpoint with retry on connection failure, and
//! the model's reply is coerced into JSON before being returned.
//!
//! A mock service with the same request shape and a fixed latency profile
//! is included for client-side testing.

pub mod config;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod server;
