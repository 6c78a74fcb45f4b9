//! HTTP handlers. Thin: parse, delegate to the core service, shape the reply.

pub mod downloads;
pub mod health;
