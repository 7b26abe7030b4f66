//! Data Transfer Objects for per-call directives
//!
//! DTOs here are transient value objects read by the client while it builds
//! a single request. They are never persisted.

pub mod options;
