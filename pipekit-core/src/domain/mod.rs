//! Core domain types
//!
//! These types describe what a caller submits to Pipekit. They are shared
//! between the client library (which serializes them) and the CLI (which
//! loads them from disk).

pub mod pipe;
