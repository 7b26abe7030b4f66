//! Pipekit Core
//!
//! Core types shared by the Pipekit client and CLI.
//!
//! This crate contains:
//! - Domain types: the pipe submission unit and its ownership metadata
//! - DTOs: per-call options for create and stop operations
//! - Query parameter bags and the routing target of a call

pub mod domain;
pub mod dto;
pub mod params;
pub mod route;

pub use params::{Params, ParamsContainer};
pub use route::Route;
