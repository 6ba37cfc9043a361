//! # Taskboard API Server Library
//!
//! HTTP surface of the taskboard service: router, handlers, configuration
//! and error mapping. Domain logic lives in `taskboard_shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
