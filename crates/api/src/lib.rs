//! HTTP API: configuration, the request pipeline, and routing.

pub mod app;
pub mod audit;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
