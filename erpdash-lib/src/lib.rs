//! ERP transaction platform client library
//!
//! Typed access to the tenant, transaction and application resources of a
//! multi-tenant ERP transaction API, fronted by an in-memory
//! stale-while-revalidate cache.

pub mod api;
pub mod auth;
pub mod cache;
pub mod error;
pub mod model;
pub mod response;
pub mod scope;

mod cached;
mod client;

pub use cached::*;
pub use client::*;
pub use response::CacheStatus;
pub use response::Response;
pub use scope::TenantScope;
