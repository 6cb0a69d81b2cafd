//! # inkpress
//!
//! A REST API for users, posts and roles built on Axum and Sea-ORM.
//!
//! List endpoints share one query grammar:
//!
//! ```text
//! GET /api/posts?search=title:like:rust&search=created_at:gte:2024-01-01&sort=title:asc&page=2&limit=20
//! ```
//!
//! - `search=<field>:<operator>:<value>` is repeatable and AND-combined
//! - `sort=<field>:<asc|desc>` is repeatable and applied in order
//! - fields and operators are checked against a per-resource allow-list
//!
//! Responses use the envelope `{ "data": [...] }`, optionally extended with
//! `metadata` (allowed and applied directives) and `pagination` (counts and
//! links) when `SHOW_METADATA` or `SHOW_PAGINATION` are enabled.
//!
//! Posts are addressed by a slug derived from their title. Colliding slugs get
//! a numeric suffix (`hello-world-1`, `hello-world-2`, ...).

pub mod auth;
pub mod config;
pub mod core;
pub mod entities;
pub mod errors;
pub mod filtering;
pub mod handlers;
pub mod migrations;
pub mod openapi;
pub mod resources;
pub mod response;
pub mod router;
pub mod seed;
pub mod slug;
pub mod state;
pub mod validation;

pub use config::AppConfig;
pub use core::CRUDResource;
pub use errors::ApiError;
pub use router::build_router;
pub use state::AppState;
