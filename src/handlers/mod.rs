//! HTTP handlers and the routers that group them.

pub mod posts;
pub mod roles;
pub mod users;
