//! Resource types and the database operations behind each endpoint.

pub mod post;
pub mod role;
pub mod user;

pub use post::{Post, PostCreate, PostUpdate};
pub use role::{Role, RoleCreate, RoleUpdate};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, User, UserUpdate};
