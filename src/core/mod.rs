pub mod list;
pub mod traits;

pub use list::list_resources;
pub use traits::CRUDResource;
