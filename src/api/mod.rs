pub mod error;
pub mod handlers;
pub mod options;
pub mod routes;

pub use error::*;
pub use handlers::*;
pub use options::*;
pub use routes::*;
