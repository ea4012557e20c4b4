pub mod errors;
pub mod interval_text;
pub mod models;
pub mod repo;
pub mod scheduler;
pub mod service;
pub mod stats;

pub use errors::*;
pub use interval_text::*;
pub use models::*;
pub use repo::*;
pub use scheduler::*;
pub use service::*;
pub use stats::*;
