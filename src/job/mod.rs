pub mod orchestrator;
pub mod store;
pub mod upload;

pub use orchestrator::*;
pub use store::*;
pub use upload::*;
