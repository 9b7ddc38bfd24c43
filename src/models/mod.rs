pub mod coverage;
pub mod evaluation;
pub mod insights;
pub mod job;
pub mod signal;
pub mod transcript;

pub use coverage::*;
pub use evaluation::*;
pub use insights::*;
pub use job::*;
pub use signal::*;
pub use transcript::*;
