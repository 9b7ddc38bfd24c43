pub mod coverage;
pub mod diarize;
pub mod evaluate;
pub mod opportunities;
pub mod report;
pub mod signals;

pub use coverage::*;
pub use diarize::*;
pub use evaluate::*;
pub use opportunities::*;
pub use report::*;
pub use signals::*;
