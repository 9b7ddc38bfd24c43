pub mod chat;
pub mod extract;
pub mod prompts;
pub mod transcribe;

pub use chat::*;
pub use extract::*;
pub use prompts::*;
pub use transcribe::*;
