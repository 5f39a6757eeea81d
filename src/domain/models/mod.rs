mod backend;
mod conversation;
mod manifest;
mod message;
mod report;
mod snippet;

pub use backend::*;
pub use conversation::*;
pub use manifest::*;
pub use message::*;
pub use report::*;
pub use snippet::*;
