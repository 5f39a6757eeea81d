mod batch_generator;
mod chat_session;
mod context_collector;
mod multi_file_generator;
mod output_dir;

pub use batch_generator::*;
pub use chat_session::*;
pub use context_collector::*;
pub use multi_file_generator::*;
pub use output_dir::*;
