mod api_key;
mod config;

pub use api_key::*;
pub use config::*;
