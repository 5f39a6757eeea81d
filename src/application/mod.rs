pub mod cli;
pub mod runners;
pub mod terminal;
