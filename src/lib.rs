pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod menu;
pub mod resource;
pub mod session;
pub mod shell;
pub mod types;

#[cfg(test)]
pub mod testing;
