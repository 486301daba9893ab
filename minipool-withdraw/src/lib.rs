pub mod collector;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod executor;
pub mod gate;
pub mod selector;
pub mod withdraw;

#[cfg(test)]
mod tests;
