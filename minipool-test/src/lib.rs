pub mod chain;
pub mod helpers;
pub mod runner;
