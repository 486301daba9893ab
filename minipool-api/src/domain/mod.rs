pub mod address;
pub mod minipool;
pub mod units;
pub mod withdrawal;

pub use address::*;
pub use minipool::*;
pub use units::*;
pub use withdrawal::*;
