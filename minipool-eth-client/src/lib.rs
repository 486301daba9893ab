pub mod client;
pub mod contracts;
pub mod events;
pub mod signer;
