pub mod filter;
pub mod render;
pub mod session;
pub mod snapshot;
