//! Motion input — samples, filter strategies, and sensor subscriptions.

pub mod filter;
pub mod sample;
pub mod subscription;
