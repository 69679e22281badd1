//! JSON REST source for a lottery operator's public results API.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{LotteryRestConfig, LotteryRestSource};
