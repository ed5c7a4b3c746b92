//! Core routing functionality
//!
//! ## Module structure
//!
//! - `providers` - the adapter contract the gateway dispatches through
//! - `registry` - provider set, health records, rate windows, availability
//! - `cache` - exact-match FIFO cache plus the semantic tier
//! - `cost` - cost estimation and the observational budget ledger
//! - `gateway` - the orchestrator: chat, embed, racing, stats
//! - `decompose` - task decomposition fan-out / fan-in
//! - `audit` - bounded decision log and the optimization advisor

pub mod audit;
pub mod cache;
pub mod cost;
pub mod decompose;
pub mod gateway;
pub mod providers;
pub mod registry;
