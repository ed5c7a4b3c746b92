//! Two-tier response caching
//!
//! Tier one is an exact-match FIFO cache owned by the gateway; tier two is a
//! similarity lookup against an external vector memory store. The exact tier
//! is authoritative and cheap; the semantic tier is best-effort and silently
//! skipped on any error.

pub mod exact;
pub mod semantic;

pub use exact::{CachedResponse, ExactCache};
pub use semantic::{
    MemoryEntry, MemoryHit, MemoryMetadata, PROVEN_KIND, SemanticCache, SemanticHit,
    SemanticMemory,
};
