//! Response cache: composite-keyed lookups with per-class TTLs and a
//! daily expired-row sweep.

pub mod gate;
pub mod key;
pub mod maintenance;

pub use gate::{classify_ttl, CachedAnswer, ResponseCacheGate, TtlClass, TtlSettings};
pub use key::{compute_key, normalize_query, sources_fingerprint, KeyVersions};
pub use maintenance::CacheSweeper;
