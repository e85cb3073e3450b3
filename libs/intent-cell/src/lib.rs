//! Intent classification: small talk, safety triage, fixed-info topics,
//! booking/cancel/reschedule cues, symptom routing, and the two-tier
//! tool-intent router.

pub mod cues;
pub mod keywords;
pub mod lru;
pub mod router;
pub mod safety;
pub mod smalltalk;
pub mod static_info;
pub mod symptoms;

pub use lru::LruCache;
pub use router::ToolIntentRouter;
pub use safety::{SafetyClassifier, SafetyResult};
pub use smalltalk::SmalltalkClassifier;
pub use static_info::{is_fixed_info_query, ClinicInfo, StaticAnswer, StaticAnswerCatalog};
pub use symptoms::{match_symptom_department, match_symptom_guide, SymptomGuideEntry};
