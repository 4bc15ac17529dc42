//! Language guard for generated text.
//!
//! Every sentence the engine produces (trace lines, interpretation, summary)
//! passes through here. Causal claims, prescriptive wording and compliance
//! labels are never emitted: an offending sentence is replaced by its
//! neutral fallback and the replacement is logged.

pub mod keywords;
pub mod types;

pub use keywords::{guard_text, scan_language};
pub use types::{GuardOutcome, LanguageViolation, ViolationCategory};
