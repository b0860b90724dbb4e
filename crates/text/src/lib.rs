//! Script and name-matching utilities for the voice shop agent.
//!
//! - **Transliteration**: Devanagari ASR fallback output to Roman script.
//! - **Fuzzy matching**: score similarity between Indian names across
//!   honorifics, nicknames, and phonetic spelling variants.

pub mod fuzzy;
pub mod transliterate;

pub use fuzzy::{FuzzyMatcher, MatchType, NameMatch};
pub use transliterate::transliterate;
