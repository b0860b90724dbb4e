//! Shop-editable domain data
//!
//! Whether the honorific/nickname table should be data or code is settled
//! here in favor of data: a YAML file overlays built-in defaults, the same
//! load-from-file-with-serde-defaults pattern the teacher uses for its
//! `vocabulary.rs`/`competitors.rs` domain configs, just scoped to retail
//! instead of gold-loan sales.

mod shop;

pub use shop::{GstDefault, NicknameTable, ShopDomainConfig, ShopDomainConfigError};
