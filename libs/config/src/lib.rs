//! # Mirror Configuration
//!
//! Loads the TOML description of a deployed AMM network and turns it into the
//! validated [`MirrorIdentities`](types::MirrorIdentities) the core runs on.
//!
//! ## Features
//!
//! - **File + environment layering**: TOML file first, `MIRROR_`-prefixed
//!   environment variables on top (`MIRROR_NETWORK__GAS_PRICE=0`)
//! - **Defaults**: retry, fan-out and logging settings fall back to [`defaults`]
//! - **Validation**: every address parsed, pairs and participants unique
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mirror_config::load_config;
//!
//! let config = load_config("config/mirror.toml").unwrap();
//! let identities = config.identities().unwrap();
//! println!("tracking {} pairs", identities.pairs.len());
//! ```

pub mod defaults;
pub mod mirror_config;
pub mod validation;

pub use mirror_config::{
    load_config, ContractsConfig, LoggingSettings, MirrorConfig, MirrorSettings, NetworkConfig,
    PairConfig, ParticipantConfig,
};
pub use validation::ValidationError;
