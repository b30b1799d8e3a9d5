//! Emoji logging conventions and subscriber setup for runner output

use crate::operation::OperationKind;
use mirror_config::LoggingSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Standard emoji set for runner logging
pub struct LogEmoji;

impl LogEmoji {
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";
    pub const SEARCH: &'static str = "🔍";
    pub const CHART: &'static str = "📊";
    pub const EXECUTE: &'static str = "⚡";

    pub const SWAP: &'static str = "🔄";
    pub const MINT: &'static str = "➕";
    pub const BURN: &'static str = "➖";

    /// Tag for an operation's execution line
    pub fn for_kind(kind: &OperationKind) -> &'static str {
        match kind {
            OperationKind::Swap(_) => Self::SWAP,
            OperationKind::AddLiquidity { .. } => Self::MINT,
            OperationKind::RemoveLiquidity { .. } => Self::BURN,
            OperationKind::Approve { .. } => Self::EXECUTE,
        }
    }
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        tracing::warn!("{} {}", $crate::logging::LogEmoji::WARNING, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_search {
    ($($arg:tt)*) => {
        tracing::debug!("{} {}", $crate::logging::LogEmoji::SEARCH, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_metrics {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::CHART, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_execution {
    ($kind:expr, $($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::for_kind($kind), format!($($arg)*))
    };
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level.
///
/// Returns false when a subscriber was already installed.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    }
}
