//! Command implementations.

pub mod import;
pub mod rank;
pub mod recompute;
pub mod score;
pub mod tier;
pub mod watch;

pub use self::import::execute_import;
pub use self::rank::execute_rank;
pub use self::recompute::execute_recompute;
pub use self::score::execute_score;
pub use self::tier::execute_tier;
pub use self::watch::execute_watch;
