//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override these key by key, so a file that sets only
/// `daemon.default_period_secs` keeps the default log size.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("daemon.default_period_secs", 60)?
        .set_default("daemon.max_log_entries", 1000)?
        .set_default("tree.odd_node_policy", "self_pair")?
        .set_default("tree.empty_tree_policy", "skip")?
        .set_default("tree.follow_symlinks", false)
}
