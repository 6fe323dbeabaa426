//! CLI presentation: text and json formatters.

use crate::daemon::DaemonStatus;
use crate::registry::TrackedEntry;
use crate::tree::builder::MerkleTree;
use serde_json::json;

pub fn format_tree_text(tree: &MerkleTree) -> String {
    format!(
        "root: {}\nleaves: {}\nheight: {}\nsize: {}",
        tree.root_hex(),
        tree.leaf_count(),
        tree.height(),
        tree.tree_size()
    )
}

pub fn format_tree_json(tree: &MerkleTree, tracked: &[TrackedEntry]) -> String {
    let value = json!({
        "root": tree.root_hex(),
        "leaf_count": tree.leaf_count(),
        "height": tree.height(),
        "tree_size": tree.tree_size(),
        "odd_node_policy": tree.odd_node_policy(),
        "tracked": tracked,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

pub fn format_status_text(status: &DaemonStatus) -> String {
    let mut lines = vec![format!("state: {}", status.state.as_str())];
    if let Some(ms) = status.period_ms {
        lines.push(format!("period_ms: {}", ms));
    }
    lines.push(format!("builds: {}", status.builds));
    lines.push(format!("skipped_ticks: {}", status.skipped_ticks));
    lines.push(format!("building: {}", status.building));
    match &status.last_root {
        Some(root) => {
            lines.push(format!("root: {}", root));
            if let (Some(leaves), Some(height)) = (status.last_leaf_count, status.last_height) {
                lines.push(format!("leaves: {}", leaves));
                lines.push(format!("height: {}", height));
            }
        }
        None => lines.push("root: none".to_string()),
    }
    lines.join("\n")
}

pub fn format_tracked_text(tracked: &[TrackedEntry]) -> String {
    if tracked.is_empty() {
        return "nothing tracked".to_string();
    }
    tracked
        .iter()
        .map(|entry| {
            let kind = match (entry.is_directory, entry.recursive) {
                (true, true) => "dir -r",
                (true, false) => "dir",
                (false, _) => "file",
            };
            format!("{} ({})", entry.path.display(), kind)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
