//! Label visibility and truncation
//!
//! Controls which node and edge labels are shown in the relationship network
//! and how long labels are shortened in the swimlane chart.

use crate::config::LabelConfig;

/// Label visibility options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelOptions {
    /// Master toggle for all labels
    pub all_labels: bool,
    /// Show node labels (when all_labels is true)
    pub node_labels: bool,
    /// Show edge labels (when all_labels is true)
    pub edge_labels: bool,
    /// Nodes with at least this degree are labelled without interaction
    pub prominent_degree: usize,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

impl LabelOptions {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            all_labels: true,
            node_labels: true,
            edge_labels: false,
            prominent_degree: config.prominent_degree,
        }
    }

    /// Check if node labels should be displayed
    pub fn show_node_labels(&self) -> bool {
        self.all_labels && self.node_labels
    }

    /// Check if edge labels should be displayed
    pub fn show_edge_labels(&self) -> bool {
        self.all_labels && self.edge_labels
    }

    /// Whether one node's label is drawn
    ///
    /// Hovered and selected nodes are always labelled; otherwise only
    /// prominent nodes are, and only while node labels are enabled.
    pub fn node_label_visible(&self, degree: usize, hovered: bool, selected: bool) -> bool {
        if hovered || selected {
            return true;
        }
        self.show_node_labels() && degree >= self.prominent_degree
    }

    /// Flip one switch and report its new state
    pub fn toggle(&mut self, toggle: LabelToggle) -> bool {
        let switch = match toggle {
            LabelToggle::All => &mut self.all_labels,
            LabelToggle::Nodes => &mut self.node_labels,
            LabelToggle::Edges => &mut self.edge_labels,
        };
        *switch = !*switch;
        *switch
    }
}

/// A label visibility switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelToggle {
    /// Master switch over node and edge labels
    All,
    Nodes,
    Edges,
}

/// Maximum characters of a lane header before truncation
pub const LANE_HEADER_MAX: usize = 24;
/// Maximum characters of an event card title before truncation
pub const CARD_TITLE_MAX: usize = 28;
/// Maximum characters of a document badge before truncation
pub const BADGE_MAX: usize = 14;
/// Document markers on the time axis are clipped to this many characters
pub const MARKER_MAX: usize = 12;

/// Shorten `text` to `keep` characters plus `suffix` when it exceeds `max`
///
/// Counts characters, not bytes, so multi-byte names are never split.
pub fn truncate(text: &str, max: usize, keep: usize, suffix: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

pub fn lane_header(text: &str) -> String {
    truncate(text, LANE_HEADER_MAX, LANE_HEADER_MAX - 2, "...")
}

pub fn card_title(text: &str) -> String {
    truncate(text, CARD_TITLE_MAX, CARD_TITLE_MAX - 2, "...")
}

pub fn badge(text: &str) -> String {
    truncate(text, BADGE_MAX, BADGE_MAX - 2, "..")
}

pub fn marker(text: &str) -> String {
    text.chars().take(MARKER_MAX).collect()
}
