//! Layout configuration
//!
//! Every tunable of the force layout, viewport, swimlane and selection views
//! lives here. All structs default to the values the views ship with, and
//! deserialize with `#[serde(default)]` so a config file only needs the keys
//! it overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// Configuration for the force simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Link rest length before node radii are added
    pub link_distance: f64,
    /// Link spring strength (scaled by endpoint degree)
    pub link_strength: f64,
    /// Base repulsion magnitude for every node
    pub charge_base: f64,
    /// Extra repulsion per incident edge
    pub charge_per_degree: f64,
    /// Minimum distance used by the repulsion term
    pub charge_distance_min: f64,
    /// Pull toward the viewport center
    pub center_strength: f64,
    /// Extra separation between two colliding circles
    pub collision_margin: f64,
    /// Fraction of an overlap resolved per step
    pub collision_strength: f64,
    /// Velocity decay (friction)
    pub velocity_decay: f64,
    /// Starting alpha (simulation temperature)
    pub alpha: f64,
    /// Minimum alpha before stopping
    pub alpha_min: f64,
    /// Alpha decay rate
    pub alpha_decay: f64,
    /// Alpha target while a node is being dragged
    pub drag_alpha_target: f64,
    /// Hard cap on steps per run
    pub max_iterations: usize,
    /// Initial placement seed; `None` draws fresh entropy per run
    pub seed: Option<u64>,
    /// Spread of the random initial placement per sqrt(node count)
    pub initial_spread: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 50.0,
            link_strength: 1.0,
            charge_base: 80.0,
            charge_per_degree: 10.0,
            charge_distance_min: 1.0,
            center_strength: 0.05,
            collision_margin: 12.0,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha: 1.0,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
            drag_alpha_target: 0.3,
            max_iterations: 600,
            seed: None,
            initial_spread: 10.0,
        }
    }
}

/// How node degree maps to a visual radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    pub min_radius: f64,
    pub scale_factor: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            min_radius: 5.0,
            scale_factor: 5.0,
        }
    }
}

impl RadiusConfig {
    /// `max(min_radius, sqrt(max(degree, 1)) * scale_factor)`
    pub fn radius_for(&self, degree: usize) -> f64 {
        let degree = degree.max(1) as f64;
        (degree.sqrt() * self.scale_factor).max(self.min_radius)
    }
}

/// Viewport size, fitting and zoom bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    /// Padding kept free on every side when fitting
    pub fit_padding: f64,
    /// Fitting never zooms in past this scale
    pub fit_max_zoom: f64,
    /// Whether node circles (not just centers) must fit
    pub fit_include_radius: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Per-frame interpolation factor for animated fits
    pub animation_lerp: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
            fit_padding: 40.0,
            fit_max_zoom: 1.2,
            fit_include_radius: true,
            min_zoom: 0.15,
            max_zoom: 5.0,
            animation_lerp: 0.12,
        }
    }
}

/// Which end of an association edge is the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationDirection {
    /// Source is the entity, target is the event
    EntityToEvent,
    /// Source is the event, target is the entity
    EventToEntity,
}

/// Pixel geometry of the swimlane chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimlaneGeometry {
    pub lane_height: f64,
    pub lane_gap: f64,
    pub card_width: f64,
    pub card_gap: f64,
    /// Vertical inset of a card inside its lane
    pub card_inset: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub min_width: f64,
    pub min_height: f64,
    /// Document markers closer than this to the previous one are skipped
    pub marker_spacing: f64,
}

impl Default for SwimlaneGeometry {
    fn default() -> Self {
        Self {
            lane_height: 80.0,
            lane_gap: 4.0,
            card_width: 160.0,
            card_gap: 12.0,
            card_inset: 8.0,
            margin_top: 40.0,
            margin_right: 40.0,
            margin_bottom: 40.0,
            margin_left: 200.0,
            min_width: 1100.0,
            min_height: 600.0,
            marker_spacing: 100.0,
        }
    }
}

/// Swimlane correlation and geometry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimlaneConfig {
    /// Edge category -> direction of the association
    pub associations: BTreeMap<String, AssociationDirection>,
    /// Label of the synthetic lane used when no event has an entity
    pub fallback_lane_label: String,
    pub geometry: SwimlaneGeometry,
}

impl Default for SwimlaneConfig {
    fn default() -> Self {
        let associations = [
            ("involved_in", AssociationDirection::EntityToEvent),
            ("related_to", AssociationDirection::EntityToEvent),
            ("involves", AssociationDirection::EventToEntity),
            ("has_participant", AssociationDirection::EventToEntity),
        ]
        .into_iter()
        .map(|(category, direction)| (category.to_string(), direction))
        .collect();

        Self {
            associations,
            fallback_lane_label: "All Events".to_string(),
            geometry: SwimlaneGeometry::default(),
        }
    }
}

impl SwimlaneConfig {
    /// Direction for an edge category, if it is an association category
    ///
    /// Categories compare trimmed and ignoring case, like edge categories.
    pub fn direction_for(&self, category: &str) -> Option<AssociationDirection> {
        self.associations
            .get(&category.trim().to_lowercase())
            .copied()
    }

    /// Rewrite table keys to the lowercased form edge categories use
    pub fn normalize_associations(&mut self) {
        self.associations = std::mem::take(&mut self.associations)
            .into_iter()
            .map(|(category, direction)| (category.trim().to_lowercase(), direction))
            .collect();
    }
}

/// Selection highlighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Opacity of nodes that are not the selected one
    pub dimmed_opacity: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            dimmed_opacity: 0.35,
        }
    }
}

/// Label prominence settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Nodes with at least this many edges always show a label
    pub prominent_degree: usize,
    /// Pointer distance (pixels) within which an edge counts as hovered
    pub edge_hover_threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            prominent_degree: 3,
            edge_hover_threshold: 6.0,
        }
    }
}

/// Complete layout configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub simulation: SimulationConfig,
    pub radius: RadiusConfig,
    pub viewport: ViewportConfig,
    pub swimlane: SwimlaneConfig,
    pub selection: SelectionConfig,
    pub labels: LabelConfig,
}

impl LayoutConfig {
    /// Load configuration from a YAML or JSON file
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let is_yaml = match ext.as_str() {
            "yaml" | "yml" => true,
            "json" => false,
            _ => return Err(LayoutError::UnsupportedFormat(path.display().to_string())),
        };

        let content = fs::read_to_string(path)?;
        let mut config: LayoutConfig = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.swimlane.normalize_associations();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engines cannot work with
    pub fn validate(&self) -> LayoutResult<()> {
        let sim = &self.simulation;
        if !(sim.alpha_min > 0.0 && sim.alpha_min < sim.alpha) {
            return Err(LayoutError::InvalidConfig(format!(
                "alpha_min ({}) must be positive and below alpha ({})",
                sim.alpha_min, sim.alpha
            )));
        }
        if !(sim.alpha_decay > 0.0 && sim.alpha_decay < 1.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "alpha_decay ({}) must be in (0, 1)",
                sim.alpha_decay
            )));
        }
        if !(0.0..=1.0).contains(&sim.velocity_decay) {
            return Err(LayoutError::InvalidConfig(format!(
                "velocity_decay ({}) must be in [0, 1]",
                sim.velocity_decay
            )));
        }

        let vp = &self.viewport;
        for (name, value) in [
            ("viewport.width", vp.width),
            ("viewport.height", vp.height),
            ("viewport.fit_max_zoom", vp.fit_max_zoom),
            ("viewport.min_zoom", vp.min_zoom),
            ("viewport.max_zoom", vp.max_zoom),
            ("radius.min_radius", self.radius.min_radius),
            ("radius.scale_factor", self.radius.scale_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if vp.min_zoom > vp.max_zoom {
            return Err(LayoutError::InvalidConfig(format!(
                "viewport.min_zoom ({}) exceeds viewport.max_zoom ({})",
                vp.min_zoom, vp.max_zoom
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn radius_grows_with_degree() {
        let radius = RadiusConfig::default();
        assert_eq!(radius.radius_for(0), 5.0);
        assert_eq!(radius.radius_for(1), 5.0);
        assert!(radius.radius_for(2) > radius.radius_for(1));
        assert_eq!(radius.radius_for(4), 10.0);
    }

    #[test]
    fn default_associations_cover_both_directions() {
        let swimlane = SwimlaneConfig::default();
        assert_eq!(
            swimlane.direction_for("involved_in"),
            Some(AssociationDirection::EntityToEvent)
        );
        assert_eq!(
            swimlane.direction_for("involves"),
            Some(AssociationDirection::EventToEntity)
        );
        assert_eq!(swimlane.direction_for("same_as"), None);
    }

    #[test]
    fn default_config_validates() {
        LayoutConfig::default().validate().unwrap();
    }

    #[test]
    fn loads_partial_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "simulation:\n  seed: 7\n  max_iterations: 50\nswimlane:\n  associations:\n    mentions: event_to_entity\n"
        )
        .unwrap();

        let config = LayoutConfig::from_path(file.path()).unwrap();
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.max_iterations, 50);
        assert_eq!(config.simulation.link_distance, 50.0);
        assert_eq!(
            config.swimlane.direction_for("mentions"),
            Some(AssociationDirection::EventToEntity)
        );
        // A provided table replaces the defaults entirely
        assert_eq!(config.swimlane.direction_for("involves"), None);
    }

    #[test]
    fn association_keys_ignore_case() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "swimlane:\n  associations:\n    Involved_In: entity_to_event\n    ' HAS_PARTICIPANT ': event_to_entity\n"
        )
        .unwrap();

        let config = LayoutConfig::from_path(file.path()).unwrap();
        let keys: Vec<&str> = config.swimlane.associations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["has_participant", "involved_in"]);
        assert_eq!(
            config.swimlane.direction_for("involved_in"),
            Some(AssociationDirection::EntityToEvent)
        );
        assert_eq!(
            config.swimlane.direction_for("Has_Participant"),
            Some(AssociationDirection::EventToEntity)
        );
    }

    #[test]
    fn loads_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"viewport": {{"width": 1200, "height": 800}}}}"#).unwrap();

        let config = LayoutConfig::from_path(file.path()).unwrap();
        assert_eq!(config.viewport.width, 1200.0);
        assert_eq!(config.viewport.fit_padding, 40.0);
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let err = LayoutConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_inverted_zoom_bounds() {
        let mut config = LayoutConfig::default();
        config.viewport.min_zoom = 6.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LayoutError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_alpha_min_above_alpha() {
        let mut config = LayoutConfig::default();
        config.simulation.alpha_min = 2.0;
        assert!(config.validate().is_err());
    }
}
