//! # Viewer Configuration
//!
//! Everything that ties the viewer to a particular house asset lives here as
//! data: which names identify each role, how each hinge swings, where the
//! curtain panels go and how big they are, which pivots may be dragged, and
//! the labels shown on the control bar.
//!
//! [`ViewerConfig::default`] is calibrated for the bundled house model. Any
//! subset of fields can be overridden from a JSON file:
//!
//! ```json
//! {
//!   "panel_duration_ms": 500.0,
//!   "lights": { "keywords": ["lamp"], "max_count": 2, "on_intensity": 3.0 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;
use crate::house::Role;

/// Rotation per tick for doors, in radians.
pub const DOOR_STEP: f32 = 0.05;
/// Rotation per tick for garage gates, in radians.
pub const GATE_STEP: f32 = 0.02;
/// Duration of a curtain panel raise/lower.
pub const PANEL_DURATION_MS: f64 = 350.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Which end of the depth axis a [`NameMatcher::DepthExtreme`] picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthPick {
    /// Smallest world Z
    Front,
    /// Largest world Z
    Back,
}

/// One strategy for finding a role's node by name. A role tries its matchers
/// in order and the first one that finds a node wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NameMatcher {
    /// Exact, case-sensitive names tried in order.
    Exact(Vec<String>),
    /// First node whose lowercased name contains any lowercased keyword.
    Substring(Vec<String>),
    /// Accent- and case-insensitive equality, prefix or substring.
    Normalized(Vec<String>),
    /// Among meshes whose name contains a keyword, the one nearest the front or back.
    DepthExtreme { keywords: Vec<String>, pick: DepthPick },
}

/// Where a hinge anchor is placed relative to the node it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotPlacement {
    /// Top-center of the node's world bounding box.
    TopCenter,
    /// The node's own world origin.
    Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HingeSpec {
    pub axis: Axis,
    /// +1.0 or -1.0: which way the open position lies from closed.
    pub direction: f32,
    pub placement: PivotPlacement,
    /// Radians advanced per frame tick.
    pub step: f32,
}

impl HingeSpec {
    pub fn door() -> Self {
        Self {
            axis: Axis::Y,
            direction: 1.0,
            placement: PivotPlacement::Origin,
            step: DOOR_STEP,
        }
    }

    pub fn gate(direction: f32) -> Self {
        Self {
            axis: Axis::X,
            direction,
            placement: PivotPlacement::TopCenter,
            step: GATE_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: Role,
    pub matchers: Vec<NameMatcher>,
    /// Node to search under first, falling back to the whole model.
    #[serde(default)]
    pub scope: Option<String>,
    /// Bind the first mesh inside the matched subtree instead of the match itself.
    #[serde(default)]
    pub prefer_mesh: bool,
    #[serde(default)]
    pub hinge: Option<HingeSpec>,
}

impl RoleSpec {
    pub fn new(role: Role, matchers: Vec<NameMatcher>) -> Self {
        Self {
            role,
            matchers,
            scope: None,
            prefer_mesh: false,
            hinge: None,
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    pub fn with_prefer_mesh(mut self) -> Self {
        self.prefer_mesh = true;
        self
    }

    pub fn with_hinge(mut self, hinge: HingeSpec) -> Self {
        self.hinge = Some(hinge);
        self
    }

    /// Every keyword or name this spec matches on, for miss diagnostics.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().flat_map(|m| match m {
            NameMatcher::Exact(v) | NameMatcher::Substring(v) | NameMatcher::Normalized(v) => {
                v.iter().map(String::as_str)
            }
            NameMatcher::DepthExtreme { keywords, .. } => keywords.iter().map(String::as_str),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    pub keywords: Vec<String>,
    pub max_count: usize,
    pub on_intensity: f32,
}

impl Default for LightSpec {
    fn default() -> Self {
        Self {
            keywords: strings(&[
                "luz", "light", "lampara", "lámpara", "farol", "poste", "lamp", "foco",
            ]),
            max_count: 4,
            on_intensity: 5.0,
        }
    }
}

/// What a curtain dimension is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeSource {
    /// The garage door's bounding box, falling back to the model when absent.
    Garage,
    /// The whole model's bounding box.
    Model,
    /// The configured value as-is.
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurtainSizing {
    pub width_source: SizeSource,
    pub width_scale: f32,
    pub width_value: f32,
    pub height_source: SizeSource,
    pub height_scale: f32,
    pub height_value: f32,
    pub min_width: f32,
    pub min_height: f32,
    /// Exact names of the node used as the garage reference.
    pub garage_names: Vec<String>,
}

impl Default for CurtainSizing {
    fn default() -> Self {
        Self {
            width_source: SizeSource::Garage,
            width_scale: 0.11,
            width_value: 1.2,
            height_source: SizeSource::Garage,
            height_scale: 0.45,
            height_value: 1.0,
            min_width: 0.05,
            min_height: 0.05,
            garage_names: strings(&["PuertaGaraje", "garage"]),
        }
    }
}

impl CurtainSizing {
    /// Panel `(width, height)` from the model size and, when found, the garage size.
    ///
    /// Both inputs are `(width, height)` pairs in world units.
    pub fn resolve(&self, model: (f32, f32), garage: Option<(f32, f32)>) -> (f32, f32) {
        let reference = garage.unwrap_or(model);
        let width = match self.width_source {
            SizeSource::Garage => reference.0 * self.width_scale,
            SizeSource::Model => model.0 * self.width_scale,
            SizeSource::Absolute => self.width_value,
        };
        let height = match self.height_source {
            SizeSource::Garage => reference.1 * self.height_scale,
            SizeSource::Model => model.1 * self.height_scale,
            SizeSource::Absolute => self.height_value,
        };
        (width.max(self.min_width), height.max(self.min_height))
    }
}

/// Constraint applied to a dragged pivot after every move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PositionPolicy {
    Free,
    /// Always snapped back to this position.
    LockedTo([f32; 3]),
    /// One axis pinned to a fixed value.
    LockedAxis { axis: Axis, value: f32 },
}

impl PositionPolicy {
    pub fn apply(&self, position: cgmath::Vector3<f32>) -> cgmath::Vector3<f32> {
        match *self {
            PositionPolicy::Free => position,
            PositionPolicy::LockedTo(v) => v.into(),
            PositionPolicy::LockedAxis { axis, value } => {
                let mut p = position;
                match axis {
                    Axis::X => p.x = value,
                    Axis::Y => p.y = value,
                    Axis::Z => p.z = value,
                }
                p
            }
        }
    }
}

/// Where a curtain panel goes when its own node was not found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CurtainFallback {
    /// Just inside the model's top edge on the front (max Z) or back (min Z) side.
    Edge(DepthPick),
    /// A copy of another curtain's panel, shifted by `offset`.
    CloneOf { role: Role, offset: [f32; 3] },
    /// No panel without a matching node.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurtainSpec {
    pub role: Role,
    /// Multiplier on the sized panel width.
    pub width_scale: f32,
    /// Fixed panel width, overriding sizing.
    #[serde(default)]
    pub width: Option<f32>,
    /// Fixed world position for the panel's top-center.
    #[serde(default)]
    pub placement: Option<[f32; 3]>,
    pub fallback: CurtainFallback,
    /// `Some` makes the panel pivot draggable under that policy.
    #[serde(default)]
    pub drag: Option<PositionPolicy>,
}

/// Control bar text for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLabels {
    pub role: Role,
    pub label: String,
    pub icon_open: String,
    pub icon_closed: String,
}

impl ControlLabels {
    pub fn new(role: Role, label: &str, icon_open: &str, icon_closed: &str) -> Self {
        Self {
            role,
            label: label.to_string(),
            icon_open: icon_open.to_string(),
            icon_closed: icon_closed.to_string(),
        }
    }

    pub fn icon(&self, is_open: bool) -> &str {
        if is_open {
            &self.icon_open
        } else {
            &self.icon_closed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Roles in resolution order. A node bound by an earlier role is not
    /// offered to later ones.
    pub roles: Vec<RoleSpec>,
    pub lights: LightSpec,
    pub curtains: Vec<CurtainSpec>,
    pub sizing: CurtainSizing,
    pub panel_duration_ms: f64,
    /// Panel color as `0xRRGGBB`.
    pub panel_color: u32,
    pub floor_color: u32,
    pub handle_radius: f32,
    /// Models larger than this are scaled down to `model_fit_size`.
    pub model_max_dimension: f32,
    pub model_fit_size: f32,
    pub labels: Vec<ControlLabels>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        use NameMatcher::*;

        let roles = vec![
            RoleSpec::new(Role::Floor, vec![Exact(strings(&["Cube.002"]))]),
            RoleSpec::new(Role::InteriorDoor(0), vec![Exact(strings(&["puerta_cuarto"]))])
                .with_scope("Collection 1")
                .with_hinge(HingeSpec::door()),
            RoleSpec::new(
                Role::InteriorDoor(1),
                vec![
                    Exact(strings(&["puerta_baño"])),
                    Normalized(strings(&["puerta_bano"])),
                ],
            )
            .with_scope("Collection 1")
            .with_hinge(HingeSpec::door()),
            RoleSpec::new(
                Role::FrontCurtain,
                vec![
                    Exact(strings(&["CortinaDelantera", "Cilindro.004"])),
                    DepthExtreme {
                        keywords: strings(&["cilindro", "cylinder"]),
                        pick: DepthPick::Front,
                    },
                ],
            )
            .with_prefer_mesh(),
            RoleSpec::new(
                Role::RearCurtain,
                vec![
                    Exact(strings(&["CortinaTrasera", "Cilindro.015"])),
                    DepthExtreme {
                        keywords: strings(&["cilindro", "cylinder"]),
                        pick: DepthPick::Back,
                    },
                ],
            )
            .with_prefer_mesh(),
            RoleSpec::new(
                Role::ExtraCurtain,
                vec![Normalized(strings(&[
                    "CortinaExtra",
                    "CortinaTercera",
                    "Cortina3",
                    "Cortina Central",
                    "Cortina Media",
                    "cortina extra",
                    "cortina tercera",
                    "cortina 3",
                    "central",
                    "media",
                ]))],
            )
            .with_prefer_mesh(),
            RoleSpec::new(
                Role::FrontGate,
                vec![
                    Exact(strings(&["PortonDelantero", "PuertaGaraje"])),
                    Substring(strings(&[
                        "porton delantero",
                        "portón delantero",
                        "porton_delantero",
                        "puerta delantera",
                        "front gate",
                        "front garage door",
                        "delantero",
                    ])),
                    Normalized(strings(&["porton delantero", "front gate"])),
                ],
            )
            .with_hinge(HingeSpec::gate(-1.0)),
            RoleSpec::new(
                Role::RearGate,
                vec![
                    Exact(strings(&["PortonTrasero"])),
                    Substring(strings(&[
                        "porton trasero",
                        "portón trasero",
                        "porton_trasero",
                        "puerta trasera",
                        "back gate",
                        "rear gate",
                        "trasero",
                    ])),
                    Normalized(strings(&["porton trasero", "rear gate"])),
                ],
            )
            .with_hinge(HingeSpec::gate(1.0)),
            RoleSpec::new(
                Role::MainDoor,
                vec![
                    Exact(strings(&["PuertaPrincipal", "Puerta_Principal"])),
                    Substring(strings(&[
                        "puerta principal",
                        "puerta_principal",
                        "puerta",
                        "door",
                        "main door",
                        "front door",
                    ])),
                ],
            )
            .with_hinge(HingeSpec::door()),
        ];

        let curtains = vec![
            CurtainSpec {
                role: Role::FrontCurtain,
                width_scale: 1.0,
                width: None,
                placement: Some([-0.715, 0.585, 1.049]),
                fallback: CurtainFallback::Edge(DepthPick::Front),
                drag: Some(PositionPolicy::Free),
            },
            CurtainSpec {
                role: Role::RearCurtain,
                width_scale: 1.0,
                width: None,
                placement: Some([-0.710, 0.585, 0.098]),
                fallback: CurtainFallback::Edge(DepthPick::Back),
                drag: Some(PositionPolicy::LockedTo([-0.710, 0.585, 0.098])),
            },
            CurtainSpec {
                role: Role::ExtraCurtain,
                width_scale: 1.0,
                width: Some(0.569),
                placement: Some([-0.188, 0.660, 0.107]),
                fallback: CurtainFallback::CloneOf {
                    role: Role::FrontCurtain,
                    offset: [0.0, 0.0, 0.002],
                },
                drag: Some(PositionPolicy::Free),
            },
        ];

        let mut labels = vec![
            ControlLabels::new(Role::FrontGate, "Front gate", "garage-open", "garage-closed"),
            ControlLabels::new(Role::RearGate, "Rear gate", "garage-open", "garage-closed"),
            ControlLabels::new(Role::MainDoor, "Main door", "door-open", "door-closed"),
            ControlLabels::new(Role::InteriorDoor(0), "Bedroom door", "door-open", "door-closed"),
            ControlLabels::new(Role::InteriorDoor(1), "Bathroom door", "door-open", "door-closed"),
            ControlLabels::new(Role::FrontCurtain, "Front curtain", "curtains", "curtains-closed"),
            ControlLabels::new(Role::RearCurtain, "Rear curtain", "curtains", "curtains-closed"),
            ControlLabels::new(Role::ExtraCurtain, "Extra curtain", "curtains", "curtains-closed"),
        ];
        let lights = LightSpec::default();
        labels.extend((0..lights.max_count as u8).map(|slot| {
            let title = format!("Light {}", slot + 1);
            ControlLabels::new(Role::Light(slot), &title, "light-on", "light-off")
        }));

        Self {
            roles,
            lights,
            curtains,
            sizing: CurtainSizing::default(),
            panel_duration_ms: PANEL_DURATION_MS,
            panel_color: 0xff0000,
            floor_color: 0x00ff00,
            handle_radius: 0.05,
            model_max_dimension: 10.0,
            model_fit_size: 5.0,
            labels,
        }
    }
}

impl ViewerConfig {
    /// Loads a JSON overlay; fields missing from the file keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ViewerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ViewerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ViewerError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn role_spec(&self, role: Role) -> Option<&RoleSpec> {
        self.roles.iter().find(|spec| spec.role == role)
    }

    pub fn curtain_spec(&self, role: Role) -> Option<&CurtainSpec> {
        self.curtains.iter().find(|spec| spec.role == role)
    }

    pub fn labels_for(&self, role: Role) -> Option<&ControlLabels> {
        self.labels.iter().find(|l| l.role == role)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_default_sizing_uses_garage() {
        let sizing = CurtainSizing::default();
        let (w, h) = sizing.resolve((10.0, 4.0), Some((2.0, 2.0)));
        assert!((w - 0.22).abs() < 1e-6);
        assert!((h - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_sizing_falls_back_to_model_without_garage() {
        let sizing = CurtainSizing::default();
        let (w, h) = sizing.resolve((10.0, 4.0), None);
        assert!((w - 1.1).abs() < 1e-6);
        assert!((h - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_sizing_modes_and_minimums() {
        let sizing = CurtainSizing {
            width_source: SizeSource::Absolute,
            height_source: SizeSource::Model,
            height_scale: 0.001,
            ..CurtainSizing::default()
        };
        let (w, h) = sizing.resolve((10.0, 4.0), Some((2.0, 2.0)));
        assert_eq!(w, 1.2);
        assert_eq!(h, 0.05);
    }

    #[test]
    fn test_position_policies() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(PositionPolicy::Free.apply(p), p);
        assert_eq!(
            PositionPolicy::LockedTo([-0.71, 0.585, 0.098]).apply(p),
            Vector3::new(-0.71, 0.585, 0.098)
        );
        assert_eq!(
            PositionPolicy::LockedAxis { axis: Axis::Z, value: 0.5 }.apply(p),
            Vector3::new(1.0, 2.0, 0.5)
        );
    }

    #[test]
    fn test_json_overlay_keeps_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{ "panel_duration_ms": 500.0,
                 "lights": { "keywords": ["lamp"], "max_count": 2, "on_intensity": 3.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.panel_duration_ms, 500.0);
        assert_eq!(config.lights.max_count, 2);
        assert_eq!(config.roles, ViewerConfig::default().roles);
    }

    #[test]
    fn test_json_role_override() {
        let config = ViewerConfig::from_json_str(
            r#"{ "roles": [ { "role": "FrontGate", "matchers": [ { "Exact": ["Garage"] } ],
                 "hinge": { "axis": "X", "direction": -1.0,
                            "placement": "TopCenter", "step": 0.02 } } ] }"#,
        )
        .unwrap();
        assert_eq!(config.roles.len(), 1);
        let spec = config.role_spec(Role::FrontGate).unwrap();
        assert_eq!(spec.matchers, vec![NameMatcher::Exact(vec!["Garage".to_string()])]);
        assert_eq!(spec.hinge, Some(HingeSpec::gate(-1.0)));
        assert!(!spec.prefer_mesh);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        assert!(matches!(
            ViewerConfig::from_json_str("{ roles: nope }"),
            Err(ViewerError::Config(_))
        ));
    }

    #[test]
    fn test_default_labels_cover_controls() {
        let config = ViewerConfig::default();
        for spec in &config.roles {
            if spec.hinge.is_some() {
                assert!(config.labels_for(spec.role).is_some(), "{:?}", spec.role);
            }
        }
        for curtain in &config.curtains {
            assert!(config.labels_for(curtain.role).is_some());
        }
        assert_eq!(config.labels_for(Role::FrontGate).unwrap().icon(true), "garage-open");
    }
}
