//! # House Model
//!
//! Ties a loaded house asset to its interactive controls. [`HouseModel::bind`]
//! runs once after loading:
//!
//! 1. Oversized models are scaled down to a comfortable size.
//! 2. Each configured role is resolved to a node, in configuration order, with
//!    nodes bound by earlier roles withheld from later ones.
//! 3. The floor is restyled, doors and gates get hinge anchors, curtains get
//!    generated panels, and light meshes get switches.
//! 4. Draggable curtain pivots receive pick handles.
//!
//! Anything that fails to bind is recorded as a [`BindingIssue`] and logged;
//! the control for that role is simply reported unavailable.
//!
//! Afterwards the application forwards UI commands ([`HouseModel::toggle`]),
//! pointer input and one [`HouseModel::tick`] per frame, and drains
//! [`ViewerEvent`]s for the control bar.

use std::collections::{BTreeMap, HashSet};

use cgmath::Vector3;

use super::animator::Animator;
use super::controllable::{ControlState, Controllable, Direction, ToggleOutcome};
use super::drag::{DragController, PointerEvent};
use super::lights::LightSwitch;
use super::pivot::{create_hinge_anchor, create_scale_anchor_at, PivotAnchor};
use super::resolver::{names_containing, resolve_excluding, resolve_lights};
use super::roles::Role;
use crate::config::{CurtainFallback, CurtainSpec, DepthPick, ViewerConfig};
use crate::error::{BindingIssue, ToggleRejection};
use crate::gfx::picking::AABB;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::NodeId;
use crate::viewport::Viewport;

/// Notifications for the control bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    ToggleComplete { role: Role, is_open: bool },
    DragUpdate { role: Role, position: Vector3<f32> },
    DragEnd { role: Role, position: Vector3<f32> },
}

/// Node a role was bound to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleBinding {
    pub role: Role,
    pub node: Option<NodeId>,
}

/// What the control bar shows for one role.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlView {
    pub role: Role,
    pub label: String,
    pub icon: String,
    pub available: bool,
    pub is_open: bool,
    pub transitioning: bool,
}

#[derive(Debug, Clone)]
enum Control {
    Animated(Controllable),
    Light(LightSwitch),
}

impl Control {
    fn is_open(&self) -> bool {
        match self {
            Control::Animated(c) => c.is_open(),
            Control::Light(l) => l.is_on(),
        }
    }
}

pub struct HouseModel {
    config: ViewerConfig,
    model_root: NodeId,
    bindings: Vec<RoleBinding>,
    controls: BTreeMap<Role, Control>,
    animator: Animator,
    drag: DragController,
    issues: Vec<BindingIssue>,
    events: Vec<ViewerEvent>,
}

impl HouseModel {
    /// Binds every configured role under `model_root`.
    pub fn bind<V: Viewport + ?Sized>(
        viewport: &mut V,
        model_root: NodeId,
        config: ViewerConfig,
    ) -> Self {
        let mut model = Self {
            config,
            model_root,
            bindings: Vec::new(),
            controls: BTreeMap::new(),
            animator: Animator::new(),
            drag: DragController::new(),
            issues: Vec::new(),
            events: Vec::new(),
        };

        model.fit_model(viewport);
        let claimed = model.resolve_roles(viewport);
        model.style_floor(viewport);
        model.build_hinges(viewport);
        model.build_curtains(viewport);
        model.enable_curtain_drag(viewport);
        model.build_lights(viewport, &claimed);

        log::info!(
            "Bound {} of {} roles, {} controls available",
            model.bindings.iter().filter(|b| b.node.is_some()).count(),
            model.bindings.len(),
            model.controls.len()
        );
        model
    }

    fn fit_model<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        let Some(bounds) = viewport.bounding_box_world(self.model_root) else {
            log::warn!("Model has no geometry");
            return;
        };
        let size = bounds.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim <= self.config.model_max_dimension {
            return;
        }
        let factor = self.config.model_fit_size / max_dim;
        if let Some(transform) = viewport.scene_mut().transform_mut(self.model_root) {
            transform.scale *= factor;
        }
        log::info!("Model is {max_dim:.1} units across, scaled by {factor:.3}");
    }

    fn resolve_roles<V: Viewport + ?Sized>(&mut self, viewport: &V) -> HashSet<NodeId> {
        let mut claimed = HashSet::new();
        let scene = viewport.scene();
        for spec in &self.config.roles {
            let node = resolve_excluding(scene, self.model_root, spec, &claimed);
            match node {
                Some(id) => {
                    claimed.insert(id);
                    log::info!("{} -> '{}'", spec.role, scene.name(id));
                }
                None => {
                    let near = names_containing(scene, self.model_root, spec);
                    log::warn!("No node for {}; similar names: {near:?}", spec.role);
                    self.issues.push(BindingIssue::ResolutionMiss { role: spec.role });
                }
            }
            self.bindings.push(RoleBinding {
                role: spec.role,
                node,
            });
        }
        claimed
    }

    fn style_floor<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        let Some(floor) = self.binding(Role::Floor) else {
            return;
        };
        let material = Material::from_hex("Floor", self.config.floor_color, 0.0, 1.0);
        let scene = viewport.scene_mut();
        let meshes: Vec<NodeId> = scene
            .traverse(floor)
            .filter(|&id| scene.node(id).is_some_and(|n| n.is_mesh()))
            .collect();
        for id in meshes {
            if let Some(node) = scene.node_mut(id) {
                node.material = Some(material.clone());
            }
        }
    }

    fn build_hinges<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        for spec in &self.config.roles {
            let Some(hinge) = spec.hinge else {
                continue;
            };
            let Some(node) = self.binding(spec.role) else {
                continue;
            };
            let Some(created) = create_hinge_anchor(viewport, node, &hinge) else {
                continue;
            };
            if created.degenerate {
                let name = viewport.scene().name(node).to_string();
                log::warn!("'{name}' has no usable bounds, hinging {} at its origin", spec.role);
                self.issues.push(BindingIssue::GeometryDegenerate {
                    role: spec.role,
                    name,
                });
            }
            self.controls.insert(
                spec.role,
                Control::Animated(Controllable::hinge(spec.role, created.pivot, hinge.step)),
            );
        }
    }

    fn build_curtains<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        let model_bounds = viewport.bounding_box_world(self.model_root);
        let model_size = model_bounds
            .map(|b| (b.size().x, b.size().y))
            .unwrap_or((0.0, 0.0));
        let garage_size = self
            .config
            .sizing
            .garage_names
            .iter()
            .find_map(|name| viewport.scene().find_by_name(self.model_root, name))
            .and_then(|garage| viewport.bounding_box_world(garage))
            .map(|b| (b.size().x, b.size().y));
        let (width, height) = self.config.sizing.resolve(model_size, garage_size);
        log::debug!("Curtain panels sized {width:.3} x {height:.3}");

        let curtains = self.config.curtains.clone();
        for spec in &curtains {
            let node = self.binding(spec.role);
            let width = spec.width.unwrap_or(width * spec.width_scale);
            let pivot = match node {
                Some(node) => Some(self.panel_for_node(viewport, spec, node, width, height)),
                None => self.fallback_panel(viewport, spec, model_bounds, width, height),
            };
            match pivot {
                Some(pivot) => {
                    let duration = self.config.panel_duration_ms;
                    self.controls.insert(
                        spec.role,
                        Control::Animated(Controllable::panel(spec.role, pivot, duration)),
                    );
                }
                None => log::warn!("No panel for {}", spec.role),
            }
        }
    }

    fn panel_material(&self) -> Material {
        Material::from_hex("CurtainPanel", self.config.panel_color, 0.0, 0.6)
    }

    fn panel_for_node<V: Viewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        spec: &CurtainSpec,
        node: NodeId,
        width: f32,
        height: f32,
    ) -> PivotAnchor {
        let bounds = viewport
            .bounding_box_world(node)
            .filter(|bounds| !bounds.is_degenerate());
        let top_center = match (spec.placement, bounds) {
            (Some(point), _) => Vector3::from(point),
            (None, Some(bounds)) => bounds.top_center(),
            (None, None) => {
                let name = viewport.scene().name(node).to_string();
                log::warn!("'{name}' has no usable bounds, hanging {} from its origin", spec.role);
                self.issues.push(BindingIssue::GeometryDegenerate {
                    role: spec.role,
                    name,
                });
                viewport.scene().world_position(node)
            }
        };
        create_scale_anchor_at(viewport, top_center, width, height, self.panel_material())
    }

    fn fallback_panel<V: Viewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        spec: &CurtainSpec,
        model_bounds: Option<AABB>,
        width: f32,
        height: f32,
    ) -> Option<PivotAnchor> {
        match spec.fallback {
            CurtainFallback::Edge(pick) => {
                let bounds = model_bounds?;
                let center = bounds.center();
                let z = match pick {
                    DepthPick::Front => bounds.max.z - 0.01,
                    DepthPick::Back => bounds.min.z + 0.01,
                };
                let top_center = Vector3::new(center.x, bounds.max.y - 0.01, z);
                log::info!("Placing {} panel on the model edge", spec.role);
                Some(create_scale_anchor_at(
                    viewport,
                    top_center,
                    width,
                    height,
                    self.panel_material(),
                ))
            }
            CurtainFallback::CloneOf { role, offset } => {
                self.clone_panel(viewport, role, Vector3::from(offset))
            }
            CurtainFallback::None => None,
        }
    }

    /// Copies the panel of `source` under the scene root, shifted by `offset`.
    fn clone_panel<V: Viewport + ?Sized>(
        &self,
        viewport: &mut V,
        source: Role,
        offset: Vector3<f32>,
    ) -> Option<PivotAnchor> {
        let Some(Control::Animated(control)) = self.controls.get(&source) else {
            return None;
        };
        let original = *control.pivot();
        let scene = viewport.scene_mut();
        let root = scene.root();
        let anchor = scene.clone_subtree(original.anchor, root)?;
        let content = scene
            .children(anchor)
            .iter()
            .copied()
            .find(|&c| scene.node(c).is_some_and(|n| n.is_mesh()))?;
        let world = scene.world_position(original.anchor) + offset;
        let local = scene.world_to_parent_local(anchor, world);
        scene.transform_mut(anchor)?.translation = local;
        log::info!("Cloned the {source} panel");
        Some(PivotAnchor {
            anchor,
            content,
            ..original
        })
    }

    fn enable_curtain_drag<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        for spec in &self.config.curtains {
            let Some(policy) = spec.drag else {
                continue;
            };
            let Some(Control::Animated(control)) = self.controls.get(&spec.role) else {
                continue;
            };
            let pivot = *control.pivot();
            self.drag.enable_drag(
                viewport,
                spec.role,
                pivot.anchor,
                policy,
                self.config.handle_radius,
                &[pivot.content],
            );
        }
    }

    fn build_lights<V: Viewport + ?Sized>(&mut self, viewport: &V, claimed: &HashSet<NodeId>) {
        let scene = viewport.scene();
        let found = resolve_lights(scene, self.model_root, &self.config.lights, claimed);
        if found.is_empty() {
            log::warn!("No light meshes found");
        }
        for (slot, node) in found.into_iter().enumerate() {
            let role = Role::Light(slot as u8);
            log::info!("{role} -> '{}'", scene.name(node));
            self.bindings.push(RoleBinding {
                role,
                node: Some(node),
            });
            let switch = LightSwitch::new(scene, role, node, self.config.lights.on_intensity);
            self.controls.insert(role, Control::Light(switch));
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn model_root(&self) -> NodeId {
        self.model_root
    }

    pub fn bindings(&self) -> &[RoleBinding] {
        &self.bindings
    }

    /// Node bound to `role`, if it resolved.
    pub fn binding(&self, role: Role) -> Option<NodeId> {
        self.bindings
            .iter()
            .find(|b| b.role == role)
            .and_then(|b| b.node)
    }

    pub fn issues(&self) -> &[BindingIssue] {
        &self.issues
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn is_available(&self, role: Role) -> bool {
        self.controls.contains_key(&role)
    }

    pub fn is_open(&self, role: Role) -> Option<bool> {
        self.controls.get(&role).map(Control::is_open)
    }

    pub fn state(&self, role: Role) -> Option<ControlState> {
        match self.controls.get(&role)? {
            Control::Animated(c) => Some(c.state()),
            Control::Light(l) if l.is_on() => Some(ControlState::Open),
            Control::Light(_) => Some(ControlState::Closed),
        }
    }

    pub fn pivot(&self, role: Role) -> Option<&PivotAnchor> {
        match self.controls.get(&role)? {
            Control::Animated(c) => Some(c.pivot()),
            Control::Light(_) => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Requests the opposite state for `role`.
    pub fn toggle<V: Viewport + ?Sized>(&mut self, viewport: &mut V, role: Role) -> ToggleOutcome {
        let dragged_anchor = self.drag.session().map(|s| s.anchor);
        let Some(control) = self.controls.get_mut(&role) else {
            log::warn!("{}", BindingIssue::InvalidTransition { role });
            return ToggleOutcome::Unavailable;
        };

        match control {
            Control::Light(light) => {
                let is_open = light.toggle(viewport.scene_mut());
                self.events.push(ViewerEvent::ToggleComplete { role, is_open });
                let direction = if is_open {
                    Direction::Opening
                } else {
                    Direction::Closing
                };
                ToggleOutcome::Started(direction)
            }
            Control::Animated(control) => {
                if dragged_anchor == Some(control.pivot().anchor) {
                    log::debug!("Ignoring toggle of {role} during drag");
                    return ToggleOutcome::Rejected(ToggleRejection::Dragging(role));
                }
                control.toggle(viewport.scene_mut(), &mut self.animator)
            }
        }
    }

    /// Advances animations to `now_ms` and lands finished controls.
    pub fn tick<V: Viewport + ?Sized>(&mut self, viewport: &mut V, now_ms: f64) {
        for done in self.animator.tick(viewport.scene_mut(), now_ms) {
            for control in self.controls.values_mut() {
                let Control::Animated(control) = control else {
                    continue;
                };
                if let Some(is_open) = control.on_tween_completed(&done) {
                    self.events.push(ViewerEvent::ToggleComplete {
                        role: control.role(),
                        is_open,
                    });
                    break;
                }
            }
        }
    }

    /// Returns whether the press started a drag.
    pub fn pointer_down<V: Viewport + ?Sized>(
        &mut self,
        viewport: &V,
        event: PointerEvent,
    ) -> bool {
        self.drag.pointer_down(viewport, &self.animator, event)
    }

    /// Returns whether the move was consumed by a drag.
    pub fn pointer_move<V: Viewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        event: PointerEvent,
    ) -> bool {
        match self.drag.pointer_move(viewport, event) {
            Some((role, position)) => {
                self.events.push(ViewerEvent::DragUpdate { role, position });
                true
            }
            None => false,
        }
    }

    /// Returns whether a drag ended.
    pub fn pointer_up<V: Viewport + ?Sized>(&mut self, viewport: &V, pointer_id: u64) -> bool {
        match self.drag.pointer_up(viewport, pointer_id) {
            Some((role, position)) => {
                self.events.push(ViewerEvent::DragEnd { role, position });
                true
            }
            None => false,
        }
    }

    /// Ends a drag whose release was lost. Returns whether one was running.
    pub fn cancel_drag<V: Viewport + ?Sized>(&mut self, viewport: &V) -> bool {
        match self.drag.cancel(viewport) {
            Some((role, position)) => {
                log::debug!("Drag of {role} cancelled");
                self.events.push(ViewerEvent::DragEnd { role, position });
                true
            }
            None => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    /// One entry per labelled role, in label order.
    pub fn controls(&self) -> Vec<ControlView> {
        self.config
            .labels
            .iter()
            .map(|labels| {
                let control = self.controls.get(&labels.role);
                let is_open = control.is_some_and(Control::is_open);
                let transitioning = matches!(
                    control,
                    Some(Control::Animated(c)) if c.is_transitioning()
                );
                ControlView {
                    role: labels.role,
                    label: labels.label.clone(),
                    icon: labels.icon(is_open).to_string(),
                    available: control.is_some(),
                    is_open,
                    transitioning,
                }
            })
            .collect()
    }
}
