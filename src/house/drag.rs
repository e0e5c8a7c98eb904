//! # Drag Controller
//!
//! Lets the user reposition certain pivots (the curtain anchors) with the
//! mouse. A drag starts only when Shift is held and the press lands on the
//! pivot's pick handle, a small invisible sphere parented to the anchor.
//!
//! - Primary button moves the anchor on the vertical plane through it
//!   (`z` stays constant).
//! - Secondary button moves it along Z on the horizontal plane through it.
//!
//! The offset between the anchor and the first hit is kept for the whole
//! session, so grabbing the handle off-center never makes the anchor jump.
//! Each role's [`PositionPolicy`] is applied after every move.

use cgmath::Vector3;

use super::animator::Animator;
use super::roles::Role;
use crate::config::PositionPolicy;
use crate::gfx::geometry::generate_sphere;
use crate::gfx::picking::Plane;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::{MeshData, NodeId};
use crate::viewport::{ScreenPoint, Viewport};

pub const HANDLE_NAME: &str = "PivotHandle";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Vertical plane facing the camera, `z` fixed.
    PlanarXY,
    /// Horizontal plane, only `z` changes.
    PlanarZ,
}

impl From<PointerButton> for DragMode {
    fn from(button: PointerButton) -> Self {
        match button {
            PointerButton::Primary => DragMode::PlanarXY,
            PointerButton::Secondary => DragMode::PlanarZ,
        }
    }
}

/// A press, move or release from one pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u64,
    pub screen: ScreenPoint,
    pub button: PointerButton,
    pub shift: bool,
}

#[derive(Debug, Clone)]
struct DragTarget {
    role: Role,
    anchor: NodeId,
    handle: NodeId,
    policy: PositionPolicy,
    /// Nodes whose animation blocks dragging this anchor.
    guarded: Vec<NodeId>,
}

/// State of an active drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub role: Role,
    pub anchor: NodeId,
    pub pointer_id: u64,
    pub mode: DragMode,
    pub offset: Vector3<f32>,
    plane: Plane,
    start: Vector3<f32>,
    policy: PositionPolicy,
}

#[derive(Debug, Default)]
pub struct DragController {
    targets: Vec<DragTarget>,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `anchor` draggable and returns its pick handle.
    ///
    /// `guarded` lists extra nodes (typically the panel under the anchor)
    /// whose running tweens should also block a drag.
    pub fn enable_drag<V: Viewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        role: Role,
        anchor: NodeId,
        policy: PositionPolicy,
        handle_radius: f32,
        guarded: &[NodeId],
    ) -> NodeId {
        let scene = viewport.scene_mut();
        let handle = scene.add_mesh_node(
            anchor,
            HANDLE_NAME,
            MeshData::from_geometry(&generate_sphere(handle_radius, 16, 8)),
            Material::new(HANDLE_NAME, [1.0, 1.0, 1.0, 1.0], 0.0, 1.0),
        );
        if let Some(node) = scene.node_mut(handle) {
            node.visible = false;
        }

        let mut blocked_by = vec![anchor];
        blocked_by.extend_from_slice(guarded);
        self.targets.retain(|t| t.role != role);
        self.targets.push(DragTarget {
            role,
            anchor,
            handle,
            policy,
            guarded: blocked_by,
        });
        log::debug!("Drag enabled for {role} ({policy:?})");
        handle
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn dragging_role(&self) -> Option<Role> {
        self.session.map(|s| s.role)
    }

    pub fn handle_for(&self, role: Role) -> Option<NodeId> {
        self.targets.iter().find(|t| t.role == role).map(|t| t.handle)
    }

    /// Tries to start a session. Returns whether one started.
    pub fn pointer_down<V: Viewport + ?Sized>(
        &mut self,
        viewport: &V,
        animator: &Animator,
        event: PointerEvent,
    ) -> bool {
        if self.session.is_some() || !event.shift {
            return false;
        }

        let picked = self
            .targets
            .iter()
            .filter_map(|t| {
                let hit = viewport.raycast_against(t.handle, event.screen).into_iter().next()?;
                Some((t, hit.distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(t, _)| t);
        let Some(target) = picked else {
            return false;
        };

        if target.guarded.iter().any(|&n| animator.is_animating(n)) {
            log::debug!("Not dragging {} while it animates", target.role);
            return false;
        }

        let mode = DragMode::from(event.button);
        let start = viewport.scene().world_position(target.anchor);
        let normal = match mode {
            DragMode::PlanarXY => Vector3::unit_z(),
            DragMode::PlanarZ => Vector3::unit_y(),
        };
        let plane = Plane::through_point(normal, start);
        let Some(hit) = viewport.screen_to_world_on_plane(event.screen, &plane) else {
            return false;
        };

        log::debug!("Dragging {} ({mode:?})", target.role);
        self.session = Some(DragSession {
            role: target.role,
            anchor: target.anchor,
            pointer_id: event.pointer_id,
            mode,
            offset: start - hit,
            plane,
            start,
            policy: target.policy,
        });
        true
    }

    /// Moves the dragged anchor. Returns its new world position.
    pub fn pointer_move<V: Viewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        event: PointerEvent,
    ) -> Option<(Role, Vector3<f32>)> {
        let session = self.session.filter(|s| s.pointer_id == event.pointer_id)?;
        let hit = viewport.screen_to_world_on_plane(event.screen, &session.plane)?;

        let mut world = hit + session.offset;
        if session.mode == DragMode::PlanarZ {
            world.x = session.start.x;
            world.y = session.start.y;
        }

        let scene = viewport.scene_mut();
        let local = session.policy.apply(scene.world_to_parent_local(session.anchor, world));
        let transform = scene.transform_mut(session.anchor)?;
        transform.translation = local;
        Some((session.role, scene.world_position(session.anchor)))
    }

    /// Ends the session for `pointer_id`. Returns the final world position.
    pub fn pointer_up<V: Viewport + ?Sized>(
        &mut self,
        viewport: &V,
        pointer_id: u64,
    ) -> Option<(Role, Vector3<f32>)> {
        let session = self.session.filter(|s| s.pointer_id == pointer_id)?;
        self.session = None;
        Some((session.role, viewport.scene().world_position(session.anchor)))
    }

    /// Ends the session whatever pointer owns it, for when the release will
    /// never arrive (focus lost, pointer captured elsewhere). The anchor stays
    /// where the last move put it.
    pub fn cancel<V: Viewport + ?Sized>(
        &mut self,
        viewport: &V,
    ) -> Option<(Role, Vector3<f32>)> {
        let session = self.session.take()?;
        Some((session.role, viewport.scene().world_position(session.anchor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::orbit_camera::OrbitCamera;
    use crate::gfx::scene::{SceneGraph, Transform};
    use crate::house::animator::TweenProperty;
    use crate::config::Axis;
    use crate::viewport::SceneViewport;

    const CENTER: ScreenPoint = (100.0, 100.0);

    fn setup(
        pitch: f32,
        policy: PositionPolicy,
    ) -> (SceneViewport, DragController, NodeId, NodeId) {
        let camera = OrbitCamera::new(5.0, pitch, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        let mut vp = SceneViewport::new(SceneGraph::new(), camera, 200, 200);
        let root = vp.scene.root();
        let anchor = vp.create_anchor_node(root, "CurtainPivot");
        let panel = vp.scene.add_node(anchor, "CurtainPanel");
        let mut drag = DragController::new();
        drag.enable_drag(&mut vp, Role::FrontCurtain, anchor, policy, 0.05, &[panel]);
        (vp, drag, anchor, panel)
    }

    fn press(screen: ScreenPoint, button: PointerButton, shift: bool) -> PointerEvent {
        PointerEvent {
            pointer_id: 1,
            screen,
            button,
            shift,
        }
    }

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3 && (a.z - b.z).abs() < 1e-3
    }

    #[test]
    fn test_handle_is_invisible_child_of_anchor() {
        let (vp, drag, anchor, _) = setup(0.0, PositionPolicy::Free);
        let handle = drag.handle_for(Role::FrontCurtain).unwrap();
        assert_eq!(vp.scene.parent(handle), Some(anchor));
        assert_eq!(vp.scene.name(handle), HANDLE_NAME);
        assert!(!vp.scene.is_visible_in_tree(handle));
    }

    #[test]
    fn test_requires_shift_and_handle_hit() {
        let (vp, mut drag, _, _) = setup(0.0, PositionPolicy::Free);
        let animator = Animator::new();
        assert!(!drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, false)));
        let miss = press((10.0, 10.0), PointerButton::Primary, true);
        assert!(!drag.pointer_down(&vp, &animator, miss));
        assert!(drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true)));
        assert_eq!(drag.dragging_role(), Some(Role::FrontCurtain));
    }

    #[test]
    fn test_off_center_grab_does_not_jump() {
        let (mut vp, mut drag, anchor, _) = setup(0.0, PositionPolicy::Free);
        let animator = Animator::new();
        let grab = (101.0, 100.0);
        assert!(drag.pointer_down(&vp, &animator, press(grab, PointerButton::Primary, true)));

        let (_, position) = drag
            .pointer_move(&mut vp, press(grab, PointerButton::Primary, true))
            .unwrap();
        assert!(close(position, Vector3::new(0.0, 0.0, 0.0)));

        let plane = Plane::through_point(Vector3::unit_z(), Vector3::new(0.0, 0.0, 0.0));
        let from = vp.screen_to_world_on_plane(grab, &plane).unwrap();
        let to = vp.screen_to_world_on_plane((150.0, 80.0), &plane).unwrap();
        let (role, position) = drag
            .pointer_move(&mut vp, press((150.0, 80.0), PointerButton::Primary, true))
            .unwrap();
        assert_eq!(role, Role::FrontCurtain);
        assert!(close(position, to - from));
        assert!(position.z.abs() < 1e-5);
        assert!(close(vp.scene.world_position(anchor), to - from));

        let (_, end) = drag.pointer_up(&vp, 1).unwrap();
        assert!(close(end, to - from));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_secondary_button_moves_along_z_only() {
        let (mut vp, mut drag, anchor, _) = setup(0.6, PositionPolicy::Free);
        let animator = Animator::new();
        assert!(drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Secondary, true)));
        assert_eq!(drag.session().unwrap().mode, DragMode::PlanarZ);

        let (_, position) = drag
            .pointer_move(&mut vp, press((130.0, 140.0), PointerButton::Secondary, true))
            .unwrap();
        assert_eq!(position.x, 0.0);
        assert_eq!(position.y, 0.0);
        assert!(position.z > 0.0);
        assert_eq!(vp.scene.world_position(anchor), position);
    }

    #[test]
    fn test_policies_applied_after_move() {
        let locked = [0.25, 0.5, -0.75];
        let (mut vp, mut drag, anchor, _) = setup(0.0, PositionPolicy::LockedTo(locked));
        let animator = Animator::new();
        drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true));
        drag.pointer_move(&mut vp, press((160.0, 60.0), PointerButton::Primary, true));
        assert_eq!(vp.scene.world_position(anchor), Vector3::from(locked));

        let policy = PositionPolicy::LockedAxis { axis: Axis::Y, value: 0.0 };
        let (mut vp, mut drag, anchor, _) = setup(0.0, policy);
        drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true));
        drag.pointer_move(&mut vp, press((160.0, 60.0), PointerButton::Primary, true));
        let position = vp.scene.world_position(anchor);
        assert_eq!(position.y, 0.0);
        assert!(position.x > 0.0);
    }

    #[test]
    fn test_rejected_while_panel_animates() {
        let (mut vp, mut drag, _, panel) = setup(0.0, PositionPolicy::Free);
        let mut animator = Animator::new();
        animator
            .tween(&mut vp.scene, panel, TweenProperty::PanelHeight, 0.001, 1.0, 350.0)
            .unwrap();
        assert!(!drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true)));

        animator.tick(&mut vp.scene, 400.0);
        assert!(drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true)));
    }

    #[test]
    fn test_other_pointer_is_ignored() {
        let (mut vp, mut drag, anchor, _) = setup(0.0, PositionPolicy::Free);
        let animator = Animator::new();
        drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true));

        let mut stray = press((160.0, 100.0), PointerButton::Primary, true);
        stray.pointer_id = 2;
        assert!(drag.pointer_move(&mut vp, stray).is_none());
        assert!(drag.pointer_up(&vp, 2).is_none());
        assert_eq!(*vp.scene.transform(anchor).unwrap(), Transform::identity());
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_cancel_ends_session_for_any_pointer() {
        let (mut vp, mut drag, anchor, _) = setup(0.0, PositionPolicy::Free);
        let animator = Animator::new();
        assert!(drag.cancel(&vp).is_none());

        drag.pointer_down(&vp, &animator, press(CENTER, PointerButton::Primary, true));
        drag.pointer_move(&mut vp, press((140.0, 90.0), PointerButton::Primary, true));
        let moved = vp.scene.world_position(anchor);

        let (role, position) = drag.cancel(&vp).unwrap();
        assert_eq!(role, Role::FrontCurtain);
        assert!(close(position, moved));
        assert!(!drag.is_dragging());

        let late = press((180.0, 90.0), PointerButton::Primary, true);
        assert!(drag.pointer_move(&mut vp, late).is_none());
        assert!(drag.pointer_up(&vp, 1).is_none());
        assert!(close(vp.scene.world_position(anchor), moved));
    }
}
