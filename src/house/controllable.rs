//! Open/close state machine over a pivot anchor.

use super::animator::{Animator, TweenCompleted, TweenId};
use super::pivot::PivotAnchor;
use super::roles::Role;
use crate::error::ToggleRejection;
use crate::gfx::scene::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Opening,
    Closing,
}

impl Direction {
    pub fn is_opening(self) -> bool {
        self == Direction::Opening
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Closed,
    Open,
    Transitioning(Direction),
}

/// How a controllable moves between its rest values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Fixed angular step per tick, radians.
    Hinge { step: f32 },
    /// Linear tween over a fixed time.
    Panel { duration_ms: f64 },
}

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started(Direction),
    /// Already moving; the request was ignored.
    InFlight,
    Rejected(ToggleRejection),
    /// The role has no bound control.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct Controllable {
    role: Role,
    pivot: PivotAnchor,
    motion: Motion,
    state: ControlState,
    pending: Option<TweenId>,
}

impl Controllable {
    /// A door or gate, starting closed.
    pub fn hinge(role: Role, pivot: PivotAnchor, step: f32) -> Self {
        Self {
            role,
            pivot,
            motion: Motion::Hinge { step },
            state: ControlState::Closed,
            pending: None,
        }
    }

    /// A curtain panel, starting open (retracted).
    pub fn panel(role: Role, pivot: PivotAnchor, duration_ms: f64) -> Self {
        Self {
            role,
            pivot,
            motion: Motion::Panel { duration_ms },
            state: ControlState::Open,
            pending: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn pivot(&self) -> &PivotAnchor {
        &self.pivot
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ControlState::Open
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, ControlState::Transitioning(_))
    }

    /// Starts moving towards the opposite rest state.
    pub fn toggle(&mut self, scene: &mut SceneGraph, animator: &mut Animator) -> ToggleOutcome {
        let direction = match self.state {
            ControlState::Closed => Direction::Opening,
            ControlState::Open => Direction::Closing,
            ControlState::Transitioning(_) => return ToggleOutcome::InFlight,
        };

        let target = self.pivot.animated_node();
        let property = self.pivot.property;
        let to = self.pivot.value_for(direction.is_opening());

        let started = match self.motion {
            Motion::Hinge { step } => animator.rotate(scene, target, property, to, step),
            Motion::Panel { duration_ms } => {
                let from = scene
                    .transform(target)
                    .map(|t| property.read(t))
                    .unwrap_or_else(|| self.pivot.value_for(!direction.is_opening()));
                animator.tween(scene, target, property, from, to, duration_ms)
            }
        };

        match started {
            Ok(id) => {
                log::debug!("{} {:?}", self.role, direction);
                self.pending = Some(id);
                self.state = ControlState::Transitioning(direction);
                ToggleOutcome::Started(direction)
            }
            Err(e) => {
                log::debug!("Toggle of {} refused: {e}", self.role);
                ToggleOutcome::Rejected(e.into())
            }
        }
    }

    /// Lands in the next rest state if `completed` is this control's tween.
    /// Returns the new open flag when it does.
    pub fn on_tween_completed(&mut self, completed: &TweenCompleted) -> Option<bool> {
        if self.pending != Some(completed.id) {
            return None;
        }
        self.pending = None;
        self.state = match self.state {
            ControlState::Transitioning(Direction::Opening) => ControlState::Open,
            ControlState::Transitioning(Direction::Closing) => ControlState::Closed,
            rest => rest,
        };
        Some(self.is_open())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HingeSpec, DOOR_STEP, GATE_STEP, PANEL_DURATION_MS};
    use crate::error::AnimatorError;
    use crate::house::animator::TweenProperty;
    use crate::gfx::camera::orbit_camera::OrbitCamera;
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::resources::material::Material;
    use crate::gfx::scene::{MeshData, NodeId, Transform};
    use crate::house::pivot::{create_hinge_anchor, create_scale_anchor_at, PANEL_OPEN_SCALE};
    use crate::viewport::SceneViewport;
    use cgmath::Vector3;

    fn viewport() -> SceneViewport {
        let camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        SceneViewport::new(SceneGraph::new(), camera, 100, 100)
    }

    fn add_cube(vp: &mut SceneViewport, name: &str, at: Vector3<f32>) -> NodeId {
        let root = vp.scene.root();
        let node = vp.scene.add_mesh_node(
            root,
            name,
            MeshData::from_geometry(&generate_cube()),
            Material::default(),
        );
        vp.scene.set_transform(node, Transform::from_translation(at));
        node
    }

    fn hinge(vp: &mut SceneViewport, name: &str, spec: HingeSpec) -> Controllable {
        let node = add_cube(vp, name, Vector3::new(1.0, 0.0, 0.0));
        let pivot = create_hinge_anchor(vp, node, &spec).unwrap().pivot;
        Controllable::hinge(Role::MainDoor, pivot, spec.step)
    }

    /// Ticks at 16 ms intervals until `control` reports completion.
    fn run_to_rest(
        vp: &mut SceneViewport,
        animator: &mut Animator,
        control: &mut Controllable,
        clock: &mut f64,
    ) -> bool {
        for _ in 0..10_000 {
            *clock += 16.0;
            for done in animator.tick(&mut vp.scene, *clock) {
                if let Some(open) = control.on_tween_completed(&done) {
                    return open;
                }
            }
        }
        panic!("control never came to rest");
    }

    #[test]
    fn test_hinge_toggle_round_trip_restores_angle() {
        let mut vp = viewport();
        let mut animator = Animator::new();
        let mut clock = 0.0;
        let mut door = hinge(&mut vp, "Puerta", HingeSpec::door());
        let anchor = door.pivot().anchor;
        let original = *vp.scene.transform(anchor).unwrap();

        assert_eq!(
            door.toggle(&mut vp.scene, &mut animator),
            ToggleOutcome::Started(Direction::Opening)
        );
        assert!(run_to_rest(&mut vp, &mut animator, &mut door, &mut clock));
        assert_eq!(door.state(), ControlState::Open);
        assert_eq!(
            vp.scene.transform(anchor).unwrap().rotation.y,
            door.pivot().open_value
        );

        door.toggle(&mut vp.scene, &mut animator);
        assert!(!run_to_rest(&mut vp, &mut animator, &mut door, &mut clock));
        assert_eq!(door.state(), ControlState::Closed);
        assert_eq!(*vp.scene.transform(anchor).unwrap(), original);
    }

    #[test]
    fn test_toggle_while_transitioning_is_ignored() {
        let mut vp = viewport();
        let mut animator = Animator::new();
        let mut gate = hinge(&mut vp, "Porton", HingeSpec::gate(-1.0));

        gate.toggle(&mut vp.scene, &mut animator);
        animator.tick(&mut vp.scene, 16.0);
        let angle = vp.scene.transform(gate.pivot().anchor).unwrap().rotation.x;

        assert_eq!(gate.toggle(&mut vp.scene, &mut animator), ToggleOutcome::InFlight);
        assert_eq!(gate.state(), ControlState::Transitioning(Direction::Opening));
        assert_eq!(
            vp.scene.transform(gate.pivot().anchor).unwrap().rotation.x,
            angle
        );
        assert!((angle + GATE_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_busy_guard_leaves_state_unchanged() {
        let mut vp = viewport();
        let mut animator = Animator::new();
        let mut first = hinge(&mut vp, "PuertaA", HingeSpec::door());
        let mut second = hinge(&mut vp, "PuertaB", HingeSpec::door());
        let before = *vp.scene.transform(second.pivot().anchor).unwrap();

        first.toggle(&mut vp.scene, &mut animator);
        assert_eq!(
            second.toggle(&mut vp.scene, &mut animator),
            ToggleOutcome::Rejected(ToggleRejection::Animator(AnimatorError::Busy))
        );
        assert_eq!(second.state(), ControlState::Closed);

        animator.tick(&mut vp.scene, 16.0);
        assert_eq!(*vp.scene.transform(second.pivot().anchor).unwrap(), before);
        let first_angle = vp.scene.transform(first.pivot().anchor).unwrap().rotation.y;
        assert!((first_angle - DOOR_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_foreign_completion_is_ignored() {
        let mut vp = viewport();
        let mut animator = Animator::new();
        let mut door = hinge(&mut vp, "Puerta", HingeSpec::door());
        let other = add_cube(&mut vp, "Otro", Vector3::new(0.0, 0.0, 0.0));

        door.toggle(&mut vp.scene, &mut animator);
        animator
            .tween(&mut vp.scene, other, TweenProperty::ScaleY, 1.0, 2.0, 0.0)
            .unwrap();
        let done = animator.tick(&mut vp.scene, 16.0);
        assert_eq!(done.len(), 1);
        assert_eq!(door.on_tween_completed(&done[0]), None);
        assert!(door.is_transitioning());
    }

    #[test]
    fn test_panel_pinned_to_top_while_lowering_and_raising() {
        let mut vp = viewport();
        let mut animator = Animator::new();
        let top = Vector3::new(0.0, 1.0, 0.0);
        let pivot = create_scale_anchor_at(&mut vp, top, 0.5, 1.0, Material::default());
        let mut curtain = Controllable::panel(Role::FrontCurtain, pivot, PANEL_DURATION_MS);
        let mut clock = 0.0;
        assert!(curtain.is_open());

        curtain.toggle(&mut vp.scene, &mut animator);
        assert!(!run_to_rest(&mut vp, &mut animator, &mut curtain, &mut clock));
        assert_eq!(vp.scene.transform(pivot.content).unwrap().scale.y, 1.0);

        assert_eq!(
            curtain.toggle(&mut vp.scene, &mut animator),
            ToggleOutcome::Started(Direction::Opening)
        );
        let mut previous = 1.0;
        for step in 1..=3 {
            animator.tick(&mut vp.scene, clock + 80.0 * step as f64);
            let panel = vp.scene.transform(pivot.content).unwrap();
            assert!(panel.scale.y < previous);
            assert!(panel.scale.y > PANEL_OPEN_SCALE);
            assert_eq!(panel.translation.y, -panel.scale.y / 2.0);
            previous = panel.scale.y;
        }

        assert!(curtain.is_transitioning());
        let done = animator.tick(&mut vp.scene, clock + PANEL_DURATION_MS);
        assert_eq!(curtain.on_tween_completed(&done[0]), Some(true));
        let panel = vp.scene.transform(pivot.content).unwrap();
        assert_eq!(panel.scale.y, PANEL_OPEN_SCALE);
        assert_eq!(panel.translation.y, -PANEL_OPEN_SCALE / 2.0);
    }
}
