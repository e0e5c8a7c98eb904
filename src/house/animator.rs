//! # Animator
//!
//! Frame-driven tweens over single node properties. There are two families:
//!
//! - **Duration tweens** interpolate linearly from `from` to `to` over a fixed
//!   time and snap to exactly `to` on the tick where time runs out. Several can
//!   run at once; starting one on a `(node, property)` pair that is already
//!   animating replaces the old one, which then never completes.
//! - **Fixed-velocity tweens** advance a fixed step per tick from their start
//!   value and snap to the target on tick `ceil(|to - from| / step)`, the tick
//!   where the next step would overshoot. Only one may be in
//!   flight at a time; further requests are refused with
//!   [`AnimatorError::Busy`] until it lands.
//!
//! Completion is reported as [`TweenCompleted`] values returned from
//! [`Animator::tick`], in the same tick as the final snap.
//!
//! ## Usage
//!
//! ```no_run
//! use casaview::house::animator::{Animator, TweenProperty};
//! # let mut scene = casaview::gfx::scene::SceneGraph::new();
//! # let door = scene.add_node(scene.root(), "door");
//! let mut animator = Animator::new();
//! animator.rotate(&mut scene, door, TweenProperty::RotationY, 1.57, 0.05).unwrap();
//! for frame in 0.. {
//!     let done = animator.tick(&mut scene, frame as f64 * 16.0);
//!     if !done.is_empty() {
//!         break;
//!     }
//! }
//! ```

use crate::error::AnimatorError;
use crate::gfx::scene::{NodeId, SceneGraph, Transform};

/// A single animatable scalar on a node's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenProperty {
    RotationX,
    RotationY,
    ScaleY,
    /// Vertical scale with the node kept hanging from its top edge:
    /// writing `s` sets `scale.y = s` and `translation.y = -s / 2`.
    PanelHeight,
}

impl TweenProperty {
    pub fn read(self, transform: &Transform) -> f32 {
        match self {
            TweenProperty::RotationX => transform.rotation.x,
            TweenProperty::RotationY => transform.rotation.y,
            TweenProperty::ScaleY | TweenProperty::PanelHeight => transform.scale.y,
        }
    }

    pub fn write(self, transform: &mut Transform, value: f32) {
        match self {
            TweenProperty::RotationX => transform.rotation.x = value,
            TweenProperty::RotationY => transform.rotation.y = value,
            TweenProperty::ScaleY => transform.scale.y = value,
            TweenProperty::PanelHeight => {
                transform.scale.y = value;
                transform.translation.y = -value / 2.0;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

/// Reported once when a tween reaches its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenCompleted {
    pub id: TweenId,
    pub target: NodeId,
    pub property: TweenProperty,
    pub value: f32,
}

#[derive(Debug, Clone)]
struct DurationTween {
    id: TweenId,
    target: NodeId,
    property: TweenProperty,
    from: f32,
    to: f32,
    start_ms: f64,
    duration_ms: f64,
}

impl DurationTween {
    fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
struct FixedVelocityTween {
    id: TweenId,
    target: NodeId,
    property: TweenProperty,
    from: f32,
    to: f32,
    step: f32,
    /// Ticks taken so far.
    taken: u32,
    /// `ceil(|to - from| / step)`; the tween lands on this tick.
    total: u32,
}

/// -1, 0 or 1. Unlike `f32::signum`, zero maps to zero.
fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Tween scheduler driven by [`Animator::tick`].
#[derive(Debug, Default)]
pub struct Animator {
    next_id: u64,
    now_ms: f64,
    fixed: Option<FixedVelocityTween>,
    timed: Vec<DurationTween>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the fixed-velocity slot is occupied.
    pub fn is_busy(&self) -> bool {
        self.fixed.is_some()
    }

    /// Whether any tween currently writes to `target`.
    pub fn is_animating(&self, target: NodeId) -> bool {
        self.fixed.as_ref().is_some_and(|t| t.target == target)
            || self.timed.iter().any(|t| t.target == target)
    }

    fn allocate_id(&mut self) -> TweenId {
        self.next_id += 1;
        TweenId(self.next_id)
    }

    /// Starts a linear tween from `from` to `to` lasting `duration_ms`.
    ///
    /// `from` is written immediately. A tween already running on the same
    /// node and property is dropped without completing.
    pub fn tween(
        &mut self,
        scene: &mut SceneGraph,
        target: NodeId,
        property: TweenProperty,
        from: f32,
        to: f32,
        duration_ms: f64,
    ) -> Result<TweenId, AnimatorError> {
        let transform = scene
            .transform_mut(target)
            .ok_or(AnimatorError::MissingNode(target))?;
        property.write(transform, from);

        let before = self.timed.len();
        self.timed
            .retain(|t| !(t.target == target && t.property == property));
        if self.timed.len() != before {
            log::debug!("Restarting {:?} tween on {:?}", property, target);
        }

        let id = self.allocate_id();
        self.timed.push(DurationTween {
            id,
            target,
            property,
            from,
            to,
            start_ms: self.now_ms,
            duration_ms,
        });
        Ok(id)
    }

    /// Starts a fixed-velocity tween towards `to`, moving `step` per tick.
    ///
    /// Nothing moves until the next [`tick`](Self::tick).
    pub fn rotate(
        &mut self,
        scene: &mut SceneGraph,
        target: NodeId,
        property: TweenProperty,
        to: f32,
        step: f32,
    ) -> Result<TweenId, AnimatorError> {
        if self.fixed.is_some() {
            return Err(AnimatorError::Busy);
        }
        if !scene.contains(target) {
            return Err(AnimatorError::MissingNode(target));
        }

        let from = scene
            .transform(target)
            .map(|t| property.read(t))
            .ok_or(AnimatorError::MissingNode(target))?;
        let step = step.abs().max(f32::EPSILON);
        let id = self.allocate_id();
        self.fixed = Some(FixedVelocityTween {
            id,
            target,
            property,
            from,
            to,
            step,
            taken: 0,
            total: ((to - from).abs() / step).ceil() as u32,
        });
        Ok(id)
    }

    /// Advances every tween to `now_ms` and returns the ones that finished.
    pub fn tick(&mut self, scene: &mut SceneGraph, now_ms: f64) -> Vec<TweenCompleted> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut completed = Vec::new();

        if let Some(mut tween) = self.fixed.take() {
            match step_fixed(scene, &mut tween) {
                Some(true) => completed.push(TweenCompleted {
                    id: tween.id,
                    target: tween.target,
                    property: tween.property,
                    value: tween.to,
                }),
                Some(false) => self.fixed = Some(tween),
                None => log::warn!("Dropping rotation on missing node {:?}", tween.target),
            }
        }

        let now = self.now_ms;
        self.timed.retain(|tween| {
            let Some(transform) = scene.transform_mut(tween.target) else {
                log::warn!("Dropping tween on missing node {:?}", tween.target);
                return false;
            };
            let p = tween.progress(now);
            if p >= 1.0 {
                tween.property.write(transform, tween.to);
                completed.push(TweenCompleted {
                    id: tween.id,
                    target: tween.target,
                    property: tween.property,
                    value: tween.to,
                });
                false
            } else {
                let value = tween.from + (tween.to - tween.from) * p as f32;
                tween.property.write(transform, value);
                true
            }
        });

        completed
    }
}

/// One step of a fixed-velocity tween. `Some(true)` once it has landed,
/// `None` if its node is gone.
///
/// Positions are computed from the start value rather than accumulated, so
/// the tween lands on exactly its `total`-th tick.
fn step_fixed(scene: &mut SceneGraph, tween: &mut FixedVelocityTween) -> Option<bool> {
    let transform = scene.transform_mut(tween.target)?;
    tween.taken += 1;
    let direction = f32::from(sign(tween.to - tween.from));
    let next = tween.from + tween.taken as f32 * tween.step * direction;

    if tween.taken >= tween.total {
        tween.property.write(transform, tween.to);
        return Some(true);
    }
    // Rounding must not carry an intermediate step past the target.
    let next = if sign(tween.to - next) == sign(tween.to - tween.from) {
        next
    } else {
        tween.to
    };
    tween.property.write(transform, next);
    Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn scene_with(name: &str) -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let node = scene.add_node(scene.root(), name);
        (scene, node)
    }

    fn value(scene: &SceneGraph, node: NodeId, property: TweenProperty) -> f32 {
        property.read(scene.transform(node).unwrap())
    }

    #[test]
    fn test_duration_tween_snaps_at_end_and_completes_once() {
        let (mut scene, node) = scene_with("panel");
        let mut animator = Animator::new();
        animator.tick(&mut scene, 1000.0);
        animator
            .tween(&mut scene, node, TweenProperty::ScaleY, 0.3, 1.7, 350.0)
            .unwrap();

        assert!(animator.tick(&mut scene, 1175.0).is_empty());
        assert!((value(&scene, node, TweenProperty::ScaleY) - 1.0).abs() < 1e-5);

        let done = animator.tick(&mut scene, 1350.0);
        assert_eq!(done.len(), 1);
        assert_eq!(value(&scene, node, TweenProperty::ScaleY), 1.7);

        assert!(animator.tick(&mut scene, 1400.0).is_empty());
        assert!(!animator.is_animating(node));
    }

    #[test]
    fn test_duration_tween_interpolates_linearly() {
        let (mut scene, node) = scene_with("panel");
        let mut animator = Animator::new();
        animator
            .tween(&mut scene, node, TweenProperty::ScaleY, 0.0, 2.0, 100.0)
            .unwrap();
        assert_eq!(value(&scene, node, TweenProperty::ScaleY), 0.0);

        for (t, expected) in [(25.0, 0.5), (50.0, 1.0), (75.0, 1.5)] {
            animator.tick(&mut scene, t);
            assert!((value(&scene, node, TweenProperty::ScaleY) - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_panel_height_pins_top_edge() {
        let (mut scene, node) = scene_with("panel");
        let mut animator = Animator::new();
        animator
            .tween(&mut scene, node, TweenProperty::PanelHeight, 1.0, 0.001, 300.0)
            .unwrap();

        for t in [50.0, 150.0, 250.0, 300.0] {
            animator.tick(&mut scene, t);
            let transform = scene.transform(node).unwrap();
            assert_eq!(transform.translation.y, -transform.scale.y / 2.0);
        }
        assert_eq!(value(&scene, node, TweenProperty::PanelHeight), 0.001);
    }

    #[test]
    fn test_restarting_duration_tween_drops_previous() {
        let (mut scene, node) = scene_with("panel");
        let mut animator = Animator::new();
        let first = animator
            .tween(&mut scene, node, TweenProperty::ScaleY, 0.0, 1.0, 100.0)
            .unwrap();
        animator.tick(&mut scene, 50.0);
        let second = animator
            .tween(&mut scene, node, TweenProperty::ScaleY, 0.5, 0.0, 100.0)
            .unwrap();

        let done = animator.tick(&mut scene, 150.0);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, second);
        assert_ne!(done[0].id, first);
        assert_eq!(value(&scene, node, TweenProperty::ScaleY), 0.0);
    }

    #[test]
    fn test_zero_duration_completes_next_tick() {
        let (mut scene, node) = scene_with("panel");
        let mut animator = Animator::new();
        animator
            .tween(&mut scene, node, TweenProperty::ScaleY, 1.0, 0.25, 0.0)
            .unwrap();
        let done = animator.tick(&mut scene, 0.0);
        assert_eq!(done.len(), 1);
        assert_eq!(value(&scene, node, TweenProperty::ScaleY), 0.25);
    }

    #[test]
    fn test_fixed_velocity_tick_count() {
        let cases = [
            (0.0f32, 1.0f32, 0.25f32),
            (0.0, 1.0, 0.3),
            (0.0, FRAC_PI_2, 0.05),
            (0.0, -FRAC_PI_2, 0.02),
            (1.0, -0.5, 0.02),
        ];
        for (from, to, step) in cases {
            let (mut scene, node) = scene_with("door");
            TweenProperty::RotationY.write(scene.transform_mut(node).unwrap(), from);
            let mut animator = Animator::new();
            animator
                .rotate(&mut scene, node, TweenProperty::RotationY, to, step)
                .unwrap();

            let expected = ((to - from).abs() / step).ceil() as usize;
            let mut ticks = 0;
            loop {
                ticks += 1;
                let done = animator.tick(&mut scene, ticks as f64 * 16.0);
                if !done.is_empty() {
                    break;
                }
                assert!(ticks < 10_000);
            }
            assert_eq!(ticks, expected, "{from}->{to} by {step}");
            assert_eq!(value(&scene, node, TweenProperty::RotationY), to);
            assert!(!animator.is_busy());
        }
    }

    #[test]
    fn test_fixed_velocity_exact_multiple() {
        let (mut scene, node) = scene_with("door");
        let mut animator = Animator::new();
        animator
            .rotate(&mut scene, node, TweenProperty::RotationX, 1.0, 0.25)
            .unwrap();
        for tick in 1..=3 {
            assert!(animator.tick(&mut scene, tick as f64).is_empty());
        }
        assert_eq!(animator.tick(&mut scene, 4.0).len(), 1);
        assert_eq!(value(&scene, node, TweenProperty::RotationX), 1.0);
    }

    #[test]
    fn test_fixed_velocity_zero_distance_completes() {
        let (mut scene, node) = scene_with("door");
        let mut animator = Animator::new();
        animator
            .rotate(&mut scene, node, TweenProperty::RotationY, 0.0, 0.05)
            .unwrap();
        assert_eq!(animator.tick(&mut scene, 16.0).len(), 1);
        assert!(!animator.is_busy());
    }

    #[test]
    fn test_busy_guard_rejects_second_rotation() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a");
        let b = scene.add_node(scene.root(), "b");
        let mut animator = Animator::new();

        animator
            .rotate(&mut scene, a, TweenProperty::RotationY, 1.0, 0.1)
            .unwrap();
        assert_eq!(
            animator.rotate(&mut scene, b, TweenProperty::RotationY, 1.0, 0.1),
            Err(AnimatorError::Busy)
        );
        for tick in 0..20 {
            animator.tick(&mut scene, tick as f64);
        }
        assert_eq!(value(&scene, b, TweenProperty::RotationY), 0.0);
        assert_eq!(value(&scene, a, TweenProperty::RotationY), 1.0);
    }

    #[test]
    fn test_duration_tweens_ignore_busy_guard() {
        let mut scene = SceneGraph::new();
        let door = scene.add_node(scene.root(), "door");
        let panel = scene.add_node(scene.root(), "panel");
        let mut animator = Animator::new();

        animator
            .rotate(&mut scene, door, TweenProperty::RotationY, 1.0, 0.1)
            .unwrap();
        assert!(animator
            .tween(&mut scene, panel, TweenProperty::ScaleY, 1.0, 0.0, 10.0)
            .is_ok());
        assert!(animator.is_animating(door));
        assert!(animator.is_animating(panel));
    }

    #[test]
    fn test_missing_node_rejected() {
        let (mut scene, _) = scene_with("x");
        let mut other = SceneGraph::new();
        let ghost = other.add_node(other.root(), "a");
        let ghost = other.add_node(ghost, "b");
        let mut animator = Animator::new();
        assert_eq!(
            animator.rotate(&mut scene, ghost, TweenProperty::RotationY, 1.0, 0.1),
            Err(AnimatorError::MissingNode(ghost))
        );
    }
}
