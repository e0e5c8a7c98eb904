//! # Pivot Anchors
//!
//! Most objects in an exported house model rotate about their centroid, which
//! is wrong for doors and gates. A pivot anchor is an empty node placed where
//! the hinge should be; the object is moved under it without changing where it
//! appears, and animations then rotate or scale the anchor instead.
//!
//! Curtains are simulated with a generated panel hanging from a scale anchor.

use std::f32::consts::FRAC_PI_2;

use cgmath::Vector3;

use super::animator::TweenProperty;
use crate::config::{Axis, HingeSpec, PivotPlacement};
use crate::gfx::geometry::generate_box;
use crate::gfx::resources::material::Material;
use crate::gfx::scene::{MeshData, NodeId, Transform};
use crate::viewport::Viewport;

/// Panel vertical scale when fully retracted.
pub const PANEL_OPEN_SCALE: f32 = 0.001;
/// Smallest panel width and drop.
pub const PANEL_MIN_SIZE: f32 = 0.05;
/// Smallest panel depth scale.
pub const PANEL_MIN_DEPTH: f32 = 0.02;
/// Depth of the panel geometry before scaling.
const PANEL_THICKNESS: f32 = 0.05;

/// Synthetic transform node plus the content it moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotAnchor {
    pub anchor: NodeId,
    /// Re-parented original node, or the generated panel.
    pub content: NodeId,
    pub property: TweenProperty,
    pub closed_value: f32,
    pub open_value: f32,
}

impl PivotAnchor {
    /// Node whose transform the animation writes.
    pub fn animated_node(&self) -> NodeId {
        match self.property {
            TweenProperty::PanelHeight | TweenProperty::ScaleY => self.content,
            TweenProperty::RotationX | TweenProperty::RotationY => self.anchor,
        }
    }

    pub fn value_for(&self, open: bool) -> f32 {
        if open {
            self.open_value
        } else {
            self.closed_value
        }
    }
}

/// Outcome of [`create_hinge_anchor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HingeAnchor {
    pub pivot: PivotAnchor,
    /// The node had no measurable geometry and its origin was used instead.
    pub degenerate: bool,
}

fn rotation_property(axis: Axis) -> TweenProperty {
    match axis {
        Axis::X => TweenProperty::RotationX,
        // No role swings about Z; treat it like a door.
        Axis::Y | Axis::Z => TweenProperty::RotationY,
    }
}

/// Wraps `node` in a hinge anchor placed per `hinge.placement`.
///
/// The anchor is created under the node's current parent, so the node keeps
/// its place in the hierarchy one level down. Returns `None` for the scene
/// root, which has no parent to hang an anchor from.
pub fn create_hinge_anchor<V: Viewport + ?Sized>(
    viewport: &mut V,
    node: NodeId,
    hinge: &HingeSpec,
) -> Option<HingeAnchor> {
    let parent = viewport.scene().parent(node)?;

    let bounds = viewport
        .bounding_box_world(node)
        .filter(|bounds| !bounds.is_degenerate());
    let degenerate = bounds.is_none();
    let world_point = match (hinge.placement, bounds) {
        (PivotPlacement::TopCenter, Some(bounds)) => bounds.top_center(),
        _ => viewport.scene().world_position(node),
    };

    let name = format!("{}Pivot", viewport.scene().name(node));
    let anchor = viewport.create_anchor_node(parent, &name);
    let scene = viewport.scene_mut();
    let local_point = scene.world_to_parent_local(anchor, world_point);
    scene.set_transform(anchor, Transform::from_translation(local_point));

    if let Err(e) = scene.attach(node, anchor) {
        log::warn!("Could not move '{}' under its pivot: {e}", scene.name(node));
        return None;
    }

    let property = rotation_property(hinge.axis);
    let closed_value = scene
        .transform(anchor)
        .map(|t| property.read(t))
        .unwrap_or(0.0);
    let open_value = closed_value + hinge.direction.signum() * FRAC_PI_2;

    Some(HingeAnchor {
        pivot: PivotAnchor {
            anchor,
            content: node,
            property,
            closed_value,
            open_value,
        },
        degenerate,
    })
}

/// Creates a panel hanging from `world_top_center`, starting retracted.
///
/// # Arguments
/// * `world_top_center` - World position of the panel's top edge midpoint
/// * `width` - Panel width, at least [`PANEL_MIN_SIZE`]
/// * `max_height` - Fully lowered drop, at least [`PANEL_MIN_SIZE`]
/// * `material` - Panel surface
pub fn create_scale_anchor_at<V: Viewport + ?Sized>(
    viewport: &mut V,
    world_top_center: Vector3<f32>,
    width: f32,
    max_height: f32,
    material: Material,
) -> PivotAnchor {
    let root = viewport.scene().root();
    let anchor = viewport.create_anchor_node(root, "CurtainPivot");
    let scene = viewport.scene_mut();
    let local_point = scene.world_to_parent_local(anchor, world_top_center);
    scene.set_transform(anchor, Transform::from_translation(local_point));

    let panel = scene.add_mesh_node(
        anchor,
        "CurtainPanel",
        MeshData::from_geometry(&generate_box(1.0, 1.0, PANEL_THICKNESS)),
        material,
    );
    let mut transform = Transform::identity().with_scale(Vector3::new(
        width.max(PANEL_MIN_SIZE),
        1.0,
        (width * 0.05).max(PANEL_MIN_DEPTH),
    ));
    TweenProperty::PanelHeight.write(&mut transform, PANEL_OPEN_SCALE);
    scene.set_transform(panel, transform);

    PivotAnchor {
        anchor,
        content: panel,
        property: TweenProperty::PanelHeight,
        closed_value: max_height.max(PANEL_MIN_SIZE),
        open_value: PANEL_OPEN_SCALE,
    }
}
