//! # Picking
//!
//! Ray casting from the cursor into the scene. Used to grab pivot handles and
//! to project pointer motion onto drag planes.
//!
//! ## How it works
//!
//! 1. **Cursor to Ray**: unproject the cursor through the camera into a world ray
//! 2. **Ray vs Bounds**: test the ray against world-space AABBs of meshes
//! 3. **Ray vs Plane**: intersect the ray with an arbitrary plane for dragging
//!
//! ## Usage
//!
//! ```no_run
//! use casaview::gfx::picking::{screen_to_ray, Plane};
//! use casaview::gfx::camera::orbit_camera::OrbitCamera;
//! use cgmath::Vector3;
//!
//! let camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
//! let ray = screen_to_ray((400.0, 300.0), (800.0, 600.0), &camera);
//! let floor = Plane::new(Vector3::unit_y(), 0.0);
//! let hit = ray.intersect_plane(&floor);
//! ```

use cgmath::{ElementWise, EuclideanSpace, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::camera::orbit_camera::{OrbitCamera, OPENGL_TO_WGPU_MATRIX};

/// Diagonal below which a box is treated as a single point.
pub const DEGENERATE_EXTENT: f32 = 1e-5;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// Point where the ray meets `plane`, or `None` when the ray is parallel
    /// to the plane or the plane lies behind the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vector3<f32>> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (plane.distance - plane.normal.dot(self.origin)) / denom;
        (t >= 0.0).then(|| self.point_at(t))
    }
}

/// Plane of points `p` with `normal · p == distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vector3<f32>, distance: f32) -> Self {
        Self {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Plane with the given normal passing through `point`.
    pub fn through_point(normal: Vector3<f32>, point: Vector3<f32>) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vector3<f32>,
    /// Maximum corner of the bounding box
    pub max: Vector3<f32>,
}

impl AABB {
    /// Create a new AABB
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create AABB from a set of vertices
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        let Some(first) = vertices.first() else {
            return Self::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0));
        };

        let mut min = Vector3::from(*first);
        let mut max = min;
        for vertex in vertices.iter().skip(1) {
            let v = Vector3::from(*vertex);
            min = Vector3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z));
            max = Vector3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z));
        }

        Self::new(min, max)
    }

    pub fn union(&self, other: &AABB) -> Self {
        Self::new(
            Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// True when the box has collapsed to a point. Flat boxes still count.
    pub fn is_degenerate(&self) -> bool {
        self.size().magnitude() < DEGENERATE_EXTENT
    }

    /// Center of the top face (highest Y).
    pub fn top_center(&self) -> Vector3<f32> {
        let c = self.center();
        Vector3::new(c.x, self.max.y, c.z)
    }

    /// Test ray-AABB intersection
    /// Returns the distance to intersection point, or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners: Vec<[f32; 3]> = (0..8)
            .map(|i| {
                let corner = Vector4::new(
                    if i & 1 == 0 { self.min.x } else { self.max.x },
                    if i & 2 == 0 { self.min.y } else { self.max.y },
                    if i & 4 == 0 { self.min.z } else { self.max.z },
                    1.0,
                );
                let p = matrix * corner;
                [p.x / p.w, p.y / p.w, p.z / p.w]
            })
            .collect();

        Self::from_vertices(&corners)
    }
}

/// Something a ray hit, ordered nearest first by callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit<T> {
    pub target: T,
    /// Distance from the ray origin to the intersection point
    pub distance: f32,
    /// World space intersection point
    pub point: Vector3<f32>,
}

/// Convert screen coordinates to a world-space ray
///
/// # Arguments
/// * `screen_pos` - Cursor position in physical pixels, origin top-left
/// * `screen_size` - Surface size in physical pixels
/// * `camera` - Camera the frame is rendered with
pub fn screen_to_ray(screen_pos: (f32, f32), screen_size: (f32, f32), camera: &OrbitCamera) -> Ray {
    let (mouse_x, mouse_y) = screen_pos;
    let (screen_width, screen_height) = (screen_size.0.max(1.0), screen_size.1.max(1.0));

    let ndc_x = (2.0 * mouse_x) / screen_width - 1.0;
    let ndc_y = 1.0 - (2.0 * mouse_y) / screen_height;

    let eye = cgmath::Point3::from_vec(camera.eye);
    let target = cgmath::Point3::from_vec(camera.target);
    let view = Matrix4::look_at_rh(eye, target, camera.up);
    let proj = OPENGL_TO_WGPU_MATRIX
        * cgmath::perspective(camera.fovy, camera.aspect, camera.znear, camera.zfar);
    let inv_view_proj = (proj * view).invert().unwrap_or_else(Matrix4::identity);

    // wgpu clip space depth runs from 0 (near) to 1 (far).
    let unproject = |depth: f32| {
        let p = inv_view_proj * Vector4::new(ndc_x, ndc_y, depth, 1.0);
        Vector3::new(p.x / p.w, p.y / p.w, p.z / p.w)
    };
    let near = unproject(0.0);
    let far = unproject(1.0);

    Ray::new(near, far - near)
}
