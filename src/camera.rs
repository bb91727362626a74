//! Perspective camera and the field's model transform.

use glam::{Mat4, Vec2, Vec3};

/// A half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub dir: Vec3,
}

impl Ray {
    /// Point where the ray crosses the plane `z = plane_z`, if it does in front
    pub fn intersect_z_plane(&self, plane_z: f32) -> Option<Vec3> {
        if self.dir.z.abs() <= f32::EPSILON {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.dir.z;
        (t > 0.0).then(|| self.origin + self.dir * t)
    }
}

/// A world-space point projected onto the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Pixel coordinates, origin top-left
    pub x: f32,
    pub y: f32,
    /// Distance along the view axis
    pub depth: f32,
}

/// Fixed perspective camera looking at the origin down -Z.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 50.0),
            fov_y: 75.0,
            aspect: sane_aspect(aspect),
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sane_aspect(aspect);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Pixel coordinate to normalized device coordinates
    pub fn ndc_from_pixel(x: f32, y: f32, viewport: Vec2) -> Option<Vec2> {
        if !(x.is_finite() && y.is_finite()) || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        Some(Vec2::new(x / viewport.x * 2.0 - 1.0, -(y / viewport.y * 2.0 - 1.0)))
    }

    /// World ray from the camera through an NDC point
    pub fn ray(&self, ndc: Vec2) -> Option<Ray> {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let dir = (far - near).normalize_or_zero();
        if dir == Vec3::ZERO || !dir.is_finite() {
            return None;
        }
        Some(Ray {
            origin: self.position,
            dir,
        })
    }

    /// Project a world point onto the viewport. Points behind the camera
    /// yield `None`.
    pub fn project(&self, world: Vec3, view_projection: &Mat4, viewport: Vec2) -> Option<ScreenPoint> {
        let clip = *view_projection * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * viewport.x,
            y: (1.0 - ndc.y) * 0.5 * viewport.y,
            depth: clip.w,
        })
    }

    /// Pixels per world unit at a given depth
    pub fn pixels_per_unit(&self, depth: f32, viewport: Vec2) -> f32 {
        let half_height = depth.max(self.near) * (self.fov_y.to_radians() * 0.5).tan();
        viewport.y / (2.0 * half_height)
    }
}

fn sane_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Rotation and breathing scale applied to the whole field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldTransform {
    /// Euler rotation around X then Y (radians)
    pub rotation: Vec2,
    pub scale: f32,
}

impl Default for FieldTransform {
    fn default() -> Self {
        Self {
            rotation: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl FieldTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_scale(Vec3::splat(self.scale))
    }

    #[cfg(test)]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.matrix().transform_point3(local)
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.matrix().inverse().transform_point3(world)
    }
}
