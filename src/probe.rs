use crate::camera::{Camera, FieldTransform};
use glam::{Vec2, Vec3};

/// Ray distances closer than this count as a tie
const TIE_EPSILON: f32 = 1e-3;

/// Maps a pointer coordinate to the particle under it
pub trait Probe {
    fn probe(&self, x: f32, y: f32) -> Option<usize>;
}

/// Ray-casting probe over the current frame's particle positions.
///
/// Selects the particle with the smallest perpendicular distance to the pick
/// ray, within `threshold` world units. Ties go to the particle nearer the
/// camera.
pub struct PointerProbe<'a> {
    pub camera: &'a Camera,
    pub transform: &'a FieldTransform,
    pub positions: &'a [Vec3],
    pub viewport: Vec2,
    pub threshold: f32,
}

impl Probe for PointerProbe<'_> {
    fn probe(&self, x: f32, y: f32) -> Option<usize> {
        let ndc = Camera::ndc_from_pixel(x, y, self.viewport)?;
        let ray = self.camera.ray(ndc)?;
        let model = self.transform.matrix();

        let mut best: Option<(usize, f32, f32)> = None;
        for (i, local) in self.positions.iter().enumerate() {
            let to_point = model.transform_point3(*local) - ray.origin;
            let along = to_point.dot(ray.dir);
            if along <= 0.0 {
                continue;
            }
            let off_ray = (to_point - ray.dir * along).length();
            if off_ray > self.threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_off, best_along)) => {
                    off_ray < best_off - TIE_EPSILON
                        || ((off_ray - best_off).abs() <= TIE_EPSILON && along < best_along)
                }
            };
            if better {
                best = Some((i, off_ray, along));
            }
        }

        best.map(|(i, _, _)| i)
    }
}

/// Unproject a pointer onto the world `z = 0` plane, in field-local space
pub fn pointer_to_local_plane(
    camera: &Camera,
    transform: &FieldTransform,
    x: f32,
    y: f32,
    viewport: Vec2,
) -> Option<Vec3> {
    let ndc = Camera::ndc_from_pixel(x, y, viewport)?;
    let hit = camera.ray(ndc)?.intersect_z_plane(0.0)?;
    Some(transform.to_local(hit))
}
