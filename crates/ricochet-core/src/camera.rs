use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

use crate::{Ray, Viewport};

/// Perspective camera used to turn a reported screen coordinate into a world ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub viewport: Viewport,
}

impl Camera {
    pub fn new_perspective(fov_y: f32, viewport: Viewport, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y,
            near_plane: near,
            far_plane: far,
            viewport,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y,
            self.viewport.aspect_ratio(),
            self.near_plane,
            self.far_plane,
        )
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        let mat3 = Mat3::from_cols(right, up, -forward);
        self.rotation = Quat::from_mat3(&mat3);
    }

    /// Ray from the near plane through `pixel` (origin at the bottom-left of
    /// the viewport).
    pub fn screen_point_to_ray(&self, pixel: Vec2) -> Ray {
        let ndc = self.viewport.to_ndc(pixel);
        let inv_view_proj = self.view_projection_matrix().inverse();

        let near = inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));

        Ray::new(near, far - near)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(
            std::f32::consts::FRAC_PI_3,
            Viewport::new(1280, 720),
            0.1,
            1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_pixel_looks_forward() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 5.0, 0.0);
        camera.look_at(Vec3::ZERO, Vec3::Z);

        let ray = camera.screen_point_to_ray(Vec2::new(640.0, 360.0));
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Y, 1e-4));
        assert!((ray.origin.y - (5.0 - camera.near_plane)).abs() < 1e-3);
    }

    #[test]
    fn right_edge_bends_ray_right() {
        let camera = Camera::default();
        let ray = camera.screen_point_to_ray(Vec2::new(1280.0, 360.0));
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.z < 0.0);
    }
}
