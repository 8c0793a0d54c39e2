use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera as seen by the culling and cascade-fitting stages.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Camera {
    pub fn new_perspective(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y,
            aspect_ratio,
            near_plane: near,
            far_plane: far,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);
        let mat3 = Mat3::from_cols(right, up, -forward);
        self.rotation = Quat::from_mat3(&mat3);
    }

    /// World-space corners of the view frustum between the view distances
    /// `near` and `far`. Near plane first, then far plane, each as
    /// bottom-left, bottom-right, top-right, top-left.
    pub fn slice_corners(&self, near: f32, far: f32) -> [Vec3; 8] {
        let tan_half_fov = (self.fov_y * 0.5).tan();
        let (forward, right, up) = (self.forward(), self.right(), self.up());

        let mut corners = [Vec3::ZERO; 8];
        for (plane, distance) in [near, far].into_iter().enumerate() {
            let half_height = distance * tan_half_fov;
            let half_width = half_height * self.aspect_ratio;
            let center = self.position + forward * distance;
            let plane_corners = [
                center - right * half_width - up * half_height,
                center + right * half_width - up * half_height,
                center + right * half_width + up * half_height,
                center - right * half_width + up * half_height,
            ];
            corners[plane * 4..plane * 4 + 4].copy_from_slice(&plane_corners);
        }
        corners
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(
            std::f32::consts::FRAC_PI_3,
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn slice_corners_lie_on_requested_planes() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 2.0, 5.0);
        camera.look_at(Vec3::ZERO, Vec3::Y);

        let corners = camera.slice_corners(1.0, 10.0);
        for corner in &corners[..4] {
            assert_relative_eq!((*corner - camera.position).dot(camera.forward()), 1.0, epsilon = 1e-4);
        }
        for corner in &corners[4..] {
            assert_relative_eq!((*corner - camera.position).dot(camera.forward()), 10.0, epsilon = 1e-3);
        }
    }
}
