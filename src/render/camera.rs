//! Look-at camera with cached view and projection matrices

use crate::foundation::math::{self, Mat4, Vec3};

/// A perspective camera
///
/// Degrees at the API boundary, radians inside. The view and projection
/// matrices are cached and refreshed by the setters, so reading them per
/// frame is free.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,

    /// Vertical field of view in radians
    fov: f32,
    /// Width / height
    aspect: f32,
    /// Near plane distance
    near: f32,
    /// Far plane distance
    far: f32,

    view_matrix: Mat4,
    proj_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            45.0,
            4.0 / 3.0,
            0.1,
            100.0,
        )
    }
}

impl Camera {
    /// Create a perspective camera; field of view in degrees
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            target,
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: math::to_radians(fov_degrees),
            aspect,
            near,
            far,
            view_matrix: Mat4::identity(),
            proj_matrix: Mat4::identity(),
        };
        camera.update_view_matrix();
        camera.update_projection_matrix();
        camera
    }

    /// Current view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    /// Current projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.proj_matrix
    }

    /// Near plane distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far plane distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Move the camera, keeping its orientation
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_view_matrix();
    }

    /// Aim the camera at a new target
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.update_view_matrix();
    }

    /// Change the up direction
    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.update_view_matrix();
    }

    /// Reconfigure the projection; field of view in degrees
    pub fn set_perspective(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.fov = math::to_radians(fov_degrees);
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.update_projection_matrix();
    }

    /// Dolly along the view direction; target moves with the camera
    pub fn move_forward(&mut self, distance: f32) {
        let forward = (self.target - self.position).normalized();
        self.position += forward * distance;
        self.target += forward * distance;
        self.update_view_matrix();
    }

    /// Strafe along the camera's right axis
    pub fn move_right(&mut self, distance: f32) {
        let forward = (self.target - self.position).normalized();
        let right = forward.cross(self.up).normalized();
        self.position += right * distance;
        self.target += right * distance;
        self.update_view_matrix();
    }

    /// Move along the up direction
    pub fn move_up(&mut self, distance: f32) {
        self.position += self.up * distance;
        self.target += self.up * distance;
        self.update_view_matrix();
    }

    /// Rotate the view direction by yaw and pitch, in degrees
    ///
    /// The pitch is clamped short of the poles to avoid flipping over.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        let offset = self.target - self.position;
        let length = offset.length();
        let direction = offset.normalized();

        let mut theta = direction.z.atan2(direction.x);
        let mut phi = math::clamp(direction.y, -1.0, 1.0).acos();

        theta -= math::to_radians(yaw);
        phi -= math::to_radians(pitch);
        phi = math::clamp(phi, 0.1, std::f32::consts::PI - 0.1);

        let direction = Vec3::new(
            phi.sin() * theta.cos(),
            phi.cos(),
            phi.sin() * theta.sin(),
        );
        self.target = self.position + direction * length;
        self.update_view_matrix();
    }

    fn update_view_matrix(&mut self) {
        self.view_matrix = Mat4::look_at(self.position, self.target, self.up);
    }

    fn update_projection_matrix(&mut self) {
        self.proj_matrix = Mat4::perspective(self.fov, self.aspect, self.near, self.far);
    }
}
