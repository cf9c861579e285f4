use glam::{Mat4, Vec3};

use crate::math;

/// Camera state with cached view and projection matrices.
///
/// The view matrix is recomputed only after eye/target/up change and the
/// projection only after the field of view, clip planes or aspect ratio
/// change. `Scene::render` feeds the aspect ratio from the surface size.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    fov_y_degrees: f32,
    near: f32,
    far: f32,
    aspect: f32,
    view: Mat4,
    projection: Mat4,
    view_dirty: bool,
    projection_dirty: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Creates a camera at (0, 0, 3) looking at the origin, 90 degree
    /// vertical field of view, clip planes at 0.01 and 100.
    pub fn new() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 90.0,
            near: 0.01,
            far: 100.0,
            aspect: 1.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_dirty: true,
            projection_dirty: true,
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_eye(&mut self, eye: Vec3) {
        self.eye = eye;
        self.view_dirty = true;
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.view_dirty = true;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.view_dirty = true;
    }

    pub fn set_fov_y_degrees(&mut self, fov_y_degrees: f32) {
        self.fov_y_degrees = fov_y_degrees;
        self.projection_dirty = true;
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near = near;
        self.far = far;
        self.projection_dirty = true;
    }

    /// Updates the aspect ratio; a no-op when the ratio is unchanged.
    pub(crate) fn set_aspect(&mut self, aspect: f32) {
        if aspect != self.aspect {
            self.aspect = aspect;
            self.projection_dirty = true;
        }
    }

    /// Returns the view matrix, recomputing it first if the camera moved.
    pub fn view(&mut self) -> Mat4 {
        if self.view_dirty {
            self.view = math::view_matrix(self.eye, self.target, self.up);
            self.view_dirty = false;
        }
        self.view
    }

    /// Returns the projection matrix, recomputing it first if stale.
    pub fn projection(&mut self) -> Mat4 {
        if self.projection_dirty {
            self.projection =
                math::perspective_matrix(self.fov_y_degrees, self.aspect, self.near, self.far);
            self.projection_dirty = false;
        }
        self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_the_eye_marks_the_view_dirty() {
        let mut camera = Camera::new();
        let before = camera.view();
        assert!(!camera.view_dirty);
        camera.set_eye(Vec3::new(5.0, 0.0, 0.0));
        assert!(camera.view_dirty);
        let after = camera.view();
        assert_ne!(before, after);
    }

    #[test]
    fn clean_camera_keeps_cached_matrices() {
        let mut camera = Camera::new();
        camera.view();
        camera.projection();
        assert!(!camera.view_dirty);
        assert!(!camera.projection_dirty);
        camera.view();
        camera.projection();
        assert!(!camera.view_dirty);
        assert!(!camera.projection_dirty);
    }

    #[test]
    fn aspect_change_recomputes_projection() {
        let mut camera = Camera::new();
        camera.set_aspect(1.0);
        let square = camera.projection();
        camera.set_aspect(2.0);
        assert!(camera.projection_dirty);
        let wide = camera.projection();
        assert_ne!(square.col(0).x, wide.col(0).x);
        assert_eq!(square.col(1).y, wide.col(1).y);
    }

    #[test]
    fn unchanged_aspect_keeps_projection_clean() {
        let mut camera = Camera::new();
        camera.set_aspect(1.5);
        camera.projection();
        camera.set_aspect(1.5);
        assert!(!camera.projection_dirty);
    }

    #[test]
    fn fov_change_recomputes_projection() {
        let mut camera = Camera::new();
        let wide = camera.projection();
        camera.set_fov_y_degrees(45.0);
        let narrow = camera.projection();
        assert!(narrow.col(1).y > wide.col(1).y);
    }
}
