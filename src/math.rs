use glam::{Mat4, Vec3, Vec4};

/// Builds a right-handed look-at view matrix from eye, target and up.
///
/// The basis is derived as forward = normalize(eye - target),
/// right = normalize(up x forward), true up = forward x right. Zero-length
/// inputs pass through normalization unchanged, so degenerate cameras yield
/// a degenerate matrix instead of a panic.
pub fn view_matrix(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = (eye - target).normalize_or_zero();
    let right = up.cross(forward).normalize_or_zero();
    let true_up = forward.cross(right);
    Mat4::from_cols(
        Vec4::new(right.x, true_up.x, forward.x, 0.0),
        Vec4::new(right.y, true_up.y, forward.y, 0.0),
        Vec4::new(right.z, true_up.z, forward.z, 0.0),
        Vec4::new(
            -right.dot(eye),
            -true_up.dot(eye),
            -forward.dot(eye),
            1.0,
        ),
    )
}

/// Builds a perspective projection matrix for a GL clip space (-1..1 depth).
///
/// The vertical field of view is in degrees. No input validation; an aspect
/// of zero or NaN propagates into the matrix.
pub fn perspective_matrix(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y_degrees * std::f32::consts::PI / 360.0).tan();
    let nf = 1.0 / (near - far);
    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, (far + near) * nf, -1.0),
        Vec4::new(0.0, 0.0, 2.0 * far * near * nf, 0.0),
    )
}
