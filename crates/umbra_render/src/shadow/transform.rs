//! Shadow Transform Derivation
//!
//! Computes the view-projection matrices that frame each light type's
//! shadow volume. This module is backend-agnostic and only performs the
//! mathematical calculations:
//!
//! - Spot: one perspective frustum covering the outer cone
//! - Point: six 90° frusta covering the cube faces
//! - Directional: one stable view anchored behind the reference camera,
//!   combined with one orthographic projection per cascade
//!
//! All matrices are column-major, right-handed, with the wgpu/Vulkan
//! [0, 1] clip depth range. The derivation is a pure function of the
//! light parameters and the reference camera position: calling it twice
//! with unchanged inputs yields bit-identical results.

/// Maximum supported cascade count
pub const MAX_CASCADES: usize = 4;

/// Number of cube shadow faces
pub const CUBE_FACE_COUNT: usize = 6;

/// Cube face view directions in fixed order: -X, -Y, -Z, +X, +Y, +Z
pub const CUBE_FACE_DIRECTIONS: [[f32; 3]; CUBE_FACE_COUNT] = [
    [-1.0, 0.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, -1.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Fixed up vectors paired with [`CUBE_FACE_DIRECTIONS`]
///
/// A lookup table, not derived algorithmically: the ±Y faces use Z-axis
/// ups so no face pairs a view direction with a parallel up vector.
pub const CUBE_FACE_UPS: [[f32; 3]; CUBE_FACE_COUNT] = [
    [0.0, -1.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, -1.0, 0.0],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, -1.0, 0.0],
];

/// Spot light view-projection matrix
///
/// Vertical field of view is exactly `2 * outer_cone`, aspect 1. The
/// view looks from `position` toward `position + direction` with the
/// perpendicular up rule of [`find_up_vector`]. `near < far` is a
/// caller contract.
pub fn spot_view_projection(
    position: [f32; 3],
    direction: [f32; 3],
    outer_cone: f32,
    near: f32,
    far: f32,
) -> [[f32; 4]; 4] {
    let target = [
        position[0] + direction[0],
        position[1] + direction[1],
        position[2] + direction[2],
    ];
    let view = look_at(position, target, find_up_vector(direction));
    let proj = perspective(2.0 * outer_cone, 1.0, near, far);
    multiply_mat4(&proj, &view)
}

/// Point light view-projection matrix for one cube face
///
/// Each face is a 90° frustum looking along [`CUBE_FACE_DIRECTIONS`]
/// with the fixed up vector from [`CUBE_FACE_UPS`]. The six frusta
/// together cover all directions from `position`.
pub fn point_face_view_projection(
    position: [f32; 3],
    face: usize,
    near: f32,
    far: f32,
) -> [[f32; 4]; 4] {
    let dir = CUBE_FACE_DIRECTIONS[face];
    let target = [
        position[0] + dir[0],
        position[1] + dir[1],
        position[2] + dir[2],
    ];
    let view = look_at(position, target, CUBE_FACE_UPS[face]);
    let proj = perspective(core::f32::consts::FRAC_PI_2, 1.0, near, far);
    multiply_mat4(&proj, &view)
}

/// Stable directional shadow view matrix
///
/// Looks from a point offset behind the reference camera along the
/// light direction by half of `distance`, toward the reference camera
/// position. Anchoring the eye to the camera keeps every cascade's
/// footprint centered on the viewer.
pub fn directional_view(
    camera_position: [f32; 3],
    direction: [f32; 3],
    distance: f32,
) -> [[f32; 4]; 4] {
    let half = distance * 0.5;
    let eye = [
        camera_position[0] - direction[0] * half,
        camera_position[1] - direction[1] * half,
        camera_position[2] - direction[2] * half,
    ];
    look_at(eye, camera_position, find_up_vector(direction))
}

/// Cascade view-projection matrix for a directional light
///
/// Combines the shared [`directional_view`] with an orthographic
/// projection `[-half_extent, half_extent]²` over the depth range
/// `[0, distance]`.
pub fn cascade_view_projection(
    camera_position: [f32; 3],
    direction: [f32; 3],
    distance: f32,
    half_extent: f32,
) -> [[f32; 4]; 4] {
    let view = directional_view(camera_position, direction, distance);
    let proj = orthographic(
        -half_extent,
        half_extent,
        -half_extent,
        half_extent,
        0.0,
        distance,
    );
    multiply_mat4(&proj, &view)
}

/// Find the up reference for a light view matrix
///
/// `cross(direction, (0,0,1))` unless `direction` is axis-aligned with
/// the Y or Z axis, in which case `(1,0,0)` is used so the cross
/// product never degenerates.
pub fn find_up_vector(direction: [f32; 3]) -> [f32; 3] {
    let axis_aligned_yz = direction[0].abs() < 1e-5
        && ((direction[1].abs() - 1.0).abs() < 1e-5 && direction[2].abs() < 1e-5
            || (direction[2].abs() - 1.0).abs() < 1e-5 && direction[1].abs() < 1e-5);
    if axis_aligned_yz {
        [1.0, 0.0, 0.0]
    } else {
        normalize(cross(direction, [0.0, 0.0, 1.0]))
    }
}

// ============================================================================
// Matrix Math Utilities
// ============================================================================

pub(crate) const IDENTITY_MATRIX: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Create a look-at view matrix (column-major)
pub(crate) fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [[f32; 4]; 4] {
    let f = normalize([
        target[0] - eye[0],
        target[1] - eye[1],
        target[2] - eye[2],
    ]);

    let s = normalize(cross(f, up));
    let u = cross(s, f);

    [
        [s[0], u[0], -f[0], 0.0],
        [s[1], u[1], -f[1], 0.0],
        [s[2], u[2], -f[2], 0.0],
        [-dot(s, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

/// Create a perspective projection matrix (column-major, depth [0, 1])
pub(crate) fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov_y * 0.5).tan();
    let nmf = near - far;

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far / nmf, -1.0],
        [0.0, 0.0, near * far / nmf, 0.0],
    ]
}

/// Create an orthographic projection matrix (column-major, depth [0, 1])
pub(crate) fn orthographic(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> [[f32; 4]; 4] {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;

    [
        [2.0 / rml, 0.0, 0.0, 0.0],
        [0.0, 2.0 / tmb, 0.0, 0.0],
        [0.0, 0.0, -1.0 / fmn, 0.0],
        [-(right + left) / rml, -(top + bottom) / tmb, -near / fmn, 1.0],
    ]
}

/// Multiply two 4x4 matrices (column-major)
pub(crate) fn multiply_mat4(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = a[0][j] * b[i][0]
                         + a[1][j] * b[i][1]
                         + a[2][j] * b[i][2]
                         + a[3][j] * b[i][3];
        }
    }

    result
}

/// Transform a vec4 by a matrix
pub(crate) fn transform_vec4(m: &[[f32; 4]; 4], v: [f32; 4]) -> [f32; 4] {
    [
        m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2] + m[3][0] * v[3],
        m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2] + m[3][1] * v[3],
        m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2] + m[3][2] * v[3],
        m[0][3] * v[0] + m[1][3] * v[1] + m[2][3] * v[2] + m[3][3] * v[3],
    ]
}

/// Normalize a vec3
pub(crate) fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Cross product
pub(crate) fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Dot product
pub(crate) fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
