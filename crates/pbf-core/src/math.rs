use glam::Vec3;

/// Splits `v` into its components along and across the unit normal `n`.
///
/// Returns `(n · v, normal_part, tangential_part)`.
#[inline]
pub fn split_normal_tangent(v: Vec3, n: Vec3) -> (f32, Vec3, Vec3) {
    let vn = n.dot(v);
    let normal = n * vn;
    (vn, normal, v - normal)
}

/// Largest vector length in `values`, `0.0` for an empty slice.
pub fn max_length(values: &[Vec3]) -> f32 {
    values
        .iter()
        .map(|v| v.length_squared())
        .fold(0.0_f32, f32::max)
        .sqrt()
}
