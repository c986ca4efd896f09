/// Scales `v` to unit L2 length in place. Zero and empty vectors are left untouched
/// so callers can still detect them downstream.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 && norm_sq.is_finite() {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}
