/// Linearly interpolated `p`-quantile of `v`, `p` in [0, 1].
pub fn quantile(v: &[f64], p: f64) -> f64 {
    assert!(!v.is_empty());
    let mut v = v.to_vec();
    v.sort_unstable_by(|a, b| a.total_cmp(b));
    let rank = p.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    v[lo] + (v[hi] - v[lo]) * (rank - lo as f64)
}

pub fn median(v: &[f64]) -> f64 {
    quantile(v, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq_with_tol;

    #[test]
    fn test_quantile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq_with_tol!(quantile(&v, 0.0), 1.0, 1e-12);
        assert_eq_with_tol!(quantile(&v, 1.0), 4.0, 1e-12);
        assert_eq_with_tol!(quantile(&v, 0.5), 2.5, 1e-12);
        assert_eq_with_tol!(quantile(&v, 0.9), 3.7, 1e-12);
    }

    #[test]
    fn test_median_odd() {
        assert_eq_with_tol!(median(&[5.0, 1.0, 3.0]), 3.0, 1e-12);
    }
}
