//! Jukes-Cantor (JC69) distance correction.
//!
//! Under JC69 the expected fraction of differing sites after `k`
//! substitutions per site is `p = 3/4 (1 - exp(-4/3 k))`. Inverting it gives
//! the maximum-likelihood estimate `k = -3/4 ln(1 - 4/3 p)`, which only
//! exists for `p < 3/4`.

use anyhow::{Result, bail};

/// Observed fraction at which the sequences are saturated.
pub const SATURATION: f64 = 0.75;

/// Corrected distance for an observed fraction `d` of differing sites.
///
/// Returns `None` if `d` is outside `[0, 0.75)`.
pub fn jc_distance(d: f64) -> Option<f64> {
    if !(0.0..SATURATION).contains(&d) {
        return None;
    }
    if d == 0.0 {
        return Some(0.0);
    }
    Some(-0.75 * (1.0 - (4.0 / 3.0) * d).ln())
}

/// Corrected number of substitutions for `count` observed differences out of
/// `seq_len` sites.
pub fn correct_count(count: usize, seq_len: usize) -> Result<Option<f64>> {
    if seq_len == 0 {
        bail!("sequence length must be positive");
    }
    if count > seq_len {
        bail!("count must be at most {seq_len}, but is {count}");
    }
    let d = count as f64 / seq_len as f64;
    Ok(jc_distance(d).map(|dist| dist * seq_len as f64))
}

/// Map an observed series to its corrected series, element by element.
pub fn correct_series(observed: &[usize], seq_len: usize) -> Result<Vec<Option<f64>>> {
    observed
        .iter()
        .map(|&count| correct_count(count, seq_len))
        .collect()
}

/// Expected fraction of differing sites after `subs_per_site` substitutions
/// per site.
pub fn expected_observed_fraction(subs_per_site: f64) -> f64 {
    SATURATION * (1.0 - (-subs_per_site / SATURATION).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_is_exactly_zero() {
        let corrected = correct_count(0, 1000).unwrap().unwrap();
        assert_eq!(corrected, 0.0);
        assert!(corrected.is_sign_positive());
        assert_eq!(corrected.to_string(), "0");
    }

    #[test]
    fn quarter_difference() {
        let corrected = correct_count(1, 4).unwrap().unwrap();
        let expected = -0.75 * (1.0_f64 - 1.0 / 3.0).ln() * 4.0;
        assert_eq!(corrected, expected);
        assert!((corrected - 1.216).abs() < 1e-3);
    }

    #[test]
    fn saturation_is_undefined() {
        assert_eq!(correct_count(750, 1000).unwrap(), None);
        assert_eq!(correct_count(999, 1000).unwrap(), None);
        assert_eq!(correct_count(1000, 1000).unwrap(), None);
        assert!(correct_count(749, 1000).unwrap().is_some());
    }

    #[test]
    fn correction_never_deflates() {
        let seq_len = 1000;
        for count in 0..750 {
            let corrected = correct_count(count, seq_len).unwrap().unwrap();
            assert!(corrected >= count as f64, "{count} -> {corrected}");
        }
    }

    #[test]
    fn invalid_inputs_fail() {
        assert!(correct_count(0, 0).is_err());
        assert!(correct_count(5, 4).is_err());
    }

    #[test]
    fn series_keeps_alignment() {
        let corrected = correct_series(&[0, 1, 3, 4], 4).unwrap();
        assert_eq!(corrected.len(), 4);
        assert_eq!(corrected[0], Some(0.0));
        assert!(corrected[1].is_some());
        assert_eq!(corrected[2], None);
        assert_eq!(corrected[3], None);
    }

    #[test]
    fn expectation_inverts_correction() {
        for k in [0.0, 0.1, 0.5, 1.0, 2.0] {
            let p = expected_observed_fraction(k);
            assert!(p < SATURATION);
            let back = jc_distance(p).unwrap();
            assert!((back - k).abs() < 1e-9, "{k} -> {p} -> {back}");
        }
    }
}
