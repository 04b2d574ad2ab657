//! Small numeric helpers shared by the baseline monitoring calculators.

use std::collections::BTreeMap;

// ── Descriptive statistics ────────────────────────────────────────────────────

/// Arithmetic mean of the finite values. Returns `None` when there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

/// Population standard deviation (divisor `n`) of the finite values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let m = mean(&finite)?;
    let var = finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / finite.len() as f64;
    Some(var.sqrt())
}

/// Alerting band `mean ± multiplier·σ` derived from reference values.
///
/// Returns `(lower, upper)`; both are `None` when no finite reference value
/// exists. Bounds are clamped into `clamp` when one is given.
pub fn std_thresholds(
    reference: &[f64],
    multiplier: f64,
    clamp: Option<(f64, f64)>,
) -> (Option<f64>, Option<f64>) {
    let (Some(m), Some(sd)) = (mean(reference), std_dev(reference)) else {
        return (None, None);
    };
    let mut lower = m - multiplier * sd;
    let mut upper = m + multiplier * sd;
    if let Some((lo, hi)) = clamp {
        lower = lower.clamp(lo, hi);
        upper = upper.clamp(lo, hi);
    }
    (Some(lower), Some(upper))
}

// ── Correlation ───────────────────────────────────────────────────────────────

/// Pearson correlation of paired samples, skipping pairs with a non-finite
/// member. `None` when fewer than two pairs remain or a side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Two-sided p-value for a Pearson correlation using the Fisher z
/// transformation. Returns `1.0` when `n < 4`.
pub fn pearson_p_value(r: f64, n: usize) -> f64 {
    if n < 4 || !r.is_finite() {
        return 1.0;
    }
    let r = r.clamp(-0.999_999_999, 0.999_999_999);
    let z = r.atanh() * ((n - 3) as f64).sqrt();
    (1.0 - erf(z.abs() / std::f64::consts::SQRT_2)).clamp(0.0, 1.0)
}

// ── Two-sample tests ──────────────────────────────────────────────────────────

/// Two-sample Kolmogorov–Smirnov test.
///
/// Returns `(d, p_value)` where `d` is the maximum distance between the two
/// empirical CDFs. Ties are stepped together. Empty input yields `(0, 1)`.
pub fn ks_two_sample(reference: &[f64], current: &[f64]) -> (f64, f64) {
    let mut a: Vec<f64> = reference.iter().copied().filter(|v| v.is_finite()).collect();
    let mut b: Vec<f64> = current.iter().copied().filter(|v| v.is_finite()).collect();
    if a.is_empty() || b.is_empty() {
        return (0.0, 1.0);
    }
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let (mut i, mut j) = (0usize, 0usize);
    let mut d_max = 0.0f64;

    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        let diff = (i as f64 / n1 - j as f64 / n2).abs();
        d_max = d_max.max(diff);
    }

    let n_eff = (n1 * n2) / (n1 + n2);
    let lambda = (n_eff.sqrt() + 0.12 + 0.11 / n_eff.sqrt()) * d_max;
    (d_max, ks_p_value(lambda))
}

/// Asymptotic Kolmogorov distribution tail probability `Q_KS(lambda)`.
pub fn ks_p_value(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut p = 0.0;
    for k in 1..=100 {
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * (-2.0 * f64::from(k).powi(2) * lambda.powi(2)).exp();
        p += term;
        if term.abs() < 1e-10 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

/// Chi-squared test of homogeneity on a 2×K contingency table built from
/// category counts of the reference and current samples.
///
/// Returns `(statistic, p_value)`; a table with fewer than two observed
/// categories or an empty side yields `(0, 1)`.
pub fn chi2_contingency(
    reference: &BTreeMap<String, usize>,
    current: &BTreeMap<String, usize>,
) -> (f64, f64) {
    let total_ref: usize = reference.values().sum();
    let total_cur: usize = current.values().sum();
    if total_ref == 0 || total_cur == 0 {
        return (0.0, 1.0);
    }

    let mut categories: Vec<&String> = reference.keys().chain(current.keys()).collect();
    categories.sort();
    categories.dedup();
    if categories.len() < 2 {
        return (0.0, 1.0);
    }

    let grand = (total_ref + total_cur) as f64;
    let mut stat = 0.0;
    for cat in &categories {
        let r = *reference.get(*cat).unwrap_or(&0) as f64;
        let c = *current.get(*cat).unwrap_or(&0) as f64;
        let col = r + c;
        let exp_r = col * total_ref as f64 / grand;
        let exp_c = col * total_cur as f64 / grand;
        if exp_r > 0.0 {
            stat += (r - exp_r).powi(2) / exp_r;
        }
        if exp_c > 0.0 {
            stat += (c - exp_c).powi(2) / exp_c;
        }
    }

    let df = categories.len() - 1;
    (stat, chi_square_p_value(stat, df))
}

/// Upper-tail chi-squared probability via the Wilson–Hilferty approximation.
pub fn chi_square_p_value(chi_sq: f64, df: usize) -> f64 {
    if df == 0 || chi_sq <= 0.0 {
        return 1.0;
    }
    let k = df as f64;
    let z = ((chi_sq / k).powf(1.0 / 3.0) - (1.0 - 2.0 / (9.0 * k))) / (2.0 / (9.0 * k)).sqrt();
    (0.5 * (1.0 - erf(z / std::f64::consts::SQRT_2))).clamp(0.0, 1.0)
}

/// Abramowitz–Stegun 7.1.26 approximation of the error function.
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    // ── mean / std ────────────────────────────────────────────────────────────

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        assert_eq!(std_dev(&v), Some(2.0));
    }

    #[test]
    fn test_mean_skips_nan_and_handles_empty() {
        assert_eq!(mean(&[1.0, f64::NAN, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(std_dev(&[f64::NAN]), None);
    }

    #[test]
    fn test_std_thresholds() {
        let (lo, hi) = std_thresholds(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 3.0, None);
        assert_eq!(lo, Some(-1.0));
        assert_eq!(hi, Some(11.0));
    }

    #[test]
    fn test_std_thresholds_clamped() {
        let (lo, hi) = std_thresholds(&[0.5, 0.9], 5.0, Some((0.0, 1.0)));
        assert_eq!(lo, Some(0.0));
        assert_eq!(hi, Some(1.0));
    }

    #[test]
    fn test_std_thresholds_empty() {
        assert_eq!(std_thresholds(&[], 3.0, None), (None, None));
    }

    // ── pearson ───────────────────────────────────────────────────────────────

    #[test]
    fn test_pearson_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        let neg = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_side_is_none() {
        assert!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_none());
        assert!(pearson(&[1.0], &[1.0]).is_none());
    }

    #[test]
    fn test_pearson_p_value_bounds() {
        assert_eq!(pearson_p_value(0.9, 3), 1.0);
        let strong = pearson_p_value(0.99, 30);
        let weak = pearson_p_value(0.05, 30);
        assert!(strong < 0.001);
        assert!(weak > 0.5);
    }

    // ── KS ────────────────────────────────────────────────────────────────────

    #[test]
    fn test_ks_identical_samples() {
        let a: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let (d, p) = ks_two_sample(&a, &a);
        assert_eq!(d, 0.0);
        assert!(p > 0.99);
    }

    #[test]
    fn test_ks_disjoint_samples() {
        let a: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let b: Vec<f64> = (1000..1100).map(|i| i as f64).collect();
        let (d, p) = ks_two_sample(&a, &b);
        assert!((d - 1.0).abs() < 1e-12);
        assert!(p < 1e-6);
    }

    #[test]
    fn test_ks_handles_ties() {
        let a = [1.0, 1.0, 1.0, 2.0];
        let b = [1.0, 2.0, 2.0, 2.0];
        let (d, _) = ks_two_sample(&a, &b);
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ks_empty() {
        assert_eq!(ks_two_sample(&[], &[1.0]), (0.0, 1.0));
    }

    // ── chi-squared ───────────────────────────────────────────────────────────

    #[test]
    fn test_chi2_same_distribution() {
        let r = counts(&[("a", 50), ("b", 50)]);
        let c = counts(&[("a", 25), ("b", 25)]);
        let (stat, p) = chi2_contingency(&r, &c);
        assert!(stat.abs() < 1e-12);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_chi2_shifted_distribution() {
        let r = counts(&[("a", 90), ("b", 10)]);
        let c = counts(&[("a", 10), ("b", 90)]);
        let (stat, p) = chi2_contingency(&r, &c);
        assert!(stat > 100.0);
        assert!(p < 0.001);
    }

    #[test]
    fn test_chi2_new_category_in_current() {
        let r = counts(&[("a", 100)]);
        let c = counts(&[("a", 50), ("b", 50)]);
        let (stat, p) = chi2_contingency(&r, &c);
        assert!(stat > 0.0);
        assert!(p < 0.05);
    }

    #[test]
    fn test_chi2_single_category() {
        let r = counts(&[("a", 10)]);
        let c = counts(&[("a", 3)]);
        assert_eq!(chi2_contingency(&r, &c), (0.0, 1.0));
    }

    #[test]
    fn test_erf_known_values() {
        assert!(erf(0.0).abs() < 1e-6);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
    }
}
