//! Numeric primitives shared by the estimators.
//!
//! NaN handling is explicit: a NaN anywhere in the input makes the result NaN.

use contracts::ContractError;

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
///
/// Returns NaN when `len <= ddof`.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }
    let mu = mean(values);
    let ss: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    (ss / (n - ddof) as f64).sqrt()
}

/// Population standard deviation (ddof = 0)
pub fn population_std(values: &[f64]) -> f64 {
    std_dev(values, 0)
}

/// Sample standard deviation (ddof = 1)
pub fn sample_std(values: &[f64]) -> f64 {
    std_dev(values, 1)
}

/// Fraction of `true` entries; NaN for an empty mask
pub fn portion(mask: &[bool]) -> f64 {
    if mask.is_empty() {
        return f64::NAN;
    }
    mask.iter().filter(|&&m| m).count() as f64 / mask.len() as f64
}

/// Several percentiles of the same data with one sort.
///
/// Linear interpolation between closest ranks (`q` in percent, 0..=100):
/// position `q/100 * (n-1)` in the sorted data.
///
/// # Errors
/// `DegenerateInput` for fewer than 2 values or `q` outside `[0, 100]`.
pub fn percentiles(values: &[f64], qs: &[f64]) -> Result<Vec<f64>, ContractError> {
    if values.len() < 2 {
        return Err(ContractError::degenerate(
            "percentile",
            values.len(),
            "at least 2 samples required",
        ));
    }
    if let Some(q) = qs.iter().find(|q| !(0.0..=100.0).contains(*q)) {
        return Err(ContractError::degenerate(
            "percentile",
            values.len(),
            format!("percentile {q} outside [0, 100]"),
        ));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Ok(vec![f64::NAN; qs.len()]);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = (sorted.len() - 1) as f64;

    Ok(qs
        .iter()
        .map(|q| {
            let pos = q / 100.0 * last;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            if lo == hi {
                sorted[lo]
            } else {
                sorted[lo] + (sorted[hi] - sorted[lo]) * frac
            }
        })
        .collect())
}

/// Single percentile, see [`percentiles`]
pub fn percentile(values: &[f64], q: f64) -> Result<f64, ContractError> {
    Ok(percentiles(values, &[q])?[0])
}
