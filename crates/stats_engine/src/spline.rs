//! Natural cubic smoothing spline (Reinsch formulation).
//!
//! Minimizes `Σ wᵢ²(yᵢ − g(xᵢ))² + λ∫g″²` with knots at every sample. For a
//! fixed λ the second derivatives γ at the interior knots solve the symmetric
//! pentadiagonal system
//!
//! ```text
//! (R + λ·QᵀW⁻¹Q)·γ = Qᵀy,        g = y − λ·W⁻¹Qγ
//! ```
//!
//! with `W = diag(wᵢ²)`. λ is then chosen so that the weighted residual
//! `Σ (wᵢ(yᵢ − gᵢ))²` meets the smoothing budget `S`.

use contracts::ContractError;

/// Minimum number of samples for a cubic fit
pub const MIN_SAMPLES: usize = 4;

const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e12;
const RELATIVE_TOLERANCE: f64 = 1e-3;
const MAX_BISECTIONS: usize = 200;

/// Residual budget `m − √(2m)` for `m` samples
pub fn default_smoothing(m: usize) -> f64 {
    let m = m as f64;
    m - (2.0 * m).sqrt()
}

/// Fitted spline, evaluated at its knots.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingSpline {
    x: Vec<f64>,
    values: Vec<f64>,
    /// Second derivative at every knot (zero at both ends)
    second: Vec<f64>,
    /// `f64::INFINITY` when the weighted least-squares line was returned
    lambda: f64,
}

impl SmoothingSpline {
    /// Fit over `(index, value)` with a constant weight and the default
    /// residual budget.
    ///
    /// # Errors
    /// See [`fit`](Self::fit).
    pub fn fit_uniform(y: &[f64], weight: f64) -> Result<Self, ContractError> {
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
        let w = vec![weight; y.len()];
        Self::fit(&x, y, &w, None)
    }

    /// Fit with explicit knots, weights and optional budget `s`
    /// (defaults to `m − √(2m)`).
    ///
    /// Non-finite `y` yields an all-NaN spline rather than an error.
    ///
    /// # Errors
    /// `DegenerateInput` for fewer than [`MIN_SAMPLES`] points, mismatched
    /// lengths, non-increasing knots or non-positive weights.
    pub fn fit(x: &[f64], y: &[f64], w: &[f64], s: Option<f64>) -> Result<Self, ContractError> {
        let n = y.len();
        if n < MIN_SAMPLES {
            return Err(ContractError::degenerate(
                "smoothing_spline",
                n,
                format!("at least {MIN_SAMPLES} samples required"),
            ));
        }
        if x.len() != n || w.len() != n {
            return Err(ContractError::degenerate(
                "smoothing_spline",
                n,
                "x, y and w must have the same length",
            ));
        }
        if x.windows(2).any(|p| !(p[1] > p[0])) {
            return Err(ContractError::degenerate(
                "smoothing_spline",
                n,
                "knots must be strictly increasing",
            ));
        }
        if w.iter().any(|&wi| !(wi > 0.0) || !wi.is_finite()) {
            return Err(ContractError::degenerate(
                "smoothing_spline",
                n,
                "weights must be finite and > 0",
            ));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Ok(Self {
                x: x.to_vec(),
                values: vec![f64::NAN; n],
                second: vec![f64::NAN; n],
                lambda: f64::NAN,
            });
        }

        let system = System::new(x, y, w);
        let budget = s.unwrap_or_else(|| default_smoothing(n));

        let line = system.weighted_line();
        if system.line_rss(&line) <= budget {
            return Ok(Self {
                x: x.to_vec(),
                values: line,
                second: vec![0.0; n],
                lambda: f64::INFINITY,
            });
        }

        let lambda = if budget <= 0.0 {
            0.0
        } else {
            system.search_lambda(budget)?
        };
        system.spline(lambda)
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Smoothed values at the knots
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// First derivative at every knot.
    ///
    /// On `[xᵢ, xᵢ₊₁]`: `g′(xᵢ) = (gᵢ₊₁ − gᵢ)/h − h/6·(2γᵢ + γᵢ₊₁)`; the last
    /// knot uses the right end of the final interval.
    pub fn derivatives(&self) -> Vec<f64> {
        let n = self.values.len();
        let g = &self.values;
        let s = &self.second;
        let mut out = Vec::with_capacity(n);
        for i in 0..n - 1 {
            let h = self.x[i + 1] - self.x[i];
            out.push((g[i + 1] - g[i]) / h - h / 6.0 * (2.0 * s[i] + s[i + 1]));
        }
        let h = self.x[n - 1] - self.x[n - 2];
        out.push((g[n - 1] - g[n - 2]) / h + h / 6.0 * (s[n - 2] + 2.0 * s[n - 1]));
        out
    }
}

/// Banded pieces of the Reinsch system for one data set.
struct System<'a> {
    x: &'a [f64],
    y: &'a [f64],
    /// 1 / wᵢ²
    inv_w: Vec<f64>,
    h: Vec<f64>,
    /// Column k of Q has `a[k]`, `b[k]`, `c[k]` at rows k, k+1, k+2
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    /// Qᵀy
    rhs: Vec<f64>,
}

impl<'a> System<'a> {
    fn new(x: &'a [f64], y: &'a [f64], w: &[f64]) -> Self {
        let n = y.len();
        let m = n - 2;
        let h: Vec<f64> = x.windows(2).map(|p| p[1] - p[0]).collect();
        let mut a = Vec::with_capacity(m);
        let mut b = Vec::with_capacity(m);
        let mut c = Vec::with_capacity(m);
        for k in 0..m {
            a.push(1.0 / h[k]);
            b.push(-1.0 / h[k] - 1.0 / h[k + 1]);
            c.push(1.0 / h[k + 1]);
        }
        let rhs = (0..m)
            .map(|k| a[k] * y[k] + b[k] * y[k + 1] + c[k] * y[k + 2])
            .collect();
        Self {
            x,
            y,
            inv_w: w.iter().map(|wi| 1.0 / (wi * wi)).collect(),
            h,
            a,
            b,
            c,
            rhs,
        }
    }

    fn n(&self) -> usize {
        self.y.len()
    }

    /// γ for a given λ, via banded LDLᵀ
    fn solve(&self, lambda: f64) -> Result<Vec<f64>, ContractError> {
        let m = self.a.len();
        let (a, b, c, iw, h) = (&self.a, &self.b, &self.c, &self.inv_w, &self.h);

        let mut diag = vec![0.0; m];
        let mut off1 = vec![0.0; m];
        let mut off2 = vec![0.0; m];
        for k in 0..m {
            diag[k] = (h[k] + h[k + 1]) / 3.0
                + lambda
                    * (a[k] * a[k] * iw[k] + b[k] * b[k] * iw[k + 1] + c[k] * c[k] * iw[k + 2]);
            if k + 1 < m {
                off1[k] = h[k + 1] / 6.0
                    + lambda * (b[k] * a[k + 1] * iw[k + 1] + c[k] * b[k + 1] * iw[k + 2]);
            }
            if k + 2 < m {
                off2[k] = lambda * c[k] * a[k + 2] * iw[k + 2];
            }
        }

        let mut d = vec![0.0; m];
        let mut e = vec![0.0; m];
        let mut f = vec![0.0; m];
        for k in 0..m {
            let mut dk = diag[k];
            if k >= 1 {
                dk -= e[k - 1] * e[k - 1] * d[k - 1];
            }
            if k >= 2 {
                dk -= f[k - 2] * f[k - 2] * d[k - 2];
            }
            if !(dk > 0.0) {
                return Err(ContractError::degenerate(
                    "smoothing_spline",
                    self.n(),
                    format!("system not positive definite at λ = {lambda}"),
                ));
            }
            d[k] = dk;
            if k + 1 < m {
                let mut v = off1[k];
                if k >= 1 {
                    v -= f[k - 1] * e[k - 1] * d[k - 1];
                }
                e[k] = v / dk;
            }
            if k + 2 < m {
                f[k] = off2[k] / dk;
            }
        }

        let mut z = self.rhs.clone();
        for k in 0..m {
            if k >= 1 {
                z[k] -= e[k - 1] * z[k - 1];
            }
            if k >= 2 {
                z[k] -= f[k - 2] * z[k - 2];
            }
        }
        for k in 0..m {
            z[k] /= d[k];
        }
        for k in (0..m).rev() {
            if k + 1 < m {
                z[k] -= e[k] * z[k + 1];
            }
            if k + 2 < m {
                z[k] -= f[k] * z[k + 2];
            }
        }
        Ok(z)
    }

    /// Qγ (length n)
    fn q_times(&self, gamma: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.n()];
        for (k, g) in gamma.iter().enumerate() {
            out[k] += self.a[k] * g;
            out[k + 1] += self.b[k] * g;
            out[k + 2] += self.c[k] * g;
        }
        out
    }

    /// Weighted residual `Σ wᵢ²(yᵢ − gᵢ)² = λ²·Σ (Qγ)ᵢ²/wᵢ²`
    fn rss(&self, lambda: f64) -> Result<f64, ContractError> {
        let qg = self.q_times(&self.solve(lambda)?);
        Ok(lambda
            * lambda
            * qg
                .iter()
                .zip(&self.inv_w)
                .map(|(v, iw)| v * v * iw)
                .sum::<f64>())
    }

    fn spline(&self, lambda: f64) -> Result<SmoothingSpline, ContractError> {
        let gamma = self.solve(lambda)?;
        let qg = self.q_times(&gamma);
        let values = self
            .y
            .iter()
            .zip(&qg)
            .zip(&self.inv_w)
            .map(|((y, q), iw)| y - lambda * iw * q)
            .collect();
        let mut second = Vec::with_capacity(self.n());
        second.push(0.0);
        second.extend_from_slice(&gamma);
        second.push(0.0);
        Ok(SmoothingSpline {
            x: self.x.to_vec(),
            values,
            second,
            lambda,
        })
    }

    /// Log-space bisection for `rss(λ) = budget`; rss grows with λ.
    fn search_lambda(&self, budget: f64) -> Result<f64, ContractError> {
        let mut lo = 1.0;
        while lo > LAMBDA_MIN && self.rss(lo)? > budget {
            lo /= 10.0;
        }
        let mut hi = 1.0;
        while hi < LAMBDA_MAX && self.rss(hi)? < budget {
            hi *= 10.0;
        }
        if lo >= hi {
            return Ok(lo.max(hi));
        }

        for _ in 0..MAX_BISECTIONS {
            let mid = (lo * hi).sqrt();
            let r = self.rss(mid)?;
            if (r - budget).abs() <= RELATIVE_TOLERANCE * budget {
                return Ok(mid);
            }
            if r < budget {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi / lo < 1.0 + 1e-12 {
                break;
            }
        }
        Ok((lo * hi).sqrt())
    }

    /// Weighted least-squares line, the λ → ∞ limit
    fn weighted_line(&self) -> Vec<f64> {
        let weights: Vec<f64> = self.inv_w.iter().map(|iw| 1.0 / iw).collect();
        let total: f64 = weights.iter().sum();
        let x_bar = self.x.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>() / total;
        let y_bar = self.y.iter().zip(&weights).map(|(y, w)| y * w).sum::<f64>() / total;
        let (mut sxy, mut sxx) = (0.0, 0.0);
        for ((x, y), w) in self.x.iter().zip(self.y).zip(&weights) {
            sxy += w * (x - x_bar) * (y - y_bar);
            sxx += w * (x - x_bar) * (x - x_bar);
        }
        let slope = sxy / sxx;
        self.x.iter().map(|x| y_bar + slope * (x - x_bar)).collect()
    }

    fn line_rss(&self, line: &[f64]) -> f64 {
        self.y
            .iter()
            .zip(line)
            .zip(&self.inv_w)
            .map(|((y, g), iw)| (y - g) * (y - g) / iw)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_too_few_points() {
        let err = SmoothingSpline::fit_uniform(&[1.0, 2.0, 3.0], 0.05).unwrap_err();
        assert!(matches!(err, ContractError::DegenerateInput { len: 3, .. }));
    }

    #[test]
    fn test_straight_line_is_reproduced() {
        let y: Vec<f64> = (0..50).map(|i| 3.0 + 2.0 * i as f64).collect();
        let spline = SmoothingSpline::fit_uniform(&y, 0.05).unwrap();
        assert!(spline.lambda().is_infinite());
        for (v, d) in spline.values().iter().zip(spline.derivatives()) {
            assert!(v.is_finite());
            assert!(close(d, 2.0, 1e-9), "derivative {d}");
        }
    }

    #[test]
    fn test_interpolating_spline_on_cubic_free_data() {
        // S = 0 forces interpolation; a natural spline through a line is the line
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.0 - 0.5 * v).collect();
        let w = vec![1.0; 10];
        let spline = SmoothingSpline::fit(&x, &y, &w, Some(0.0)).unwrap();
        for (g, yi) in spline.values().iter().zip(&y) {
            assert!(close(*g, *yi, 1e-9));
        }
        assert!(spline.derivatives().iter().all(|d| close(*d, -0.5, 1e-9)));
    }

    #[test]
    fn test_interpolation_hits_every_point() {
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y = vec![0.0, 1.0, 0.0, 4.0, 2.0, 2.0, 7.0, 1.0];
        let spline = SmoothingSpline::fit(&x, &y, &[1.0; 8], Some(0.0)).unwrap();
        assert_eq!(spline.lambda(), 0.0);
        for (g, yi) in spline.values().iter().zip(&y) {
            assert!(close(*g, *yi, 1e-9));
        }
    }

    #[test]
    fn test_residual_meets_budget() {
        let y: Vec<f64> = (0..200)
            .map(|i| {
                let t = i as f64;
                100.0 * (t / 20.0).sin() + if i % 2 == 0 { 15.0 } else { -15.0 }
            })
            .collect();
        let weight = 0.05;
        let spline = SmoothingSpline::fit_uniform(&y, weight).unwrap();
        let rss: f64 = y
            .iter()
            .zip(spline.values())
            .map(|(a, g)| (weight * (a - g)).powi(2))
            .sum();
        let budget = default_smoothing(y.len());
        assert!(
            (rss - budget).abs() <= 1e-3 * budget + 1e-9,
            "rss {rss} vs budget {budget}"
        );
        assert!(spline.lambda() > 0.0 && spline.lambda().is_finite());
    }

    #[test]
    fn test_smoothing_removes_alternating_noise() {
        let y: Vec<f64> = (0..300)
            .map(|i| if i % 2 == 0 { 20.0 } else { -20.0 })
            .collect();
        let spline = SmoothingSpline::fit_uniform(&y, 0.05).unwrap();
        let max_derivative = spline
            .derivatives()
            .iter()
            .fold(0.0f64, |acc, d| acc.max(d.abs()));
        // raw data jumps by 40 per step; the smoothed fit is nearly flat
        assert!(max_derivative < 30.0, "max |g'| = {max_derivative}");
    }

    #[test]
    fn test_non_finite_input_gives_nan() {
        let mut y = vec![1.0; 10];
        y[4] = f64::INFINITY;
        let spline = SmoothingSpline::fit_uniform(&y, 0.05).unwrap();
        assert!(spline.derivatives().iter().all(|d| d.is_nan()));
    }

    #[test]
    fn test_rejects_bad_knots_and_weights() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert!(SmoothingSpline::fit(&[0.0, 1.0, 1.0, 2.0], &y, &[1.0; 4], None).is_err());
        let weights = [1.0, 0.0, 1.0, 1.0];
        assert!(SmoothingSpline::fit(&[0.0, 1.0, 2.0, 3.0], &y, &weights, None).is_err());
    }
}
