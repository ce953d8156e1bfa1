use serde::{Deserialize, Serialize};

/// Running mean and variance (Welford's algorithm).
#[derive(Default)]
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

/// Correlated series of values, one per simulation round.
///
/// The observed divergence rises from zero and then fluctuates around its
/// saturation value, so statistics are taken over the tail that starts at the
/// equilibration index.
#[derive(Default)]
pub struct TimeSeries {
    vals: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeSeriesReport {
    /// Index of the first value of the equilibrated tail.
    pub i_equil: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub sem: f64,
    pub is_equil: bool,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, val: f64) {
        self.vals.push(val);
    }

    /// Statistics of the equilibrated tail of the series.
    pub fn report(&self) -> TimeSeriesReport {
        let i_equil = opt_i_equil(&self.vals);
        let tail = &self.vals[i_equil..];
        TimeSeriesReport {
            i_equil,
            mean: mean(tail),
            std_dev: var(tail).sqrt(),
            sem: sem(tail),
            is_equil: i_equil != self.vals.len() / 2,
        }
    }
}

fn mean(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

fn var(vals: &[f64]) -> f64 {
    let n_vals = vals.len();
    if n_vals < 2 {
        return f64::NAN;
    }
    let mean = mean(vals);
    vals.iter().map(|&val| (val - mean).powi(2)).sum::<f64>() / (n_vals - 1) as f64
}

/// Standard error of the mean by the Flyvbjerg-Petersen blocking method.
fn sem(vals: &[f64]) -> f64 {
    let mut blk_vals = vals.to_vec();
    let mut sem2_ests = Vec::new();
    let mut sem2_errs = Vec::new();

    while blk_vals.len() >= 2 {
        let n_vals = blk_vals.len() as f64;
        let sem2_est = var(&blk_vals) / n_vals;
        sem2_ests.push(sem2_est);
        sem2_errs.push(sem2_est * (2.0 / (n_vals - 1.0)).sqrt());

        blk_vals = blk_vals
            .chunks_exact(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();
    }

    // First blocking level whose estimate lies above every later lower bound.
    for (idx, &sem2_est) in sem2_ests.iter().enumerate() {
        let max_low = sem2_ests[idx..]
            .iter()
            .zip(&sem2_errs[idx..])
            .map(|(est, err)| est - err)
            .fold(f64::NEG_INFINITY, f64::max);
        if sem2_est > max_low {
            return sem2_est.sqrt();
        }
    }

    sem2_ests.last().copied().unwrap_or(f64::NAN).sqrt()
}

/// Equilibration index by the marginal standard error rule.
fn opt_i_equil(vals: &[f64]) -> usize {
    let n_vals = vals.len();
    let mut opt = n_vals / 2;
    if n_vals == 0 {
        return opt;
    }

    let mut min_mse = f64::INFINITY;
    let n_idxs = n_vals.ilog2() + 1;
    for idx in 0..n_idxs {
        let i_equil = n_vals / 2_usize.pow(n_idxs - idx);
        let tail = &vals[i_equil..];
        let n_tail = tail.len();
        let mse = var(tail) * (n_tail - 1) as f64 / n_tail.pow(2) as f64;
        if mse < min_mse {
            min_mse = mse;
            opt = i_equil;
        }
    }

    opt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_mean_and_std_dev() {
        let mut acc = Accumulator::new();
        for val in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.add(val);
        }
        let report = acc.report();
        assert_eq!(report.n_vals, 8);
        assert!((report.mean - 5.0).abs() < 1e-12);
        assert!((report.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn empty_accumulator_is_nan() {
        let report = Accumulator::new().report();
        assert_eq!(report.n_vals, 0);
        assert!(report.mean.is_nan());
        assert!(report.std_dev.is_nan());
    }

    #[test]
    fn time_series_skips_transient() {
        let mut series = TimeSeries::new();
        for idx in 0..256 {
            series.push(idx.min(32) as f64 + if idx % 2 == 0 { 0.1 } else { -0.1 });
        }
        let report = series.report();
        assert_eq!(report.i_equil, 32);
        assert!((report.mean - 32.0).abs() < 0.5, "{report:?}");
        assert!(report.is_equil);
    }

    #[test]
    fn short_time_series_does_not_panic() {
        let mut series = TimeSeries::new();
        assert!(series.report().mean.is_nan());
        series.push(1.0);
        let report = series.report();
        assert_eq!(report.mean, 1.0);
    }
}
