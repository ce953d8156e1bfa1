use crate::config::Config;
use crate::correction::{SATURATION, expected_observed_fraction};
use crate::model::Record;
use crate::stats::{Accumulator, TimeSeries};
use anyhow::{Context, Result, bail};
use rmp_serde::decode;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

/// Observable computed from the records of a run.
pub trait Obs {
    fn update(&mut self, record: &Record) -> Result<()>;
    fn name(&self) -> &'static str;
    fn report(&self) -> Result<toml::Value>;
}

/// Observed fraction of differing sites.
pub struct ObsFrac {
    seq_len: usize,
    subs_rate: f64,
    n_rounds: usize,
    time_series: TimeSeries,
}

#[derive(Serialize)]
struct ObsFracReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    plateau_round: Option<usize>,
    mean: f64,
    std_dev: f64,
    sem: f64,
    is_equil: bool,
    saturation: f64,
    expected_final: f64,
}

impl ObsFrac {
    pub fn new(cfg: &Config) -> Self {
        Self {
            seq_len: cfg.model.seq_len,
            subs_rate: cfg.model.policy.substitution_rate(),
            n_rounds: cfg.run.n_rounds,
            time_series: TimeSeries::new(),
        }
    }
}

impl Obs for ObsFrac {
    fn update(&mut self, record: &Record) -> Result<()> {
        self.time_series
            .push(record.observed as f64 / self.seq_len as f64);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "obs_frac"
    }

    fn report(&self) -> Result<toml::Value> {
        let ts_report = self.time_series.report();
        let subs_per_site = self.subs_rate * self.n_rounds as f64 / self.seq_len as f64;
        // Rounds start at 1.
        let plateau_round = ts_report.is_equil.then_some(ts_report.i_equil + 1);
        let report = ObsFracReport {
            plateau_round,
            mean: ts_report.mean,
            std_dev: ts_report.std_dev,
            sem: ts_report.sem,
            is_equil: ts_report.is_equil,
            saturation: SATURATION,
            expected_final: expected_observed_fraction(subs_per_site),
        };
        Ok(toml::Value::try_from(report)?)
    }
}

/// Deviation of the corrected estimate from the expected number of
/// substitutions, per site.
pub struct CorrBias {
    seq_len: usize,
    subs_rate: f64,
    acc: Accumulator,
    n_undef: usize,
    first_undef: Option<usize>,
}

#[derive(Serialize)]
struct CorrBiasReport {
    n_def: usize,
    mean: f64,
    std_dev: f64,
    n_undef: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_undef: Option<usize>,
}

impl CorrBias {
    pub fn new(cfg: &Config) -> Self {
        Self {
            seq_len: cfg.model.seq_len,
            subs_rate: cfg.model.policy.substitution_rate(),
            acc: Accumulator::new(),
            n_undef: 0,
            first_undef: None,
        }
    }
}

impl Obs for CorrBias {
    fn update(&mut self, record: &Record) -> Result<()> {
        match record.corrected {
            Some(corrected) => {
                let expected = self.subs_rate * record.round as f64;
                self.acc.add((corrected - expected) / self.seq_len as f64);
            }
            None => {
                self.n_undef += 1;
                if self.first_undef.is_none() {
                    self.first_undef = Some(record.round);
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "corr_bias"
    }

    fn report(&self) -> Result<toml::Value> {
        let acc_report = self.acc.report();
        let report = CorrBiasReport {
            n_def: acc_report.n_vals,
            mean: acc_report.mean,
            std_dev: acc_report.std_dev,
            n_undef: self.n_undef,
            first_undef: self.first_undef,
        };
        Ok(toml::Value::try_from(report)?)
    }
}

/// Run analyzer.
///
/// Replays the records of a trajectory file through every observable.
pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> =
            vec![Box::new(ObsFrac::new(&cfg)), Box::new(CorrBias::new(&cfg))];
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_record(&mut self, record: &Record) -> Result<()> {
        if record.observed > self.cfg.model.seq_len {
            bail!(
                "observed count must be at most {}, but is {}",
                self.cfg.model.seq_len,
                record.observed
            );
        }
        for obs in &mut self.obs_ptr_vec {
            obs.update(record)
                .with_context(|| format!("failed to update {}", obs.name()))?;
        }
        Ok(())
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.run.n_rounds {
            let record: Record = decode::from_read(&mut reader).context("failed to read record")?;
            self.add_record(&record)?;
        }
        Ok(())
    }

    pub fn results(&self) -> Result<toml::Table> {
        let mut table = toml::Table::new();
        for obs in &self.obs_ptr_vec {
            let report = obs
                .report()
                .with_context(|| format!("failed to report {}", obs.name()))?;
            table.insert(obs.name().to_string(), report);
        }
        Ok(table)
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let contents =
            toml::to_string_pretty(&self.results()?).context("failed to serialize results")?;
        fs::write(file, contents).with_context(|| format!("failed to write {file:?}"))?;
        Ok(())
    }
}
