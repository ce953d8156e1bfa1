use crate::config::Config;
use crate::correction::correct_series;
use crate::model::{Record, Sequence};
use crate::mutation::generate_sequence;
use crate::tracker::Tracker;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::encode;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Original and final sequences of a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Sequences {
    pub original: Sequence,
    pub working: Sequence,
}

/// Simulation engine.
///
/// Holds the configuration, the original sequence and the random number
/// generator of a single run.
pub struct Engine {
    cfg: Config,
    original: Sequence,
    working: Option<Sequence>,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random
    /// original sequence.
    ///
    /// Seeded runs use `run_idx` as the stream of the generator, so every
    /// run of a simulation draws an independent sequence of numbers.
    pub fn generate_initial_condition(cfg: Config, run_idx: usize) -> Result<Self> {
        let mut rng = match cfg.run.seed {
            Some(seed) => {
                let mut rng = ChaCha12Rng::seed_from_u64(seed);
                rng.set_stream(run_idx as u64);
                rng
            }
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed from OS entropy")?,
        };

        let original = generate_sequence(cfg.model.seq_len, &mut rng)
            .context("failed to generate original sequence")?;

        Ok(Self {
            cfg,
            original,
            working: None,
            rng,
        })
    }

    pub fn original(&self) -> &Sequence {
        &self.original
    }

    /// Final working sequence of the last completed run, if any.
    pub fn working(&self) -> Option<&Sequence> {
        self.working.as_ref()
    }

    /// Run all mutation rounds and correct the observed series.
    pub fn run_rounds(&mut self) -> Result<Vec<Record>> {
        let n_rounds = self.cfg.run.n_rounds;
        let seq_len = self.cfg.model.seq_len;

        let mut tracker = Tracker::new(self.original.clone());
        tracker
            .run(n_rounds, self.cfg.model.policy, &mut self.rng)
            .context("failed to run rounds")?;

        let (working, observed) = tracker.finish();
        let corrected = correct_series(&observed, seq_len).context("failed to correct series")?;

        let n_undef = corrected.iter().filter(|val| val.is_none()).count();
        if n_undef > 0 {
            log::warn!("{n_undef} of {n_rounds} rounds are past saturation");
        }
        self.working = Some(working);

        let records = observed
            .into_iter()
            .zip(corrected)
            .enumerate()
            .map(|(idx, (observed, corrected))| Record {
                round: idx + 1,
                observed,
                corrected,
            })
            .collect();

        Ok(records)
    }

    /// Write the records of a run to a binary file.
    pub fn write_trajectory<P: AsRef<Path>>(file: P, records: &[Record]) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            encode::write(&mut writer, record).context("failed to serialize record")?;
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save the original and final sequences of the run.
    pub fn save_sequences<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let Some(working) = &self.working else {
            bail!("no rounds have been performed");
        };
        let sequences = Sequences {
            original: self.original.clone(),
            working: working.clone(),
        };

        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &sequences).context("failed to serialize sequences")?;
        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }
}
