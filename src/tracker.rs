use crate::model::{MutationEvent, Sequence};
use crate::mutation::{MutationPolicy, draw_mutation};
use anyhow::{Context, Result};
use rand::prelude::*;

/// Divergence tracker.
///
/// Holds the immutable original sequence and a working copy, and records the
/// Hamming distance between them after every applied mutation.
pub struct Tracker {
    original: Sequence,
    working: Sequence,
    observed: Vec<usize>,
}

impl Tracker {
    /// Create a tracker whose working sequence starts as a copy of `original`.
    pub fn new(original: Sequence) -> Self {
        let working = original.clone();
        Self {
            original,
            working,
            observed: Vec::new(),
        }
    }

    pub fn working(&self) -> &Sequence {
        &self.working
    }

    /// Apply one mutation to the working sequence and record the new distance.
    pub fn step(&mut self, event: MutationEvent) -> Result<usize> {
        self.working
            .apply(event)
            .context("failed to apply mutation")?;

        let dist = self
            .original
            .hamming(&self.working)
            .context("failed to compute distance")?;
        self.observed.push(dist);

        Ok(dist)
    }

    /// Perform `n_rounds` rounds of mutation drawn according to `policy`.
    ///
    /// Rounds are strictly sequential: each one starts from the working
    /// sequence left by the previous one.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        n_rounds: usize,
        policy: MutationPolicy,
        rng: &mut R,
    ) -> Result<&[usize]> {
        self.observed.reserve_exact(n_rounds);
        let report_every = (n_rounds / 10).max(1);

        for round in 1..=n_rounds {
            let event = draw_mutation(&self.working, policy, rng)
                .with_context(|| format!("failed to draw mutation at round {round}"))?;
            self.step(event)
                .with_context(|| format!("failed to perform round {round}"))?;

            if round % report_every == 0 {
                let progress = 100.0 * round as f64 / n_rounds as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        Ok(self.observed())
    }

    pub fn observed(&self) -> &[usize] {
        &self.observed
    }

    /// Consume the tracker, returning the final working sequence and the
    /// observed series.
    pub fn finish(self) -> (Sequence, Vec<usize>) {
        (self.working, self.observed)
    }
}
