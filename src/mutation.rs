use crate::model::{Base, MutationEvent, Sequence};
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

/// How the replacement base of a mutation is drawn.
///
/// The two policies are not equivalent: under uniform replacement a quarter
/// of the events leave the site unchanged, so the number of real
/// substitutions per round is 3/4 of that under exclusive replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationPolicy {
    /// Draw uniformly from the three bases different from the current one.
    ExclusiveReplacement,
    /// Draw uniformly from all four bases, including the current one.
    UniformReplacement,
}

impl MutationPolicy {
    /// Expected number of real substitutions per round.
    pub fn substitution_rate(self) -> f64 {
        match self {
            MutationPolicy::ExclusiveReplacement => 1.0,
            MutationPolicy::UniformReplacement => 0.75,
        }
    }
}

/// Generate a sequence of `len` independent, uniformly random bases.
pub fn generate_sequence<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Result<Sequence> {
    if len == 0 {
        bail!("sequence length must be positive");
    }

    let base_dist = Uniform::new(0, Base::ALL.len())?;
    let bases = (0..len)
        .map(|_| Base::ALL[base_dist.sample(rng)])
        .collect();

    Ok(Sequence::new(bases))
}

/// Draw a single-site mutation of `seq` according to `policy`.
///
/// The position is drawn first, then the replacement base.
pub fn draw_mutation<R: Rng + ?Sized>(
    seq: &Sequence,
    policy: MutationPolicy,
    rng: &mut R,
) -> Result<MutationEvent> {
    if seq.is_empty() {
        bail!("cannot mutate an empty sequence");
    }

    let pos_dist = Uniform::new(0, seq.len())?;
    let pos = pos_dist.sample(rng);

    let base = match policy {
        MutationPolicy::ExclusiveReplacement => {
            let current = seq.get(pos).context("failed to get current base")?;
            *current
                .others()
                .choose(rng)
                .context("failed to choose a replacement base")?
        }
        MutationPolicy::UniformReplacement => *Base::ALL
            .choose(rng)
            .context("failed to choose a replacement base")?,
    };

    Ok(MutationEvent { pos, base })
}
