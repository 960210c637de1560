use std::f64::consts::PI;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::core::ScheduleError;

/// How the learning-rate ceiling shrinks from one section to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DecayMode {
    /// Geometric decay by `min(n_sections / 10, 0.9)` per section. Does not use `lr_min`.
    #[default]
    Linear,
    /// Linear interpolation in log space from `lr_max` at section 0 to `lr_min` at
    /// section `n_sections`.
    Exponential,
    /// Quarter-cosine ease in log space between `lr_max` and `lr_min`.
    Cosine,
}

impl DecayMode {
    pub fn name(&self) -> &'static str {
        match self {
            DecayMode::Linear => "linear",
            DecayMode::Exponential => "exponential",
            DecayMode::Cosine => "cosine",
        }
    }
}

impl Display for DecayMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DecayMode {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(DecayMode::Linear),
            "exponential" => Ok(DecayMode::Exponential),
            "cosine" => Ok(DecayMode::Cosine),
            other => Err(ScheduleError::invalid(format!(
                "unsupported decay mode `{}`",
                other
            ))),
        }
    }
}

impl TryFrom<String> for DecayMode {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DecayMode> for String {
    fn from(mode: DecayMode) -> Self {
        mode.name().to_owned()
    }
}

/// Per-section bounds of the learning rate.
///
/// The floor of section `i` is the ceiling of section `i + 1`. It is never clamped, so the
/// last section's floor extrapolates the envelope one section past `n_sections`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayProfile {
    mode: DecayMode,
    lr_max: f64,
    lr_min: f64,
    n_sections: i64,
}

impl DecayProfile {
    pub fn new(mode: DecayMode, lr_max: f64, lr_min: f64, n_sections: i64) -> Self {
        Self {
            mode,
            lr_max,
            lr_min,
            n_sections,
        }
    }

    pub fn mode(&self) -> DecayMode {
        self.mode
    }

    pub fn ceiling(&self, section_index: i64) -> f64 {
        let log_lr_max = self.lr_max.ln();
        let log_lr_min = self.lr_min.ln();
        let i = section_index as f64;
        let n = self.n_sections as f64;

        match self.mode {
            DecayMode::Linear => self.lr_max * (n / 10.0).min(0.9).powf(i),
            DecayMode::Exponential => (log_lr_max - (log_lr_max - log_lr_min) * (i / n)).exp(),
            DecayMode::Cosine => {
                let ease = (1.0 + (PI * 0.25 * i / n).cos()) / 2.0;
                (log_lr_min + (log_lr_max - log_lr_min) * ease).exp()
            }
        }
    }

    pub fn floor(&self, section_index: i64) -> f64 {
        self.ceiling(section_index + 1)
    }

    /// Half the band width and its midline. Negative amplitude means the floor sits above
    /// the ceiling and the waveform is inverted.
    pub fn amplitude_height(&self, section_index: i64) -> (f64, f64) {
        let ceiling = self.ceiling(section_index);
        let floor = self.floor(section_index);
        let amplitude = (ceiling - floor) / 2.0;
        let height = ceiling - amplitude;
        (amplitude, height)
    }

    /// `(ceiling, floor)` of every section in order.
    pub fn envelopes(&self) -> Vec<(f64, f64)> {
        (0..=self.n_sections)
            .map(|i| self.ceiling(i))
            .tuple_windows()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parse_modes() {
        assert_eq!(
            "Exponential".parse::<DecayMode>().unwrap(),
            DecayMode::Exponential
        );
        assert_eq!("cosine".parse::<DecayMode>().unwrap(), DecayMode::Cosine);
        assert!(matches!(
            "polynomial".parse::<DecayMode>(),
            Err(ScheduleError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn linear_ratio_saturates() {
        let few = DecayProfile::new(DecayMode::Linear, 1.0, 0.5, 4);
        assert_relative_eq!(few.ceiling(2), 0.16, max_relative = 1e-12);
        let many = DecayProfile::new(DecayMode::Linear, 1.0, 0.5, 40);
        assert_relative_eq!(many.ceiling(2), 0.81, max_relative = 1e-12);
    }

    #[test]
    fn envelopes_chain() {
        let profile = DecayProfile::new(DecayMode::Exponential, 1e-2, 1e-4, 4);
        let envelopes = profile.envelopes();
        assert_eq!(envelopes.len(), 4);
        for pair in envelopes.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
