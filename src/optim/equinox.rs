use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use equinox_derive::ScheduleBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::decay::{DecayMode, DecayProfile};
use super::scheduler::SchedulerAlgorithm;
use super::section::{SectionMapper, SectionPosition};
use super::waveform::{WaveformUnit, DEFAULT_SERIES_ORDER};
use crate::core::{ParamGroupCell, ScheduleError};

/// Decaying asymmetric sinusoidal learning-rate schedule.
///
/// The run of `total_steps` is cut into `n_sections` sections. Each section owns a band
/// `[floor, ceiling]` given by the [`DecayProfile`], and within it the learning rate
/// oscillates `frequency_per_section` times along a [`WaveformUnit`]:
///
/// ```text
/// lr(step) = height(section) + unit(x_scaled) * amplitude(section)
/// ```
///
/// Steps past `total_steps` stay in the last section and keep oscillating in its band.
///
/// ```ignore
/// let mut scheduler = EquinoxLRBuilder::default()
///     .total_steps(1000)
///     .lr_max(1e-3)
///     .lr_min(1e-6)
///     .frequency_per_section(2)
///     .n_sections(10)
///     .decay_mode(DecayMode::Exponential)
///     .param_groups(param_groups!["encoder" => 1e-3, "head" => 1e-3])
///     .build()?;
/// let lr = scheduler.advance(None);
/// ```
#[derive(Debug, ScheduleBuilder)]
pub struct EquinoxLR {
    #[builder(setter(into))]
    total_steps: i64,
    #[builder(setter(into))]
    lr_max: f64,
    #[builder(setter(into))]
    lr_min: f64,
    #[builder(setter(into))]
    frequency_per_section: f64,
    #[builder(setter(into))]
    n_sections: i64,
    #[builder(default = "DecayMode::Linear")]
    decay_mode: DecayMode,
    /// Truncation order of the waveform series.
    #[builder(default = "DEFAULT_SERIES_ORDER")]
    series_order: usize,
    /// Step to resume from; `-1` starts a fresh run.
    #[builder(default = "-1")]
    last_step: i64,
    #[builder(default)]
    param_groups: Vec<ParamGroupCell>,

    last_lr: Option<f64>,
    mapper: SectionMapper,
    profile: DecayProfile,
    waveform: WaveformUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStatus {
    /// No step has been taken yet.
    Uninitialized,
    Running,
}

/// The part of a scheduler that changes during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub last_step: i64,
    pub last_lr: Option<f64>,
}

impl EquinoxLR {
    pub fn new(config: EquinoxLRConfig) -> Result<EquinoxLR, ScheduleError> {
        if config.total_steps <= 0 {
            return Err(ScheduleError::invalid(format!(
                "total_steps must be positive, got {}",
                config.total_steps
            )));
        }
        if config.n_sections < 1 {
            return Err(ScheduleError::invalid(format!(
                "n_sections must be at least 1, got {}",
                config.n_sections
            )));
        }
        for (name, value) in [
            ("lr_max", config.lr_max),
            ("lr_min", config.lr_min),
            ("frequency_per_section", config.frequency_per_section),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScheduleError::invalid(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }
        if config.lr_min > config.lr_max {
            return Err(ScheduleError::invalid(format!(
                "lr_min ({}) is greater than lr_max ({})",
                config.lr_min, config.lr_max
            )));
        }

        let section_length = (config.total_steps / config.n_sections).max(1);
        let waveform = WaveformUnit::new(config.series_order)?;
        let profile = DecayProfile::new(
            config.decay_mode,
            config.lr_max,
            config.lr_min,
            config.n_sections,
        );
        let mapper = SectionMapper::new(
            section_length,
            config.n_sections,
            config.frequency_per_section,
        );

        info!(
            total_steps = config.total_steps,
            n_sections = config.n_sections,
            section_length,
            lr_max = config.lr_max,
            lr_min = config.lr_min,
            frequency_per_section = config.frequency_per_section,
            decay_mode = %config.decay_mode,
            last_step = config.last_step,
            param_groups = config.param_groups.len(),
            "created equinox learning-rate schedule"
        );

        Ok(EquinoxLR {
            total_steps: config.total_steps,
            lr_max: config.lr_max,
            lr_min: config.lr_min,
            frequency_per_section: config.frequency_per_section,
            n_sections: config.n_sections,
            decay_mode: config.decay_mode,
            series_order: config.series_order,
            last_step: config.last_step,
            param_groups: config.param_groups,
            last_lr: None,
            mapper,
            profile,
            waveform,
        })
    }

    fn evaluate(&self, step: i64) -> (SectionPosition, f64) {
        let position = self.mapper.map(step);
        let (amplitude, height) = self.profile.amplitude_height(position.index);
        let lr = height + self.waveform.unit(position.x_scaled) * amplitude;
        (position, lr)
    }

    pub fn lr_at(&self, step: i64) -> f64 {
        self.evaluate(step).1
    }

    /// Learning rates for every step of `steps`.
    pub fn lr_curve<I>(&self, steps: I) -> Vec<f64>
    where
        I: IntoIterator<Item = i64>,
    {
        steps.into_iter().map(|step| self.lr_at(step)).collect()
    }

    /// Jump to `step` (or the next step when `None`) and write the new learning rate into
    /// every parameter group.
    pub fn advance(&mut self, step: Option<i64>) -> f64 {
        let step = step.unwrap_or(self.last_step + 1);
        if self.mapper.is_past_horizon(step) && !self.mapper.is_past_horizon(self.last_step) {
            debug!(
                step,
                total_steps = self.total_steps,
                "schedule past its horizon, holding the last section"
            );
        }

        let (position, lr) = self.evaluate(step);
        for group in &self.param_groups {
            group.lock().learning_rate = lr;
        }
        self.last_step = step;
        self.last_lr = Some(lr);

        trace!(
            step,
            section = position.index,
            lr,
            "advanced learning-rate schedule"
        );
        lr
    }

    /// Track another parameter group. It receives the learning rate from the next advance on.
    pub fn attach(&mut self, group: ParamGroupCell) {
        self.param_groups.push(group);
    }

    pub fn param_groups(&self) -> &[ParamGroupCell] {
        &self.param_groups
    }

    pub fn status(&self) -> ScheduleStatus {
        if self.last_step >= 0 {
            ScheduleStatus::Running
        } else {
            ScheduleStatus::Uninitialized
        }
    }

    pub fn last_step(&self) -> i64 {
        self.last_step
    }

    pub fn last_lr(&self) -> Option<f64> {
        self.last_lr
    }

    pub fn total_steps(&self) -> i64 {
        self.total_steps
    }

    pub fn n_sections(&self) -> i64 {
        self.n_sections
    }

    pub fn section_length(&self) -> i64 {
        self.mapper.section_length()
    }

    pub fn lr_max(&self) -> f64 {
        self.lr_max
    }

    pub fn lr_min(&self) -> f64 {
        self.lr_min
    }

    pub fn frequency_per_section(&self) -> f64 {
        self.frequency_per_section
    }

    pub fn decay_mode(&self) -> DecayMode {
        self.decay_mode
    }

    pub fn series_order(&self) -> usize {
        self.series_order
    }

    pub fn waveform(&self) -> &WaveformUnit {
        &self.waveform
    }

    pub fn profile(&self) -> &DecayProfile {
        &self.profile
    }

    pub fn mapper(&self) -> &SectionMapper {
        &self.mapper
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState {
            last_step: self.last_step,
            last_lr: self.last_lr,
        }
    }

    /// Restore the step counter. Parameter groups are left alone until the next advance.
    pub fn load_state(&mut self, state: SchedulerState) {
        self.last_step = state.last_step;
        self.last_lr = state.last_lr;
    }

    pub fn save_state<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.state())?;
        Ok(())
    }

    pub fn restore_state<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let state: SchedulerState = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed scheduler state {}", path.display()))?;
        self.load_state(state);
        Ok(())
    }
}

impl SchedulerAlgorithm for EquinoxLR {
    fn lr_at(&self, step: i64) -> f64 {
        EquinoxLR::lr_at(self, step)
    }

    fn step(&mut self, step: Option<i64>) -> f64 {
        self.advance(step)
    }

    fn last_step(&self) -> i64 {
        self.last_step
    }
}
