/// Where a step falls within the sectioned schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPosition {
    /// Section whose envelope applies, frozen at the last section past the horizon.
    pub index: i64,
    /// Progress through the section, scaled to waveform cycles.
    pub x_scaled: f64,
}

/// Splits the step axis into sections of equal length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionMapper {
    section_length: i64,
    n_sections: i64,
    frequency_per_section: f64,
}

impl SectionMapper {
    pub fn new(section_length: i64, n_sections: i64, frequency_per_section: f64) -> Self {
        Self {
            section_length,
            n_sections,
            frequency_per_section,
        }
    }

    pub fn section_length(&self) -> i64 {
        self.section_length
    }

    pub fn n_sections(&self) -> i64 {
        self.n_sections
    }

    /// Steps past the last full section keep the last section's envelope and continue
    /// cycling in phase.
    pub fn is_past_horizon(&self, step: i64) -> bool {
        step.div_euclid(self.section_length) > self.n_sections - 1
    }

    pub fn map(&self, step: i64) -> SectionPosition {
        let raw_index = step.div_euclid(self.section_length);
        let x = step.rem_euclid(self.section_length);
        SectionPosition {
            index: raw_index.min(self.n_sections - 1),
            x_scaled: (x as f64 / self.section_length as f64) * self.frequency_per_section,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_within_horizon() {
        let mapper = SectionMapper::new(20, 5, 2.0);
        let position = mapper.map(45);
        assert_eq!(position.index, 2);
        assert_eq!(position.x_scaled, 0.5);
    }

    #[test]
    fn freezes_past_horizon() {
        let mapper = SectionMapper::new(20, 5, 1.0);
        assert_eq!(mapper.map(99).index, 4);
        assert_eq!(mapper.map(100).index, 4);
        assert_eq!(mapper.map(100).x_scaled, 0.0);
        assert_eq!(mapper.map(10_000).index, 4);
        assert!(!mapper.is_past_horizon(99));
        assert!(mapper.is_past_horizon(100));
    }

    #[test]
    fn negative_steps_use_floor_division() {
        let mapper = SectionMapper::new(10, 3, 1.0);
        let position = mapper.map(-1);
        assert_eq!(position.index, -1);
        assert_eq!(position.x_scaled, 0.9);
    }
}
