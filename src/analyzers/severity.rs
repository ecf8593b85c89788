//! PM2.5 severity classes and the binning rule that assigns them.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pollution level of a concentration, ordered from cleanest to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityClass {
    Good,
    Light,
    Medium,
    Heavy,
}

impl SeverityClass {
    pub const ALL: [SeverityClass; 4] = [
        SeverityClass::Good,
        SeverityClass::Light,
        SeverityClass::Medium,
        SeverityClass::Heavy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityClass::Good => "good",
            SeverityClass::Light => "light",
            SeverityClass::Medium => "medium",
            SeverityClass::Heavy => "heavy",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SeverityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds (inclusive) of the three lower classes.
///
/// | Range              | Class  |
/// |--------------------|--------|
/// | <= 35              | good   |
/// | (35, 75]           | light  |
/// | (75, 150]          | medium |
/// | > 150              | heavy  |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub good_max: f64,
    pub light_max: f64,
    pub medium_max: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            good_max: 35.0,
            light_max: 75.0,
            medium_max: 150.0,
        }
    }
}

impl SeverityThresholds {
    pub fn validate(&self) -> PipelineResult<()> {
        let finite = [self.good_max, self.light_max, self.medium_max]
            .iter()
            .all(|t| t.is_finite());
        if !finite || self.good_max >= self.light_max || self.light_max >= self.medium_max {
            return Err(PipelineError::Config(format!(
                "thresholds must be finite and strictly increasing, got {}/{}/{}",
                self.good_max, self.light_max, self.medium_max
            )));
        }
        Ok(())
    }

    pub fn classify(&self, concentration: f64) -> PipelineResult<SeverityClass> {
        match concentration {
            c if c.is_nan() => Err(PipelineError::InvalidInput(c)),
            c if c <= self.good_max => Ok(SeverityClass::Good),
            c if c <= self.light_max => Ok(SeverityClass::Light),
            c if c <= self.medium_max => Ok(SeverityClass::Medium),
            _ => Ok(SeverityClass::Heavy),
        }
    }

    /// Fraction of `values` falling into each class.
    pub fn percentage_by_class(&self, values: &[f64]) -> PipelineResult<ClassShares> {
        if values.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let counts = self.count_by_class(values)?;
        let total = values.len() as f64;
        Ok(ClassShares {
            good: counts.get(SeverityClass::Good) as f64 / total,
            light: counts.get(SeverityClass::Light) as f64 / total,
            medium: counts.get(SeverityClass::Medium) as f64 / total,
            heavy: counts.get(SeverityClass::Heavy) as f64 / total,
        })
    }

    pub fn count_by_class(&self, values: &[f64]) -> PipelineResult<ClassCounts> {
        let mut counts = ClassCounts::default();
        for &v in values {
            counts.add(self.classify(v)?);
        }
        Ok(counts)
    }
}

/// Classifies with the standard 35/75/150 cutoffs.
pub fn classify(concentration: f64) -> PipelineResult<SeverityClass> {
    SeverityThresholds::default().classify(concentration)
}

pub fn percentage_by_class(values: &[f64]) -> PipelineResult<ClassShares> {
    SeverityThresholds::default().percentage_by_class(values)
}

/// Number of observations per class. Absent classes count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts([usize; 4]);

impl ClassCounts {
    pub fn add(&mut self, class: SeverityClass) {
        self.0[class.index()] += 1;
    }

    pub fn get(&self, class: SeverityClass) -> usize {
        self.0[class.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassShares {
    pub heavy: f64,
    pub medium: f64,
    pub light: f64,
    pub good: f64,
}

impl ClassShares {
    pub fn sum(&self) -> f64 {
        self.heavy + self.medium + self.light + self.good
    }
}
