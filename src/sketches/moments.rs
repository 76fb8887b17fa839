// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::enums::SketchKind;
use crate::traits::{Mergeable, Sketch, SketchError};
use serde::{Deserialize, Serialize};

/// Moments - Streaming Summary Statistics
///
/// Keeps the count, mean and the second to fourth central moment sums of a stream of `f64`
/// observations. From these it derives mean, variance, standard deviation, skewness and
/// excess kurtosis without keeping the observations.
///
/// # Merging
///
/// Two summaries combine with the pairwise update of Chan et al. extended to the third and
/// fourth moments. The result matches a summary built from the concatenated streams up to
/// floating-point rounding, so the merge laws hold within a relative tolerance rather than
/// bit for bit.
///
/// # Example
///
/// ```
/// use stream_sketches::{Mergeable, Moments};
///
/// let a = Moments::from_values([1.0, 2.0]);
/// let b = Moments::from_values([3.0, 4.0, 5.0]);
/// let all = a.combine(&b).unwrap();
///
/// assert_eq!(all.count(), 5);
/// assert!((all.mean().unwrap() - 3.0).abs() < 1e-12);
/// assert!((all.population_variance().unwrap() - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Moments {
    count: u64,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Moments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(x: f64) -> Self {
        let mut moments = Self::new();
        moments.add(x);
        moments
    }

    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut moments = Self::new();
        for x in values {
            moments.add(x);
        }
        moments
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Folds one observation in.
    pub fn add(&mut self, x: f64) {
        let n1 = self.count as f64;
        self.count += 1;
        let n = self.count as f64;

        let delta = x - self.mean;
        let delta_n = delta / n;
        let delta_n2 = delta_n * delta_n;
        let term1 = delta * delta_n * n1;

        self.mean += delta_n;
        self.m4 += term1 * delta_n2 * (n * n - 3.0 * n + 3.0) + 6.0 * delta_n2 * self.m2
            - 4.0 * delta_n * self.m3;
        self.m3 += term1 * delta_n * (n - 2.0) - 3.0 * delta_n * self.m2;
        self.m2 += term1;
    }

    fn require(&self, min: u64, what: &str) -> Result<(), SketchError> {
        if self.count < min {
            return Err(SketchError::InsufficientData(format!(
                "{} needs at least {} observation(s), have {}",
                what, min, self.count
            )));
        }
        Ok(())
    }

    pub fn mean(&self) -> Result<f64, SketchError> {
        self.require(1, "mean")?;
        Ok(self.mean)
    }

    /// `M2 / n`
    pub fn population_variance(&self) -> Result<f64, SketchError> {
        self.require(1, "population variance")?;
        Ok(self.m2 / self.count as f64)
    }

    /// `M2 / (n - 1)`
    pub fn sample_variance(&self) -> Result<f64, SketchError> {
        self.require(2, "sample variance")?;
        Ok(self.m2 / (self.count - 1) as f64)
    }

    /// Population standard deviation.
    pub fn stddev(&self) -> Result<f64, SketchError> {
        self.population_variance().map(f64::sqrt)
    }

    fn require_spread(&self, what: &str) -> Result<(), SketchError> {
        self.require(1, what)?;
        if self.m2 == 0.0 {
            return Err(SketchError::InsufficientData(format!(
                "{} is undefined for zero variance",
                what
            )));
        }
        Ok(())
    }

    /// `sqrt(n) * M3 / M2^1.5`
    pub fn skewness(&self) -> Result<f64, SketchError> {
        self.require_spread("skewness")?;
        let n = self.count as f64;
        Ok(n.sqrt() * self.m3 / self.m2.powf(1.5))
    }

    /// Excess kurtosis, `n * M4 / M2^2 - 3`.
    pub fn kurtosis(&self) -> Result<f64, SketchError> {
        self.require_spread("kurtosis")?;
        let n = self.count as f64;
        Ok(n * self.m4 / (self.m2 * self.m2) - 3.0)
    }
}

impl Mergeable for Moments {
    type Config = ();

    fn zero(_config: &Self::Config) -> Result<Self, SketchError> {
        Ok(Self::new())
    }

    fn config(&self) -> Self::Config {}

    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if other.count == 0 {
            return Ok(());
        }
        if self.count == 0 {
            *self = *other;
            return Ok(());
        }

        let na = self.count as f64;
        let nb = other.count as f64;
        let n = na + nb;
        let delta = other.mean - self.mean;
        let delta2 = delta * delta;
        let delta3 = delta2 * delta;
        let delta4 = delta2 * delta2;

        let m2 = self.m2 + other.m2 + delta2 * na * nb / n;
        let m3 = self.m3
            + other.m3
            + delta3 * na * nb * (na - nb) / (n * n)
            + 3.0 * delta * (na * other.m2 - nb * self.m2) / n;
        let m4 = self.m4
            + other.m4
            + delta4 * na * nb * (na * na - na * nb + nb * nb) / (n * n * n)
            + 6.0 * delta2 * (na * na * other.m2 + nb * nb * self.m2) / (n * n)
            + 4.0 * delta * (na * other.m3 - nb * self.m3) / n;

        self.count = self.count.saturating_add(other.count);
        self.mean += delta * nb / n;
        self.m2 = m2;
        self.m3 = m3;
        self.m4 = m4;
        Ok(())
    }
}

impl Sketch for Moments {
    const KIND: SketchKind = SketchKind::Moments;

    fn validate(&self) -> Result<(), SketchError> {
        let fields = [self.mean, self.m2, self.m3, self.m4];
        if fields.iter().any(|v| v.is_nan()) {
            return Err(SketchError::InvalidInput("Moment sums contain NaN".into()));
        }
        if self.m2 < 0.0 || self.m4 < 0.0 {
            return Err(SketchError::InvalidInput(
                "Even moment sums must be non-negative".into(),
            ));
        }
        if self.count == 0 && fields.iter().any(|&v| v != 0.0) {
            return Err(SketchError::InvalidInput(
                "Empty summary carries non-zero moments".into(),
            ));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.count == 0
    }
}
