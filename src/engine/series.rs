//! Synthetic trend series for display.
//!
//! The points produced here are a *display approximation*: a straight-line
//! ramp from around the historical average up to the current value. They
//! are not measured history and must never be presented as such.

use crate::error::{EngineError, EngineResult};

/// One synthetic point: a time label and an estimated value.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Builds the synthetic series for `labels`.
///
/// Values ramp linearly from `historical_avg - spread_ratio ×
/// historical_avg` to `current`, one value per label in ascending time
/// order. The final point's value is `current` exactly (assigned, not
/// interpolated, so no float drift). The returned [`Projection`] yields
/// exactly `labels.len()` points, lazily, and can be iterated any number
/// of times via [`Projection::points`].
///
/// # Errors
///
/// `Validation` if `labels` is empty, `historical_avg` is negative or
/// non-finite, `current` is non-finite, or `spread_ratio` lies outside
/// `[0, 1]`.
pub fn project_series(
    current: f64,
    historical_avg: f64,
    labels: &[String],
    spread_ratio: f64,
) -> EngineResult<Projection> {
    if labels.is_empty() {
        return Err(EngineError::Validation(
            "projection label set is empty".to_string(),
        ));
    }
    if !historical_avg.is_finite() || historical_avg < 0.0 {
        return Err(EngineError::Validation(format!(
            "historical average is {historical_avg}: expected a non-negative finite number"
        )));
    }
    if !current.is_finite() {
        return Err(EngineError::Validation(format!(
            "current value is {current}: expected a finite number"
        )));
    }
    if !spread_ratio.is_finite() || !(0.0..=1.0).contains(&spread_ratio) {
        return Err(EngineError::Validation(format!(
            "spread ratio {spread_ratio} lies outside [0, 1]"
        )));
    }

    let spread = spread_ratio * historical_avg;
    Ok(Projection {
        start: historical_avg - spread,
        current,
        labels: labels.to_vec(),
    })
}

/// A validated projection: a finite, restartable sequence of synthetic
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    start: f64,
    current: f64,
    labels: Vec<String>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Starts a fresh pass over the points. Each call restarts from the
    /// first label.
    pub fn points(&self) -> Points<'_> {
        Points {
            projection: self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for &'a Projection {
    type Item = SeriesPoint;
    type IntoIter = Points<'a>;

    fn into_iter(self) -> Points<'a> {
        self.points()
    }
}

/// Lazy iterator over one pass of a [`Projection`].
#[derive(Debug, Clone)]
pub struct Points<'a> {
    projection: &'a Projection,
    next: usize,
}

impl Iterator for Points<'_> {
    type Item = SeriesPoint;

    fn next(&mut self) -> Option<SeriesPoint> {
        let i = self.next;
        let n = self.projection.labels.len();
        if i >= n {
            return None;
        }
        self.next += 1;

        let value = if i + 1 == n {
            self.projection.current
        } else {
            let t = i as f64 / (n - 1) as f64;
            self.projection.start + (self.projection.current - self.projection.start) * t
        };
        Some(SeriesPoint {
            label: self.projection.labels[i].clone(),
            value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.projection.labels.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Points<'_> {}
