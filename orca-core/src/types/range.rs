use crate::parser::error::{OrcaError, Result};
use std::fmt;

/// A half-open numeric range `start..end..step`.
///
/// The step is always resolved at construction, so a `Range` is immutable and
/// every call to [`Range::iter`] restarts from `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Range {
    /// Build a range, inferring the step from the direction when it is absent.
    ///
    /// Errors when a bound is not finite, the step is zero or not finite, or
    /// the step points away from `end`.
    pub fn new(start: f64, end: f64, step: Option<f64>) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(OrcaError::InvalidRange(format!(
                "bounds must be finite numbers, got {}..{}",
                start, end
            )));
        }

        let step = match step {
            Some(step) => {
                if step == 0.0 || !step.is_finite() {
                    return Err(OrcaError::InvalidRange(format!(
                        "step must be a non-zero finite number, got {}",
                        step
                    )));
                }
                if (end > start && step < 0.0) || (end < start && step > 0.0) {
                    return Err(OrcaError::InvalidRange(format!(
                        "step {} never reaches {} from {}",
                        step, end, start
                    )));
                }
                step
            }
            None if end < start => -1.0,
            None => 1.0,
        };

        Ok(Range { start, end, step })
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter {
            range: *self,
            index: 0,
        }
    }

    /// Number of values the range yields
    pub fn len(&self) -> usize {
        let span = (self.end - self.start) / self.step;
        if span <= 0.0 {
            0
        } else {
            span.ceil() as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for &Range {
    type Item = f64;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

/// Iterator over the values of a [`Range`]
#[derive(Debug, Clone)]
pub struct RangeIter {
    range: Range,
    index: usize,
}

impl Iterator for RangeIter {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        // computed from the index so decimal steps do not accumulate error
        let value = self.range.start + self.index as f64 * self.range.step;
        let within = if self.range.step > 0.0 {
            value < self.range.end
        } else {
            value > self.range.end
        };

        if within {
            self.index += 1;
            Some(value)
        } else {
            None
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::types::value::format_number;
        write!(
            f,
            "{}..{}..{}",
            format_number(self.start),
            format_number(self.end),
            format_number(self.step)
        )
    }
}
