//! Calibration point bookkeeping and least-squares fitting.
//!
//! The device converts raw counts with `actual = (raw - offset) / scale`.
//! Operator-entered `(raw, actual)` pairs are fitted as `actual = a*raw + b`
//! by ordinary least squares and inverted to that model:
//! `scale = 1/a`, `offset = -b/a`.

use crate::error::{CoreError, Result};
use crate::util::{mean_of, round_to};

/// Decimal places used for operator-facing scale/offset values.
pub const DISPLAY_DECIMALS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub raw: f64,
    pub actual: f64,
}

/// The device-side calibration: `actual = (raw - offset) / scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    /// Raw counts per unit of weight.
    pub scale: f64,
    /// Raw reading at zero load.
    pub offset: f64,
}

impl CalibrationModel {
    pub fn new(scale: f64, offset: f64) -> Result<Self> {
        if !scale.is_finite() || scale == 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "scale must be finite and non-zero, got {scale}"
            )));
        }
        if !offset.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "offset must be finite, got {offset}"
            )));
        }
        Ok(Self { scale, offset })
    }

    pub fn weight_of(&self, raw: f64) -> f64 {
        (raw - self.offset) / self.scale
    }

    pub fn raw_for(&self, actual: f64) -> f64 {
        actual * self.scale + self.offset
    }
}

/// Outcome of a successful fit, in full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// `a` in `actual = a*raw + b`
    pub slope: f64,
    /// `b` in `actual = a*raw + b`
    pub intercept: f64,
    pub scale: f64,
    pub offset: f64,
    /// Coefficient of determination over the fitted points.
    pub r_squared: f64,
    pub points_used: usize,
}

impl FitResult {
    /// Scale and offset rounded to `DISPLAY_DECIMALS` for presentation.
    pub fn rounded(&self) -> Self {
        Self {
            scale: round_to(self.scale, DISPLAY_DECIMALS),
            offset: round_to(self.offset, DISPLAY_DECIMALS),
            ..*self
        }
    }

    pub fn model(&self) -> CalibrationModel {
        CalibrationModel {
            scale: self.scale,
            offset: self.offset,
        }
    }

    /// Weight predicted for `raw` by the fitted line.
    pub fn predict(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }

    /// Raw reading the fitted line maps to `actual`.
    pub fn raw_for(&self, actual: f64) -> f64 {
        self.model().raw_for(actual)
    }
}

/// Accumulates calibration points and keeps a fit current.
///
/// Points stay in insertion order. The zero weight, when set, only filters
/// which points feed the regression; it never removes points.
#[derive(Debug, Clone)]
pub struct CalibrationFitter {
    points: Vec<CalibrationPoint>,
    zero_weight: Option<f64>,
    fit: Result<FitResult>,
}

impl Default for CalibrationFitter {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationFitter {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            zero_weight: None,
            fit: Err(CoreError::InsufficientData { usable: 0 }),
        }
    }

    pub fn add_point(&mut self, raw: f64, actual: f64) -> Result<()> {
        if !raw.is_finite() || !actual.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "calibration point must be finite, got raw={raw} actual={actual}"
            )));
        }
        self.points.push(CalibrationPoint { raw, actual });
        self.refresh();
        Ok(())
    }

    pub fn remove_point(&mut self, index: usize) -> Result<CalibrationPoint> {
        if index >= self.points.len() {
            return Err(CoreError::IndexOutOfRange {
                index,
                len: self.points.len(),
            });
        }
        let removed = self.points.remove(index);
        self.refresh();
        Ok(removed)
    }

    pub fn set_zero_weight(&mut self, zero_weight: Option<f64>) -> Result<()> {
        if let Some(z) = zero_weight
            && !z.is_finite()
        {
            return Err(CoreError::InvalidInput(format!(
                "zero weight must be finite, got {z}"
            )));
        }
        self.zero_weight = zero_weight;
        self.refresh();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.refresh();
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn zero_weight(&self) -> Option<f64> {
        self.zero_weight
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points that feed the regression, in insertion order.
    pub fn usable_points(&self) -> impl Iterator<Item = &CalibrationPoint> {
        let zero = self.zero_weight;
        self.points
            .iter()
            .filter(move |p| zero.is_none_or(|z| p.actual != z))
    }

    /// Fit as of the last mutation.
    pub fn fit(&self) -> Result<FitResult> {
        self.fit.clone()
    }

    /// Residual `actual - predicted` for every point, excluded ones included.
    pub fn residuals(&self) -> Result<Vec<f64>> {
        let fit = self.fit.clone()?;
        Ok(self
            .points
            .iter()
            .map(|p| p.actual - fit.predict(p.raw))
            .collect())
    }

    fn refresh(&mut self) {
        self.fit = self.compute_fit();
    }

    /// Least-squares fit over the usable points. Does not mutate state.
    pub fn compute_fit(&self) -> Result<FitResult> {
        let pts: Vec<CalibrationPoint> = self.usable_points().copied().collect();
        if pts.len() < 2 {
            return Err(CoreError::InsufficientData { usable: pts.len() });
        }
        let first_raw = pts[0].raw;
        if pts.iter().all(|p| p.raw == first_raw) {
            return Err(CoreError::DegenerateFit(
                "all raw values are identical (zero variance)",
            ));
        }

        // Centered sums: same slope as n*Sxy - Sx*Sy over n*Sxx - Sx^2,
        // without cancellation at large raw counts.
        let mean_x = mean_of(pts.iter().map(|p| p.raw));
        let mean_y = mean_of(pts.iter().map(|p| p.actual));
        let mut sxx = 0.0f64;
        let mut sxy = 0.0f64;
        let mut syy = 0.0f64;
        for p in &pts {
            let dx = p.raw - mean_x;
            let dy = p.actual - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        if !sxx.is_finite() || !sxy.is_finite() || !syy.is_finite() {
            return Err(CoreError::DegenerateFit(
                "raw or actual values too large to fit",
            ));
        }
        if sxx <= 0.0 {
            return Err(CoreError::DegenerateFit("raw variance is zero"));
        }
        let a = sxy / sxx;
        if !a.is_finite() {
            return Err(CoreError::DegenerateFit("non-finite slope"));
        }
        if a == 0.0 {
            return Err(CoreError::DegenerateFit("zero slope (scale undefined)"));
        }
        let b = mean_y - a * mean_x;
        let scale = 1.0 / a;
        let offset = -b / a;
        if !scale.is_finite() || !offset.is_finite() {
            return Err(CoreError::DegenerateFit("scale or offset out of range"));
        }
        // Correlation first; the product sxx*syy can overflow where r cannot
        let r_squared = if syy > 0.0 {
            let r = sxy / (sxx.sqrt() * syy.sqrt());
            (r * r).min(1.0)
        } else {
            1.0
        };

        Ok(FitResult {
            slope: a,
            intercept: b,
            scale,
            offset,
            r_squared,
            points_used: pts.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_round_trips_raw_and_weight() {
        let m = CalibrationModel::new(420.0, 8400.0).unwrap();
        assert_eq!(m.raw_for(100.0), 50_400.0);
        assert_eq!(m.weight_of(50_400.0), 100.0);
    }

    #[test]
    fn model_rejects_zero_scale() {
        assert!(matches!(
            CalibrationModel::new(0.0, 1.0),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn new_fitter_reports_no_points() {
        let f = CalibrationFitter::new();
        assert_eq!(f.fit(), Err(CoreError::InsufficientData { usable: 0 }));
    }
}
