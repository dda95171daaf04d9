//! Exponentially weighted statistics with adjusted weights.
//!
//! Matches `pandas.Series.ewm(..., adjust=True)` on a gap-free series: the
//! observation `i` of `n` gets weight `(1 - alpha)^(n - 1 - i)`, and the
//! standard deviation carries the weighted bias correction
//! `(sum w)^2 / ((sum w)^2 - sum w^2)`.

use serde::{Deserialize, Serialize};

/// How the smoothing factor is specified.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decay {
    /// Center of mass: `alpha = 1 / (1 + com)`, `com >= 0`.
    Com(f64),
    /// Span: `alpha = 2 / (span + 1)`, `span >= 1`.
    Span(f64),
    /// Smoothing factor directly, `0 < alpha <= 1`.
    Alpha(f64),
}

impl Decay {
    pub fn alpha(self) -> Option<f64> {
        let alpha = match self {
            Decay::Com(com) if com >= 0.0 => 1.0 / (1.0 + com),
            Decay::Span(span) if span >= 1.0 => 2.0 / (span + 1.0),
            Decay::Alpha(alpha) if alpha > 0.0 && alpha <= 1.0 => alpha,
            _ => return None,
        };
        alpha.is_finite().then_some(alpha)
    }
}

/// Weighted moments of a series evaluated at its last point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EwmStats {
    pub mean: f64,
    /// `None` with fewer than two observations or no effective degrees of freedom.
    pub std: Option<f64>,
}

/// EWM mean and bias-corrected std at the last observation.
///
/// Returns `None` for an empty series or an invalid decay.
pub fn ewm_last(values: &[f64], decay: Decay) -> Option<EwmStats> {
    let alpha = decay.alpha()?;
    if values.is_empty() {
        return None;
    }
    let keep = 1.0 - alpha;

    // Walk newest -> oldest so the newest weight is exactly 1.
    let mut w = 1.0f64;
    let mut sum_w = 0.0f64;
    let mut sum_w2 = 0.0f64;
    let mut sum_wx = 0.0f64;
    for &x in values.iter().rev() {
        sum_w += w;
        sum_w2 += w * w;
        sum_wx += w * x;
        w *= keep;
    }
    let mean = sum_wx / sum_w;

    let std = if values.len() < 2 {
        None
    } else {
        let mut w = 1.0f64;
        let mut sum_wdev2 = 0.0f64;
        for &x in values.iter().rev() {
            let d = x - mean;
            sum_wdev2 += w * d * d;
            w *= keep;
        }
        let biased = sum_wdev2 / sum_w;
        let numer = sum_w * sum_w;
        let denom = numer - sum_w2;
        if denom > 0.0 {
            let var = (numer / denom) * biased;
            Some(var.max(0.0).sqrt())
        } else {
            None
        }
    };

    Some(EwmStats { mean, std })
}

pub fn ewm_mean(values: &[f64], decay: Decay) -> Option<f64> {
    ewm_last(values, decay).map(|s| s.mean)
}
