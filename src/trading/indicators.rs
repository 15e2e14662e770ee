//! Chart overlay indicators over a candle series.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Candle;

/// One point of an indicator line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmaPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Lazy exponential moving average over candle closes.
///
/// The first point is the simple average of the first `period` closes and
/// lands on candle `period - 1`; every following candle applies
/// `ema = close * k + prev * (1 - k)` with `k = 2 / (period + 1)`.
pub struct Ema<'a> {
    candles: &'a [Candle],
    period: usize,
    k: f64,
    next: usize,
    prev: Option<f64>,
}

/// EMA of `candles`; yields `len - period + 1` points, none if the series is too short.
pub fn ema(candles: &[Candle], period: usize) -> Ema<'_> {
    Ema {
        candles,
        period,
        k: 2.0 / (period as f64 + 1.0),
        next: period.saturating_sub(1),
        prev: None,
    }
}

impl<'a> Ema<'a> {
    fn remaining(&self) -> usize {
        if self.period == 0 || self.candles.len() < self.period {
            return 0;
        }
        self.candles.len().saturating_sub(self.next)
    }
}

impl<'a> Iterator for Ema<'a> {
    type Item = EmaPoint;

    fn next(&mut self) -> Option<EmaPoint> {
        if self.remaining() == 0 {
            return None;
        }

        let candle = &self.candles[self.next];
        let value = match self.prev {
            None => {
                let seed: f64 = self.candles[..self.period].iter().map(|c| c.close).sum();
                seed / self.period as f64
            }
            Some(prev) => candle.close * self.k + prev * (1.0 - self.k),
        };

        self.prev = Some(value);
        self.next += 1;

        Some(EmaPoint {
            time: candle.time,
            value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for Ema<'a> {}
