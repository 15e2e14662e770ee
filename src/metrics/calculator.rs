//! Calculator for journal metrics: win rate, profit factor, drawdown, streaks.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::statistics::Statistics;

use super::JournalMetrics;
use crate::models::{Position, PositionStatus};

pub struct JournalCalculator;

impl JournalCalculator {
    /// Metrics over the closed positions that have a P&L, in close order.
    pub fn calculate(positions: &[Position]) -> JournalMetrics {
        let mut metrics = JournalMetrics::default();

        let mut closed: Vec<&Position> = positions
            .iter()
            .filter(|p| p.status == PositionStatus::Closed)
            .filter(|p| p.realized_pnl_or_computed().is_some())
            .collect();

        if closed.is_empty() {
            return metrics;
        }

        closed.sort_by_key(|p| p.closed_at.unwrap_or(p.created_at));

        let pnls: Vec<Decimal> = closed
            .iter()
            .filter_map(|p| p.realized_pnl_or_computed())
            .collect();

        metrics.closed_trades = pnls.len() as u32;
        metrics.total_fees = closed.iter().map(|p| p.fees).sum();

        Self::calculate_pnl_metrics(&mut metrics, &pnls);
        Self::calculate_drawdown(&mut metrics, &pnls);
        Self::calculate_streaks(&mut metrics, &pnls);
        Self::calculate_dispersion(&mut metrics, &pnls);

        let ratios: Vec<Decimal> = closed.iter().filter_map(|p| p.actual_risk_reward).collect();
        if !ratios.is_empty() {
            metrics.average_risk_reward =
                Some(ratios.iter().copied().sum::<Decimal>() / Decimal::from(ratios.len()));
        }

        metrics
    }

    fn calculate_pnl_metrics(metrics: &mut JournalMetrics, pnls: &[Decimal]) {
        let wins: Vec<Decimal> = pnls.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
        let losses: Vec<Decimal> = pnls.iter().copied().filter(|p| *p < Decimal::ZERO).collect();

        metrics.winning_trades = wins.len() as u32;
        metrics.losing_trades = losses.len() as u32;
        metrics.breakeven_trades = metrics.closed_trades - metrics.winning_trades - metrics.losing_trades;
        metrics.win_rate = wins.len() as f64 / pnls.len() as f64 * 100.0;

        metrics.total_pnl = pnls.iter().copied().sum();
        metrics.average_pnl = metrics.total_pnl / Decimal::from(pnls.len());
        metrics.best_trade = pnls.iter().copied().max();
        metrics.worst_trade = pnls.iter().copied().min();

        let gross_profit: Decimal = wins.iter().copied().sum();
        let gross_loss: Decimal = losses.iter().map(|l| l.abs()).sum();

        if !wins.is_empty() {
            metrics.avg_win = gross_profit / Decimal::from(wins.len());
        }
        if !losses.is_empty() {
            metrics.avg_loss = gross_loss / Decimal::from(losses.len());
        }

        if gross_loss > Decimal::ZERO {
            metrics.profit_factor =
                Some(gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0));
        }

        // Win-rate weighted average outcome
        let win_ratio = Decimal::from(wins.len()) / Decimal::from(pnls.len());
        let loss_ratio = Decimal::from(losses.len()) / Decimal::from(pnls.len());
        metrics.expectancy = win_ratio * metrics.avg_win - loss_ratio * metrics.avg_loss;
    }

    /// Largest fall of the cumulative P&L curve from a previous high.
    fn calculate_drawdown(metrics: &mut JournalMetrics, pnls: &[Decimal]) {
        let mut equity = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_dd = Decimal::ZERO;
        let mut max_dd_pct = 0.0f64;

        for pnl in pnls {
            equity += pnl;

            if equity > peak {
                peak = equity;
            }

            let dd = peak - equity;
            if dd > max_dd {
                max_dd = dd;
            }

            if peak > Decimal::ZERO {
                let dd_pct = dd.to_f64().unwrap_or(0.0) / peak.to_f64().unwrap_or(1.0);
                if dd_pct > max_dd_pct {
                    max_dd_pct = dd_pct;
                }
            }
        }

        metrics.max_drawdown = max_dd;
        metrics.max_drawdown_pct = max_dd_pct;
    }

    fn calculate_streaks(metrics: &mut JournalMetrics, pnls: &[Decimal]) {
        let mut wins = 0u32;
        let mut losses = 0u32;

        for pnl in pnls {
            if *pnl > Decimal::ZERO {
                wins += 1;
                losses = 0;
            } else if *pnl < Decimal::ZERO {
                losses += 1;
                wins = 0;
            } else {
                wins = 0;
                losses = 0;
            }
            metrics.longest_win_streak = metrics.longest_win_streak.max(wins);
            metrics.longest_loss_streak = metrics.longest_loss_streak.max(losses);
        }
    }

    fn calculate_dispersion(metrics: &mut JournalMetrics, pnls: &[Decimal]) {
        if pnls.len() < 2 {
            return;
        }

        let values: Vec<f64> = pnls.iter().filter_map(|p| p.to_f64()).collect();
        let std_dev = values.std_dev();
        if std_dev.is_finite() {
            metrics.pnl_std_dev = Some(std_dev);
        }
    }
}
