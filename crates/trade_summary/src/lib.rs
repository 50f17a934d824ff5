//! Account statistics over extracted trade records.

use chrono::{DateTime, Utc};
use models::{TradeRecord, TradeSummary};
use tracing::debug;

fn is_long(record: &TradeRecord) -> bool {
    record.kind.trim().to_ascii_lowercase().starts_with("buy")
}

fn is_short(record: &TradeRecord) -> bool {
    record.kind.trim().to_ascii_lowercase().starts_with("sell")
}

/// Computes the statement summary block for `records`.
///
/// Drawdown figures follow the balance curve `initial_balance + cumulative
/// result`, walked in close-time order.
pub fn summarize(records: &[TradeRecord], initial_balance: f64) -> TradeSummary {
    let mut summary = TradeSummary {
        total_trades: records.len(),
        ..TradeSummary::default()
    };

    for record in records {
        let result = record.net_result();

        if is_long(record) {
            summary.long_positions += 1;
        } else if is_short(record) {
            summary.short_positions += 1;
        }

        if result > 0.0 {
            summary.profit_trades += 1;
            summary.gross_profit += result;
        } else if result < 0.0 {
            summary.loss_trades += 1;
            summary.gross_loss += result;
        }
    }

    summary.net_profit = summary.gross_profit + summary.gross_loss;
    if summary.gross_loss < 0.0 {
        summary.profit_factor = summary.gross_profit / summary.gross_loss.abs();
    }
    if summary.total_trades > 0 {
        summary.expected_payoff = summary.net_profit / summary.total_trades as f64;
    }

    let (maximal, relative) = drawdown(records, initial_balance);
    summary.maximal_drawdown = maximal;
    summary.relative_drawdown = relative;

    debug!(
        trades = summary.total_trades,
        net_profit = summary.net_profit,
        "Computed trade summary"
    );
    summary
}

/// Close-time order; records without a close time keep their order at the end.
fn close_order(records: &[TradeRecord]) -> Vec<&TradeRecord> {
    let mut ordered: Vec<&TradeRecord> = records.iter().collect();
    ordered.sort_by_key(|r| close_key(r.close_time));
    ordered
}

fn close_key(close_time: Option<DateTime<Utc>>) -> (bool, Option<DateTime<Utc>>) {
    (close_time.is_none(), close_time)
}

/// Returns (largest peak-to-trough drop, largest drop in percent of its peak).
fn drawdown(records: &[TradeRecord], initial_balance: f64) -> (f64, f64) {
    let mut balance = initial_balance;
    let mut peak = initial_balance;
    let mut maximal = 0.0_f64;
    let mut relative = 0.0_f64;

    for record in close_order(records) {
        balance += record.net_result();
        if balance > peak {
            peak = balance;
            continue;
        }

        let drop = peak - balance;
        maximal = maximal.max(drop);
        if peak > 0.0 {
            relative = relative.max(drop / peak * 100.0);
        }
    }

    (maximal, relative)
}
