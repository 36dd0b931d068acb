//! Plain-text report tables.
//!
//! Every function writes to any `io::Write` so tests can capture output.

use std::io::{self, Write};

use coinfolio::rebalance::RebalanceAmounts;
use coinfolio::{BacktestResults, Coin, RiskAnalysis, Timestamp, to_datetime};

/// `YYYY-MM-DD`, or the raw number if out of range.
pub fn format_date(ts: Timestamp) -> String {
    to_datetime(ts)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Backtest summary: one line per strategy variant, then per-coin holdings.
pub fn write_backtest<W: Write>(w: &mut W, results: &BacktestResults) -> io::Result<()> {
    writeln!(
        w,
        "BACKTEST {} to {}: {} steps, initial ${:.2}, rebalance period ~{:.1} steps",
        format_date(results.from),
        format_date(results.to),
        results.len(),
        results.initial_value,
        results.rebalance_period_steps,
    )?;

    writeln!(w, "\nPORTFOLIO:")?;
    writeln!(
        w,
        "  {:32} {:>12} {:>9} {:>12} {:10} {:>12} {:10} {:>6}",
        "Strategy", "Final", "Profit", "Min", "Min date", "Max", "Max date", "Snaps"
    )?;
    for (slot, variant) in results.variants.iter().enumerate() {
        let Some(last) = results.portfolio.last().map(|r| &r.totals[slot]) else {
            continue;
        };
        let Some(mm) = results.stats.portfolio.get(variant) else {
            continue;
        };
        let snaps = if variant.is_threshold() {
            results
                .portfolio
                .iter()
                .filter(|r| !r.totals[slot].rebalanced.is_empty())
                .count()
                .to_string()
        } else {
            "-".into()
        };
        writeln!(
            w,
            "  {:32} ${:>11.2} {:>+8.2}% ${:>11.2} {:10} ${:>11.2} {:10} {:>6}",
            variant.to_string(),
            last.value,
            last.profit_pc,
            mm.min.value,
            format_date(mm.min.timestamp),
            mm.max.value,
            format_date(mm.max.timestamp),
            snaps,
        )?;
    }

    for series in &results.coins {
        writeln!(w, "\n{} (initial ${:.2}):", series.coin, series.initial_value)?;
        let Some(last) = series.records.last() else {
            continue;
        };
        for (variant, h) in results.variants.iter().zip(&last.holdings) {
            writeln!(
                w,
                "  {:32} {:>14.6} units ${:>11.2} {:>+8.2}%",
                variant.to_string(),
                h.amount,
                h.coin_value,
                h.profit_pc,
            )?;
        }
    }
    Ok(())
}

/// Live rebalance plan, one line per coin.
pub fn write_plan<W: Write>(
    w: &mut W,
    total_value: f64,
    rows: &[(Coin, RebalanceAmounts)],
) -> io::Result<()> {
    writeln!(w, "PORTFOLIO VALUE: ${total_value:.2}")?;
    writeln!(
        w,
        "  {:8} {:>8} {:>8} {:>8} {:>6} {:6} {:>14} {:>12}",
        "Coin", "Current", "Target", "Diff", "Thr", "Action", "Amount", "Value"
    )?;
    for (coin, r) in rows {
        let action = if r.reached_threshold {
            r.to_balance_direction.to_string()
        } else {
            "Hold".into()
        };
        writeln!(
            w,
            "  {:8} {:>7.2}% {:>7} {:>8} {:>5.1}% {:6} {:>14} {:>12}",
            coin.as_str(),
            r.current_percentage,
            opt_pct(r.target_percentage),
            r.difference_percentage
                .map_or_else(|| "-".into(), |d| format!("{d:+.2}")),
            r.threshold_percentage,
            action,
            r.to_balance_amount
                .map_or_else(|| "-".into(), |a| format!("{a:+.6}")),
            r.to_balance_value
                .map_or_else(|| "-".into(), |v| format!("{v:+.2}")),
        )?;
    }
    Ok(())
}

/// Risk analysis table, summary first.
pub fn write_risk<W: Write>(w: &mut W, analysis: &RiskAnalysis) -> io::Result<()> {
    writeln!(w, "RISK ANALYSIS ({}):", analysis.period)?;
    writeln!(
        w,
        "  {:16} {:>12} {:>9} {:>6} {:>6} {:>9} {:>9} {:>4}",
        "Date", "Open", "Change", "Win", "Loss", "Winning", "Losing", "Heat"
    )?;
    let s = &analysis.summary;
    writeln!(
        w,
        "  {:16} {:>12} {:>+8.2}% {:>6.2} {:>6.2} {:>8.2}% {:>8.2}% {:>4}   KC {:.2}%",
        s.label, "", s.performance, s.positive, s.negative, s.winning, s.losing, "", s.kc
    )?;
    for r in &analysis.rows {
        writeln!(
            w,
            "  {:16} {:>12.2} {:>+8.2}% {:>6} {:>6} {:>8.2}% {:>8.2}% {:>4}",
            r.label, r.open, r.performance, r.positive, r.negative, r.winning, r.losing, r.heatmap
        )?;
    }
    Ok(())
}

fn opt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| "-".into(), |p| format!("{p:.2}%"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinfolio::portfolio::TargetAllocation;
    use coinfolio::rebalance::rebalance_amounts;
    use coinfolio::{RiskPeriod, risk_analysis};

    #[test]
    fn date_format() {
        assert_eq!(format_date(1_609_459_200_000), "2021-01-01");
        assert_eq!(format_date(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn plan_lines() {
        let target = TargetAllocation {
            threshold: 5.0,
            percent: 50.0,
        };
        let rows = vec![
            (Coin::new("BTC"), rebalance_amounts(&target, 40_000.0, 0.5, 30_000.0)),
            (Coin::new("ETH"), rebalance_amounts(&target, 2_000.0, 5.0, 30_000.0)),
        ];
        let mut out = Vec::new();
        write_plan(&mut out, 30_000.0, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("PORTFOLIO VALUE: $30000.00"));
        assert!(text.contains("Sell"));
        assert!(text.contains("-0.125000"));
        assert!(text.contains("Buy"));
    }

    #[test]
    fn on_target_coin_holds() {
        let target = TargetAllocation {
            threshold: 0.0,
            percent: 50.0,
        };
        let rows = vec![(Coin::new("BTC"), rebalance_amounts(&target, 1.0, 50.0, 100.0))];
        let mut out = Vec::new();
        write_plan(&mut out, 100.0, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(2).unwrap().contains("Hold"));
        assert!(!text.contains("Sell"));
    }

    #[test]
    fn risk_table_has_summary_first() {
        let prices = vec![(1_609_459_200_000, 100.0), (1_612_137_600_000, 110.0)];
        let ra = risk_analysis(&prices, RiskPeriod::Monthly);
        let mut out = Vec::new();
        write_risk(&mut out, &ra).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "RISK ANALYSIS (monthly):");
        assert!(lines[2].contains("Average so far"));
        assert!(lines[3].contains("Jan 01 2021"));
        assert!(lines[4].contains("Feb 01 2021"));
    }
}
