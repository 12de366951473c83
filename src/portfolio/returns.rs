//! Valuation, weights, and daily returns
//!
//! Portfolio returns are lag-1 weighted: today's asset moves are scaled
//! by yesterday's composition, so a trade executed today cannot inflate
//! today's return. The published series covers every calendar day
//! between its first and last observation, with 0.0 on days the
//! computation produced nothing (weekends included).

use std::collections::BTreeMap;

use crate::ledger::Trade;
use crate::timeseries::{DailyFrame, DailySeries};

use super::EPSILON;

/// Everything derived from positions × prices in one pass
pub struct Valuation {
    pub value: DailyFrame,
    pub weights: DailyFrame,
    pub asset_returns: DailyFrame,
    /// Calendar-complete daily portfolio return series
    pub portfolio_returns: DailySeries,
}

/// Derive valuation, weights, and returns from positions and prices
///
/// Pure function of its inputs; nothing is retained across calls.
pub fn compute(positions: &DailyFrame, prices: &DailyFrame) -> Valuation {
    let symbols: Vec<String> = positions.symbols().cloned().collect();
    let index = positions.index().to_vec();
    let n = index.len();

    // value[date, symbol] = quantity * close; an unpriced cell stays absent
    let mut value = DailyFrame::zeroed(index.clone(), &symbols);
    for symbol in &symbols {
        if let (Some(qty), Some(px), Some(out)) = (
            positions.column(symbol),
            prices.column(symbol),
            value.column_mut(symbol),
        ) {
            for i in 0..n {
                out[i] = qty[i] * px[i];
            }
        }
    }

    let totals: Vec<f64> = (0..n).map(|i| value.row_sum(i)).collect();

    // Row-normalized weights; a zero-value day has all-zero weights
    let mut weights = DailyFrame::zeroed(index.clone(), &symbols);
    for symbol in &symbols {
        if let (Some(v), Some(w)) = (value.column(symbol), weights.column_mut(symbol)) {
            for i in 0..n {
                w[i] = if totals[i] > 0.0 && !v[i].is_nan() {
                    v[i] / totals[i]
                } else {
                    0.0
                };
            }
        }
    }

    // Per-symbol close-to-close change, 0.0 on the first date and
    // across absent observations
    let mut asset_returns = DailyFrame::zeroed(index.clone(), &symbols);
    for symbol in &symbols {
        if let (Some(px), Some(out)) = (prices.column(symbol), asset_returns.column_mut(symbol)) {
            pct_change_into(px, out);
        }
    }

    // Yesterday's weights against today's moves
    let mut raw = BTreeMap::new();
    for i in 0..n {
        let ret = if i == 0 {
            0.0
        } else {
            symbols
                .iter()
                .filter_map(|s| {
                    let w = weights.column(s)?[i - 1];
                    let r = asset_returns.column(s)?[i];
                    Some(w * r)
                })
                .sum()
        };
        raw.insert(index[i], ret);
    }

    Valuation {
        value,
        weights,
        asset_returns,
        portfolio_returns: calendar_fill(&raw),
    }
}

/// One symbol's daily percent-change series, first date 0
pub fn pct_change_series(prices: &DailyFrame, symbol: &str) -> DailySeries {
    let mut out = BTreeMap::new();
    if let Some(px) = prices.column(symbol) {
        let mut changes = vec![0.0; px.len()];
        pct_change_into(px, &mut changes);
        for (date, change) in prices.index().iter().zip(changes) {
            out.insert(*date, change);
        }
    }
    out
}

/// Latest weights row, filtered to live holdings, largest first
pub fn current_weights(weights: &DailyFrame) -> Vec<(String, f64)> {
    let Some(last) = weights.index().len().checked_sub(1) else {
        return Vec::new();
    };
    let mut out: Vec<(String, f64)> = weights
        .symbols()
        .filter_map(|symbol| {
            let w = *weights.column(symbol)?.get(last)?;
            (!w.is_nan() && w.abs() > EPSILON).then(|| (symbol.clone(), w))
        })
        .collect();
    out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Each accepted trade's notional as a percentage of portfolio value at
/// its effective date; NaN when that value is zero or unavailable
pub fn trade_percentages(trades: &[Trade], value: &DailyFrame) -> Vec<f64> {
    trades
        .iter()
        .map(|trade| {
            let Some(row) = value.first_row_at_or_after(trade.date) else {
                return f64::NAN;
            };
            let total = value.row_sum(row);
            if total > 0.0 {
                100.0 * (trade.quantity * trade.price).abs() / total
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Insert 0.0 for every calendar day missing between min and max date
///
/// No assumptions about weekends or holidays: every day gets a row.
pub fn calendar_fill(series: &DailySeries) -> DailySeries {
    let (Some(first), Some(last)) = (series.keys().next(), series.keys().next_back()) else {
        return BTreeMap::new();
    };

    let mut out = BTreeMap::new();
    let mut day = *first;
    while day <= *last {
        out.insert(day, series.get(&day).copied().unwrap_or(0.0));
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }
    out
}

fn pct_change_into(prices: &[f64], out: &mut [f64]) {
    for i in 1..prices.len() {
        let (prev, cur) = (prices[i - 1], prices[i]);
        out[i] = if prev.is_nan() || cur.is_nan() || prev == 0.0 {
            0.0
        } else {
            cur / prev - 1.0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    fn frame(cols: &[(&str, &[(u32, f64)])]) -> DailyFrame {
        let mut series = BTreeMap::new();
        for (symbol, points) in cols {
            series.insert(
                symbol.to_string(),
                points.iter().map(|(day, v)| (d(*day), *v)).collect(),
            );
        }
        DailyFrame::from_series(&series)
    }

    fn two_asset_inputs() -> (DailyFrame, DailyFrame) {
        let prices = frame(&[
            ("AAPL", &[(13, 100.0), (14, 110.0)]),
            ("MSFT", &[(13, 200.0), (14, 210.0)]),
        ]);
        // 1 share AAPL, 1.5 shares MSFT throughout
        let positions = frame(&[
            ("AAPL", &[(13, 1.0), (14, 1.0)]),
            ("MSFT", &[(13, 1.5), (14, 1.5)]),
        ]);
        (positions, prices)
    }

    #[test]
    fn test_weights_sum_to_one() {
        let (positions, prices) = two_asset_inputs();
        let valuation = compute(&positions, &prices);

        for row in 0..valuation.weights.index().len() {
            let sum = valuation.weights.row_sum(row);
            assert!((sum - 1.0).abs() < 1e-9, "row {row} sums to {sum}");
        }
    }

    #[test]
    fn test_zero_value_day_has_zero_weights() {
        let prices = frame(&[("AAPL", &[(13, 100.0), (14, 110.0)])]);
        let positions = frame(&[("AAPL", &[(13, 0.0), (14, 2.0)])]);

        let valuation = compute(&positions, &prices);
        assert_eq!(valuation.weights.get(d(13), "AAPL"), Some(0.0));
        assert_eq!(valuation.weights.get(d(14), "AAPL"), Some(1.0));
    }

    #[test]
    fn test_lag_one_portfolio_return() {
        let (positions, prices) = two_asset_inputs();
        let valuation = compute(&positions, &prices);

        // Day 13: value 100 + 300 = 400, weights 0.25 / 0.75
        // Day 14: AAPL +10%, MSFT +5% → 0.25*0.10 + 0.75*0.05 = 0.0625
        assert_eq!(valuation.portfolio_returns.get(&d(13)), Some(&0.0));
        let ret = valuation.portfolio_returns.get(&d(14)).unwrap();
        assert!((ret - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_first_day_return_is_zero() {
        let (positions, prices) = two_asset_inputs();
        let valuation = compute(&positions, &prices);
        assert_eq!(valuation.portfolio_returns.values().next(), Some(&0.0));
    }

    #[test]
    fn test_same_day_trade_does_not_leak_into_return() {
        // Position appears on the 14th; with zero weight on the 13th the
        // 14th's move contributes nothing
        let prices = frame(&[("AAPL", &[(13, 100.0), (14, 110.0)])]);
        let positions = frame(&[("AAPL", &[(13, 0.0), (14, 10.0)])]);

        let valuation = compute(&positions, &prices);
        assert_eq!(valuation.portfolio_returns.get(&d(14)), Some(&0.0));
    }

    #[test]
    fn test_unpriced_leading_cells_stay_out_of_totals() {
        // MSFT has no price on the 13th: the 13th's total is AAPL only
        let prices = frame(&[
            ("AAPL", &[(13, 100.0), (14, 110.0)]),
            ("MSFT", &[(14, 210.0)]),
        ]);
        let positions = frame(&[
            ("AAPL", &[(13, 1.0), (14, 1.0)]),
            ("MSFT", &[(13, 1.0), (14, 1.0)]),
        ]);

        let valuation = compute(&positions, &prices);
        assert!((valuation.value.row_sum(0) - 100.0).abs() < 1e-9);
        assert_eq!(valuation.weights.get(d(13), "AAPL"), Some(1.0));
        assert_eq!(valuation.weights.get(d(13), "MSFT"), Some(0.0));
    }

    #[test]
    fn test_calendar_fill_covers_every_day() {
        // Friday the 17th to Monday the 20th: weekend days are inserted
        let raw = BTreeMap::from([(d(17), 0.01), (d(20), 0.02)]);
        let filled = calendar_fill(&raw);

        assert_eq!(filled.len(), 4);
        assert_eq!(filled.get(&d(18)), Some(&0.0));
        assert_eq!(filled.get(&d(19)), Some(&0.0));
        assert_eq!(filled.get(&d(17)), Some(&0.01));
        assert_eq!(filled.get(&d(20)), Some(&0.02));
    }

    #[test]
    fn test_calendar_fill_empty_series() {
        assert!(calendar_fill(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_current_weights_filtered_and_sorted() {
        let prices = frame(&[
            ("AAPL", &[(13, 100.0), (14, 110.0)]),
            ("MSFT", &[(13, 200.0), (14, 210.0)]),
            ("TBIL", &[(13, 50.0), (14, 50.0)]),
        ]);
        let positions = frame(&[
            ("AAPL", &[(13, 1.0), (14, 1.0)]),
            ("MSFT", &[(13, 3.0), (14, 3.0)]),
            ("TBIL", &[(13, 0.0), (14, 0.0)]),
        ]);

        let valuation = compute(&positions, &prices);
        let current = current_weights(&valuation.weights);

        // TBIL is flat and filtered out; MSFT leads
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].0, "MSFT");
        assert_eq!(current[1].0, "AAPL");
        assert!(current[0].1 > current[1].1);
    }

    #[test]
    fn test_trade_percentages() {
        use crate::ledger::{Trade, TradeSide};

        let (positions, prices) = two_asset_inputs();
        let valuation = compute(&positions, &prices);

        let trades = vec![
            Trade {
                date: d(14),
                symbol: "AAPL".to_string(),
                side: TradeSide::Buy,
                quantity: 1.0,
                price: 110.0,
                amount: -110.0,
            },
            // After the last priced date: undefined
            Trade {
                date: d(20),
                symbol: "AAPL".to_string(),
                side: TradeSide::Buy,
                quantity: 1.0,
                price: 110.0,
                amount: -110.0,
            },
        ];

        let pcts = trade_percentages(&trades, &valuation.value);
        // Day 14 total value: 110 + 315 = 425
        assert!((pcts[0] - 100.0 * 110.0 / 425.0).abs() < 1e-9);
        assert!(pcts[1].is_nan());
    }

    #[test]
    fn test_pct_change_series_benchmark() {
        let prices = frame(&[("SPY", &[(13, 400.0), (14, 404.0), (15, 402.0)])]);
        let series = pct_change_series(&prices, "SPY");

        assert_eq!(series.get(&d(13)), Some(&0.0));
        assert!((series.get(&d(14)).unwrap() - 0.01).abs() < 1e-12);
        assert!((series.get(&d(15)).unwrap() + 2.0 / 404.0).abs() < 1e-12);
    }
}
