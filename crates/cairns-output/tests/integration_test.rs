//! Integration tests for the reporting workflow: curve and trade log in,
//! summary and exported artifacts out.

use chrono::NaiveDate;

use cairns_output::{
    EquityCurve, EquityPoint, PerformanceSummary, TradeLog, TradeRecord, summary_to_json,
    write_equity_csv, write_trades_csv,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(d))
}

fn simulated_run() -> (EquityCurve, TradeLog) {
    let equities = [1.0, 1.0, 1.02, 1.01, 1.04, 1.06, 1.03, 1.08];
    let mut curve = EquityCurve::default();
    let mut prev = equities[0];
    for (i, &e) in equities.iter().enumerate() {
        curve.push(EquityPoint {
            date: day(i as u32),
            equity: e,
            period_return: if i == 0 { 0.0 } else { e / prev - 1.0 },
        });
        prev = e;
    }

    let mut trades = TradeLog::default();
    trades.push(TradeRecord {
        date: day(1),
        symbol: "AAA".to_string(),
        delta_weight: 0.5,
        cost: 0.0005,
    });
    trades.push(TradeRecord {
        date: day(1),
        symbol: "BBB".to_string(),
        delta_weight: 0.5,
        cost: 0.0005,
    });
    trades.push(TradeRecord {
        date: day(5),
        symbol: "AAA".to_string(),
        delta_weight: -0.2,
        cost: 0.0002,
    });
    (curve, trades)
}

#[test]
fn full_reporting_workflow() {
    let (curve, trades) = simulated_run();
    let summary = PerformanceSummary::compute(&curve, &trades, 252);

    assert!((summary.total_return - 0.08).abs() < 1e-12);
    assert_eq!(summary.n_periods, 8);
    assert_eq!(summary.n_trades, 3);
    assert!((summary.total_costs - 0.0012).abs() < 1e-12);
    // drawdown: peak 1.06 to trough 1.03
    assert!((summary.max_drawdown - (1.0 - 1.03 / 1.06)).abs() < 1e-12);
    // turnover: 1.0 on the entry date, 0.2 on the trim date
    assert!((summary.average_turnover - 0.6).abs() < 1e-12);
    assert_eq!(summary.period_start, Some(day(0)));
    assert_eq!(summary.period_end, Some(day(7)));

    // Renderings carry the period and the headline metrics
    let ascii = summary.to_ascii_table();
    assert!(ascii.contains("2024-01-01"));
    assert!(ascii.contains("Sharpe Ratio"));
    let markdown = summary.to_markdown();
    assert!(markdown.contains("| Total Return |"));

    // JSON export is machine-readable
    let json = summary_to_json(&summary).unwrap();
    assert!(json.contains("\"n_trades\": 3"));
}

#[test]
fn csv_artifacts_round_trip() {
    let (curve, trades) = simulated_run();
    let dir = std::env::temp_dir();
    let equity_path = dir.join("cairns_integration_equity.csv");
    let trades_path = dir.join("cairns_integration_trades.csv");

    write_equity_csv(&curve, &equity_path).unwrap();
    write_trades_csv(&trades, &trades_path).unwrap();

    let equity_csv = std::fs::read_to_string(&equity_path).unwrap();
    assert_eq!(equity_csv.lines().count(), 1 + curve.len());
    assert!(equity_csv.lines().next().unwrap().starts_with("date,equity"));

    let trades_csv = std::fs::read_to_string(&trades_path).unwrap();
    assert_eq!(trades_csv.lines().count(), 1 + trades.len());
    assert!(trades_csv.contains("BBB"));

    std::fs::remove_file(&equity_path).ok();
    std::fs::remove_file(&trades_path).ok();
}
