//! Summarize every invoice XML in a folder.
//!
//! ```text
//! cargo run --example summarize_folder -- facturas/ [2024-05-01 2024-05-31]
//! ```

use chrono::NaiveDate;
use comprobante::batch::{BatchConfig, DateRange, process_directory};

fn parse_day(arg: Option<String>) -> Option<NaiveDate> {
    arg.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| ".".into());
    let date_range = match (parse_day(args.next()), parse_day(args.next())) {
        (Some(first), Some(last)) => Some(DateRange::days(first, last)),
        (Some(first), None) => Some(DateRange::days(first, first)),
        _ => None,
    };
    let config = BatchConfig {
        date_range,
        ..Default::default()
    };

    let report = match process_directory(&dir, &config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    println!("=== Invoices ===\n");
    for invoice in &report.invoices {
        let r = &invoice.record;
        let date = r
            .issue_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".into());
        println!(
            "{date}  {:<24}  IVA {:>12}  total {:>12}",
            invoice.file_name, r.tax_total, r.grand_total
        );
        for (rate, amount) in r.tax_by_rate.iter() {
            println!("    {:>5}%  {amount:>12}", rate.normalize());
        }
        if !r.observations.is_empty() {
            println!("    {}", r.observation_text());
        }
    }

    let agg = &report.aggregate;
    println!("\n=== Totals ===\n");
    println!("  Invoices:   {} ({} exempt)", agg.invoice_count, agg.exempt_count);
    println!("  Taxable:    {}", agg.taxable_total);
    println!("  Exempt:     {}", agg.exempt_total);
    println!("  Discounts:  {}", agg.discount_total);
    println!("  IVA:        {}", agg.tax_total);
    println!("  Total:      {}", agg.grand_total);
    for (rate, amount) in agg.tax_by_rate.iter() {
        let base = agg.taxable_by_rate.get(rate).unwrap_or_default();
        println!("    {:>5}%  IVA {amount:>12}  base {:>14}", rate.normalize(), base.round_dp(2));
    }

    if !report.skipped.is_empty() {
        println!("\n=== Skipped ===\n");
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.path.display(), skipped.error);
        }
    }
}
