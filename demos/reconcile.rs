use comprobante::*;
use rust_decimal_macros::dec;

fn show(label: &str, breakdown: &Breakdown, declared: rust_decimal::Decimal) {
    let r = reconcile(breakdown, declared);
    println!("{label} (declared {declared})");
    for (rate, amount) in r.breakdown.iter() {
        let before = breakdown.get(rate).unwrap_or_default();
        println!("  {:>3}%  {before:>8} -> {amount:>8}", rate.normalize());
    }
    match r.info.adjusted_rate {
        Some(rate) if r.info.adjusted => {
            println!("  adjusted, residual on {}%, diff {}", rate.normalize(), r.info.diff_applied)
        }
        _ if r.info.is_unresolved() => println!("  unresolved, diff {}", r.info.diff_applied),
        _ => println!("  unchanged"),
    }
    println!();
}

fn main() {
    println!("=== Rate Codes ===\n");
    for code in ["01", "2", "03", "04", "05", "06", "07", "08", "11"] {
        match RateCode::from_code(code) {
            Some(rc) => println!("  {code:>2} => {}%", rc.rate()),
            None => println!("  {code:>2} => unknown"),
        }
    }
    println!();

    println!("=== Reconciliation ===\n");
    let single: Breakdown = [(dec!(13), dec!(129.97))].into_iter().collect();
    show("Rounding drift", &single, dec!(130.00));

    let two: Breakdown = [(dec!(13), dec!(100.00)), (dec!(1), dec!(10.00))]
        .into_iter()
        .collect();
    show("Two rates", &two, dec!(112.00));

    let three: Breakdown = [
        (dec!(1), dec!(10.00)),
        (dec!(2), dec!(10.00)),
        (dec!(4), dec!(10.00)),
    ]
    .into_iter()
    .collect();
    show("Equal buckets", &three, dec!(100.00));

    let zero: Breakdown = [(dec!(13), dec!(0))].into_iter().collect();
    show("Nothing to scale", &zero, dec!(50.00));
}
