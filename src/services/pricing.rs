use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Fixed 12% GST surcharge applied to every booking. No dynamic pricing,
/// surge, or discounting exists in this system.
pub const GST_PERCENT: f64 = 12.0;

/// Whole nights between check-in and check-out, floored at one. Callers
/// validate that check-out is strictly after check-in; the clamp is the
/// backstop for same-day pairs.
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

/// Computed in percent space (`* 112 / 100` rather than `* 1.12`) so that
/// whole-rupee nightly prices produce exact whole-rupee totals.
pub fn total_amount(nights: i64, price_per_night: f64) -> f64 {
    nights as f64 * price_per_night * (100.0 + GST_PERCENT) / 100.0
}

/// Booking references must not collide under concurrent creation: the
/// millisecond timestamp plus a random hex disambiguator makes collisions
/// practically impossible, and the UNIQUE column is the backstop.
pub fn booking_reference() -> String {
    let disambiguator = Uuid::new_v4().simple().to_string();
    format!(
        "LUX{}{}",
        Utc::now().timestamp_millis(),
        &disambiguator[..6].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nights_counts_whole_days() {
        for k in 1..=30 {
            let check_in = date(2025, 1, 1);
            let check_out = check_in + chrono::Duration::days(k);
            assert_eq!(nights(check_in, check_out), k);
        }
    }

    #[test]
    fn nights_floors_at_one() {
        assert_eq!(nights(date(2025, 1, 1), date(2025, 1, 1)), 1);
    }

    #[test]
    fn total_applies_fixed_surcharge() {
        // 2 nights at 5000/night: 2 * 5000 * 1.12 = 11200 exactly.
        let n = nights(date(2025, 1, 1), date(2025, 1, 3));
        assert_eq!(n, 2);
        assert_eq!(total_amount(n, 5000.0), 11200.0);

        for k in 1..=10 {
            assert_eq!(total_amount(k, 1000.0), k as f64 * 1120.0);
        }
    }

    #[test]
    fn references_carry_prefix_and_do_not_collide() {
        let refs: HashSet<String> = (0..1000).map(|_| booking_reference()).collect();
        assert_eq!(refs.len(), 1000);
        assert!(refs.iter().all(|r| r.starts_with("LUX")));
    }
}
