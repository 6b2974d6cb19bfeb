//! Synthetic sales data for seller and manager peers.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rand::Rng;

use crate::ledger::{Sale, CATALOG};

/// Sales are dated within `[2023-01-01T00:00:00Z, 2023-06-23T00:00:00Z)`.
pub fn window() -> (DateTime<Utc>, DateTime<Utc>) {
    (
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
            .single()
            .expect("sales window start is a valid date"),
        Utc.with_ymd_and_hms(2023, 6, 23, 0, 0, 0)
            .single()
            .expect("sales window end is a valid date"),
    )
}

pub fn product<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    CATALOG[rng.gen_range(0..CATALOG.len())]
}

pub fn date<R: Rng + ?Sized>(rng: &mut R) -> DateTime<Utc> {
    let (from, to) = window();
    let secs = rng.gen_range(from.timestamp()..to.timestamp());
    Utc.timestamp_opt(secs, 0).single().unwrap_or(from)
}

/// Two dates in the sales window, earliest first.
pub fn date_range<R: Rng + ?Sized>(rng: &mut R) -> (NaiveDate, NaiveDate) {
    let a = date(rng).date_naive();
    let b = date(rng).date_naive();
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One sale recorded under `seller`.
pub fn sale<R: Rng + ?Sized>(seller: &str, rng: &mut R) -> Sale {
    Sale {
        name: seller.to_string(),
        product: product(rng).to_string(),
        price: rng.gen_range(0..1000),
        date: date(rng),
    }
}
