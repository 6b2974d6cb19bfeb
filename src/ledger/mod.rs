//! Sales ledger served by whichever peer holds the server role.
//!
//! The ledger is a collaborator of the failover protocol rather than part of
//! it: sellers submit sales, managers run one query from a fixed menu, and
//! the server peer answers from an in-process [`Ledger`].
//!
//! - [`query`]: typed query menu and response shapes
//! - [`client`]: HTTP client used by seller and manager peers
//! - [`fake`]: synthetic sale and query data

pub mod client;
pub mod fake;
pub mod query;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::LedgerClient;
pub use query::{CountResponse, LedgerQuery, ProductTally, QueryAnswer, QueryKind, SellerTally};

/// Products the ledger accepts.
pub const CATALOG: [&str; 15] = [
    "apple",
    "banana",
    "orange",
    "pear",
    "pineapple",
    "grape",
    "strawberry",
    "blueberry",
    "raspberry",
    "blackberry",
    "watermelon",
    "melon",
    "mango",
    "kiwi",
    "peach",
];

pub fn is_catalog_product(product: &str) -> bool {
    CATALOG.contains(&product)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Identity of the seller peer that recorded the sale.
    pub name: String,
    pub product: String,
    pub price: u32,
    pub date: DateTime<Utc>,
}

/// In-memory sales book.
#[derive(Debug, Default)]
pub struct Ledger {
    sales: Vec<Sale>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sale: Sale) {
        self.sales.push(sale);
    }

    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    pub fn total_by_seller(&self, seller: &str) -> u64 {
        self.sales.iter().filter(|s| s.name == seller).count() as u64
    }

    pub fn total_by_product(&self, product: &str) -> u64 {
        self.sales.iter().filter(|s| s.product == product).count() as u64
    }

    /// Sales dated between midnight UTC of `start` and midnight UTC of `end`,
    /// both ends inclusive. An inverted range counts nothing.
    pub fn total_in_range(&self, start: NaiveDate, end: NaiveDate) -> u64 {
        let from = start.and_time(NaiveTime::MIN).and_utc();
        let to = end.and_time(NaiveTime::MIN).and_utc();
        self.sales
            .iter()
            .filter(|s| s.date >= from && s.date <= to)
            .count() as u64
    }

    pub fn best_seller(&self) -> Option<SellerTally> {
        most_frequent(self.sales.iter().map(|s| s.name.as_str()))
            .map(|(name, count)| SellerTally { name, count })
    }

    pub fn best_product(&self) -> Option<ProductTally> {
        most_frequent(self.sales.iter().map(|s| s.product.as_str()))
            .map(|(product, count)| ProductTally { product, count })
    }
}

// Ties go to the key seen first.
fn most_frequent<'a>(keys: impl Iterator<Item = &'a str>) -> Option<(String, u64)> {
    let mut tallies: Vec<(&str, u64)> = Vec::new();
    for key in keys {
        match tallies.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => tallies.push((key, 1)),
        }
    }

    let mut best: Option<(&str, u64)> = None;
    for (key, count) in tallies {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((key, count));
        }
    }
    best.map(|(key, count)| (key.to_string(), count))
}
