use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ledger::fake;

/// The read queries a manager can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    BestSeller,
    BestProduct,
    TotalBySeller,
    TotalByProduct,
    TotalByRange,
}

impl QueryKind {
    pub const ALL: [QueryKind; 5] = [
        QueryKind::BestSeller,
        QueryKind::BestProduct,
        QueryKind::TotalBySeller,
        QueryKind::TotalByProduct,
        QueryKind::TotalByRange,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// A fully parameterized ledger query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerQuery {
    BestSeller,
    BestProduct,
    TotalBySeller { seller: String },
    TotalByProduct { product: String },
    TotalByRange { start: NaiveDate, end: NaiveDate },
}

impl LedgerQuery {
    /// Fill in parameters for `kind`. `TotalBySeller` needs a registered
    /// seller and yields `None` when there is none.
    pub fn for_kind<R: Rng + ?Sized>(kind: QueryKind, sellers: &[String], rng: &mut R) -> Option<Self> {
        let query = match kind {
            QueryKind::BestSeller => LedgerQuery::BestSeller,
            QueryKind::BestProduct => LedgerQuery::BestProduct,
            QueryKind::TotalBySeller => LedgerQuery::TotalBySeller {
                seller: sellers.choose(rng)?.clone(),
            },
            QueryKind::TotalByProduct => LedgerQuery::TotalByProduct {
                product: fake::product(rng).to_string(),
            },
            QueryKind::TotalByRange => {
                let (start, end) = fake::date_range(rng);
                LedgerQuery::TotalByRange { start, end }
            }
        };
        Some(query)
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            LedgerQuery::BestSeller => QueryKind::BestSeller,
            LedgerQuery::BestProduct => QueryKind::BestProduct,
            LedgerQuery::TotalBySeller { .. } => QueryKind::TotalBySeller,
            LedgerQuery::TotalByProduct { .. } => QueryKind::TotalByProduct,
            LedgerQuery::TotalByRange { .. } => QueryKind::TotalByRange,
        }
    }

    /// Path segments of the request on the server peer, unescaped.
    pub fn segments(&self) -> Vec<String> {
        let fixed = |parts: &[&str]| -> Vec<String> {
            parts.iter().map(|p| p.to_string()).collect()
        };
        match self {
            LedgerQuery::BestSeller => fixed(&["best", "seller"]),
            LedgerQuery::BestProduct => fixed(&["best", "product"]),
            LedgerQuery::TotalBySeller { seller } => {
                vec!["total".into(), "seller".into(), seller.clone()]
            }
            LedgerQuery::TotalByProduct { product } => {
                vec!["total".into(), "product".into(), product.clone()]
            }
            LedgerQuery::TotalByRange { start, end } => vec![
                "total".into(),
                "range".into(),
                start.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerTally {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTally {
    pub product: String,
    pub count: u64,
}

/// Decoded answer to a [`LedgerQuery`]; best-of queries are `None` on an
/// empty ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAnswer {
    BestSeller(Option<SellerTally>),
    BestProduct(Option<ProductTally>),
    Count(CountResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments() {
        assert_eq!(LedgerQuery::BestSeller.segments(), ["best", "seller"]);
        assert_eq!(LedgerQuery::BestProduct.segments(), ["best", "product"]);
        assert_eq!(
            LedgerQuery::TotalBySeller {
                seller: "brave-otter".to_string()
            }
            .segments(),
            ["total", "seller", "brave-otter"]
        );
        assert_eq!(
            LedgerQuery::TotalByProduct {
                product: "kiwi".to_string()
            }
            .segments(),
            ["total", "product", "kiwi"]
        );
        assert_eq!(
            LedgerQuery::TotalByRange {
                start: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
                end: NaiveDate::from_ymd_opt(2023, 3, 4).unwrap(),
            }
            .segments(),
            ["total", "range", "2023-01-02", "2023-03-04"]
        );
    }

    #[test]
    fn total_by_seller_needs_a_seller() {
        let mut rng = rand::thread_rng();
        assert!(LedgerQuery::for_kind(QueryKind::TotalBySeller, &[], &mut rng).is_none());

        let sellers = vec!["s1".to_string()];
        assert_eq!(
            LedgerQuery::for_kind(QueryKind::TotalBySeller, &sellers, &mut rng),
            Some(LedgerQuery::TotalBySeller {
                seller: "s1".to_string()
            })
        );
    }

    #[test]
    fn every_kind_builds_a_matching_query() {
        let mut rng = rand::thread_rng();
        let sellers = vec!["s1".to_string(), "s2".to_string()];
        for kind in QueryKind::ALL {
            let query = LedgerQuery::for_kind(kind, &sellers, &mut rng).unwrap();
            assert_eq!(query.kind(), kind);
        }
    }

    #[test]
    fn random_kind_covers_menu() {
        let mut rng = rand::thread_rng();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            seen.insert(format!("{:?}", QueryKind::random(&mut rng)));
        }
        assert_eq!(seen.len(), QueryKind::ALL.len());
    }
}
