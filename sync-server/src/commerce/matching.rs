//! Pure matching rules for the commerce bridge
//!
//! Catalog product preference and paid-sale → local-order
//! disambiguation. Kept free of I/O so the precedence rules stay easy to
//! verify in isolation.

use shared::models::{Order, OrderStatus};

use super::CatalogProduct;
use crate::sync::commission::money_eq;

/// Pick the best catalog match for a service title.
///
/// Preference order: exact case-insensitive title match, then a result
/// whose title contains the query or vice versa. None means the caller
/// should create a new product.
pub fn pick_product<'a>(results: &'a [CatalogProduct], title: &str) -> Option<&'a CatalogProduct> {
    let wanted = title.trim().to_lowercase();

    if let Some(exact) = results
        .iter()
        .find(|p| p.title.trim().to_lowercase() == wanted)
    {
        return Some(exact);
    }

    results.iter().find(|p| {
        let candidate = p.title.trim().to_lowercase();
        candidate.contains(&wanted) || wanted.contains(&candidate)
    })
}

/// True when a sale's source indicates it was converted from a draft
pub fn source_is_draft(source: Option<&str>) -> bool {
    source.is_some_and(|s| s.to_lowercase().contains("draft"))
}

/// Disambiguate candidate draft orders sharing the customer email.
///
/// Exactly one candidate wins outright; several fall back to the sale
/// total within 0.01 tolerance; anything still ambiguous matches nothing
/// (the caller reports "no match" and takes no action).
pub fn match_by_total<'a>(candidates: &'a [Order], total_amount: f64) -> Option<&'a Order> {
    debug_assert!(candidates.iter().all(|o| o.status == OrderStatus::Draft));

    match candidates {
        [] => None,
        [only] => Some(only),
        several => {
            let mut by_total = several
                .iter()
                .filter(|o| money_eq(o.total_amount, total_amount));
            match (by_total.next(), by_total.next()) {
                (Some(winner), None) => Some(winner),
                _ => None,
            }
        }
    }
}
