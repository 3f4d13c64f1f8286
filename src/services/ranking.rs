use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{BookId, UserId};
use crate::services::svdpp::Prediction;

/// Ranked (book, estimate) pairs per user
pub type TopN = HashMap<UserId, Vec<(BookId, f64)>>;

/// Groups predictions by user and keeps the `n` highest estimates for each.
///
/// Sorting is stable, so equal estimates keep their input order.
pub fn top_n(predictions: &[Prediction], n: usize) -> TopN {
    let mut grouped: TopN = HashMap::new();
    for p in predictions {
        grouped
            .entry(p.user_id)
            .or_default()
            .push((p.book_id, p.estimate));
    }

    for ranked in grouped.values_mut() {
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(n);
    }

    grouped
}
