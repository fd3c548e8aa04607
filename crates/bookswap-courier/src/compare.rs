//! Cheapest / fastest / recommended selection over a set of quotes.

use bookswap_entity::quote::{Quote, QuoteComparison};

/// Weight of the normalised price in the recommendation score.
const PRICE_WEIGHT: f64 = 0.6;
/// Weight of the normalised transit time in the recommendation score.
const TRANSIT_WEIGHT: f64 = 0.4;
/// Scores closer than this are considered tied.
const SCORE_EPSILON: f64 = 1e-9;

/// Derive the comparison for `quotes`. The quotes keep their order.
///
/// Ties always go to the quote encountered first, except that a tied
/// recommendation prefers the cheaper quote.
pub fn compare_quotes(quotes: Vec<Quote>) -> QuoteComparison {
    if quotes.is_empty() {
        return QuoteComparison::default();
    }

    let cheapest = quotes
        .iter()
        .reduce(|best, q| if q.price < best.price { q } else { best })
        .cloned();
    let fastest = quotes.iter().min_by_key(|q| q.transit_days).cloned();
    let recommended = recommend(&quotes).cloned();

    QuoteComparison {
        quotes,
        cheapest,
        fastest,
        recommended,
    }
}

/// Lowest `0.6 * price / min_price + 0.4 * transit / min_transit`.
fn recommend(quotes: &[Quote]) -> Option<&Quote> {
    let min_price = quotes
        .iter()
        .map(|q| q.price)
        .fold(f64::INFINITY, f64::min)
        .max(0.01);
    let min_transit = quotes
        .iter()
        .map(|q| q.transit_days)
        .min()
        .unwrap_or(1)
        .max(1) as f64;

    let score = |q: &Quote| {
        PRICE_WEIGHT * q.price / min_price + TRANSIT_WEIGHT * q.transit_days as f64 / min_transit
    };

    let mut best: Option<(&Quote, f64)> = None;
    for quote in quotes {
        let s = score(quote);
        best = match best {
            None => Some((quote, s)),
            Some((current, best_score)) => {
                let tied = (s - best_score).abs() <= SCORE_EPSILON;
                if s < best_score - SCORE_EPSILON || (tied && quote.price < current.price) {
                    Some((quote, s))
                } else {
                    Some((current, best_score))
                }
            }
        };
    }
    best.map(|(quote, _)| quote)
}
