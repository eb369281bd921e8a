use std::cmp::Ordering;
use std::str::FromStr;

use super::EngineError;
use super::search::SearchHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    Rating,
    Stars,
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(SortKey::PriceAsc),
            "price_desc" => Ok(SortKey::PriceDesc),
            "rating" => Ok(SortKey::Rating),
            "stars" => Ok(SortKey::Stars),
            other => Err(EngineError::Validation(format!(
                "unknown sort {other:?}, expected price_asc, price_desc, rating or stars"
            ))),
        }
    }
}

fn compare(a: &SearchHit, b: &SearchHit, key: SortKey) -> Ordering {
    match key {
        SortKey::PriceAsc => a.quote.nightly_total.cmp(&b.quote.nightly_total),
        SortKey::PriceDesc => b.quote.nightly_total.cmp(&a.quote.nightly_total),
        SortKey::Rating => b.hotel.rating.total_cmp(&a.hotel.rating),
        SortKey::Stars => b.hotel.stars.cmp(&a.hotel.stars),
    }
}

/// Order hits in place. Without a key, hits stay in registration order.
/// The sort is stable, so equal keys keep registration order too.
pub fn rank(hits: &mut [SearchHit], sort: Option<SortKey>) {
    match sort {
        Some(key) => hits.sort_by(|a, b| compare(a, b, key).then(a.seq.cmp(&b.seq))),
        None => hits.sort_by_key(|h| h.seq),
    }
}
