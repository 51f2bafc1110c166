#[cfg(test)]
use mockall::automock;
use {
    crate::migration::entities::Bid,
    serde_json::Value,
    std::{
        cmp::Ordering,
        fmt::Debug,
    },
};

/// Ordering of bids used to pick the candidate for the next award.
///
/// The ranking the auction module applies during qualification, exposed here
/// so the migration stages the same bid the live system would have staged.
#[cfg_attr(test, automock)]
pub trait BidRanker: Debug + Send + Sync + 'static {
    /// Returns the bids ranked best first. `features` carries the document's
    /// raw feature descriptors for implementations that weight amounts.
    fn rank(&self, bids: &[Bid], features: &Option<Value>) -> Vec<Bid>;
}

/// Plain ranking: highest amount first, earlier bid wins ties.
#[derive(Clone, Debug, Default)]
pub struct HighestValueRanker;

impl BidRanker for HighestValueRanker {
    fn rank(&self, bids: &[Bid], _features: &Option<Value>) -> Vec<Bid> {
        let mut ranked = bids.to_vec();
        ranked.sort_by(|a, b| {
            let amount_a = a.value.as_ref().map(|value| value.amount).unwrap_or(0.0);
            let amount_b = b.value.as_ref().map(|value| value.amount).unwrap_or(0.0);
            amount_b
                .partial_cmp(&amount_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.date.cmp(&b.date))
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::migration::entities::{
            BidStatus,
            Money,
        },
        time::macros::datetime,
    };

    fn bid(id: &str, amount: f64, date: time::OffsetDateTime) -> Bid {
        let value = Money {
            amount,
            currency: Some("UAH".to_string()),
            value_added_tax_included: Some(true),
            extra: serde_json::Map::new(),
        };
        Bid {
            id:        id.to_string(),
            status:    Some(BidStatus::Active),
            date:      Some(date),
            value:     Some(value),
            tenderers: None,
            extra:     serde_json::Map::new(),
        }
    }

    #[test]
    fn higher_amounts_rank_first() {
        let bids = vec![
            bid("a", 475.0, datetime!(2016-10-03 10:00 +2)),
            bid("b", 480.0, datetime!(2016-10-03 10:05 +2)),
        ];
        let ranked = HighestValueRanker.rank(&bids, &None);
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[1].id, "a");
    }

    #[test]
    fn earlier_bid_wins_a_tie() {
        let bids = vec![
            bid("late", 480.0, datetime!(2016-10-03 10:05 +2)),
            bid("early", 480.0, datetime!(2016-10-03 10:00 +2)),
        ];
        let ranked = HighestValueRanker.rank(&bids, &None);
        assert_eq!(ranked[0].id, "early");
    }
}
