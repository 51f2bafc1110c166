use {
    super::{
        Award,
        AwardId,
        AwardStatus,
        Bid,
        Money,
        Period,
    },
    anyhow::Context,
    serde::{
        Deserialize,
        Serialize,
    },
    serde_json::{
        Map,
        Value,
    },
    std::collections::HashSet,
    time::OffsetDateTime,
};

pub type AuctionId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum AuctionStatus {
    #[serde(rename = "draft")]
    #[strum(serialize = "draft")]
    Draft,
    #[serde(rename = "pending.activation")]
    #[strum(serialize = "pending.activation")]
    PendingActivation,
    #[serde(rename = "active.tendering")]
    #[strum(serialize = "active.tendering")]
    ActiveTendering,
    #[serde(rename = "active.auction")]
    #[strum(serialize = "active.auction")]
    ActiveAuction,
    /// Auction ended, the winner is being qualified.
    #[serde(rename = "active.qualification")]
    #[strum(serialize = "active.qualification")]
    ActiveQualification,
    /// Winner qualified, the contract is being signed.
    #[serde(rename = "active.awarded")]
    #[strum(serialize = "active.awarded")]
    ActiveAwarded,
    #[serde(rename = "complete")]
    #[strum(serialize = "complete")]
    Complete,
    #[serde(rename = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
    #[serde(rename = "unsuccessful")]
    #[strum(serialize = "unsuccessful")]
    Unsuccessful,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id:       String,
    #[serde(rename = "awardID")]
    pub award_id: AwardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status:   Option<String>,
    #[serde(flatten)]
    pub extra:    Map<String, Value>,
}

/// Auction document as stored, with every field the migration does not touch
/// kept verbatim in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id:                      AuctionId,
    pub procurement_method_type: String,
    pub status:                  AuctionStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bids:                    Vec<Bid>,
    /// `None` means the document has no awards field at all, which is not the
    /// same thing as an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awards:                  Option<Vec<Award>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts:               Option<Vec<Contract>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub award_period:            Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value:                   Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_step:            Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features:                Option<Value>,
    #[serde(
        default,
        with = "crate::serde::nullable_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_modified:           Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra:                   Map<String, Value>,
}

impl Auction {
    /// Number of distinct bidders the awards point at.
    pub fn unique_award_bidders(&self) -> usize {
        self.awards
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|award| award.bid_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Flags every bid priced below the disclosed threshold as invalid.
    ///
    /// The threshold is the auction value plus one minimal step, rounded to
    /// two decimal places the way the qualification rule rounds it.
    pub fn invalidate_bids_below_threshold(&mut self) -> anyhow::Result<()> {
        let value = self
            .value
            .as_ref()
            .with_context(|| format!("auction {} has no value", self.id))?;
        let minimal_step = self
            .minimal_step
            .as_ref()
            .with_context(|| format!("auction {} has no minimalStep", self.id))?;
        let threshold = ((value.amount + minimal_step.amount) * 100.0).round() / 100.0;
        for bid in &mut self.bids {
            let amount = bid
                .value
                .as_ref()
                .with_context(|| format!("bid {} has no value", bid.id))?
                .amount;
            if amount < threshold {
                bid.status = Some(super::BidStatus::Invalid);
            }
        }
        Ok(())
    }

    pub fn all_bids_invalid(&self) -> bool {
        self.bids.iter().all(Bid::is_invalid)
    }

    /// True when every bid behind `bid_id` has been invalidated. A dangling
    /// reference counts as invalid.
    pub fn bid_invalid(&self, bid_id: &str) -> bool {
        self.bids
            .iter()
            .filter(|bid| bid.id == bid_id)
            .all(Bid::is_invalid)
    }

    /// Closes the first award still in progress and takes the auction down
    /// with it.
    ///
    /// Contracts hanging off the disqualified award are cancelled while the
    /// auction still reads as awarded, then the award period is closed and
    /// the whole auction becomes unsuccessful.
    pub fn disqualify_excess_award(&mut self, now: OffsetDateTime) -> anyhow::Result<()> {
        let mut awards = self
            .awards
            .take()
            .with_context(|| format!("auction {} has no awards", self.id))?;
        let excessive = awards
            .iter_mut()
            .find(|award| award.status.is_in_progress())
            .with_context(|| format!("auction {} has no award left to disqualify", self.id))?;
        if self.status == AuctionStatus::ActiveAwarded {
            for contract in self.contracts.iter_mut().flatten() {
                if contract.award_id == excessive.id {
                    contract.status = Some("cancelled".to_string());
                }
            }
        }
        excessive.status = AwardStatus::Unsuccessful;
        excessive
            .complaint_period
            .get_or_insert_with(Period::default)
            .end_date = Some(now);
        self.awards = Some(awards);
        self.award_period
            .get_or_insert_with(Period::default)
            .end_date = Some(now);
        self.status = AuctionStatus::Unsuccessful;
        Ok(())
    }

    /// True when any award already carries rolled-out windows or a staged
    /// status, meaning a previous pass got to this document.
    pub fn awards_already_staged(&self) -> bool {
        self.awards.as_deref().unwrap_or_default().iter().any(|award| {
            award.verification_period.is_some()
                || award.payment_period.is_some()
                || award.signing_period.is_some()
                || award.status.is_staged()
        })
    }
}
