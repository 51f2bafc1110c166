use {
    super::{
        BidId,
        Money,
        Period,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    serde_json::{
        Map,
        Value,
    },
    time::OffsetDateTime,
};

pub type AwardId = String;

/// Lifecycle of a single award.
///
/// Documents written before the post-auction flow was split into separate
/// windows only carry `pending`, `active`, `cancelled` and `unsuccessful`.
/// The dotted statuses are introduced by the migration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
pub enum AwardStatus {
    /// Qualification has not been broken into windows yet.
    #[serde(rename = "pending")]
    #[strum(serialize = "pending")]
    Pending,
    /// Waiting for the auction protocol to be verified.
    #[serde(rename = "pending.verification")]
    #[strum(serialize = "pending.verification")]
    PendingVerification,
    /// Protocol verified, waiting for the payment to arrive.
    #[serde(rename = "pending.payment")]
    #[strum(serialize = "pending.payment")]
    PendingPayment,
    /// Stand-by award held for the runner-up bid.
    #[serde(rename = "pending.waiting")]
    #[strum(serialize = "pending.waiting")]
    PendingWaiting,
    /// Award accepted, contract on the way.
    #[serde(rename = "active")]
    #[strum(serialize = "active")]
    Active,
    #[serde(rename = "cancelled")]
    #[strum(serialize = "cancelled")]
    Cancelled,
    #[serde(rename = "unsuccessful")]
    #[strum(serialize = "unsuccessful")]
    Unsuccessful,
}

impl AwardStatus {
    /// Statuses of an award whose qualification has not concluded yet.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AwardStatus::Active | AwardStatus::Pending)
    }

    /// Statuses that only exist after award windows have been rolled out.
    pub fn is_staged(&self) -> bool {
        matches!(
            self,
            AwardStatus::PendingVerification
                | AwardStatus::PendingPayment
                | AwardStatus::PendingWaiting
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub id:                  AwardId,
    #[serde(rename = "bid_id")]
    pub bid_id:              BidId,
    pub status:              AwardStatus,
    #[serde(
        default,
        with = "crate::serde::nullable_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub date:                Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value:               Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppliers:           Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaint_period:    Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_period:      Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_period:      Option<Period>,
    #[serde(flatten)]
    pub extra:               Map<String, Value>,
}
