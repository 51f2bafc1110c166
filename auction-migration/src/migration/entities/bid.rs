use {
    super::Money,
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

pub type BidId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BidStatus {
    /// Bid takes part in the auction.
    Active,
    /// Bid was never submitted.
    Draft,
    /// Bid was ruled out during qualification.
    Invalid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id:        BidId,
    /// Absent on documents written before bid statuses existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status:    Option<BidStatus>,
    #[serde(
        default,
        with = "crate::serde::nullable_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub date:      Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value:     Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenderers: Option<Value>,
    #[serde(flatten)]
    pub extra:     Map<String, Value>,
}

impl Bid {
    pub fn is_invalid(&self) -> bool {
        self.status == Some(BidStatus::Invalid)
    }
}
