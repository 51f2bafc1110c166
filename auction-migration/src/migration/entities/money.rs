use {
    serde::{
        Deserialize,
        Serialize,
    },
    serde_json::{
        Map,
        Value,
    },
};

/// Monetary value as stored on auctions, bids and awards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount:                   f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency:                 Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_added_tax_included: Option<bool>,
    #[serde(flatten)]
    pub extra:                    Map<String, Value>,
}
