use {
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

/// Time window attached to auctions and awards.
///
/// Both bounds are optional on the wire. A window without an `endDate` is
/// still open.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(
        default,
        with = "crate::serde::nullable_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "crate::serde::nullable_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date:   Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra:      Map<String, Value>,
}

impl Period {
    pub fn starting(start: OffsetDateTime) -> Self {
        Self {
            start_date: Some(start),
            ..Default::default()
        }
    }

    pub fn spanning(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start_date: Some(start),
            end_date:   Some(end),
            extra:      Map::new(),
        }
    }
}
