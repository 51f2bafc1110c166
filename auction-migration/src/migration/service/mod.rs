use {
    crate::{
        kernel::{
            calendar::BusinessCalendar,
            ranking::BidRanker,
        },
        migration::repository::{
            Database,
            Repository,
        },
    },
    std::{
        ops::Deref,
        sync::Arc,
    },
    time::Duration,
};

pub mod apply_payment_flow;
pub mod apply_verification_flow;
pub mod migrate;

/// Procurement method types whose documents the award rollout touches.
pub const MIGRATED_PROCUREMENT_TYPES: [&str; 2] = ["dgfOtherAssets", "dgfFinancialAssets"];
/// Plugin that has to be enabled for the deployment before anything runs.
pub const PLUGIN: &str = "auctions.dgf";

/// Working-day spans of the three windows opened on each award.
pub const VERIFY_PROTOCOL_TIME: Duration = Duration::days(4);
pub const AWARD_PAYMENT_TIME: Duration = Duration::days(20);
pub const CONTRACT_SIGNING_TIME: Duration = Duration::days(40);

#[derive(Clone, Debug)]
pub struct Config {
    /// Plugins enabled for the deployment. `None` enables everything.
    pub plugins:            Option<Vec<String>>,
    /// Write the `unsuccessful` status to awards whose bids were invalidated
    /// during the rollout instead of only closing their complaint period.
    pub demote_dead_awards: bool,
}

pub struct ServiceInner {
    config:   Config,
    repo:     Repository,
    calendar: Box<dyn BusinessCalendar>,
    ranker:   Box<dyn BidRanker>,
}

#[derive(Clone)]
pub struct Service(Arc<ServiceInner>);

impl Deref for Service {
    type Target = ServiceInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Service {
    pub fn new(
        db: impl Database,
        config: Config,
        calendar: impl BusinessCalendar,
        ranker: impl BidRanker,
    ) -> Self {
        Self(Arc::new(ServiceInner {
            config,
            repo: Repository::new(db),
            calendar: Box::new(calendar),
            ranker: Box::new(ranker),
        }))
    }
}
