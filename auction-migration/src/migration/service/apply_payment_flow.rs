// Not registered with any migration step, reachable only from its tests.
#![allow(dead_code)]

use {
    super::{
        Service,
        AWARD_PAYMENT_TIME,
        CONTRACT_SIGNING_TIME,
        MIGRATED_PROCUREMENT_TYPES,
    },
    crate::migration::{
        entities::{
            Auction,
            Award,
            AwardStatus,
            Period,
        },
        repository::{
            AUCTION_PAGE_SIZE,
            BULK_UPDATE_SIZE,
        },
    },
    anyhow::Context,
    time::OffsetDateTime,
    uuid::Uuid,
};

impl Service {
    /// Earlier rollout variant that staged awards straight into the payment
    /// vocabulary: `pending` becomes `pending.payment` and the windows are
    /// measured from the migration instant instead of the award date.
    ///
    /// Superseded by [`Service::apply_verification_flow`] and no longer
    /// registered with any migration step. Kept around because deployed
    /// stores were shaped by it and its behavior documents what those
    /// documents mean.
    #[tracing::instrument(skip_all)]
    pub async fn apply_payment_flow(&self) -> anyhow::Result<()> {
        let mut queued: Vec<Auction> = Vec::new();
        let mut after = None;
        loop {
            let page = self
                .repo
                .get_auction_page(after.clone(), AUCTION_PAGE_SIZE)
                .await?;
            let page_len = page.len() as i64;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id.clone());
            for mut auction in page {
                let now = OffsetDateTime::now_utc();
                if !self.stage_payment_flow(&mut auction, now)? {
                    continue;
                }
                tracing::debug!(
                    auction_id = auction.id,
                    status = auction.status.as_ref(),
                    "Rewrote auction awards"
                );
                queued.push(auction);
                if queued.len() >= BULK_UPDATE_SIZE {
                    self.repo.save_auctions(&queued).await?;
                    queued.clear();
                }
            }
            if page_len < AUCTION_PAGE_SIZE {
                break;
            }
        }
        if !queued.is_empty() {
            self.repo.save_auctions(&queued).await?;
        }
        Ok(())
    }

    /// Unlike the verification flow this variant does not look at the auction
    /// status and never invalidates bids or disqualifies awards.
    fn stage_payment_flow(
        &self,
        auction: &mut Auction,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        if !MIGRATED_PROCUREMENT_TYPES.contains(&auction.procurement_method_type.as_str()) {
            return Ok(false);
        }
        if auction.awards.is_none() {
            return Ok(false);
        }
        if auction.awards_already_staged() {
            tracing::warn!(
                auction_id = auction.id,
                "Auction already carries staged awards, skipping"
            );
            return Ok(false);
        }

        let unique_awards = auction.unique_award_bidders();
        let mut awards = auction.awards.take().unwrap_or_default();
        for award in &mut awards {
            match award.status {
                AwardStatus::Pending => {
                    let complaint_start = award
                        .complaint_period
                        .as_ref()
                        .and_then(|period| period.start_date)
                        .with_context(|| {
                            format!("award {} has no complaintPeriod start", award.id)
                        })?;
                    award.status = AwardStatus::PendingPayment;
                    award.verification_period = Some(Period::spanning(complaint_start, now));
                    award.payment_period = Some(Period::spanning(
                        now,
                        self.calendar
                            .business_date(now, AWARD_PAYMENT_TIME, auction, true),
                    ));
                }
                AwardStatus::Active => {
                    let complaint = award.complaint_period.clone().with_context(|| {
                        format!("award {} has no complaintPeriod", award.id)
                    })?;
                    let complaint_start = complaint.start_date.with_context(|| {
                        format!("award {} has no complaintPeriod start", award.id)
                    })?;
                    let complaint_end = complaint.end_date.with_context(|| {
                        format!("award {} has no complaintPeriod end", award.id)
                    })?;
                    award.verification_period =
                        Some(Period::spanning(complaint_start, complaint_start));
                    award.payment_period = Some(Period::spanning(complaint_start, complaint_end));
                    award.signing_period = Some(Period::spanning(
                        now,
                        self.calendar
                            .business_date(now, CONTRACT_SIGNING_TIME, auction, true),
                    ));
                }
                AwardStatus::Cancelled | AwardStatus::Unsuccessful => {
                    award.verification_period = award.complaint_period.clone();
                }
                // staged statuses cannot reach this loop, the whole document
                // is skipped before it
                _ => {}
            }
        }

        if unique_awards == 1 {
            let ranked = self.ranker.rank(&auction.bids, &auction.features);
            let runner_up = ranked.get(1).cloned().with_context(|| {
                format!("auction {} has no runner-up bid to stage", auction.id)
            })?;
            awards.push(Award {
                id:                  Uuid::new_v4().simple().to_string(),
                bid_id:              runner_up.id.clone(),
                status:              AwardStatus::PendingWaiting,
                date:                Some(now),
                value:               runner_up.value.clone(),
                suppliers:           runner_up.tenderers.clone(),
                complaint_period:    Some(Period::starting(now)),
                verification_period: None,
                payment_period:      None,
                signing_period:      None,
                extra:               serde_json::Map::new(),
            });
        }

        auction.awards = Some(awards);
        auction.date_modified = Some(now);
        Ok(true)
    }
}
