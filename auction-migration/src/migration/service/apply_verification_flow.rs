use {
    super::{
        Service,
        AWARD_PAYMENT_TIME,
        CONTRACT_SIGNING_TIME,
        MIGRATED_PROCUREMENT_TYPES,
        VERIFY_PROTOCOL_TIME,
    },
    crate::migration::{
        entities::{
            Auction,
            AuctionStatus,
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
    /// Rewrites every qualifying auction to the verification vocabulary of
    /// the post-auction flow: `pending` awards become `pending.verification`
    /// and every surviving award gets verification, payment and signing
    /// windows measured from its creation date.
    #[tracing::instrument(skip_all)]
    pub async fn apply_verification_flow(&self) -> anyhow::Result<()> {
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
                if !self.stage_verification_flow(&mut auction, now)? {
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

    /// Rewrites one document in place. Returns false when the document is not
    /// subject to the rollout and must not be written back.
    fn stage_verification_flow(
        &self,
        auction: &mut Auction,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        if !MIGRATED_PROCUREMENT_TYPES.contains(&auction.procurement_method_type.as_str()) {
            return Ok(false);
        }
        if !matches!(
            auction.status,
            AuctionStatus::ActiveQualification | AuctionStatus::ActiveAwarded
        ) {
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
        if unique_awards > 2 {
            auction.disqualify_excess_award(now)?;
        } else {
            auction.invalidate_bids_below_threshold()?;
            if auction.all_bids_invalid() {
                auction.disqualify_excess_award(now)?;
            } else {
                self.stage_award_windows(auction, unique_awards, now)?;
            }
        }
        auction.date_modified = Some(now);
        Ok(true)
    }

    fn stage_award_windows(
        &self,
        auction: &mut Auction,
        unique_awards: usize,
        now: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut awards = auction.awards.take().unwrap_or_default();
        for award in &mut awards {
            if award.status.is_in_progress() && auction.bid_invalid(&award.bid_id) {
                if self.config.demote_dead_awards {
                    award.status = AwardStatus::Unsuccessful;
                }
                award
                    .complaint_period
                    .get_or_insert_with(Period::default)
                    .end_date = Some(now);
                continue;
            }

            let anchor = award
                .date
                .with_context(|| format!("award {} has no date", award.id))?;
            award.verification_period = Some(Period::spanning(
                anchor,
                self.calendar
                    .business_date(anchor, VERIFY_PROTOCOL_TIME, auction, true),
            ));
            award.payment_period = Some(Period::spanning(
                anchor,
                self.calendar
                    .business_date(anchor, AWARD_PAYMENT_TIME, auction, true),
            ));
            award.signing_period = Some(Period::spanning(
                anchor,
                self.calendar
                    .business_date(anchor, CONTRACT_SIGNING_TIME, auction, true),
            ));

            match award.status {
                AwardStatus::Pending => {
                    award.status = AwardStatus::PendingVerification;
                    let signing_end = award.signing_period.as_ref().and_then(|period| period.end_date);
                    award
                        .complaint_period
                        .get_or_insert_with(Period::default)
                        .end_date = signing_end;
                }
                AwardStatus::Cancelled | AwardStatus::Unsuccessful => {
                    let complaint_end =
                        award.complaint_period.as_ref().and_then(|period| period.end_date);
                    for period in [
                        &mut award.verification_period,
                        &mut award.payment_period,
                        &mut award.signing_period,
                    ] {
                        if let Some(period) = period {
                            period.end_date = complaint_end;
                        }
                    }
                }
                AwardStatus::Active => {
                    let signing_end = award.signing_period.as_ref().and_then(|period| period.end_date);
                    if let Some(period) = award.verification_period.as_mut() {
                        period.end_date = signing_end;
                    }
                    if let Some(period) = award.payment_period.as_mut() {
                        period.end_date = signing_end;
                    }
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
            let first_award_date = awards[0].date;
            let mut follow_up = Award {
                id:                  Uuid::new_v4().simple().to_string(),
                bid_id:              runner_up.id.clone(),
                status:              AwardStatus::PendingWaiting,
                date:                first_award_date,
                value:               runner_up.value.clone(),
                suppliers:           runner_up.tenderers.clone(),
                complaint_period:    Some(Period {
                    start_date: first_award_date,
                    ..Default::default()
                }),
                verification_period: None,
                payment_period:      None,
                signing_period:      None,
                extra:               serde_json::Map::new(),
            };
            if runner_up.is_invalid() {
                follow_up.status = AwardStatus::Unsuccessful;
                if let Some(period) = follow_up.complaint_period.as_mut() {
                    period.end_date = Some(now);
                }
            }
            awards.push(follow_up);
        }

        auction.awards = Some(awards);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            kernel::{
                calendar::WorkingDayCalendar,
                ranking::MockBidRanker,
            },
            migration::{
                entities::{
                    Bid,
                    BidStatus,
                    Money,
                },
                repository::{
                    AuctionRow,
                    MockDatabase,
                },
                service::{
                    tests::dgf_config,
                    Config,
                    PLUGIN,
                },
            },
        },
        serde_json::json,
        time::macros::datetime,
    };

    const ANCHOR: OffsetDateTime = datetime!(2016-10-03 14:30 +2);
    const NOW: OffsetDateTime = datetime!(2016-11-01 09:00 +2);

    fn money(amount: f64) -> Money {
        Money {
            amount,
            currency: Some("UAH".to_string()),
            value_added_tax_included: Some(true),
            extra: serde_json::Map::new(),
        }
    }

    fn bid(id: &str, amount: f64) -> Bid {
        Bid {
            id:        id.to_string(),
            status:    Some(BidStatus::Active),
            date:      Some(ANCHOR),
            value:     Some(money(amount)),
            tenderers: Some(json!([{"name": format!("supplier of {id}")}])),
            extra:     serde_json::Map::new(),
        }
    }

    fn award(id: &str, bid_id: &str, status: AwardStatus) -> Award {
        Award {
            id:                  id.to_string(),
            bid_id:              bid_id.to_string(),
            status,
            date:                Some(ANCHOR),
            value:               Some(money(480.0)),
            suppliers:           None,
            complaint_period:    Some(Period::starting(ANCHOR)),
            verification_period: None,
            payment_period:      None,
            signing_period:      None,
            extra:               serde_json::Map::new(),
        }
    }

    fn auction(bids: Vec<Bid>, awards: Vec<Award>) -> Auction {
        Auction {
            id:                      "d50d83a49d9c48938dd00e5d9b835930".to_string(),
            procurement_method_type: "dgfOtherAssets".to_string(),
            status:                  AuctionStatus::ActiveQualification,
            bids,
            awards:                  Some(awards),
            contracts:               None,
            award_period:            Some(Period::starting(ANCHOR)),
            value:                   Some(money(400.0)),
            minimal_step:            Some(money(35.0)),
            features:                None,
            date_modified:           None,
            extra:                   serde_json::Map::new(),
        }
    }

    fn service() -> Service {
        Service::new_with_mocks(MockDatabase::new(), dgf_config())
    }

    #[test]
    fn single_distinct_bidder_gets_windows_and_a_stand_by_award() {
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![award("award_a", "bid_a", AwardStatus::Pending)],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        let awards = auction.awards.as_ref().unwrap();
        assert_eq!(awards.len(), 2);

        let staged = &awards[0];
        assert_eq!(staged.status, AwardStatus::PendingVerification);
        let verification = staged.verification_period.as_ref().unwrap();
        assert_eq!(verification.start_date, Some(ANCHOR));
        assert_eq!(verification.end_date, Some(datetime!(2016-10-07 14:30 +2)));
        let payment = staged.payment_period.as_ref().unwrap();
        assert_eq!(payment.start_date, Some(ANCHOR));
        assert_eq!(payment.end_date, Some(datetime!(2016-10-31 14:30 +2)));
        let signing = staged.signing_period.as_ref().unwrap();
        assert_eq!(signing.start_date, Some(ANCHOR));
        assert_eq!(signing.end_date, Some(datetime!(2016-11-28 14:30 +2)));
        assert_eq!(
            staged.complaint_period.as_ref().unwrap().end_date,
            signing.end_date
        );

        let stand_by = &awards[1];
        assert_eq!(stand_by.status, AwardStatus::PendingWaiting);
        assert_eq!(stand_by.bid_id, "bid_b");
        assert_eq!(stand_by.date, Some(ANCHOR));
        assert_eq!(stand_by.id.len(), 32);
        assert_eq!(stand_by.value.as_ref().unwrap().amount, 475.0);
        let complaint = stand_by.complaint_period.as_ref().unwrap();
        assert_eq!(complaint.start_date, Some(ANCHOR));
        assert_eq!(complaint.end_date, None);
        assert!(stand_by.verification_period.is_none());
        assert!(stand_by.payment_period.is_none());
        assert!(stand_by.signing_period.is_none());

        assert_eq!(auction.date_modified, Some(NOW));
    }

    #[test]
    fn two_distinct_bidders_do_not_get_a_stand_by_award() {
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![
                award("award_a", "bid_a", AwardStatus::Pending),
                award("award_b", "bid_b", AwardStatus::Pending),
            ],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        let awards = auction.awards.as_ref().unwrap();
        assert_eq!(awards.len(), 2);
        assert!(awards
            .iter()
            .all(|award| award.status == AwardStatus::PendingVerification));
    }

    #[test]
    fn invalid_runner_up_bid_stages_an_unsuccessful_stand_by() {
        // bid_b sits below the 435.00 threshold
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 430.0)],
            vec![award("award_a", "bid_a", AwardStatus::Pending)],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        let awards = auction.awards.as_ref().unwrap();
        assert_eq!(awards.len(), 2);
        let stand_by = &awards[1];
        assert_eq!(stand_by.status, AwardStatus::Unsuccessful);
        assert_eq!(stand_by.bid_id, "bid_b");
        let complaint = stand_by.complaint_period.as_ref().unwrap();
        assert_eq!(complaint.start_date, Some(ANCHOR));
        assert_eq!(complaint.end_date, Some(NOW));
    }

    #[test]
    fn active_award_windows_all_close_at_the_signing_end() {
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![
                award("award_a", "bid_a", AwardStatus::Active),
                award("award_b", "bid_b", AwardStatus::Pending),
            ],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        let active = &auction.awards.as_ref().unwrap()[0];
        assert_eq!(active.status, AwardStatus::Active);
        let signing_end = Some(datetime!(2016-11-28 14:30 +2));
        assert_eq!(active.signing_period.as_ref().unwrap().end_date, signing_end);
        assert_eq!(active.verification_period.as_ref().unwrap().end_date, signing_end);
        assert_eq!(active.payment_period.as_ref().unwrap().end_date, signing_end);
        // the complaint window is not touched on this branch
        assert_eq!(active.complaint_period.as_ref().unwrap().end_date, None);
    }

    #[test]
    fn closed_award_windows_collapse_to_the_complaint_end() {
        let complaint_end = datetime!(2016-10-10 12:00 +2);
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![
                award("award_a", "bid_a", AwardStatus::Cancelled),
                award("award_b", "bid_b", AwardStatus::Pending),
            ],
        );
        auction.awards.as_mut().unwrap()[0].complaint_period =
            Some(Period::spanning(ANCHOR, complaint_end));
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        let cancelled = &auction.awards.as_ref().unwrap()[0];
        assert_eq!(cancelled.status, AwardStatus::Cancelled);
        for period in [
            &cancelled.verification_period,
            &cancelled.payment_period,
            &cancelled.signing_period,
        ] {
            let period = period.as_ref().unwrap();
            assert_eq!(period.start_date, Some(ANCHOR));
            assert_eq!(period.end_date, Some(complaint_end));
        }
    }

    #[test]
    fn dead_bid_award_keeps_its_status_but_loses_the_complaint_window() {
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 430.0)],
            vec![
                award("award_b", "bid_b", AwardStatus::Pending),
                award("award_a", "bid_a", AwardStatus::Pending),
            ],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        // bid_b sits below the 435.00 threshold, so its award is dead
        assert!(auction.bids[1].is_invalid());
        let awards = auction.awards.as_ref().unwrap();
        let dead = &awards[0];
        assert_eq!(dead.status, AwardStatus::Pending);
        assert_eq!(dead.complaint_period.as_ref().unwrap().end_date, Some(NOW));
        assert!(dead.verification_period.is_none());

        let staged = &awards[1];
        assert_eq!(staged.status, AwardStatus::PendingVerification);
        assert!(staged.verification_period.is_some());
    }

    #[test]
    fn demote_dead_awards_writes_the_unsuccessful_status() {
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 430.0)],
            vec![
                award("award_b", "bid_b", AwardStatus::Pending),
                award("award_a", "bid_a", AwardStatus::Pending),
            ],
        );
        let service = Service::new_with_mocks(
            MockDatabase::new(),
            Config {
                plugins:            Some(vec![PLUGIN.to_string()]),
                demote_dead_awards: true,
            },
        );
        assert!(service.stage_verification_flow(&mut auction, NOW).unwrap());

        let dead = &auction.awards.as_ref().unwrap()[0];
        assert_eq!(dead.status, AwardStatus::Unsuccessful);
        assert_eq!(dead.complaint_period.as_ref().unwrap().end_date, Some(NOW));
    }

    #[test]
    fn three_distinct_bidders_disqualify_the_first_open_award() {
        // bid_c is priced below the 435.00 threshold, which must not matter
        // on this path
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0), bid("bid_c", 430.0)],
            vec![
                award("award_a", "bid_a", AwardStatus::Active),
                award("award_b", "bid_b", AwardStatus::Unsuccessful),
                award("award_c", "bid_c", AwardStatus::Pending),
            ],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        let awards = auction.awards.as_ref().unwrap();
        assert_eq!(awards[0].status, AwardStatus::Unsuccessful);
        assert_eq!(awards[0].complaint_period.as_ref().unwrap().end_date, Some(NOW));
        // only the first open award is taken down
        assert_eq!(awards[2].status, AwardStatus::Pending);
        assert!(awards.iter().all(|award| award.verification_period.is_none()));

        assert_eq!(auction.status, AuctionStatus::Unsuccessful);
        assert_eq!(auction.award_period.as_ref().unwrap().end_date, Some(NOW));
        // the threshold rule never ran on this path
        assert!(auction.bids.iter().all(|bid| !bid.is_invalid()));
    }

    #[test]
    fn entirely_invalid_bids_disqualify_the_auction() {
        let mut auction = auction(
            vec![bid("bid_a", 420.0), bid("bid_b", 410.0)],
            vec![award("award_a", "bid_a", AwardStatus::Pending)],
        );
        assert!(service().stage_verification_flow(&mut auction, NOW).unwrap());

        assert!(auction.bids.iter().all(Bid::is_invalid));
        let awards = auction.awards.as_ref().unwrap();
        assert_eq!(awards.len(), 1);
        assert_eq!(awards[0].status, AwardStatus::Unsuccessful);
        assert_eq!(auction.status, AuctionStatus::Unsuccessful);
    }

    #[test]
    fn documents_outside_the_rollout_are_not_touched() {
        let service = service();

        let mut foreign = auction(vec![bid("bid_a", 480.0)], vec![]);
        foreign.procurement_method_type = "belowThreshold".to_string();
        let untouched = foreign.clone();
        assert!(!service.stage_verification_flow(&mut foreign, NOW).unwrap());
        assert_eq!(foreign, untouched);

        let mut tendering = auction(vec![bid("bid_a", 480.0)], vec![]);
        tendering.status = AuctionStatus::ActiveTendering;
        assert!(!service.stage_verification_flow(&mut tendering, NOW).unwrap());

        let mut awardless = auction(vec![bid("bid_a", 480.0)], vec![]);
        awardless.awards = None;
        assert!(!service.stage_verification_flow(&mut awardless, NOW).unwrap());
    }

    #[test]
    fn previously_staged_documents_are_skipped() {
        let service = service();

        let mut staged = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![award("award_a", "bid_a", AwardStatus::Pending)],
        );
        staged.awards.as_mut().unwrap()[0].verification_period = Some(Period::starting(ANCHOR));
        let untouched = staged.clone();
        assert!(!service.stage_verification_flow(&mut staged, NOW).unwrap());
        assert_eq!(staged, untouched);

        let mut waiting = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![award("award_a", "bid_a", AwardStatus::PendingWaiting)],
        );
        assert!(!service.stage_verification_flow(&mut waiting, NOW).unwrap());
    }

    #[test]
    fn staging_twice_changes_nothing_more() {
        let service = service();
        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![award("award_a", "bid_a", AwardStatus::Pending)],
        );
        assert!(service.stage_verification_flow(&mut auction, NOW).unwrap());

        let after_first_pass = auction.clone();
        let later = datetime!(2016-12-01 09:00 +2);
        assert!(!service.stage_verification_flow(&mut auction, later).unwrap());
        assert_eq!(auction, after_first_pass);
    }

    #[test]
    fn missing_runner_up_bid_aborts_the_migration() {
        let mut auction = auction(
            vec![bid("bid_a", 480.0)],
            vec![award("award_a", "bid_a", AwardStatus::Pending)],
        );
        let err = service()
            .stage_verification_flow(&mut auction, NOW)
            .unwrap_err();
        assert!(err.to_string().contains("no runner-up bid"));
    }

    #[test]
    fn ranking_decides_the_stand_by_bidder() {
        let mut ranker = MockBidRanker::new();
        ranker
            .expect_rank()
            .returning(|bids, _| vec![bids[1].clone(), bids[0].clone()]);
        let service = Service::new(
            MockDatabase::new(),
            dgf_config(),
            WorkingDayCalendar,
            ranker,
        );

        let mut auction = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![award("award_b", "bid_b", AwardStatus::Pending)],
        );
        assert!(service.stage_verification_flow(&mut auction, NOW).unwrap());

        let stand_by = &auction.awards.as_ref().unwrap()[1];
        assert_eq!(stand_by.bid_id, "bid_a");
    }

    fn row(auction: &Auction) -> AuctionRow {
        AuctionRow {
            id:   auction.id.clone(),
            data: sqlx::types::Json(serde_json::to_value(auction).unwrap()),
        }
    }

    fn stored_auction(index: usize) -> Auction {
        let mut stored = auction(
            vec![bid("bid_a", 480.0), bid("bid_b", 475.0)],
            vec![
                award("award_a", "bid_a", AwardStatus::Pending),
                award("award_b", "bid_b", AwardStatus::Pending),
            ],
        );
        stored.id = format!("auction{index:04}");
        stored
    }

    #[tokio::test]
    async fn scan_flushes_full_batches_and_the_tail() {
        let first_page: Vec<AuctionRow> = (0..AUCTION_PAGE_SIZE as usize)
            .map(|index| row(&stored_auction(index)))
            .collect();
        let second_page: Vec<AuctionRow> = (0..2)
            .map(|index| row(&stored_auction(AUCTION_PAGE_SIZE as usize + index)))
            .collect();

        let mut db = MockDatabase::new();
        db.expect_get_auction_page()
            .withf(|after, limit| after.is_none() && *limit == AUCTION_PAGE_SIZE)
            .times(1)
            .returning(move |_, _| Ok(first_page.clone()));
        db.expect_get_auction_page()
            .withf(|after, _| after.as_deref() == Some("auction1023"))
            .times(1)
            .returning(move |_, _| Ok(second_page.clone()));
        db.expect_update_auctions()
            .withf(|auctions| auctions.len() == BULK_UPDATE_SIZE)
            .times(8)
            .returning(|_| Ok(()));
        db.expect_update_auctions()
            .withf(|auctions| auctions.len() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let service = Service::new_with_mocks(db, dgf_config());
        service.apply_verification_flow().await.unwrap();
    }

    #[tokio::test]
    async fn broken_document_aborts_the_scan() {
        let mut db = MockDatabase::new();
        db.expect_get_auction_page().times(1).returning(|_, _| {
            Ok(vec![AuctionRow {
                id:   "broken".to_string(),
                data: sqlx::types::Json(json!({"id": "broken", "status": "nonsense"})),
            }])
        });

        let service = Service::new_with_mocks(db, dgf_config());
        let err = service.apply_verification_flow().await.unwrap_err();
        assert!(err.to_string().contains("Invalid auction document"));
    }
}
