#[cfg(test)]
use mockall::automock;
use {
    crate::migration::entities::Auction,
    std::fmt::Debug,
    time::{
        Duration,
        OffsetDateTime,
        Time,
        Weekday,
    },
};

/// Deadline arithmetic over the deployment's working calendar.
///
/// Award windows are measured in working days, so the end of a window depends
/// on which days count as working for the deployment. The auction document is
/// passed along because some deployments derive calendar adjustments from it.
#[cfg_attr(test, automock)]
pub trait BusinessCalendar: Debug + Send + Sync + 'static {
    /// Returns `start` advanced by `offset`, counting working days only.
    ///
    /// With `round_up` set, a `start` that falls on a non-working day is
    /// snapped to the beginning of the next working day before counting.
    fn business_date(
        &self,
        start: OffsetDateTime,
        offset: Duration,
        auction: &Auction,
        round_up: bool,
    ) -> OffsetDateTime;
}

/// Calendar that treats Saturdays and Sundays as non-working days.
///
/// Deployments with a national holiday feed provide their own implementation.
#[derive(Clone, Debug, Default)]
pub struct WorkingDayCalendar;

impl BusinessCalendar for WorkingDayCalendar {
    fn business_date(
        &self,
        start: OffsetDateTime,
        offset: Duration,
        _auction: &Auction,
        round_up: bool,
    ) -> OffsetDateTime {
        let mut date = start;
        if round_up && is_weekend(date) {
            date = date.replace_time(Time::MIDNIGHT) + Duration::days(1);
            while is_weekend(date) {
                date += Duration::days(1);
            }
        }
        for _ in 0..offset.whole_days() {
            date += Duration::days(1);
            while is_weekend(date) {
                date += Duration::days(1);
            }
        }
        date
    }
}

fn is_weekend(date: OffsetDateTime) -> bool {
    matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday)
}
