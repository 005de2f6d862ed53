//! Daily trigger at a fixed local wall-clock time.

use chrono::{DateTime, Days, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

use crate::context::AppContext;
use crate::fetcher::Fetch;
use crate::outputs::DigestSink;

/// The first `at` strictly after `now`: today if still ahead, otherwise tomorrow.
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        now.date()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(at))
            .unwrap_or(today)
    }
}

/// Resolve a wall-clock time in `tz`.
///
/// An ambiguous time (clocks going back) takes the earlier instant; a time
/// that does not exist (clocks going forward) moves on by an hour.
fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest(),
    }
}

/// The next instant at which the daily job should fire.
///
/// # Arguments
///
/// * `now` - Current time in the zone the schedule is read in
/// * `at` - Wall-clock time of day
///
/// # Returns
///
/// Today at `at` if that is still ahead of `now`, otherwise tomorrow.
///
/// # Examples
///
/// ```ignore
/// let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let next = next_run(Local::now(), at);
/// sleep((next - Local::now()).to_std().unwrap_or_default()).await;
/// ```
pub fn next_run<Tz: TimeZone>(now: DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let next = next_occurrence(now.naive_local(), at);
    resolve(&tz, next).unwrap_or_else(|| now + chrono::Duration::days(1))
}

fn delay_until<Tz: TimeZone>(now: &DateTime<Tz>, next: &DateTime<Tz>) -> Duration {
    next.clone()
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Run the digest every day at the context's schedule time. Never returns.
#[instrument(level = "info", skip_all, fields(at = %ctx.schedule_at))]
pub async fn run_daily<F, S>(ctx: Arc<AppContext<F, S>>)
where
    F: Fetch,
    S: DigestSink,
{
    loop {
        let now = Local::now();
        let next = next_run(now, ctx.schedule_at);
        info!(next_run = %next.to_rfc3339(), "Waiting for next scheduled run");
        sleep(delay_until(&now, &next)).await;

        match ctx.run_once().await {
            Ok(found) => info!(found, "Scheduled run finished"),
            Err(e) => error!(error = %e, "Scheduled run failed"),
        }
    }
}
