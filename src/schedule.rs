// Posting schedule builder.
//
// Engagement peaks Friday evening through the weekend, so threads start
// on a Friday (or today, when today already is Friday–Sunday). Weekday
// slots land at 18:00 local with a random minute; weekend slots anywhere
// between 12:00 and 20:00. Every third tweet rolls over to the next day;
// the rest land 30–60 minutes apart conceptually, which the per-slot
// random minutes approximate.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One slot of the posting schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPost {
    /// 1-based position in the thread.
    pub tweet_number: usize,
    /// Human-readable slot, e.g. "Friday, June 05, 2026 at 06:12 PM".
    pub scheduled_time: String,
    pub timestamp: NaiveDateTime,
}

/// Build a schedule for `thread_len` tweets starting from the current
/// local date.
pub fn build_schedule(thread_len: usize) -> Vec<ScheduledPost> {
    build_schedule_from(
        chrono::Local::now().date_naive(),
        thread_len,
        &mut rand::thread_rng(),
    )
}

/// Deterministic core: schedule `thread_len` tweets starting from `today`.
pub fn build_schedule_from(
    today: NaiveDate,
    thread_len: usize,
    rng: &mut impl Rng,
) -> Vec<ScheduledPost> {
    let start_date = match today.weekday() {
        Weekday::Fri | Weekday::Sat | Weekday::Sun => today,
        other => {
            let days_until_friday =
                (Weekday::Fri.num_days_from_monday() + 7 - other.num_days_from_monday()) % 7;
            today
                .checked_add_days(Days::new(u64::from(days_until_friday)))
                .unwrap_or(today)
        }
    };

    let mut schedule = Vec::with_capacity(thread_len);
    let mut date = start_date;

    for i in 0..thread_len {
        let (hour, minute) = if is_weekend(date) {
            (12 + rng.gen_range(0..=8), rng.gen_range(0..60))
        } else {
            (18, rng.gen_range(0..60))
        };

        // Hour is at most 20 and minute below 60, so this can't fail
        let timestamp = date.and_hms_opt(hour, minute, 0).unwrap();

        schedule.push(ScheduledPost {
            tweet_number: i + 1,
            scheduled_time: timestamp.format("%A, %B %d, %Y at %I:%M %p").to_string(),
            timestamp,
        });

        // Every third tweet advances to the next day
        if i % 3 == 2 {
            date = date.checked_add_days(Days::new(1)).unwrap_or(date);
        }
    }

    schedule
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
