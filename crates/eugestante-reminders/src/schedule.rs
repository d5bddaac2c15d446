use chrono::{DateTime, Days, Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use eugestante_core::time::TimeOfDay;

/// Longest spring-forward gap searched backwards for the pre-gap offset.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Compute the next instant strictly after `now` at which the local wall
/// clock reads `time`.
///
/// Today's slot is used when it is still ahead; a slot equal to `now` counts
/// as elapsed and rolls to tomorrow. A slot inside a DST spring-forward gap
/// is shifted forward by the gap length on the same day (02:30 in a
/// 02:00-03:00 gap fires at 03:30); an ambiguous slot (fall-back) fires at
/// its earliest occurrence.
///
/// Returns `None` only if no valid slot exists within three days, which no
/// real time zone produces.
pub fn next_fire_instant<Tz: TimeZone>(time: TimeOfDay, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();

    (0..3u64).find_map(|offset| {
        let day = today.checked_add_days(Days::new(offset))?;
        let candidate = resolve_local(&tz, day.and_time(time.to_naive()))?;
        (candidate > *now).then_some(candidate)
    })
}

/// Map a local wall-clock reading to an instant.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // Inside a gap: read the wall clock with the offset in force just
            // before it, which lands the same distance past the gap's end.
            let before = (1..=MAX_GAP_MINUTES).find_map(|m| {
                tz.from_local_datetime(&(naive - Duration::minutes(m)))
                    .earliest()
            })?;
            let fixed = before.offset().fix();
            let shifted = fixed.from_local_datetime(&naive).single()?;
            Some(shifted.with_timezone(tz))
        }
    }
}
