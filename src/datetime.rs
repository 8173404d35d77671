use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};

/// 1日の分数。
pub const MINUTES_PER_DAY: f64 = 1440.0;

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// Localタイムゾーンでの暦日を返す。
pub fn local_date(time: &DateTime<Utc>) -> NaiveDate {
    time.with_timezone(&Local).date_naive()
}

/// 2つの時刻がLocalタイムゾーンで同じ日かどうか。
pub fn is_same_day(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    local_date(a) == local_date(b)
}

/// 2つの時刻がLocalタイムゾーンで同じ年・同じ月かどうか。
pub fn is_same_month(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    let (a, b) = (local_date(a), local_date(b));
    a.year() == b.year() && a.month() == b.month()
}

/// 指定された時刻を含む月の日数を返す。
///
/// 翌月1日と当月1日の差から求めるため、12月やうるう年の2月も正しく扱う。
pub fn days_in_month(time: &DateTime<Utc>) -> u32 {
    let date = local_date(time);
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    match (
        NaiveDate::from_ymd_opt(date.year(), date.month(), 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

/// Localタイムゾーンの暦日の00:00:00をUTCで返す。
///
/// 夏時間の切り替えで00:00が存在しない日は、その日の最も早い時刻を使う。
pub fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|datetime| datetime.to_utc())
}
