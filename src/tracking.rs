use chrono::{DateTime, Utc};

use crate::time_entry::{TimeCategory, TimeEntry};

/// 計測中の時間。
///
/// 計測の停止時に1つの`TimeEntry`として`Store::record_entry`へ渡す。
/// 表示用の経過秒の更新は呼び出し側が行い、ストアには触れない。
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingSession {
    pub started_at: DateTime<Utc>,
    pub category: TimeCategory,
    pub custom_tag: Option<String>,
    pub note: String,
}

impl TrackingSession {
    pub fn start(started_at: DateTime<Utc>, category: TimeCategory, note: String) -> Self {
        Self {
            started_at,
            category,
            custom_tag: None,
            note,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.custom_tag = Some(tag.into());
        self
    }

    /// 開始からの経過秒。1秒未満は切り捨てる。`now`が開始より前なら0。
    pub fn elapsed_seconds(&self, now: &DateTime<Utc>) -> i64 {
        (*now - self.started_at).num_seconds().max(0)
    }

    /// 計測を終了し、記録を返す。
    ///
    /// 時間は経過した秒数を60で割った値。
    pub fn finish(self, end: DateTime<Utc>) -> TimeEntry {
        let amount = self.elapsed_seconds(&end) as f64 / 60.0;
        TimeEntry {
            custom_tag: self.custom_tag,
            note: self.note,
            ..TimeEntry::new(self.started_at, self.category, amount).with_end_time(end)
        }
    }
}
