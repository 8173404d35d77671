use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseCategoryError;

/// 記録された1つの時間の区間。
///
/// `amount`は開始・終了時刻から導出せず、独立して保持する。
/// タイマーで記録した場合と手動で記録した場合で計算方法が異なるため。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub category: TimeCategory,
    /// タグへの名前による参照。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_tag: Option<String>,
    pub note: String,
    /// 分単位の時間。
    pub amount: f64,
}

impl TimeEntry {
    /// 新しい`TimeEntry`を返す。終了時刻とタグは持たない。
    pub fn new(start_time: DateTime<Utc>, category: TimeCategory, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time,
            end_time: None,
            category,
            custom_tag: None,
            note: String::new(),
            amount,
        }
    }

    /// 手動入力された開始・終了時刻から`TimeEntry`を作成する。
    ///
    /// 時間は開始から終了までの差を分単位(小数あり)で計算する。
    /// 終了が開始より前の場合は負の値になるが、ここでは検証しない。
    pub fn manual(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        category: TimeCategory,
        custom_tag: Option<String>,
        note: String,
    ) -> Self {
        let amount = (end_time - start_time).num_milliseconds() as f64 / 60_000.0;
        Self {
            id: Uuid::new_v4(),
            start_time,
            end_time: Some(end_time),
            category,
            custom_tag,
            note,
            amount,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.custom_tag = Some(tag.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }
}

/// 時間の類別。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeCategory {
    Work,
    Study,
    Exercise,
    Entertainment,
    Rest,
    Social,
    Custom,
    Other,
}

impl TimeCategory {
    /// 全ての類別。宣言順。
    pub const ALL: [TimeCategory; 8] = [
        TimeCategory::Work,
        TimeCategory::Study,
        TimeCategory::Exercise,
        TimeCategory::Entertainment,
        TimeCategory::Rest,
        TimeCategory::Social,
        TimeCategory::Custom,
        TimeCategory::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TimeCategory::Work => "work",
            TimeCategory::Study => "study",
            TimeCategory::Exercise => "exercise",
            TimeCategory::Entertainment => "entertainment",
            TimeCategory::Rest => "rest",
            TimeCategory::Social => "social",
            TimeCategory::Custom => "custom",
            TimeCategory::Other => "other",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TimeCategory::Work => "briefcase.fill",
            TimeCategory::Study => "book.fill",
            TimeCategory::Exercise => "figure.run",
            TimeCategory::Entertainment => "tv.fill",
            TimeCategory::Rest => "bed.double.fill",
            TimeCategory::Social => "person.2.fill",
            TimeCategory::Custom => "tag.fill",
            TimeCategory::Other => "ellipsis.circle.fill",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TimeCategory::Work => "blue",
            TimeCategory::Study => "green",
            TimeCategory::Exercise => "orange",
            TimeCategory::Entertainment => "purple",
            TimeCategory::Rest => "gray",
            TimeCategory::Social => "pink",
            TimeCategory::Custom => "teal",
            TimeCategory::Other => "brown",
        }
    }
}

impl fmt::Display for TimeCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeCategory {
    type Err = ParseCategoryError;

    /// 大文字・小文字を区別せずに類別名をパースする。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        TimeCategory::ALL
            .iter()
            .find(|category| category.name() == lower)
            .copied()
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rstest::rstest;

    use super::{TimeCategory, TimeEntry};
    use crate::error::ParseCategoryError;

    /// 類別名が大文字・小文字を区別せずにパースできることを確認する。
    #[rstest]
    #[case::lower("work", TimeCategory::Work)]
    #[case::upper("STUDY", TimeCategory::Study)]
    #[case::padded(" rest ", TimeCategory::Rest)]
    #[case::mixed("Entertainment", TimeCategory::Entertainment)]
    fn test_parse_category(#[case] input: &str, #[case] expected: TimeCategory) {
        assert_eq!(input.parse::<TimeCategory>(), Ok(expected));
    }

    /// 未知の類別名はエラーになることを確認する。
    #[test]
    fn test_parse_unknown_category() {
        assert_eq!(
            "sleep".parse::<TimeCategory>(),
            Err(ParseCategoryError("sleep".to_string()))
        );
    }

    /// 全ての類別が表示名から元に戻せることを確認する。
    #[test]
    fn test_display_matches_parse() {
        for category in TimeCategory::ALL {
            assert_eq!(category.to_string().parse::<TimeCategory>(), Ok(category));
        }
    }

    /// 手動入力の時間が開始・終了の差から分単位で計算されることを確認する。
    #[rstest]
    #[case::ninety_minutes(Duration::minutes(90), 90.0)]
    #[case::half_minute(Duration::seconds(30), 0.5)]
    #[case::zero(Duration::zero(), 0.0)]
    #[case::reversed(Duration::minutes(-10), -10.0)]
    fn test_manual_amount(#[case] span: Duration, #[case] expected: f64) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        let entry = TimeEntry::manual(
            start,
            start + span,
            TimeCategory::Work,
            None,
            String::new(),
        );

        assert_eq!(entry.amount, expected);
        assert_eq!(entry.end_time, Some(start + span));
    }

    /// 値のないoptionalなフィールドはエンコード結果に含まれないことを確認する。
    #[test]
    fn test_serialize_omits_absent_fields() {
        let entry = TimeEntry::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            TimeCategory::Exercise,
            45.0,
        );

        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["category"], "exercise");
        assert_eq!(value["startTime"], "2024-01-01T09:00:00Z");
        assert!(value.get("endTime").is_none());
        assert!(value.get("customTag").is_none());
    }

    /// optionalなフィールドが欠けていてもデコードできることを確認する。
    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "startTime": "2024-01-01T09:00:00Z",
            "category": "study",
            "note": "",
            "amount": 25.0
        }"#;

        let entry: TimeEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.category, TimeCategory::Study);
        assert_eq!(entry.end_time, None);
        assert_eq!(entry.custom_tag, None);
        assert_eq!(entry.amount, 25.0);
    }
}
