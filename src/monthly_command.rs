use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use log::info;

use crate::datetime;
use crate::storage::BlobStore;
use crate::store::Store;
use crate::time_entry::{TimeCategory, TimeEntry};

/// `monthly`サブコマンドの引数を表す構造体。
#[derive(Debug, clap::Args)]
pub struct MonthlyArgs {
    #[clap(
        short = 'm',
        long = "month",
        help = "Sets a custom month in the format YYYY-MM",
        parse(try_from_str = parse_month),
    )]
    month: Option<DateTime<Utc>>,

    #[clap(long = "daily", help = "Show summary by day")]
    daily: bool,
}

/// 1ヶ月分の集計結果。
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    /// 全ての類別の合計時間(分)。宣言順。
    pub totals: Vec<(TimeCategory, f64)>,
    pub spent_minutes: f64,
    /// 現在の予算に対する進捗(%)。月を指定した場合は`None`。
    pub progress: Option<f64>,
    /// `--daily`の場合のみ、日付の古い順。
    pub days: Vec<(NaiveDate, Vec<(TimeCategory, f64)>)>,
}

pub struct MonthlyCommand<'a, S: BlobStore> {
    store: &'a Store<S>,
}

impl<'a, S: BlobStore> MonthlyCommand<'a, S> {
    pub fn new(store: &'a Store<S>) -> Self {
        Self { store }
    }

    /// `monthly`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された月の記録を類別ごとに集計する。
    /// 月が指定されていない場合は、Localタイムゾーンで現在の月を利用する。
    ///
    /// # Arguments
    ///
    /// * `monthly` - `monthly`サブコマンドの引数
    pub fn run(&self, monthly: MonthlyArgs) -> Result<MonthlyReport> {
        let (reference, totals, spent_minutes, progress) = match monthly.month {
            Some(month) => (
                month,
                self.store.category_totals_in_month_of(&month),
                self.store.time_spent_in_month_of(&month),
                None,
            ),
            None => (
                datetime::now(),
                self.store.category_totals_for_current_month(),
                self.store.time_spent_this_month(),
                Some(self.store.monthly_progress()),
            ),
        };
        let local_date = datetime::local_date(&reference);
        info!("Month: {}-{:02}", local_date.year(), local_date.month());

        let days = if monthly.daily {
            daily_totals(&self.store.entries_in_month_of(&reference))
        } else {
            Vec::new()
        };

        Ok(MonthlyReport {
            year: local_date.year(),
            month: local_date.month(),
            totals,
            spent_minutes,
            progress,
            days,
        })
    }
}

/// 日毎、かつ類別ごとの合計時間を計算する。記録のない類別は含めない。
fn daily_totals(entries: &[&TimeEntry]) -> Vec<(NaiveDate, Vec<(TimeCategory, f64)>)> {
    let by_day: BTreeMap<NaiveDate, Vec<&TimeEntry>> =
        entries.iter().fold(BTreeMap::new(), |mut acc, entry| {
            acc.entry(datetime::local_date(&entry.start_time))
                .or_default()
                .push(*entry);
            acc
        });

    by_day
        .into_iter()
        .map(|(date, entries)| {
            let totals: Vec<(TimeCategory, f64)> = TimeCategory::ALL
                .iter()
                .filter_map(|category| {
                    let matching: Vec<f64> = entries
                        .iter()
                        .filter(|entry| entry.category == *category)
                        .map(|entry| entry.amount)
                        .collect();
                    if matching.is_empty() {
                        None
                    } else {
                        Some((*category, matching.iter().sum::<f64>()))
                    }
                })
                .collect();
            (date, totals)
        })
        .collect()
}

/// 月をパースする。
fn parse_month(s: &str) -> Result<DateTime<Utc>> {
    let target_date = s.to_string() + "-01";
    let naive_date = NaiveDate::parse_from_str(&target_date, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", target_date))?;
    let naive_datetime = naive_date
        .and_hms_opt(12, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .single()
        .context("Failed to convert to DateTime<Local>")?
        .to_utc();

    Ok(datetime)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::{parse_month, MonthlyArgs, MonthlyCommand};
    use crate::datetime::mock_datetime;
    use crate::storage::MemoryBlobStore;
    use crate::store::Store;
    use crate::time_entry::{TimeCategory, TimeEntry};

    fn local(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, month, day, hour, 0, 0)
            .unwrap()
            .to_utc()
    }

    fn store() -> Store<MemoryBlobStore> {
        mock_datetime::set_mock_time(local(1, 15, 12));
        let mut store = Store::load(MemoryBlobStore::new());
        store.record_entry(TimeEntry::new(local(1, 3, 9), TimeCategory::Work, 120.0));
        store.record_entry(TimeEntry::new(local(1, 3, 20), TimeCategory::Rest, 60.0));
        store.record_entry(TimeEntry::new(local(1, 15, 9), TimeCategory::Work, 30.0));
        store.record_entry(TimeEntry::new(local(2, 1, 9), TimeCategory::Study, 45.0));
        store
    }

    /// 月を指定しない場合は今月が集計され、予算に対する進捗が含まれることを確認する。
    #[test]
    fn test_monthly_command_current_month() {
        let store = store();

        let report = MonthlyCommand::new(&store)
            .run(MonthlyArgs {
                month: None,
                daily: false,
            })
            .unwrap();

        assert_eq!((report.year, report.month), (2024, 1));
        assert_eq!(report.totals[0], (TimeCategory::Work, 150.0));
        assert_eq!(report.spent_minutes, 210.0);
        assert_eq!(report.progress, Some(210.0 / (31.0 * 1440.0) * 100.0));
        assert!(report.days.is_empty());
    }

    /// 月を指定した場合はその月が集計されることを確認する。
    #[rstest]
    #[case::february("2024-02", 45.0)]
    #[case::empty("2023-12", 0.0)]
    fn test_monthly_command_with_month(#[case] month: &str, #[case] spent: f64) {
        let store = store();

        let report = MonthlyCommand::new(&store)
            .run(MonthlyArgs {
                month: Some(parse_month(month).unwrap()),
                daily: false,
            })
            .unwrap();

        assert_eq!(report.spent_minutes, spent);
        assert_eq!(report.progress, None);
    }

    /// `--daily`の場合、日毎・類別ごとの集計が日付順に含まれることを確認する。
    #[test]
    fn test_monthly_command_daily() {
        let store = store();

        let report = MonthlyCommand::new(&store)
            .run(MonthlyArgs {
                month: None,
                daily: true,
            })
            .unwrap();

        assert_eq!(
            report.days,
            vec![
                (
                    NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    vec![(TimeCategory::Work, 120.0), (TimeCategory::Rest, 60.0)],
                ),
                (
                    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                    vec![(TimeCategory::Work, 30.0)],
                ),
            ]
        );
    }

    /// 月の形式が不正な場合はエラーになることを確認する。
    #[rstest]
    #[case::month_out_of_range("2024-13")]
    #[case::with_day("2024-01-05")]
    fn test_parse_month_invalid(#[case] input: &str) {
        assert!(parse_month(input).is_err());
    }
}
