use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use crate::datetime::{self, MINUTES_PER_DAY};
use crate::storage::BlobStore;
use crate::store::Store;
use crate::time_entry::TimeEntry;

/// 日毎の情報を出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<DateTime<Utc>>,
}

/// 1日分の集計結果。
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub entries: Vec<TimeEntry>,
    pub spent_minutes: f64,
    /// 1440分から使用済みを引いた分数。
    pub remaining_minutes: f64,
}

pub struct DailyCommand<'a, S: BlobStore> {
    store: &'a Store<S>,
}

impl<'a, S: BlobStore> DailyCommand<'a, S> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - 記録を保持するストア
    pub fn new(store: &'a Store<S>) -> Self {
        Self { store }
    }

    /// `daily`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日に開始した記録を集計する。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `daily` - `daily`サブコマンドの引数
    pub fn run(&self, daily: DailyArgs) -> Result<DailyReport> {
        let (reference, spent_minutes, remaining_minutes) = match daily.date {
            Some(date) => {
                let spent = self.store.time_spent_on_day_of(&date);
                (date, spent, MINUTES_PER_DAY - spent)
            }
            None => (
                datetime::now(),
                self.store.time_spent_today(),
                self.store.time_remaining_today(),
            ),
        };
        let date = datetime::local_date(&reference);
        info!("Date: {}", date);

        let entries = self
            .store
            .entries_on_day_of(&reference)
            .into_iter()
            .cloned()
            .collect();

        Ok(DailyReport {
            date,
            entries,
            spent_minutes,
            remaining_minutes,
        })
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))?;
    datetime::start_of_day(naive_date).context("Failed to convert to DateTime<Local>")
}
