use anyhow::Result;
use chrono::NaiveDate;
use log::info;

use crate::storage::BlobStore;
use crate::store::Store;
use crate::time_entry::{TimeCategory, TimeEntry};

/// `history`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct HistoryArgs {
    #[clap(short = 'c', long = "category", help = "Show only entries of this category")]
    category: Option<TimeCategory>,
}

pub struct HistoryCommand<'a, S: BlobStore> {
    store: &'a Store<S>,
}

impl<'a, S: BlobStore> HistoryCommand<'a, S> {
    pub fn new(store: &'a Store<S>) -> Self {
        Self { store }
    }

    /// 記録を日付ごとにまとめて、新しい日付から順に返す。
    pub fn run(&self, history: HistoryArgs) -> Result<Vec<(NaiveDate, Vec<TimeEntry>)>> {
        if let Some(category) = history.category {
            info!(
                "{} of {} entries are {}",
                self.store.entries_for_category(category).len(),
                self.store.entries().len(),
                category
            );
        }

        Ok(self
            .store
            .entries_by_day(history.category)
            .into_iter()
            .map(|(date, entries)| (date, entries.into_iter().cloned().collect()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone};
    use rstest::rstest;

    use super::{HistoryArgs, HistoryCommand};
    use crate::storage::MemoryBlobStore;
    use crate::store::Store;
    use crate::time_entry::{TimeCategory, TimeEntry};

    fn store() -> Store<MemoryBlobStore> {
        let mut store = Store::load(MemoryBlobStore::new());
        for (day, category) in [
            (3, TimeCategory::Work),
            (5, TimeCategory::Social),
            (3, TimeCategory::Social),
        ] {
            let start = Local
                .with_ymd_and_hms(2024, 1, day, 10, 0, 0)
                .unwrap()
                .to_utc();
            store.record_entry(TimeEntry::new(start, category, 30.0));
        }
        store
    }

    /// 絞り込みの有無で、日付ごとのまとめが新しい順に返ることを確認する。
    #[rstest]
    #[case::all(None, &[(5, 1), (3, 2)])]
    #[case::social(Some(TimeCategory::Social), &[(5, 1), (3, 1)])]
    #[case::work(Some(TimeCategory::Work), &[(3, 1)])]
    #[case::none_matching(Some(TimeCategory::Rest), &[])]
    fn test_history_command(
        #[case] category: Option<TimeCategory>,
        #[case] expected: &[(u32, usize)],
    ) {
        let store = store();

        let days = HistoryCommand::new(&store)
            .run(HistoryArgs { category })
            .unwrap();

        let actual: Vec<(NaiveDate, usize)> = days
            .iter()
            .map(|(date, entries)| (*date, entries.len()))
            .collect();
        let expected: Vec<(NaiveDate, usize)> = expected
            .iter()
            .map(|(day, count)| (NaiveDate::from_ymd_opt(2024, 1, *day).unwrap(), *count))
            .collect();
        assert_eq!(actual, expected);
    }
}
