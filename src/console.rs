use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;

use crate::budget::TimeBudget;
use crate::tag::CustomTag;
use crate::time_entry::{TimeCategory, TimeEntry};

/// Consoleに記録や予算を表示するためのtrait。
pub trait ConsolePresenter {
    /// 記録を開始時刻順に表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示する記録
    fn show_time_entries(&mut self, time_entries: &[&TimeEntry]) -> Result<()>;

    /// 予算の概要と類別予算を表示する。
    fn show_budget(&mut self, budget: &TimeBudget) -> Result<()>;

    fn show_tags(&mut self, tags: &[CustomTag]) -> Result<()>;

    /// 類別ごとの合計時間を表示する。
    fn show_category_totals(&mut self, totals: &[(TimeCategory, f64)]) -> Result<()>;
}

/// Markdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // 記録をlist形式で表示する。
    fn show_time_entries(&mut self, time_entries: &[&TimeEntry]) -> Result<()> {
        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(|entry| entry.start_time);

        for entry in sorted_entries {
            writeln!(self.writer, "{}", format_entry(entry))
                .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }

        Ok(())
    }

    fn show_budget(&mut self, budget: &TimeBudget) -> Result<()> {
        let month = budget.month.with_timezone(&Local).format("%Y-%m");
        writeln!(
            self.writer,
            "- {}: {:.0} / {:.0} min spent, {:.0} min allocated, {:.0} min unallocated",
            month,
            budget.spent_minutes,
            budget.total_minutes,
            budget.total_allocated_minutes(),
            budget.unallocated_minutes()
        )
        .context("Failed to write budget")?;

        for category_budget in &budget.category_budgets {
            writeln!(
                self.writer,
                "  - {}: {:.0} / {:.0} min ({:.1}%), {:.0} min remaining",
                category_budget.category,
                category_budget.spent_minutes,
                category_budget.allocated_minutes,
                category_budget.percentage_used(),
                category_budget.remaining_minutes()
            )
            .with_context(|| {
                format!("Failed to write category budget: {}", category_budget.category)
            })?;
        }

        Ok(())
    }

    fn show_tags(&mut self, tags: &[CustomTag]) -> Result<()> {
        for tag in tags {
            writeln!(self.writer, "- {} ({}, {})", tag.name, tag.color, tag.icon)
                .with_context(|| format!("Failed to write tag: {}", tag.name))?;
        }

        Ok(())
    }

    fn show_category_totals(&mut self, totals: &[(TimeCategory, f64)]) -> Result<()> {
        for (category, minutes) in totals {
            let hours = minutes / 60.0;
            writeln!(self.writer, "- {}: {:.2}", category, hours)
                .with_context(|| format!("Failed to write total: {}", category))?;
        }

        Ok(())
    }
}

/// 1件の記録を`- 09:00 ~ 10:30: work 90 min [tag] note`の形式にする。
fn format_entry(entry: &TimeEntry) -> String {
    let start_str = entry
        .start_time
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    let end_str = entry
        .end_time
        .map(|end| end.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "- {} ~ {}: {} {:.0} min",
        start_str, end_str, entry.category, entry.amount
    );
    if let Some(tag) = &entry.custom_tag {
        line.push_str(&format!(" [{}]", tag));
    }
    if !entry.note.is_empty() {
        line.push(' ');
        line.push_str(&entry.note);
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    use super::ConsoleMarkdownList;
    use super::ConsolePresenter;
    use crate::budget::TimeBudget;
    use crate::tag::CustomTag;
    use crate::time_entry::{TimeCategory, TimeEntry};

    fn local(hour: u32, minute: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 1, 15, hour, minute, 0)
            .unwrap()
            .to_utc()
    }

    /// 正常系のテスト。
    #[rstest]
    #[case::no_entry(&[], "")]
    #[case::single(
        &[dummy_entry(1)],
        "- 09:00 ~ 10:30: work 90 min\n",
    )]
    #[case::no_end_with_tag_and_note(
        &[dummy_entry(3)],
        "- 12:00 ~ -: exercise 45 min [Gym] legs\n",
    )]
    #[case::sort_with_start_time(
        &[dummy_entry(2), dummy_entry(1)],
        "- 09:00 ~ 10:30: work 90 min\n- 11:00 ~ 11:30: study 30 min\n",
    )]
    fn test_show_time_entries(#[case] input: &[TimeEntry], #[case] expected: &str) {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);
        let entries: Vec<&TimeEntry> = input.iter().collect();

        presenter.show_time_entries(&entries).unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), expected);
    }

    /// 予算と類別予算が表示されることを確認する。
    #[test]
    fn test_show_budget() {
        let mut budget = TimeBudget::new(local(12, 0));
        budget.allocate(TimeCategory::Work, 600.0).unwrap();
        budget.apply_spend(TimeCategory::Work, 150.0);
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_budget(&budget).unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "- 2024-01: 150 / 44640 min spent, 600 min allocated, 44040 min unallocated\n  \
             - work: 150 / 600 min (25.0%), 450 min remaining\n"
        );
    }

    /// タグと類別ごとの合計が表示されることを確認する。
    #[test]
    fn test_show_tags_and_totals() {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter
            .show_tags(&[CustomTag::new("Gym").with_color("red")])
            .unwrap();
        presenter
            .show_category_totals(&[(TimeCategory::Work, 90.0), (TimeCategory::Rest, 0.0)])
            .unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            "- Gym (red, tag.fill)\n- work: 1.50\n- rest: 0.00\n"
        );
    }

    /// テスト用にダミーのTimeEntryを作成する。
    fn dummy_entry(pattern: u8) -> TimeEntry {
        match pattern {
            1 => TimeEntry::new(local(9, 0), TimeCategory::Work, 90.0).with_end_time(local(10, 30)),
            2 => TimeEntry::new(local(11, 0), TimeCategory::Study, 30.0)
                .with_end_time(local(11, 30)),
            3 => TimeEntry::new(local(12, 0), TimeCategory::Exercise, 45.0)
                .with_tag("Gym")
                .with_note("legs"),
            _ => panic!("Invalid pattern: {}", pattern),
        }
    }
}
