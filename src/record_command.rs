use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::info;

use crate::datetime;
use crate::storage::BlobStore;
use crate::store::Store;
use crate::time_entry::{TimeCategory, TimeEntry};

/// `record`サブコマンドの引数。
///
/// `--minutes`で時間を直接指定するか、`--start`と`--end`で区間を指定する。
#[derive(Debug, clap::Args)]
pub struct RecordArgs {
    #[clap(short = 'c', long = "category", help = "Category of the activity")]
    category: TimeCategory,

    #[clap(
        short = 'm',
        long = "minutes",
        conflicts_with = "end",
        help = "Spent minutes"
    )]
    minutes: Option<f64>,

    #[clap(
        long = "start",
        help = "Start time in the format YYYY-MM-DD HH:MM (defaults to now)",
        parse(try_from_str = parse_datetime),
    )]
    start: Option<DateTime<Utc>>,

    #[clap(
        long = "end",
        requires = "start",
        help = "End time in the format YYYY-MM-DD HH:MM",
        parse(try_from_str = parse_datetime),
    )]
    end: Option<DateTime<Utc>>,

    #[clap(short = 't', long = "tag", help = "Name of an existing tag")]
    tag: Option<String>,

    #[clap(short = 'n', long = "note", default_value = "", help = "Free text note")]
    note: String,
}

pub struct RecordCommand<'a, S: BlobStore> {
    store: &'a mut Store<S>,
}

impl<'a, S: BlobStore> RecordCommand<'a, S> {
    /// 新しい`RecordCommand`を返す。
    ///
    /// # Arguments
    /// * `store` - 記録を追加するストア
    pub fn new(store: &'a mut Store<S>) -> Self {
        Self { store }
    }

    /// `record`サブコマンドの処理を行う。
    ///
    /// 入力の検証はここで行い、検証を通った記録だけをストアに渡す。
    pub fn run(&mut self, args: RecordArgs) -> Result<TimeEntry> {
        if let Some(tag) = &args.tag {
            if self.store.tag_by_name(tag).is_none() {
                bail!("Unknown tag: '{}'. Add it with `tag add` first", tag);
            }
        }

        let entry = match (args.minutes, args.start, args.end) {
            (Some(minutes), start, None) => {
                if !minutes.is_finite() || minutes < 0.0 {
                    bail!("Minutes must be a non-negative number, got {}", minutes);
                }
                let start = start.unwrap_or_else(datetime::now);
                let entry = TimeEntry::new(start, args.category, minutes).with_note(args.note);
                match args.tag {
                    Some(tag) => entry.with_tag(tag),
                    None => entry,
                }
            }
            (None, Some(start), Some(end)) => {
                if end < start {
                    bail!("End time {} is before start time {}", end, start);
                }
                TimeEntry::manual(start, end, args.category, args.tag, args.note)
            }
            _ => bail!("Either --minutes or both --start and --end must be given"),
        };

        info!(
            "Recording {:.1} minutes of {} starting at {}",
            entry.amount, entry.category, entry.start_time
        );
        self.store.record_entry(entry.clone());

        Ok(entry)
    }
}

/// `YYYY-MM-DD HH:MM`形式のLocalの日時をパースする。
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let naive_datetime = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .with_context(|| format!("Failed to parse datetime: {}", s))?;
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .single()
        .context("Failed to convert to DateTime<Local>")?
        .to_utc();

    Ok(datetime)
}
