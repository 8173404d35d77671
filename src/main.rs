use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

use time_wealth::budget_command::{BudgetArgs, BudgetCommand};
use time_wealth::config::{get_config_dir, Config};
use time_wealth::console::{ConsoleMarkdownList, ConsolePresenter};
use time_wealth::context::AppContext;
use time_wealth::daily_command::{DailyArgs, DailyCommand};
use time_wealth::history_command::{HistoryArgs, HistoryCommand};
use time_wealth::monthly_command::{MonthlyArgs, MonthlyCommand};
use time_wealth::record_command::{RecordArgs, RecordCommand};
use time_wealth::tag_command::{TagArgs, TagCommand};

/// 時間を類別ごとに記録し、月ごとの時間予算と比較するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- record -c work -m 90
/// $ cargo run -- daily
/// $ cargo run -- monthly --daily
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(
        long = "config-dir",
        global = true,
        help = "Directory holding config.toml (defaults to $TIME_WEALTH_HOME or ~/.time-wealth)",
        parse(from_os_str)
    )]
    config_dir: Option<PathBuf>,

    #[clap(short = 'v', long = "verbose", global = true, help = "Log debug messages")]
    verbose: bool,

    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Record a block of time
    Record(RecordArgs),
    /// Show entries and spent minutes of a day
    Daily(DailyArgs),
    /// Show per-category totals of a month
    Monthly(MonthlyArgs),
    /// Show entries grouped by day, newest first
    History(HistoryArgs),
    /// Manage the monthly budget
    Budget(BudgetArgs),
    /// Manage tags
    Tag(TagArgs),
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir(args.config_dir.as_deref())?;
    let config = Config::load(&config_dir)?;
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        config.level_filter()
    };
    init_logger(level)?;

    let mut ctx = AppContext::with_config(config, &config_dir);
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut presenter = ConsoleMarkdownList::new(&mut writer);

    match args.subcommand {
        SubCommands::Record(record) => {
            let entry = RecordCommand::new(&mut ctx.store).run(record)?;
            presenter.show_time_entries(&[&entry])?;
        }
        SubCommands::Daily(daily) => {
            let report = DailyCommand::new(&ctx.store).run(daily)?;
            let entries: Vec<_> = report.entries.iter().collect();
            presenter.show_time_entries(&entries)?;
            println!(
                "\n{}: {:.0} min spent, {:.0} min remaining",
                report.date, report.spent_minutes, report.remaining_minutes
            );
        }
        SubCommands::Monthly(monthly) => {
            let report = MonthlyCommand::new(&ctx.store).run(monthly)?;
            println!("# {}-{:02}", report.year, report.month);
            if report.days.is_empty() {
                presenter.show_category_totals(&report.totals)?;
            } else {
                for (date, totals) in &report.days {
                    println!("## {}", date);
                    presenter.show_category_totals(totals)?;
                }
            }
            match report.progress {
                Some(progress) => println!(
                    "\n{:.0} min spent ({:.1}% of the budget)",
                    report.spent_minutes, progress
                ),
                None => println!("\n{:.0} min spent", report.spent_minutes),
            }
        }
        SubCommands::History(history) => {
            for (date, entries) in HistoryCommand::new(&ctx.store).run(history)? {
                println!("## {}", date);
                let entries: Vec<_> = entries.iter().collect();
                presenter.show_time_entries(&entries)?;
            }
        }
        SubCommands::Budget(budget) => {
            let budget = BudgetCommand::new(&mut ctx.store).run(budget)?;
            presenter.show_budget(&budget)?;
        }
        SubCommands::Tag(tag) => {
            let tags = TagCommand::new(&mut ctx.store).run(tag)?;
            presenter.show_tags(&tags)?;
        }
    }

    writer.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// 標準エラー出力にログを出力する。
fn init_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")
}
