use anyhow::{bail, Result};
use clap::Subcommand;
use log::info;

use crate::budget::TimeBudget;
use crate::storage::BlobStore;
use crate::store::Store;
use crate::time_entry::TimeCategory;

/// `budget`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct BudgetArgs {
    #[clap(subcommand)]
    action: BudgetAction,
}

#[derive(Debug, Subcommand)]
pub enum BudgetAction {
    /// Show the current monthly budget
    Show,
    /// Allocate minutes of the monthly budget to a category
    Allocate {
        category: TimeCategory,
        minutes: f64,
    },
    /// Remove the budget of a category
    Remove { category: TimeCategory },
    /// Replace the budget with a fresh one for the current month, dropping all allocations
    Reset {
        #[clap(long = "yes", help = "Confirm the reset")]
        yes: bool,
    },
}

pub struct BudgetCommand<'a, S: BlobStore> {
    store: &'a mut Store<S>,
}

impl<'a, S: BlobStore> BudgetCommand<'a, S> {
    pub fn new(store: &'a mut Store<S>) -> Self {
        Self { store }
    }

    /// `budget`サブコマンドの処理を行い、処理後の予算を返す。
    pub fn run(&mut self, budget: BudgetArgs) -> Result<TimeBudget> {
        match budget.action {
            BudgetAction::Show => {}
            BudgetAction::Allocate { category, minutes } => {
                self.store.allocate_category_budget(category, minutes)?;
                info!("Allocated {} minutes to {}", minutes, category);
            }
            BudgetAction::Remove { category } => {
                if self.store.remove_category_budget(category).is_none() {
                    bail!("Category '{}' has no budget", category);
                }
                info!("Removed budget of {}", category);
            }
            BudgetAction::Reset { yes } => {
                if !yes {
                    bail!("Resetting drops all category budgets. Pass --yes to confirm");
                }
                self.store.reset_monthly_budget();
                info!("Monthly budget reset");
            }
        }

        Ok(self.store.budget().clone())
    }
}
