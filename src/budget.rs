use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{self, MINUTES_PER_DAY};
use crate::error::BudgetError;
use crate::time_entry::TimeCategory;

/// 1ヶ月分の時間予算。
///
/// `total_minutes`は作成時に月の日数から決まり、以後変わらない。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBudget {
    pub id: Uuid,
    /// 予算の対象月に含まれる時刻。
    pub month: DateTime<Utc>,
    pub total_minutes: f64,
    pub spent_minutes: f64,
    pub category_budgets: Vec<CategoryBudget>,
}

impl TimeBudget {
    /// `month`を含む月の予算を、割り当てなしで新しく作成する。
    pub fn new(month: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            month,
            total_minutes: Self::total_minutes_in_month(&month),
            spent_minutes: 0.0,
            category_budgets: Vec::new(),
        }
    }

    /// 月の日数 × 1440。
    pub fn total_minutes_in_month(month: &DateTime<Utc>) -> f64 {
        datetime::days_in_month(month) as f64 * MINUTES_PER_DAY
    }

    pub fn category_budget(&self, category: TimeCategory) -> Option<&CategoryBudget> {
        self.category_budgets
            .iter()
            .find(|budget| budget.category == category)
    }

    pub fn total_allocated_minutes(&self) -> f64 {
        self.category_budgets
            .iter()
            .map(|budget| budget.allocated_minutes)
            .sum()
    }

    /// まだどの類別にも割り当てられていない分数。
    pub fn unallocated_minutes(&self) -> f64 {
        self.total_minutes - self.total_allocated_minutes()
    }

    pub fn remaining_minutes(&self) -> f64 {
        self.total_minutes - self.spent_minutes
    }

    /// 記録された時間を全体と、該当する類別予算があればその類別予算に加算する。
    pub fn apply_spend(&mut self, category: TimeCategory, amount: f64) {
        self.spent_minutes += amount;
        if let Some(budget) = self
            .category_budgets
            .iter_mut()
            .find(|budget| budget.category == category)
        {
            budget.spent_minutes += amount;
        }
    }

    /// 類別予算を追加する。
    ///
    /// 検証はこの作成時にのみ行う。既存の記録からの遡及加算はしないため、
    /// 追加した類別予算の使用済み時間は常に0から始まる。
    pub fn allocate(
        &mut self,
        category: TimeCategory,
        allocated_minutes: f64,
    ) -> Result<&CategoryBudget, BudgetError> {
        if self.category_budget(category).is_some() {
            return Err(BudgetError::AlreadyAllocated(category));
        }
        if allocated_minutes.is_nan() || allocated_minutes <= 0.0 {
            return Err(BudgetError::NotPositive(allocated_minutes));
        }
        let available = self.unallocated_minutes();
        if allocated_minutes > available {
            return Err(BudgetError::ExceedsUnallocated {
                requested: allocated_minutes,
                available,
            });
        }

        self.category_budgets
            .push(CategoryBudget::new(category, allocated_minutes));
        Ok(&self.category_budgets[self.category_budgets.len() - 1])
    }

    pub fn remove(&mut self, category: TimeCategory) -> Option<CategoryBudget> {
        let index = self
            .category_budgets
            .iter()
            .position(|budget| budget.category == category)?;
        Some(self.category_budgets.remove(index))
    }
}

/// 予算期間のうち1つの類別に割り当てた分。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudget {
    pub id: Uuid,
    pub category: TimeCategory,
    pub allocated_minutes: f64,
    pub spent_minutes: f64,
}

impl CategoryBudget {
    pub fn new(category: TimeCategory, allocated_minutes: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            allocated_minutes,
            spent_minutes: 0.0,
        }
    }

    /// 使い過ぎた場合は負になる。
    pub fn remaining_minutes(&self) -> f64 {
        self.allocated_minutes - self.spent_minutes
    }

    /// 割り当てが0の場合は0。
    pub fn percentage_used(&self) -> f64 {
        if self.allocated_minutes > 0.0 {
            self.spent_minutes / self.allocated_minutes * 100.0
        } else {
            0.0
        }
    }
}
