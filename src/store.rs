use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::budget::{CategoryBudget, TimeBudget};
use crate::datetime::{self, MINUTES_PER_DAY};
use crate::error::{BudgetError, StorageError};
use crate::storage::{BlobKey, BlobStore};
use crate::tag::CustomTag;
use crate::time_entry::{TimeCategory, TimeEntry};

/// ストアが保持する全ての状態。
#[derive(Clone, Debug, PartialEq)]
pub struct StoreState {
    pub budget: TimeBudget,
    pub entries: Vec<TimeEntry>,
    pub tags: Vec<CustomTag>,
}

impl StoreState {
    /// `now`を含む月の新しい予算と、空の記録・タグからなる状態を返す。
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            budget: TimeBudget::new(now),
            entries: Vec::new(),
            tags: Vec::new(),
        }
    }
}

/// 状態の変更を購読者に通知するイベント。
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    EntryRecorded(Uuid),
    TagAdded(Uuid),
    TagUpdated(Uuid),
    TagDeleted(Uuid),
    CategoryBudgetAllocated(TimeCategory),
    CategoryBudgetRemoved(TimeCategory),
    BudgetReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent, &StoreState)>;

/// 予算・記録・タグの唯一の保持者。
///
/// 全ての変更はこのストアを通して行い、変更の直後に全状態を`BlobStore`へ書き込み、
/// 購読者に通知する。集計値はキャッシュせず、読み出しのたびに記録を走査する。
pub struct Store<S: BlobStore> {
    state: StoreState,
    storage: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: BlobStore> Store<S> {
    /// `storage`から状態を読み込んで`Store`を返す。
    ///
    /// blobが存在しない、または読み込み・デコードに失敗した場合は、
    /// 予算は現在の月の新しい予算、記録とタグは空で始める。エラーは返さない。
    pub fn load(storage: S) -> Self {
        let budget = load_blob(&storage, BlobKey::Budget)
            .unwrap_or_else(|| TimeBudget::new(datetime::now()));
        let entries: Vec<TimeEntry> = load_blob(&storage, BlobKey::Entries).unwrap_or_default();
        let tags: Vec<CustomTag> = load_blob(&storage, BlobKey::Tags).unwrap_or_default();
        debug!(
            "Loaded store: {} entries, {} tags, {} category budgets",
            entries.len(),
            tags.len(),
            budget.category_budgets.len()
        );

        Self::with_state(
            storage,
            StoreState {
                budget,
                entries,
                tags,
            },
        )
    }

    /// 指定された状態で`Store`を返す。書き込みは次の変更まで行わない。
    pub fn with_state(storage: S, state: StoreState) -> Self {
        Self {
            state,
            storage,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn budget(&self) -> &TimeBudget {
        &self.state.budget
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.state.entries
    }

    pub fn tags(&self) -> &[CustomTag] {
        &self.state.tags
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&CustomTag> {
        self.state.tags.iter().find(|tag| tag.name == name)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// 状態の変更ごとに呼ばれるリスナーを登録する。
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent, &StoreState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(subscription, _)| *subscription != id);
        self.listeners.len() != before
    }

    /// 記録を追加し、予算の使用済み時間に加算する。
    ///
    /// 時間の符号や日付の妥当性は検証しない。
    pub fn record_entry(&mut self, entry: TimeEntry) {
        debug!(
            "Recording entry {}: {} minutes of {}",
            entry.id, entry.amount, entry.category
        );
        let id = entry.id;
        let (category, amount) = (entry.category, entry.amount);
        self.state.entries.push(entry);
        self.state.budget.apply_spend(category, amount);

        self.commit(StoreEvent::EntryRecorded(id));
    }

    pub fn add_tag(&mut self, tag: CustomTag) {
        debug!("Adding tag '{}' ({})", tag.name, tag.id);
        let id = tag.id;
        self.state.tags.push(tag);

        self.commit(StoreEvent::TagAdded(id));
    }

    /// 同じidのタグを置き換える。
    ///
    /// 名前が変わった場合、置き換え前の名前を持つ全ての記録を新しい名前に書き換える。
    /// 同じidのタグがない場合は何もしない。
    pub fn update_tag(&mut self, tag: CustomTag) {
        let Some(index) = self.state.tags.iter().position(|t| t.id == tag.id) else {
            debug!("Tag {} not found, nothing to update", tag.id);
            return;
        };
        let id = tag.id;
        let old = std::mem::replace(&mut self.state.tags[index], tag);
        let new_name = &self.state.tags[index].name;

        if old.name != *new_name {
            let mut rewritten = 0;
            for entry in self.state.entries.iter_mut() {
                if entry.custom_tag.as_deref() == Some(old.name.as_str()) {
                    entry.custom_tag = Some(new_name.clone());
                    rewritten += 1;
                }
            }
            debug!(
                "Renamed tag '{}' to '{}', {} entries rewritten",
                old.name, new_name, rewritten
            );
        }

        self.commit(StoreEvent::TagUpdated(id));
    }

    /// タグを削除し、その名前を持つ全ての記録からタグを外す。
    pub fn delete_tag(&mut self, tag: &CustomTag) {
        self.state.tags.retain(|t| t.id != tag.id);

        let mut cleared = 0;
        for entry in self.state.entries.iter_mut() {
            if entry.custom_tag.as_deref() == Some(tag.name.as_str()) {
                entry.custom_tag = None;
                cleared += 1;
            }
        }
        debug!("Deleted tag '{}', {} entries cleared", tag.name, cleared);

        self.commit(StoreEvent::TagDeleted(tag.id));
    }

    /// 類別予算を追加する。既存の記録は遡って加算しない。
    pub fn allocate_category_budget(
        &mut self,
        category: TimeCategory,
        allocated_minutes: f64,
    ) -> Result<(), BudgetError> {
        self.state.budget.allocate(category, allocated_minutes)?;
        debug!("Allocated {} minutes to {}", allocated_minutes, category);

        self.commit(StoreEvent::CategoryBudgetAllocated(category));
        Ok(())
    }

    pub fn remove_category_budget(&mut self, category: TimeCategory) -> Option<CategoryBudget> {
        let removed = self.state.budget.remove(category)?;
        debug!("Removed budget of {}", category);

        self.commit(StoreEvent::CategoryBudgetRemoved(category));
        Some(removed)
    }

    /// 現在の予算を破棄し、現在の月の新しい予算に置き換える。類別予算も全て失われる。
    pub fn reset_monthly_budget(&mut self) {
        self.state.budget = TimeBudget::new(datetime::now());
        debug!("Reset monthly budget to {}", self.state.budget.month);

        self.commit(StoreEvent::BudgetReset);
    }

    /// 記録の挿入順を保ったまま、類別が一致する記録を返す。
    pub fn entries_for_category(&self, category: TimeCategory) -> Vec<&TimeEntry> {
        self.state
            .entries
            .iter()
            .filter(|entry| entry.category == category)
            .collect()
    }

    /// 開始時刻が`reference`と同じ年・月の記録を返す。
    pub fn entries_in_month_of(&self, reference: &DateTime<Utc>) -> Vec<&TimeEntry> {
        self.state
            .entries
            .iter()
            .filter(|entry| datetime::is_same_month(&entry.start_time, reference))
            .collect()
    }

    pub fn entries_for_current_month(&self) -> Vec<&TimeEntry> {
        self.entries_in_month_of(&datetime::now())
    }

    /// 開始時刻が`reference`と同じ日の記録を返す。
    pub fn entries_on_day_of(&self, reference: &DateTime<Utc>) -> Vec<&TimeEntry> {
        self.state
            .entries
            .iter()
            .filter(|entry| datetime::is_same_day(&entry.start_time, reference))
            .collect()
    }

    pub fn time_spent_on_day_of(&self, reference: &DateTime<Utc>) -> f64 {
        sum_amount(self.entries_on_day_of(reference))
    }

    pub fn time_spent_today(&self) -> f64 {
        self.time_spent_on_day_of(&datetime::now())
    }

    /// 今日の残り分数。記録が1440分を超えると負になる。
    pub fn time_remaining_today(&self) -> f64 {
        MINUTES_PER_DAY - self.time_spent_today()
    }

    pub fn time_spent_in_month_of(&self, reference: &DateTime<Utc>) -> f64 {
        sum_amount(self.entries_in_month_of(reference))
    }

    pub fn time_spent_this_month(&self) -> f64 {
        self.time_spent_in_month_of(&datetime::now())
    }

    /// 今月の記録の合計が予算の総分数に占める割合(%)。
    pub fn monthly_progress(&self) -> f64 {
        let total = self.state.budget.total_minutes;
        if total > 0.0 {
            self.time_spent_this_month() / total * 100.0
        } else {
            0.0
        }
    }

    /// 全ての類別について、`reference`の月の合計時間を宣言順で返す。
    pub fn category_totals_in_month_of(
        &self,
        reference: &DateTime<Utc>,
    ) -> Vec<(TimeCategory, f64)> {
        let entries = self.entries_in_month_of(reference);
        TimeCategory::ALL
            .iter()
            .map(|category| {
                let total: f64 = entries
                    .iter()
                    .filter(|entry| entry.category == *category)
                    .map(|entry| entry.amount)
                    .sum();
                (*category, total)
            })
            .collect()
    }

    pub fn category_totals_for_current_month(&self) -> Vec<(TimeCategory, f64)> {
        self.category_totals_in_month_of(&datetime::now())
    }

    /// 記録を開始時刻のLocalの日付でまとめる。
    ///
    /// 日付は新しい順、同じ日の中は挿入順。`filter`を指定した場合はその類別のみ。
    pub fn entries_by_day(
        &self,
        filter: Option<TimeCategory>,
    ) -> Vec<(NaiveDate, Vec<&TimeEntry>)> {
        let grouped: BTreeMap<NaiveDate, Vec<&TimeEntry>> = self
            .state
            .entries
            .iter()
            .filter(|entry| filter.map_or(true, |category| entry.category == category))
            .fold(BTreeMap::new(), |mut acc, entry| {
                acc.entry(datetime::local_date(&entry.start_time))
                    .or_default()
                    .push(entry);
                acc
            });

        grouped.into_iter().rev().collect()
    }

    /// 予算・記録・タグを全て書き込む。
    ///
    /// 3つのblobはそれぞれ独立して書き込み、1つが失敗しても残りは書き込む。
    /// 最初に発生したエラーを返す。
    pub fn try_persist(&mut self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in BlobKey::ALL {
            if let Err(e) = self.persist_blob(key) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn persist_blob(&mut self, key: BlobKey) -> Result<(), StorageError> {
        let encoded = match key {
            BlobKey::Budget => serde_json::to_vec_pretty(&self.state.budget),
            BlobKey::Entries => serde_json::to_vec_pretty(&self.state.entries),
            BlobKey::Tags => serde_json::to_vec_pretty(&self.state.tags),
        };
        let data = encoded.map_err(|source| StorageError::Encode { key, source })?;
        self.storage.save(key, &data)
    }

    /// 変更を書き込み、購読者に通知する。書き込みの失敗はログに残して続行する。
    fn commit(&mut self, event: StoreEvent) {
        for key in BlobKey::ALL {
            if let Err(e) = self.persist_blob(key) {
                warn!("{}", e);
            }
        }

        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, &self.state);
        }
    }
}

fn load_blob<T: DeserializeOwned>(storage: &impl BlobStore, key: BlobKey) -> Option<T> {
    let data = match storage.load(key) {
        Ok(Some(data)) => data,
        Ok(None) => {
            debug!("No stored blob '{}', using default", key);
            return None;
        }
        Err(e) => {
            warn!("{}, using default", e);
            return None;
        }
    };

    match serde_json::from_slice(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to decode blob '{}': {}, using default", key, e);
            None
        }
    }
}

fn sum_amount(entries: Vec<&TimeEntry>) -> f64 {
    entries.iter().map(|entry| entry.amount).sum()
}
