use anyhow::{bail, Context, Result};
use clap::Subcommand;
use log::info;

use crate::storage::BlobStore;
use crate::store::Store;
use crate::tag::CustomTag;

/// `tag`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct TagArgs {
    #[clap(subcommand)]
    action: TagAction,
}

#[derive(Debug, Subcommand)]
pub enum TagAction {
    /// List all tags
    List,
    /// Add a new tag
    Add {
        name: String,
        #[clap(long = "color")]
        color: Option<String>,
        #[clap(long = "icon")]
        icon: Option<String>,
    },
    /// Rename a tag; entries using the old name follow
    Rename { old: String, new: String },
    /// Delete a tag; entries using it lose their tag
    Delete { name: String },
}

pub struct TagCommand<'a, S: BlobStore> {
    store: &'a mut Store<S>,
}

impl<'a, S: BlobStore> TagCommand<'a, S> {
    pub fn new(store: &'a mut Store<S>) -> Self {
        Self { store }
    }

    /// `tag`サブコマンドの処理を行い、処理後のタグ一覧を返す。
    ///
    /// ストアは名前の重複を許すため、重複と空の名前はここで拒否する。
    pub fn run(&mut self, tag: TagArgs) -> Result<Vec<CustomTag>> {
        match tag.action {
            TagAction::List => {}
            TagAction::Add { name, color, icon } => {
                self.ensure_available(&name)?;
                let mut tag = CustomTag::new(name);
                if let Some(color) = color {
                    tag = tag.with_color(color);
                }
                if let Some(icon) = icon {
                    tag = tag.with_icon(icon);
                }
                info!("Adding tag '{}'", tag.name);
                self.store.add_tag(tag);
            }
            TagAction::Rename { old, new } => {
                let existing = self
                    .store
                    .tag_by_name(&old)
                    .with_context(|| format!("Tag '{}' not found", old))?
                    .clone();
                self.ensure_available(&new)?;
                info!("Renaming tag '{}' to '{}'", old, new);
                self.store.update_tag(existing.renamed(new));
            }
            TagAction::Delete { name } => {
                let existing = self
                    .store
                    .tag_by_name(&name)
                    .with_context(|| format!("Tag '{}' not found", name))?
                    .clone();
                info!("Deleting tag '{}'", name);
                self.store.delete_tag(&existing);
            }
        }

        Ok(self.store.tags().to_vec())
    }

    fn ensure_available(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            bail!("Tag name must not be empty");
        }
        if self.store.tag_by_name(name).is_some() {
            bail!("Tag '{}' already exists", name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{TagAction, TagArgs, TagCommand};
    use crate::storage::MemoryBlobStore;
    use crate::store::Store;
    use crate::time_entry::{TimeCategory, TimeEntry};

    fn run(store: &mut Store<MemoryBlobStore>, action: TagAction) -> anyhow::Result<Vec<String>> {
        TagCommand::new(store)
            .run(TagArgs { action })
            .map(|tags| tags.into_iter().map(|tag| tag.name).collect())
    }

    fn add(name: &str) -> TagAction {
        TagAction::Add {
            name: name.to_string(),
            color: None,
            icon: None,
        }
    }

    fn store_with_gym() -> Store<MemoryBlobStore> {
        let mut store = Store::load(MemoryBlobStore::new());
        run(&mut store, add("Gym")).unwrap();
        store.record_entry(
            TimeEntry::new(crate::datetime::now(), TimeCategory::Exercise, 30.0).with_tag("Gym"),
        );
        store
    }

    /// 名前の変更が記録にも反映されることを確認する。
    #[test]
    fn test_rename() {
        let mut store = store_with_gym();

        let names = run(
            &mut store,
            TagAction::Rename {
                old: "Gym".to_string(),
                new: "Fitness".to_string(),
            },
        )
        .unwrap();

        assert_eq!(names, vec!["Fitness"]);
        assert_eq!(store.entries()[0].custom_tag.as_deref(), Some("Fitness"));
    }

    /// 削除で記録からタグが外れることを確認する。
    #[test]
    fn test_delete() {
        let mut store = store_with_gym();

        let names = run(
            &mut store,
            TagAction::Delete {
                name: "Gym".to_string(),
            },
        )
        .unwrap();

        assert!(names.is_empty());
        assert_eq!(store.entries()[0].custom_tag, None);
    }

    /// 色とアイコンを指定して追加できることを確認する。
    #[test]
    fn test_add_with_style() {
        let mut store = Store::load(MemoryBlobStore::new());

        run(
            &mut store,
            TagAction::Add {
                name: "Read".to_string(),
                color: Some("green".to_string()),
                icon: Some("book.fill".to_string()),
            },
        )
        .unwrap();

        assert_eq!(store.tags()[0].color, "green");
        assert_eq!(store.tags()[0].icon, "book.fill");
    }

    /// 不正な操作が拒否され、タグが変わらないことを確認する。
    #[rstest]
    #[case::duplicate(add("Gym"))]
    #[case::empty(add("  "))]
    #[case::rename_missing(TagAction::Rename { old: "Pool".to_string(), new: "Swim".to_string() })]
    #[case::rename_to_existing(TagAction::Rename { old: "Gym".to_string(), new: "Run".to_string() })]
    #[case::delete_missing(TagAction::Delete { name: "Pool".to_string() })]
    fn test_rejected(#[case] action: TagAction) {
        let mut store = store_with_gym();
        run(&mut store, add("Run")).unwrap();

        assert!(run(&mut store, action).is_err());
        assert_eq!(run(&mut store, TagAction::List).unwrap(), vec!["Gym", "Run"]);
        assert_eq!(store.entries()[0].custom_tag.as_deref(), Some("Gym"));
    }
}
