use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TAG_COLOR: &str = "blue";
pub const DEFAULT_TAG_ICON: &str = "tag.fill";

/// ユーザー定義のタグ。
///
/// `TimeEntry`からは`name`で参照される。名前の一意性は強制しない。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomTag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl CustomTag {
    /// 既定の色とアイコンで新しいタグを返す。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: DEFAULT_TAG_COLOR.to_string(),
            icon: DEFAULT_TAG_ICON.to_string(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// 同じidのまま名前だけを変えたタグを返す。
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
