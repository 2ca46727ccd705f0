//! Persisted widget lists

use lsw_core::prelude::*;
use lsw_core::WidgetItem;

use crate::prefs::Preferences;

/// Backing storage for one surface's widget list
pub trait WidgetListStore {
    /// Preference key whose change notification means the list changed
    fn key(&self) -> &str;

    /// Persisted list, duplicates removed. Unreadable data is an empty list.
    fn load(&self) -> Vec<WidgetItem>;

    fn save(&self, widgets: &[WidgetItem]) -> Result<()>;
}

/// Widget list stored as a JSON array under one preference key
#[derive(Debug, Clone)]
pub struct PreferenceWidgetStore {
    prefs: Preferences,
    key: &'static str,
}

impl PreferenceWidgetStore {
    pub fn new(prefs: &Preferences, key: &'static str) -> Self {
        Self {
            prefs: prefs.clone(),
            key,
        }
    }
}

impl WidgetListStore for PreferenceWidgetStore {
    fn key(&self) -> &str {
        self.key
    }

    fn load(&self) -> Vec<WidgetItem> {
        self.prefs.widget_list(self.key)
    }

    fn save(&self, widgets: &[WidgetItem]) -> Result<()> {
        self.prefs.set_widget_list(self.key, widgets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::keys;

    #[test]
    fn test_save_then_load() {
        let prefs = Preferences::in_memory();
        let store = PreferenceWidgetStore::new(&prefs, keys::FRAME_WIDGETS);

        let widgets = vec![WidgetItem::widget(3, "clock"), WidgetItem::shortcut(9, "Torch")];
        store.save(&widgets).unwrap();

        let loaded = store.load();
        assert_eq!(loaded, widgets);
        assert_eq!(loaded[1].label.as_deref(), Some("Torch"));
        assert_eq!(store.key(), keys::FRAME_WIDGETS);
    }

    #[test]
    fn test_save_queues_change_for_key() {
        let prefs = Preferences::in_memory();
        let store = PreferenceWidgetStore::new(&prefs, keys::DRAWER_WIDGETS);
        store.save(&[]).unwrap();
        assert!(prefs.has_pending());
    }
}
