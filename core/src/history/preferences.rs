use crate::history::store::LocalStore;
use crate::prelude::AnalysisResult;

pub const DARK_MODE_KEY: &str = "darkMode";

/// Persisted dark-mode flag, stored as `enabled` or `disabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    Enabled,
    #[default]
    Disabled,
}

impl ThemePreference {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            ThemePreference::Enabled
        } else {
            ThemePreference::Disabled
        }
    }

    pub fn is_dark(&self) -> bool {
        *self == ThemePreference::Enabled
    }

    fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Enabled => "enabled",
            ThemePreference::Disabled => "disabled",
        }
    }

    /// Anything other than `enabled` reads as light mode.
    pub fn load(store: &LocalStore) -> AnalysisResult<Self> {
        Ok(match store.get(DARK_MODE_KEY)?.as_deref() {
            Some("enabled") => ThemePreference::Enabled,
            _ => ThemePreference::Disabled,
        })
    }

    pub fn save(&self, store: &LocalStore) -> AnalysisResult<()> {
        store.set(DARK_MODE_KEY, self.as_str())
    }
}
