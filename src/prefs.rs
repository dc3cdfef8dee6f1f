use crate::events::Layer;
use crate::goals::{GoalFilter, GoalSort};
use crate::taps::TapKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MEMO_FOCUS_KEY: &str = "focus";

static EMPTY_TAB: BTreeMap<String, String> = BTreeMap::new();

/// Active tab plus per-tab preferences. Owned by the app and handed to
/// whatever needs to read or change it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapStore {
    #[serde(default)]
    active: TapKind,
    #[serde(default)]
    preferences: BTreeMap<TapKind, BTreeMap<String, String>>,
}

impl TapStore {
    pub fn active(&self) -> TapKind {
        self.active
    }

    pub fn set_active(&mut self, tap: TapKind) {
        self.active = tap;
    }

    /// Every preference stored for `tap`; empty when nothing was set.
    pub fn tab(&self, tap: TapKind) -> &BTreeMap<String, String> {
        self.preferences.get(&tap).unwrap_or(&EMPTY_TAB)
    }

    pub fn get(&self, tap: TapKind, key: &str) -> Option<&str> {
        self.tab(tap).get(key).map(String::as_str)
    }

    /// Last write wins.
    pub fn set(&mut self, tap: TapKind, key: impl Into<String>, value: impl Into<String>) {
        self.preferences
            .entry(tap)
            .or_default()
            .insert(key.into(), value.into());
    }
}

/// Everything the TUI restores on the next launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(default)]
    pub taps: TapStore,
    #[serde(default)]
    pub goal_filter: GoalFilter,
    #[serde(default)]
    pub goal_sort: GoalSort,
    #[serde(default)]
    pub hidden_layers: BTreeSet<Layer>,
}

impl UiState {
    pub fn enabled_layers(&self) -> BTreeSet<Layer> {
        Layer::ALL
            .into_iter()
            .filter(|layer| !self.hidden_layers.contains(layer))
            .collect()
    }

    /// Flips a layer's visibility and returns whether it is now shown.
    pub fn toggle_layer(&mut self, layer: Layer) -> bool {
        if self.hidden_layers.remove(&layer) {
            true
        } else {
            self.hidden_layers.insert(layer);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unset_tab_reads_as_empty() {
        let store = TapStore::default();
        assert!(store.tab(TapKind::Memo).is_empty());
        assert_eq!(store.get(TapKind::Memo, MEMO_FOCUS_KEY), None);
        assert_eq!(store.active(), TapKind::Memo);
    }

    #[test]
    fn set_is_last_write_wins_and_scoped_per_tab() {
        let mut store = TapStore::default();
        store.set(TapKind::Memo, MEMO_FOCUS_KEY, "product strategy");
        store.set(TapKind::Memo, MEMO_FOCUS_KEY, "brand tone");
        store.set(TapKind::Reading, MEMO_FOCUS_KEY, "papers");
        assert_eq!(store.get(TapKind::Memo, MEMO_FOCUS_KEY), Some("brand tone"));
        assert_eq!(store.get(TapKind::Reading, MEMO_FOCUS_KEY), Some("papers"));
        assert_eq!(store.tab(TapKind::Memo).len(), 1);
    }

    #[test]
    fn layer_toggle_round_trips() {
        let mut state = UiState::default();
        assert_eq!(state.enabled_layers().len(), Layer::ALL.len());
        assert!(!state.toggle_layer(Layer::Hackathon));
        assert!(!state.enabled_layers().contains(&Layer::Hackathon));
        assert!(state.toggle_layer(Layer::Hackathon));
        assert!(state.hidden_layers.is_empty());
    }

    #[test]
    fn ui_state_survives_yaml() {
        let mut state = UiState::default();
        state.taps.set_active(TapKind::VisionBoard);
        state.taps.set(TapKind::Memo, MEMO_FOCUS_KEY, "brand tone");
        state.goal_filter = GoalFilter::Completed;
        state.goal_sort = GoalSort::Progress;
        state.toggle_layer(Layer::Exhibition);

        let yaml = serde_yaml::to_string(&state).unwrap();
        assert!(yaml.contains("active: visionboard"));
        let back: UiState = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, state);
    }
}
