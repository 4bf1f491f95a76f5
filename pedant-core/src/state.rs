//! Per-session conversation history consulted by the matching engine.

use std::collections::VecDeque;

use crate::config::MatchingConfig;
use crate::types::{Category, RecordId};

/// Bounded history of recent selections, most recent first.
///
/// Created empty at session start and mutated only by
/// [`crate::MatchingEngine::match_utterance`]. Nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    recent_ids: VecDeque<RecordId>,
    recent_categories: VecDeque<Category>,
    id_capacity: usize,
    category_capacity: usize,
    turns: u64,
}

impl ConversationState {
    /// Empty state remembering `record_window` ids and `category_window`
    /// categories.
    #[must_use]
    pub fn new(record_window: usize, category_window: usize) -> Self {
        Self {
            recent_ids: VecDeque::with_capacity(record_window),
            recent_categories: VecDeque::with_capacity(category_window),
            id_capacity: record_window,
            category_capacity: category_window,
            turns: 0,
        }
    }

    /// Empty state sized from the recency and diversity windows.
    #[must_use]
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.recency.window, config.diversity.window)
    }

    /// Record a selection, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, id: RecordId, category: Category) {
        push_bounded(&mut self.recent_ids, id, self.id_capacity);
        push_bounded(&mut self.recent_categories, category, self.category_capacity);
        self.turns += 1;
    }

    /// Recently selected ids, most recent first.
    pub fn recent_record_ids(&self) -> impl ExactSizeIterator<Item = &RecordId> {
        self.recent_ids.iter()
    }

    /// Recently selected categories, most recent first.
    pub fn recent_categories(&self) -> impl ExactSizeIterator<Item = Category> + '_ {
        self.recent_categories.iter().copied()
    }

    /// Position of `id` in the recent-id window (0 = most recent).
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.recent_ids.iter().position(|r| r.as_str() == id)
    }

    /// How often `category` occurs in the recent-category window.
    #[must_use]
    pub fn category_count(&self, category: Category) -> usize {
        self.recent_categories.iter().filter(|c| **c == category).count()
    }

    /// Number of selections recorded since creation (not bounded by the windows).
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Whether no selection has been remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent_ids.is_empty() && self.recent_categories.is_empty()
    }

    /// Forget all history but keep the window sizes.
    pub fn clear(&mut self) {
        self.recent_ids.clear();
        self.recent_categories.clear();
        self.turns = 0;
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    queue.push_front(item);
    queue.truncate(capacity);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_most_recent_first() {
        let mut state = ConversationState::new(3, 3);
        state.push("a".into(), Category::Cycling);
        state.push("b".into(), Category::Food);
        assert_eq!(state.position_of("b"), Some(0));
        assert_eq!(state.position_of("a"), Some(1));
        assert_eq!(state.position_of("zzz"), None);
    }

    #[test]
    fn windows_evict_oldest() {
        let mut state = ConversationState::new(2, 3);
        for id in ["a", "b", "c", "d"] {
            state.push(id.into(), Category::Research);
        }
        let ids: Vec<&str> = state.recent_record_ids().map(RecordId::as_str).collect();
        assert_eq!(ids, vec!["d", "c"]);
        assert_eq!(state.category_count(Category::Research), 3);
        assert_eq!(state.turns(), 4);
    }

    #[test]
    fn zero_window_remembers_nothing() {
        let mut state = ConversationState::new(0, 0);
        state.push("a".into(), Category::Work);
        assert!(state.is_empty());
        assert_eq!(state.turns(), 1);
    }

    #[test]
    fn clear_resets_history() {
        let mut state = ConversationState::from_config(&MatchingConfig::default());
        state.push("a".into(), Category::Work);
        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.turns(), 0);
        assert_eq!(state.category_count(Category::Work), 0);
    }
}
