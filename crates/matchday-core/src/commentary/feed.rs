// ── Merged commentary feed ──

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{BallLabel, CommentaryEntry};

/// One row of the merged feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub entry: Arc<CommentaryEntry>,
    /// Set on the first item of each `over.ball` group only.
    pub show_label: bool,
}

impl FeedItem {
    /// The `over.ball` label to display, if this item carries it.
    pub fn label(&self) -> Option<BallLabel> {
        self.show_label.then(|| self.entry.label())
    }
}

/// Result of one fetch-and-merge. Never patched; a new fetch builds a new feed.
#[derive(Debug, Clone, Serialize)]
pub struct MergedCommentaryFeed {
    pub items: Vec<FeedItem>,
    pub first_innings: Vec<FeedItem>,
    pub second_innings: Vec<FeedItem>,
    pub generated_at: DateTime<Utc>,
}

impl MergedCommentaryFeed {
    /// Wrap already-ordered entry lists.
    pub fn new(
        all: Vec<CommentaryEntry>,
        first_innings: Vec<CommentaryEntry>,
        second_innings: Vec<CommentaryEntry>,
    ) -> Self {
        Self {
            items: label_groups(all),
            first_innings: label_groups(first_innings),
            second_innings: label_groups(second_innings),
            generated_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommentaryEntry> {
        self.items.iter().map(|item| item.entry.as_ref())
    }
}

fn label_groups(entries: Vec<CommentaryEntry>) -> Vec<FeedItem> {
    let mut seen: HashSet<BallLabel> = HashSet::new();
    entries
        .into_iter()
        .map(|entry| FeedItem {
            show_label: seen.insert(entry.label()),
            entry: Arc::new(entry),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommentarySource, Phase};

    fn entry(over: u32, ball: u32, phase: Phase) -> CommentaryEntry {
        CommentaryEntry {
            id: None,
            over,
            ball,
            source: CommentarySource::InHouse,
            phase,
            text: String::new(),
            runs: None,
            wicket: false,
            author: None,
            order: None,
            timestamp: None,
            innings: None,
        }
    }

    #[test]
    fn label_only_on_first_of_each_ball() {
        let feed = MergedCommentaryFeed::new(
            vec![
                entry(12, 4, Phase::Ball),
                entry(12, 3, Phase::PreBall),
                entry(12, 3, Phase::Ball),
                entry(12, 3, Phase::PostBall),
            ],
            Vec::new(),
            Vec::new(),
        );

        let labels: Vec<Option<String>> = feed
            .items
            .iter()
            .map(|item| item.label().map(|l| l.to_string()))
            .collect();
        assert_eq!(
            labels,
            vec![Some("12.4".into()), Some("12.3".into()), None, None]
        );
        assert_eq!(feed.len(), 4);
    }

    #[test]
    fn items_are_never_coalesced() {
        let feed = MergedCommentaryFeed::new(
            vec![entry(1, 1, Phase::Ball), entry(1, 1, Phase::Ball)],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(feed.entries().count(), 2);
    }
}
