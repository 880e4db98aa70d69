use crate::history::store::LocalStore;
use crate::prelude::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const TRANSCRIPT_KEY: &str = "varTranscripts";
pub const TRANSCRIPT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Commentary log capped at the most recent entries, persisted on every change.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    store: LocalStore,
    entries: VecDeque<TranscriptEntry>,
}

impl TranscriptStore {
    /// Restores previously persisted entries; unreadable history starts empty.
    pub fn open(store: LocalStore) -> AnalysisResult<Self> {
        let entries = match store.get(TRANSCRIPT_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<TranscriptEntry>>(&raw).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable transcript history: {}", err);
                Vec::new()
            }),
            None => Vec::new(),
        };
        let mut transcripts = Self {
            store,
            entries: entries.into(),
        };
        transcripts.evict();
        Ok(transcripts)
    }

    pub fn record(&mut self, text: &str) -> AnalysisResult<()> {
        self.record_at(text, Utc::now())
    }

    pub fn record_at(&mut self, text: &str, timestamp: DateTime<Utc>) -> AnalysisResult<()> {
        self.entries.push_back(TranscriptEntry {
            text: text.to_string(),
            timestamp,
        });
        self.evict();
        self.persist()
    }

    /// Entries in insertion order, oldest first.
    pub fn load(&self) -> Vec<TranscriptEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> AnalysisResult<()> {
        self.entries.clear();
        self.store.remove(TRANSCRIPT_KEY)
    }

    fn evict(&mut self) {
        while self.entries.len() > TRANSCRIPT_CAPACITY {
            self.entries.pop_front();
        }
    }

    fn persist(&self) -> AnalysisResult<()> {
        let entries: Vec<&TranscriptEntry> = self.entries.iter().collect();
        self.store
            .set(TRANSCRIPT_KEY, &serde_json::to_string(&entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn keeps_the_last_fifty_in_order() {
        let mut transcripts = TranscriptStore::open(LocalStore::in_memory()).unwrap();
        for i in 0..55 {
            transcripts.record(&format!("call {}", i)).unwrap();
        }
        let entries = transcripts.load();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].text, "call 5");
        assert_eq!(entries[49].text, "call 54");
    }

    #[test]
    fn persisted_entries_reload_and_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.json");
        {
            let mut transcripts = TranscriptStore::open(LocalStore::open(&path).unwrap()).unwrap();
            transcripts.record("penalty shout").unwrap();
            transcripts.record("play on").unwrap();
        }

        let mut reopened = TranscriptStore::open(LocalStore::open(&path).unwrap()).unwrap();
        let texts: Vec<String> = reopened.load().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["penalty shout", "play on"]);

        reopened.clear().unwrap();
        assert!(reopened.is_empty());
        let store = LocalStore::open(&path).unwrap();
        assert!(store.get(TRANSCRIPT_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_history_starts_empty() {
        let store = LocalStore::in_memory();
        store.set(TRANSCRIPT_KEY, "not json").unwrap();
        assert!(TranscriptStore::open(store).unwrap().is_empty());
    }
}
