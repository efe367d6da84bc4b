//! In-memory conversation history, sharded per symbol
//!
//! Follow-up chat questions reuse the turns stored here. Keys are
//! uppercased symbols; each symbol keeps at most the 50 most recent
//! turns. Appends extend a shard atomically under its own lock, so two
//! concurrent exchanges on the same symbol interleave without losing
//! turns.

use advisor_core::ConversationTurn;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// Most recent turns retained per symbol
const MAX_TURNS: usize = 50;

/// Per-symbol bounded conversation store
#[derive(Debug, Default)]
pub struct HistoryStore {
    shards: RwLock<HashMap<String, Arc<Mutex<Vec<ConversationTurn>>>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored turns for a symbol, oldest first
    pub async fn snapshot(&self, symbol: &str) -> Vec<ConversationTurn> {
        let shard = self.shard(symbol);
        let turns = shard.lock().await;
        turns.clone()
    }

    /// Append turns for a symbol, dropping the oldest beyond the cap
    pub async fn append(&self, symbol: &str, new_turns: Vec<ConversationTurn>) {
        let shard = self.shard(symbol);
        let mut turns = shard.lock().await;
        turns.extend(new_turns);

        let excess = turns.len().saturating_sub(MAX_TURNS);
        if excess > 0 {
            turns.drain(..excess);
        }
    }

    /// Number of symbols with stored history
    pub fn len(&self) -> usize {
        self.shards.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard(&self, symbol: &str) -> Arc<Mutex<Vec<ConversationTurn>>> {
        let key = symbol.to_uppercase();
        if let Some(shard) = self.shards.read().unwrap().get(&key) {
            return Arc::clone(shard);
        }

        let mut shards = self.shards.write().unwrap();
        Arc::clone(shards.entry(key).or_default())
    }
}
