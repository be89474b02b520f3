use std::sync::Arc;

use pixatools_domain::{push_newest, HistoryEntry, NewHistoryEntry};

use crate::{ApplicationError, Clock, StateStore, StoreWrite};

pub const HISTORY_KEY: &str = "history";

/// Shared, capped log of produced artifacts, newest first.
pub struct HistoryLedger {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, ApplicationError> {
        let mut stamped = HistoryEntry::stamp(entry, self.clock.now_millis());

        self.store.update(HISTORY_KEY, &mut |current| {
            let entries = decode_history(current.as_deref())?;
            stamped.disambiguate(&entries);
            let updated = push_newest(entries, stamped.clone());
            serde_json::to_string(&updated)
                .map(StoreWrite::Put)
                .map_err(|error| ApplicationError::Persistence(error.to_string()))
        })?;

        tracing::info!(id = %stamped.id, name = %stamped.name, size = stamped.size, "history entry appended");
        Ok(stamped)
    }

    pub fn list(&self) -> Result<Vec<HistoryEntry>, ApplicationError> {
        let stored = self.store.get(HISTORY_KEY)?;
        decode_history(stored.as_deref())
    }

    pub fn find(&self, id: &str) -> Result<Option<HistoryEntry>, ApplicationError> {
        Ok(self.list()?.into_iter().find(|entry| entry.id == id))
    }

    pub fn clear(&self) -> Result<(), ApplicationError> {
        self.store.remove(HISTORY_KEY)?;
        tracing::info!("history cleared");
        Ok(())
    }
}

fn decode_history(raw: Option<&str>) -> Result<Vec<HistoryEntry>, ApplicationError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    serde_json::from_str(raw)
        .map_err(|error| ApplicationError::Persistence(format!("corrupt history record: {error}")))
}
