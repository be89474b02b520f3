use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use pixatools_application::{ApplicationError, StateStore, StoreWrite};

/// Process-local state, lost on exit. Used for `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStateStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, ApplicationError> {
        self.values
            .lock()
            .map_err(|_| ApplicationError::Persistence("state store lock poisoned".to_string()))
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<StoreWrite, ApplicationError>,
    ) -> Result<(), ApplicationError> {
        let mut values = self.lock()?;
        if let StoreWrite::Put(value) = apply(values.get(key).cloned())? {
            values.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApplicationError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_leaves_value_untouched() {
        let store = InMemoryStateStore::default();
        store
            .update("k", &mut |_| Ok(StoreWrite::Put("v".to_string())))
            .expect("put");
        store.update("k", &mut |_| Ok(StoreWrite::Keep)).expect("keep");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
        store.remove("k").expect("remove");
        assert!(store.get("k").expect("get").is_none());
    }
}
