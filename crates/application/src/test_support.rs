use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{ApplicationError, Clock, StateStore, StoreWrite};

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("store lock")
            .insert(key.to_string(), value.to_string());
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        Ok(self.values.lock().expect("store lock").get(key).cloned())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<StoreWrite, ApplicationError>,
    ) -> Result<(), ApplicationError> {
        let mut values = self.values.lock().expect("store lock");
        if let StoreWrite::Put(value) = apply(values.get(key).cloned())? {
            values.insert(key.to_string(), value);
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApplicationError> {
        self.values.lock().expect("store lock").remove(key);
        Ok(())
    }
}

pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
