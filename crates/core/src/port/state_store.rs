// State Store Port
// Whole-record persistence for per-workload setup state

use async_trait::async_trait;

use crate::domain::StateRecord;
use crate::error::Result;

/// Persists workload state records across process restarts.
///
/// Records are keyed by workload type name and read/written whole -
/// callers read-modify-write, there are no partial-field updates.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the record for a workload, if one was ever saved.
    async fn get(&self, name: &str) -> Result<Option<StateRecord>>;

    /// Save (insert or replace) a whole record.
    async fn save(&self, record: &StateRecord) -> Result<()>;

    /// Drop a record entirely, forcing the next run to redo setup.
    async fn delete(&self, name: &str) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory state store for tests.
    #[derive(Default)]
    pub struct InMemoryStateStore {
        records: Mutex<HashMap<String, StateRecord>>,
    }

    impl InMemoryStateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl StateStore for InMemoryStateStore {
        async fn get(&self, name: &str) -> Result<Option<StateRecord>> {
            Ok(self.records.lock().unwrap().get(name).cloned())
        }

        async fn save(&self, record: &StateRecord) -> Result<()> {
            self.records
                .lock()
                .unwrap()
                .insert(record.name.clone(), record.clone());
            Ok(())
        }

        async fn delete(&self, name: &str) -> Result<()> {
            self.records.lock().unwrap().remove(name);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::InMemoryStateStore;
    use super::*;

    #[test]
    fn test_read_modify_write_whole_record() {
        // Sync-context exercise of the async port, teacher-style.
        tokio_test::block_on(async {
            let store = InMemoryStateStore::new();
            assert!(store.get("oltp").await.unwrap().is_none());

            let mut record = StateRecord::new("oltp");
            record
                .properties
                .insert("initialized".to_string(), serde_json::Value::Bool(true));
            store.save(&record).await.unwrap();

            let mut loaded = store.get("oltp").await.unwrap().unwrap();
            loaded.properties.insert(
                "database-initialized".to_string(),
                serde_json::Value::Bool(true),
            );
            store.save(&loaded).await.unwrap();

            let final_record = store.get("oltp").await.unwrap().unwrap();
            assert_eq!(final_record.properties.len(), 2);

            store.delete("oltp").await.unwrap();
            assert!(store.get("oltp").await.unwrap().is_none());
        });
    }
}
