//! Mock repository for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quiztree_core::draft::TestDraft;
use quiztree_core::traits::TestRepository;

use crate::error::ClientError;

/// An in-memory test repository that records how it was used.
#[derive(Default)]
pub struct MockRepository {
    tests: Mutex<HashMap<String, TestDraft>>,
    next_id: AtomicU32,
    call_count: AtomicU32,
    last_draft: Mutex<Option<TestDraft>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored test.
    pub fn with_test(id: &str, draft: TestDraft) -> Self {
        let repo = Self::default();
        repo.lock_tests().insert(id.to_string(), draft);
        repo
    }

    /// Number of calls made to this repository.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last draft passed to create or update.
    pub fn last_draft(&self) -> Option<TestDraft> {
        self.last_draft
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn stored_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_tests().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn lock_tests(&self) -> std::sync::MutexGuard<'_, HashMap<String, TestDraft>> {
        self.tests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, draft: &TestDraft) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_draft.lock().unwrap_or_else(|e| e.into_inner()) = Some(draft.clone());
    }
}

#[async_trait]
impl TestRepository for MockRepository {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_test(&self, draft: &TestDraft) -> anyhow::Result<String> {
        self.record(draft);
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.lock_tests().insert(id.clone(), draft.clone());
        Ok(id)
    }

    async fn update_test(&self, id: &str, draft: &TestDraft) -> anyhow::Result<()> {
        self.record(draft);
        let mut tests = self.lock_tests();
        match tests.get_mut(id) {
            Some(stored) => {
                *stored = draft.clone();
                Ok(())
            }
            None => Err(ClientError::NotFound(id.to_string()).into()),
        }
    }

    async fn load_test(&self, id: &str) -> anyhow::Result<TestDraft> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.lock_tests()
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()).into())
    }
}
