//! Mock implementations for testing
//!
//! `MockFhemClient` serves a fixed entity list, evaluates devspecs the way
//! FHEM does, and records every command written to it.

use crate::client::{EntityQuery, FhemClient, FhemEntity, FhemResponse};
use crate::error::{FhemError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock FHEM backend for testing
#[derive(Default)]
pub struct MockFhemClient {
    entities: Vec<FhemEntity>,
    responses: HashMap<String, FhemResponse>,
    commands: Mutex<Vec<String>>,
    queries: AtomicUsize,
    offline: bool,
    fail_commands: bool,
}

impl MockFhemClient {
    /// Create new mock client without entities
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity; query results keep insertion order
    pub fn with_entity(mut self, entity: FhemEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add several entities
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = FhemEntity>) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Respond to an exact command with the given body
    pub fn with_response(mut self, command: &str, text: &str) -> Self {
        self.responses
            .insert(command.to_string(), FhemResponse::ok(text));
        self
    }

    /// Fail every call with `BackendUnavailable`
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Serve queries but fail every command
    pub fn failing_commands(mut self) -> Self {
        self.fail_commands = true;
        self
    }

    /// Commands written so far
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Number of queries served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(FhemError::backend_unavailable("mock backend offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl FhemClient for MockFhemClient {
    async fn query(&self, query: &EntityQuery) -> Result<Vec<FhemEntity>> {
        self.check_online()?;
        self.queries.fetch_add(1, Ordering::SeqCst);

        let mut matched = Vec::new();
        for entity in &self.entities {
            if query.matches(entity)? {
                matched.push(entity.clone());
            }
        }
        Ok(matched)
    }

    async fn send_cmd(&self, command: &str) -> Result<FhemResponse> {
        self.check_online()?;
        if self.fail_commands {
            return Err(FhemError::backend_unavailable("mock command failed"));
        }

        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.to_string());
        }

        Ok(self
            .responses
            .get(command)
            .cloned()
            .unwrap_or_else(|| FhemResponse::ok("")))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.offline)
    }
}
