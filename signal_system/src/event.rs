//! Lifecycle event types and definitions
//!
//! This module defines the events that flow through the signal system when a
//! guarded mutation touches rows.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use type_mapping::SqlValue;

/// Lifecycle event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    BeforeRemove,
    AfterRemove,
    BeforeSoftRemove,
    AfterSoftRemove,
    BeforeRecover,
    AfterRecover,
}

impl EventType {
    /// Before-events run inside the mutation transaction and may abort it
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            EventType::BeforeRemove | EventType::BeforeSoftRemove | EventType::BeforeRecover
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::BeforeRemove => "before_remove",
            EventType::AfterRemove => "after_remove",
            EventType::BeforeSoftRemove => "before_soft_remove",
            EventType::AfterSoftRemove => "after_soft_remove",
            EventType::BeforeRecover => "before_recover",
            EventType::AfterRecover => "after_recover",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque audit metadata attached by the caller of a mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextData {
    pub actor: Option<String>,
    pub reason: Option<String>,
    pub extra: HashMap<String, serde_json::Value>,
}

impl ContextData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// One affected row as seen before the mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSnapshot {
    /// Primary key in canonical string form
    pub record_id: String,
    pub payload: HashMap<String, SqlValue>,
    pub context: Option<ContextData>,
}

/// Lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub id: uuid::Uuid,
    pub event_type: EventType,
    pub table_name: String,
    pub records: Vec<RecordSnapshot>,
    pub context: Option<ContextData>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl LifecycleEvent {
    pub fn new(event_type: EventType, table_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            event_type,
            table_name: table_name.into(),
            records: Vec::new(),
            context: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach the caller's context to the event and to every record
    pub fn with_context(mut self, context: Option<ContextData>) -> Self {
        for record in &mut self.records {
            record.context = context.clone();
        }
        self.context = context;
        self
    }

    pub fn with_record(mut self, record_id: String, payload: HashMap<String, SqlValue>) -> Self {
        self.records.push(RecordSnapshot {
            record_id,
            payload,
            context: self.context.clone(),
        });
        self
    }

    /// Same records and context under a different event type
    pub fn follow_up(&self, event_type: EventType) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            event_type,
            table_name: self.table_name.clone(),
            records: self.records.clone(),
            context: self.context.clone(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn record_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.record_id.as_str()).collect()
    }
}
