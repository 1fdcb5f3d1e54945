//! Testing utilities for the bot core.
//!
//! This module provides deterministic doubles for every boundary the
//! dispatcher touches:
//! - `FixedRolls` for scripting exact die faces
//! - `InMemoryTemplates` as a template store
//! - `FailingStore` for degraded-store paths
//! - `ScriptedHandler` for the external command handler

use crate::dice::DieSource;
use crate::dispatch::{CommandHandler, HandlerError, HandlerOutput};
use crate::router::CommandKind;
use crate::store::{StoreError, TemplateStore};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// A die source that replays scripted faces in order.
///
/// Tests are expected to script exactly as many faces as the dice being
/// rolled; an exhausted script keeps returning 1 so a miscounted test
/// fails on its assertions instead of panicking mid-roll.
pub struct FixedRolls {
    faces: VecDeque<u32>,
}

impl FixedRolls {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    /// Faces not yet consumed.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DieSource for FixedRolls {
    fn roll_die(&mut self, _sides: u32) -> u32 {
        self.faces.pop_front().unwrap_or(1)
    }
}

/// In-memory template store.
#[derive(Debug, Default)]
pub struct InMemoryTemplates {
    templates: HashMap<String, Vec<String>>,
}

impl InMemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register phrases for a custom keyword.
    pub fn insert(&mut self, keyword: impl Into<String>, phrases: Vec<String>) {
        self.templates.insert(keyword.into(), phrases);
    }
}

impl TemplateStore for InMemoryTemplates {
    fn lookup_templates(&self, keyword: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.templates.get(keyword).cloned().unwrap_or_default())
    }

    fn known_custom_keywords(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.templates.keys().cloned().collect())
    }
}

/// A store whose every call fails, for outage tests.
pub struct FailingStore;

impl TemplateStore for FailingStore {
    fn lookup_templates(&self, _keyword: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("scripted outage".to_string()))
    }

    fn known_custom_keywords(&self) -> Result<HashSet<String>, StoreError> {
        Err(StoreError::Unavailable("scripted outage".to_string()))
    }
}

/// External handler that replays scripted results in order.
///
/// Once the script runs out it echoes the invoked command, so tests that
/// only care about routing need no scripting at all.
pub struct ScriptedHandler {
    outputs: Mutex<VecDeque<Result<HandlerOutput, HandlerError>>>,
}

impl ScriptedHandler {
    pub fn new(outputs: Vec<Result<HandlerOutput, HandlerError>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
        }
    }

    /// Append one more scripted result.
    pub fn queue(&self, output: Result<HandlerOutput, HandlerError>) {
        let mut outputs = match self.outputs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        outputs.push_back(output);
    }
}

impl CommandHandler for ScriptedHandler {
    fn invoke(
        &self,
        command: CommandKind,
        _keywords: &[String],
    ) -> Result<HandlerOutput, HandlerError> {
        let mut outputs = match self.outputs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        outputs
            .pop_front()
            .unwrap_or_else(|| Ok(HandlerOutput::Text(format!("{command} 명령어 처리 완료"))))
    }
}
