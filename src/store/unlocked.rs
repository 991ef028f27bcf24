//! Durable record of rockets the user unlocked by hand.
//!
//! Only used to paper over a stale server read until a later fetch agrees.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::RocketId;

use super::write_atomic;

#[derive(Debug, Default)]
pub struct UnlockedSet {
    ids: BTreeSet<RocketId>,
    path: Option<PathBuf>,
}

impl UnlockedSet {
    /// A set that is never written anywhere.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Reads the plain JSON array at `path`; a missing file is an empty set.
    pub fn open(path: &Path) -> Result<Self> {
        let ids = if path.exists() {
            let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
            let ids: Vec<RocketId> = serde_json::from_slice(&bytes)
                .with_context(|| format!("parse {}", path.display()))?;
            ids.into_iter().collect()
        } else {
            BTreeSet::new()
        };
        Ok(Self {
            ids,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn contains(&self, id: &RocketId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Adds `id` and persists. Returns false if it was already present.
    pub fn insert(&mut self, id: RocketId) -> Result<bool> {
        if !self.ids.insert(id) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Drops ids the server now reports as unlocked on its own.
    pub fn prune<'a>(&mut self, confirmed: impl IntoIterator<Item = &'a RocketId>) -> Result<usize> {
        let before = self.ids.len();
        for id in confirmed {
            self.ids.remove(id);
        }
        let removed = before - self.ids.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let ids: Vec<&RocketId> = self.ids.iter().collect();
        let bytes = serde_json::to_vec(&ids).context("serialize unlocked ids")?;
        write_atomic(path, &bytes).with_context(|| format!("write {}", path.display()))
    }
}
