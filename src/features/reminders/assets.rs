//! Notification images
//!
//! Each reminder kind has a folder of images; every notification attaches a
//! random one. Folder listings are cached per kind since the lookup runs on
//! every tick of every loop.

use crate::features::reminders::ReminderKind;
use dashmap::DashMap;
use log::debug;
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lookup of an optional attachment for a notification
pub trait AssetSource: Send + Sync {
    /// Pick an image for `kind`, or `None` to send plain text
    fn pick(&self, kind: ReminderKind) -> Option<PathBuf>;
}

/// Picks random files from a folder per reminder kind
pub struct AssetPicker {
    folders: HashMap<ReminderKind, PathBuf>,
    listings: DashMap<ReminderKind, Vec<PathBuf>>,
}

impl AssetPicker {
    pub fn new(folders: HashMap<ReminderKind, PathBuf>) -> Self {
        Self {
            folders,
            listings: DashMap::new(),
        }
    }

    fn list_files(folder: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No asset folder at {}: {e}", folder.display());
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        files
    }
}

impl AssetSource for AssetPicker {
    fn pick(&self, kind: ReminderKind) -> Option<PathBuf> {
        let folder = self.folders.get(&kind)?;
        let files = self
            .listings
            .entry(kind)
            .or_insert_with(|| Self::list_files(folder));
        files.choose(&mut rand::rng()).cloned()
    }
}
