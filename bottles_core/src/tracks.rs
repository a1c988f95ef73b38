use std::path::{Path, PathBuf};

use bottles_traits::{AudioBackend, TrackHandle};

use crate::error::{BottlesError, Result, config_err};
use crate::hw_error::map_hw_error;

/// Loaded track sets plus the optional override track.
#[derive(Debug, Clone)]
pub struct TrackLibrary {
    sets: Vec<Vec<TrackHandle>>,
    override_track: Option<TrackHandle>,
    selected: usize,
}

impl TrackLibrary {
    /// Load every set. Any failing set track is fatal; a failing override
    /// track only disables override playback.
    pub fn load<A: AudioBackend + ?Sized>(
        audio: &mut A,
        sets: &[Vec<PathBuf>],
        override_track: Option<&Path>,
    ) -> Result<Self> {
        if sets.is_empty() {
            return Err(config_err("at least one track set is required"));
        }
        let mut loaded = Vec::with_capacity(sets.len());
        for (n, set) in sets.iter().enumerate() {
            let mut handles = Vec::with_capacity(set.len());
            for path in set {
                let h = audio.load_track(path).map_err(|e| {
                    eyre::Report::new(BottlesError::CollaboratorInit(format!(
                        "track set {n}: cannot load {}: {}",
                        path.display(),
                        map_hw_error(e.as_ref())
                    )))
                })?;
                handles.push(h);
            }
            loaded.push(handles);
        }
        tracing::info!(sets = loaded.len(), "track sets loaded");

        let override_track = override_track.and_then(|path| match audio.load_track(path) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(
                    track = %path.display(),
                    error = %map_hw_error(e.as_ref()),
                    "override track unavailable, continuing without it"
                );
                None
            }
        });

        Ok(Self {
            sets: loaded,
            override_track,
            selected: 0,
        })
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// Select set `n`. Returns false (and keeps the current set) when `n` is unknown.
    pub fn select(&mut self, n: usize) -> bool {
        if n < self.sets.len() {
            self.selected = n;
            true
        } else {
            false
        }
    }

    pub const fn override_track(&self) -> Option<TrackHandle> {
        self.override_track
    }

    pub const fn has_override(&self) -> bool {
        self.override_track.is_some()
    }

    /// Track per channel for the selected set, override last.
    pub fn channel_tracks(&self) -> Vec<Option<TrackHandle>> {
        self.sets
            .get(self.selected)
            .into_iter()
            .flatten()
            .copied()
            .map(Some)
            .chain(std::iter::once(self.override_track))
            .collect()
    }
}
