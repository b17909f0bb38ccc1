//! Per-track stream resolution.
//!
//! A card resolves the proxied URL of its track's best source. Every
//! resolution it starts is tagged with a generation; only a response carrying
//! the card's latest generation is applied, so a slow reply for a source the
//! card has since moved away from can never overwrite newer state.

use crate::error::BackendError;
use crate::models::{Source, Track};

/// One request to the backend `/stream` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub generation: u64,
    pub url: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    /// The track has no usable best source; nothing is ever requested.
    NoSource,
    Resolving,
    Ready(String),
    /// The last resolution failed. Not retried.
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct TrackCard {
    track: Track,
    status: StreamStatus,
    generation: u64,
}

impl TrackCard {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            status: StreamStatus::NoSource,
            generation: 0,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn best_source(&self) -> Option<&Source> {
        self.track.best_source()
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    /// Source for the audio player, once resolved.
    pub fn audio_url(&self) -> Option<&str> {
        match &self.status {
            StreamStatus::Ready(url) => Some(url),
            _ => None,
        }
    }

    /// True while the card can only show the "metadata only" notice.
    pub fn is_metadata_only(&self) -> bool {
        self.audio_url().is_none()
    }

    /// Starts resolving the current best source under `generation`.
    ///
    /// Without a best source the card drops to `NoSource` and any
    /// outstanding response is invalidated.
    pub fn begin_resolution(&mut self, generation: u64) -> Option<StreamRequest> {
        self.generation = generation;

        let Some(best) = self.track.best_source() else {
            self.status = StreamStatus::NoSource;
            return None;
        };

        self.status = StreamStatus::Resolving;
        Some(StreamRequest {
            generation,
            url: best.playable_url().to_string(),
            provider: best.provider_name.clone(),
        })
    }

    /// Applies a `/stream` response. Returns false when the response is stale.
    pub fn apply(&mut self, generation: u64, result: Result<String, BackendError>) -> bool {
        if generation != self.generation || self.status != StreamStatus::Resolving {
            tracing::debug!(
                "dropping stale stream response for {:?} (gen {} != {})",
                self.track.title,
                generation,
                self.generation
            );
            return false;
        }

        self.status = match result {
            Ok(url) => StreamStatus::Ready(url),
            Err(e) => {
                tracing::debug!("no stream for {:?}: {}", self.track.title, e);
                StreamStatus::Unavailable
            }
        };
        true
    }
}
