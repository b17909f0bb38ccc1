use serde::{Deserialize, Serialize};

/// One playable (or merely listed) copy of a track at a provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Source {
    pub provider_name: String,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub audiodownload_allowed: bool,
    #[serde(default)]
    pub downloadable: bool,
}

impl Source {
    /// URL handed to the backend proxy: stream first, then download.
    /// Empty when neither is present; the backend decides what that means.
    pub fn playable_url(&self) -> &str {
        self.stream_url
            .as_deref()
            .or(self.download_url.as_deref())
            .unwrap_or("")
    }

    pub fn download_allowed(&self) -> bool {
        self.audiodownload_allowed || self.downloadable
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub best_source_index: Option<usize>,
}

impl Track {
    /// The backend's preferred source. An out-of-range index counts as absent.
    pub fn best_source(&self) -> Option<&Source> {
        self.best_source_index.and_then(|i| self.sources.get(i))
    }

    pub fn display_artist(&self) -> &str {
        self.artist
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown artist")
    }

    pub fn summary(&self) -> String {
        format!("{} - {}", self.display_artist(), self.title)
    }
}
