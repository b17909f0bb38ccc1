//! Root application state.
//!
//! `AppState` owns the result list, the loading flag, the metadata-only
//! toggle and every track card. Front ends read it through shared
//! references and change it only through [`AppState::update`], which
//! returns the backend work to perform. Running that work is the caller's
//! business: the CLI runs it inline via [`dispatch`], the GUI on worker
//! threads, both feeding results back as events.

use std::collections::VecDeque;

use crate::backend::Backend;
use crate::core::card::{StreamRequest, TrackCard};
use crate::core::query;
use crate::error::BackendError;
use crate::models::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing searched yet.
    Idle,
    Loading,
    /// A search finished; the result list may still be empty.
    Populated,
}

#[derive(Debug)]
pub enum Event {
    Submit(String),
    SetAllowMetadataOnly(bool),
    SearchFinished(Result<Vec<Track>, BackendError>),
    StreamResolved {
        card: usize,
        generation: u64,
        result: Result<String, BackendError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search {
        query: String,
        allow_metadata_only: bool,
    },
    ResolveStream {
        card: usize,
        request: StreamRequest,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    cards: Vec<TrackCard>,
    loading: bool,
    completed: bool,
    allow_metadata_only: bool,
    last_generation: u64,
}

impl AppState {
    pub fn new(allow_metadata_only: bool) -> Self {
        Self {
            allow_metadata_only,
            ..Default::default()
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.completed {
            Phase::Populated
        } else {
            Phase::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn allow_metadata_only(&self) -> bool {
        self.allow_metadata_only
    }

    pub fn cards(&self) -> &[TrackCard] {
        &self.cards
    }

    pub fn results(&self) -> impl Iterator<Item = &Track> {
        self.cards.iter().map(TrackCard::track)
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Generations are unique across result sets, so a reply addressed to a
    /// card of an earlier search can never match a card of the current one.
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// The single entry point for state changes.
    pub fn update(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Submit(text) => {
                let Some(q) = query::accept_query(&text) else {
                    return Vec::new();
                };
                self.loading = true;
                vec![Command::Search {
                    query: q.to_string(),
                    allow_metadata_only: self.allow_metadata_only,
                }]
            }
            Event::SetAllowMetadataOnly(allow) => {
                self.allow_metadata_only = allow;
                Vec::new()
            }
            Event::SearchFinished(result) => {
                // No sequencing between searches: whichever finishes last wins.
                self.loading = false;
                self.completed = true;
                let tracks = result.unwrap_or_else(|e| {
                    tracing::debug!("search failed: {}", e);
                    Vec::new()
                });
                self.set_results(tracks)
            }
            Event::StreamResolved {
                card,
                generation,
                result,
            } => {
                match self.cards.get_mut(card) {
                    Some(c) => {
                        c.apply(generation, result);
                    }
                    None => tracing::debug!("stream response for missing card {}", card),
                }
                Vec::new()
            }
        }
    }

    fn set_results(&mut self, tracks: Vec<Track>) -> Vec<Command> {
        self.cards = tracks.into_iter().map(TrackCard::new).collect();

        let mut commands = Vec::new();
        for i in 0..self.cards.len() {
            let generation = self.next_generation();
            if let Some(request) = self.cards[i].begin_resolution(generation) {
                commands.push(Command::ResolveStream { card: i, request });
            }
        }
        commands
    }
}

/// Performs one command against the backend and reports its outcome.
pub fn execute(backend: &dyn Backend, command: Command) -> Event {
    match command {
        Command::Search {
            query,
            allow_metadata_only,
        } => Event::SearchFinished(backend.search(&query, allow_metadata_only)),
        Command::ResolveStream { card, request } => Event::StreamResolved {
            card,
            generation: request.generation,
            result: backend.resolve_stream(&request.url, &request.provider),
        },
    }
}

/// Feeds `event` into `state` and runs every resulting command inline until
/// nothing is left to do.
pub fn dispatch(state: &mut AppState, backend: &dyn Backend, event: Event) {
    let mut pending: VecDeque<Command> = state.update(event).into();
    while let Some(command) = pending.pop_front() {
        let outcome = execute(backend, command);
        pending.extend(state.update(outcome));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::card::StreamStatus;
    use crate::error::Result;
    use crate::models::Source;

    #[derive(Default)]
    struct FakeBackend {
        tracks: Option<Vec<Track>>,
        searches: Mutex<Vec<(String, bool)>>,
        resolutions: Mutex<Vec<(String, String)>>,
    }

    impl Backend for FakeBackend {
        fn search(&self, query: &str, allow_metadata_only: bool) -> Result<Vec<Track>> {
            self.searches
                .lock()
                .unwrap()
                .push((query.to_string(), allow_metadata_only));
            match &self.tracks {
                Some(t) => Ok(t.clone()),
                None => Err(BackendError::MissingStreamUrl),
            }
        }

        fn resolve_stream(&self, url: &str, provider: &str) -> Result<String> {
            self.resolutions
                .lock()
                .unwrap()
                .push((url.to_string(), provider.to_string()));
            if url.is_empty() {
                return Err(BackendError::MissingStreamUrl);
            }
            Ok(format!("http://localhost:8000/proxy/{}", provider))
        }

        fn fetch_cover(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn playable(title: &str) -> Track {
        Track {
            title: title.to_string(),
            artist: Some("Luna".to_string()),
            sources: vec![Source {
                provider_name: "Jamendo".to_string(),
                stream_url: Some("https://jamendo.example/moon.mp3".to_string()),
                license: Some("CC-BY".to_string()),
                ..Default::default()
            }],
            best_source_index: Some(0),
            ..Default::default()
        }
    }

    fn listed_only(title: &str) -> Track {
        Track {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_short_query_changes_nothing() {
        let mut state = AppState::new(false);
        for q in ["", "m", "  m "] {
            assert!(state.update(Event::Submit(q.to_string())).is_empty());
            assert_eq!(state.phase(), Phase::Idle);
            assert!(!state.is_loading());
            assert!(state.is_empty());
        }
    }

    #[test]
    fn test_short_query_keeps_existing_results() {
        let mut state = AppState::new(false);
        state.update(Event::SearchFinished(Ok(vec![listed_only("a")])));
        state.update(Event::Submit("x".to_string()));
        assert_eq!(state.phase(), Phase::Populated);
        assert_eq!(state.cards().len(), 1);
    }

    #[test]
    fn test_submit_enters_loading_and_forwards_flag() {
        let mut state = AppState::new(true);
        let commands = state.update(Event::Submit("moon".to_string()));
        assert_eq!(state.phase(), Phase::Loading);
        assert_eq!(
            commands,
            vec![Command::Search {
                query: "moon".to_string(),
                allow_metadata_only: true,
            }]
        );
    }

    #[test]
    fn test_toggle_applies_to_next_search() {
        let mut state = AppState::new(false);
        state.update(Event::SetAllowMetadataOnly(true));
        let commands = state.update(Event::Submit("moon".to_string()));
        assert!(matches!(
            commands.as_slice(),
            [Command::Search { allow_metadata_only: true, .. }]
        ));
    }

    #[test]
    fn test_success_replaces_results_exactly() {
        let mut state = AppState::new(false);
        state.update(Event::SearchFinished(Ok(vec![listed_only("old")])));

        state.update(Event::Submit("moon".to_string()));
        let tracks = vec![listed_only("a"), playable("b")];
        state.update(Event::SearchFinished(Ok(tracks.clone())));

        assert_eq!(state.phase(), Phase::Populated);
        assert_eq!(state.results().cloned().collect::<Vec<_>>(), tracks);
    }

    #[test]
    fn test_empty_success_is_populated() {
        let mut state = AppState::new(false);
        state.update(Event::Submit("moon".to_string()));
        state.update(Event::SearchFinished(Ok(Vec::new())));
        assert_eq!(state.phase(), Phase::Populated);
        assert!(state.is_empty());
    }

    #[test]
    fn test_failure_clears_results_and_loading() {
        let mut state = AppState::new(false);
        state.update(Event::SearchFinished(Ok(vec![playable("x")])));
        state.update(Event::Submit("moon".to_string()));

        let commands = state.update(Event::SearchFinished(Err(BackendError::MissingStreamUrl)));
        assert!(commands.is_empty());
        assert!(!state.is_loading());
        assert!(state.is_empty());
    }

    #[test]
    fn test_results_only_resolve_cards_with_best_source() {
        let mut state = AppState::new(false);
        let commands =
            state.update(Event::SearchFinished(Ok(vec![listed_only("a"), playable("b")])));
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            Command::ResolveStream { card, request } => {
                assert_eq!(*card, 1);
                assert_eq!(request.provider, "Jamendo");
                assert_eq!(request.url, "https://jamendo.example/moon.mp3");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(state.cards()[0].status(), &StreamStatus::NoSource);
    }

    #[test]
    fn test_reply_for_previous_result_set_is_ignored() {
        let mut state = AppState::new(false);
        let first = state.update(Event::SearchFinished(Ok(vec![playable("first")])));
        let Command::ResolveStream { request: old, .. } = &first[0] else {
            panic!("expected resolve");
        };

        state.update(Event::SearchFinished(Ok(vec![playable("second")])));
        state.update(Event::StreamResolved {
            card: 0,
            generation: old.generation,
            result: Ok("http://proxy/stale".to_string()),
        });
        assert_eq!(state.cards()[0].status(), &StreamStatus::Resolving);
    }

    #[test]
    fn test_older_reply_after_newer_one_is_ignored() {
        let mut state = AppState::new(false);
        let first = state.update(Event::SearchFinished(Ok(vec![playable("first")])));
        let second = state.update(Event::SearchFinished(Ok(vec![playable("second")])));
        let Command::ResolveStream { request: old, .. } = &first[0] else {
            panic!("expected resolve");
        };
        let Command::ResolveStream { request: new, .. } = &second[0] else {
            panic!("expected resolve");
        };

        state.update(Event::StreamResolved {
            card: 0,
            generation: new.generation,
            result: Ok("http://proxy/new".to_string()),
        });
        state.update(Event::StreamResolved {
            card: 0,
            generation: old.generation,
            result: Ok("http://proxy/old".to_string()),
        });
        assert_eq!(state.cards()[0].track().title, "second");
        assert_eq!(state.cards()[0].audio_url(), Some("http://proxy/new"));
    }

    #[test]
    fn test_failed_search_looks_like_empty_result() {
        let mut failed = AppState::new(false);
        failed.update(Event::Submit("moon".to_string()));
        failed.update(Event::SearchFinished(Err(BackendError::MissingStreamUrl)));

        let mut empty = AppState::new(false);
        empty.update(Event::Submit("moon".to_string()));
        empty.update(Event::SearchFinished(Ok(Vec::new())));

        assert_eq!(failed.phase(), empty.phase());
        assert_eq!(failed.is_loading(), empty.is_loading());
        assert_eq!(failed.is_empty(), empty.is_empty());
    }

    #[test]
    fn test_failed_resolution_looks_like_missing_source() {
        let mut state = AppState::new(false);
        let commands =
            state.update(Event::SearchFinished(Ok(vec![playable("a"), listed_only("b")])));
        let Command::ResolveStream { card, request } = &commands[0] else {
            panic!("expected resolve");
        };
        state.update(Event::StreamResolved {
            card: *card,
            generation: request.generation,
            result: Err(BackendError::MissingStreamUrl),
        });

        let cards = state.cards();
        assert!(cards[0].is_metadata_only());
        assert_eq!(cards[0].audio_url(), cards[1].audio_url());
        assert_eq!(cards[0].is_metadata_only(), cards[1].is_metadata_only());
    }

    #[test]
    fn test_reply_for_unknown_card_is_ignored() {
        let mut state = AppState::new(false);
        state.update(Event::StreamResolved {
            card: 4,
            generation: 1,
            result: Ok("http://proxy/x".to_string()),
        });
        assert!(state.is_empty());
    }

    #[test]
    fn test_dispatch_moon_scenario() {
        let backend = FakeBackend {
            tracks: Some(vec![playable("Moon Song"), listed_only("Moon Notes")]),
            ..Default::default()
        };
        let mut state = AppState::new(false);
        dispatch(&mut state, &backend, Event::Submit("moon".to_string()));

        assert_eq!(
            *backend.searches.lock().unwrap(),
            vec![("moon".to_string(), false)]
        );
        assert_eq!(backend.resolutions.lock().unwrap().len(), 1);

        let cards = state.cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].audio_url(), Some("http://localhost:8000/proxy/Jamendo"));
        assert_eq!(
            cards[0].best_source().and_then(|s| s.license.as_deref()),
            Some("CC-BY")
        );
        assert!(cards[1].is_metadata_only());
        assert_eq!(cards.iter().filter(|c| !c.is_metadata_only()).count(), 1);
    }

    #[test]
    fn test_dispatch_failed_search() {
        let backend = FakeBackend::default();
        let mut state = AppState::new(false);
        dispatch(&mut state, &backend, Event::Submit("moon".to_string()));
        assert!(!state.is_loading());
        assert!(state.is_empty());
        assert!(backend.resolutions.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_empty_source_url_falls_back() {
        let mut track = playable("No urls");
        track.sources[0].stream_url = None;
        let backend = FakeBackend {
            tracks: Some(vec![track]),
            ..Default::default()
        };
        let mut state = AppState::new(false);
        dispatch(&mut state, &backend, Event::Submit("moon".to_string()));

        assert_eq!(
            *backend.resolutions.lock().unwrap(),
            vec![(String::new(), "Jamendo".to_string())]
        );
        assert_eq!(state.cards()[0].status(), &StreamStatus::Unavailable);
    }
}
