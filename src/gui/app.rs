use std::sync::{mpsc, Arc};

use egui::{Color32, ColorImage, RichText, TextureHandle};

use crate::backend::Backend;
use crate::cli::{IDLE_HINT, METADATA_ONLY_NOTICE};
use crate::core::card::{StreamStatus, TrackCard};
use crate::core::state::{self, AppState, Command, Event, Phase};

const COVER_SIZE: f32 = 64.0;
const TAGLINE: &str =
    "Aggregates only full, legally streamable sources. Previews are never auto-played.";

enum BgResult {
    App(Event),
    CoverDone {
        batch: u64,
        card: usize,
        data: Vec<u8>,
    },
}

pub struct FulltrackApp {
    backend: Arc<dyn Backend>,
    state: AppState,

    // SearchBar text
    query: String,

    // Cover thumbnails, one slot per card of the current result set
    covers: Vec<Option<TextureHandle>>,
    cover_batch: u64,

    // Background tasks
    tx: mpsc::Sender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
}

impl FulltrackApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        backend: Arc<dyn Backend>,
        allow_metadata_only: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            state: AppState::new(allow_metadata_only),
            query: String::new(),
            covers: Vec::new(),
            cover_batch: 0,
            tx,
            rx,
        }
    }

    fn apply(&mut self, ctx: &egui::Context, event: Event) {
        let new_results = matches!(event, Event::SearchFinished(_));
        for command in self.state.update(event) {
            self.spawn(ctx, command);
        }
        if new_results {
            self.start_cover_fetches(ctx);
        }
    }

    fn spawn(&self, ctx: &egui::Context, command: Command) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let ctx = ctx.clone();

        std::thread::spawn(move || {
            let event = state::execute(backend.as_ref(), command);
            let _ = tx.send(BgResult::App(event));
            ctx.request_repaint();
        });
    }

    fn start_cover_fetches(&mut self, ctx: &egui::Context) {
        self.cover_batch += 1;
        self.covers = vec![None; self.state.cards().len()];

        for (i, card) in self.state.cards().iter().enumerate() {
            let Some(url) = card.track().cover_url.clone() else {
                continue;
            };
            let backend = Arc::clone(&self.backend);
            let tx = self.tx.clone();
            let ctx = ctx.clone();
            let batch = self.cover_batch;

            std::thread::spawn(move || match backend.fetch_cover(&url) {
                Ok(data) => {
                    let _ = tx.send(BgResult::CoverDone {
                        batch,
                        card: i,
                        data,
                    });
                    ctx.request_repaint();
                }
                Err(e) => tracing::debug!("cover {} failed: {}", url, e),
            });
        }
    }

    fn process_bg_results(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                BgResult::App(event) => self.apply(ctx, event),
                BgResult::CoverDone { batch, card, data } => {
                    if batch != self.cover_batch {
                        continue;
                    }
                    let Ok(img) = image::load_from_memory(&data) else {
                        continue;
                    };
                    let rgba = img.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    let pixels = rgba.into_raw();
                    let color_image = ColorImage::from_rgba_unmultiplied(size, &pixels);
                    let texture = ctx.load_texture(
                        format!("cover_{}_{}", batch, card),
                        color_image,
                        Default::default(),
                    );
                    if let Some(slot) = self.covers.get_mut(card) {
                        *slot = Some(texture);
                    }
                }
            }
        }
    }
}

impl eframe::App for FulltrackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bg_results(ctx);

        let mut submitted = None;
        let mut allow = self.state.allow_metadata_only();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.heading("Full-Track Music Player");
            ui.label(RichText::new(TAGLINE).color(Color32::GRAY));
            ui.add_space(6.0);

            submitted = search_bar(ui, &mut self.query);
            ui.checkbox(
                &mut allow,
                "Allow metadata-only playback (previews), off by default",
            );
            ui.add_space(6.0);
        });

        if allow != self.state.allow_metadata_only() {
            self.apply(ctx, Event::SetAllowMetadataOnly(allow));
        }
        if let Some(q) = submitted {
            self.apply(ctx, Event::Submit(q));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.phase() == Phase::Loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Searching…");
                });
            } else if self.state.is_empty() {
                ui.label(RichText::new(IDLE_HINT).color(Color32::GRAY));
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, card) in self.state.cards().iter().enumerate() {
                    let cover = self.covers.get(i).and_then(Option::as_ref);
                    track_card(ui, card, cover);
                    ui.separator();
                }
            });
        });
    }
}

/// Text field plus button. Returns the text when submitted by Enter or click;
/// length checks are left to the caller.
fn search_bar(ui: &mut egui::Ui, text: &mut String) -> Option<String> {
    let mut submitted = None;
    ui.horizontal(|ui| {
        let width = ui.available_width() - 80.0;
        let response = ui.add(
            egui::TextEdit::singleline(text)
                .hint_text("Search tracks (Jamendo, SoundCloud, Audiomack, Internet Archive)")
                .desired_width(width),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Search").clicked() || enter {
            submitted = Some(text.clone());
        }
    });
    submitted
}

fn badge(ui: &mut egui::Ui, text: String, fg: Color32, bg: Color32) {
    ui.label(RichText::new(text).small().color(fg).background_color(bg));
}

fn track_card(ui: &mut egui::Ui, card: &TrackCard, cover: Option<&TextureHandle>) {
    let track = card.track();

    ui.horizontal(|ui| {
        match cover {
            Some(texture) => {
                let size = texture.size_vec2();
                let scale = (COVER_SIZE / size.x).min(COVER_SIZE / size.y);
                ui.image(egui::load::SizedTexture::new(texture.id(), size * scale));
            }
            None => {
                let (rect, _) = ui.allocate_exact_size(
                    egui::vec2(COVER_SIZE, COVER_SIZE),
                    egui::Sense::hover(),
                );
                ui.painter().rect_filled(rect, 4.0, Color32::from_gray(220));
            }
        }

        ui.vertical(|ui| {
            ui.label(RichText::new(&track.title).strong());
            ui.label(RichText::new(track.display_artist()).color(Color32::GRAY));

            if let Some(best) = card.best_source() {
                ui.horizontal_wrapped(|ui| {
                    badge(
                        ui,
                        format!("Source: {}", best.provider_name),
                        Color32::from_rgb(21, 128, 61),
                        Color32::from_rgb(220, 252, 231),
                    );
                    if let Some(license) = &best.license {
                        badge(
                            ui,
                            format!("License: {}", license),
                            Color32::from_rgb(29, 78, 216),
                            Color32::from_rgb(219, 234, 254),
                        );
                    }
                    if best.download_allowed() {
                        badge(
                            ui,
                            "Download allowed".to_string(),
                            Color32::from_rgb(4, 120, 87),
                            Color32::from_rgb(209, 250, 229),
                        );
                    }
                });
            }

            match card.status() {
                StreamStatus::Ready(url) => {
                    ui.horizontal(|ui| {
                        ui.hyperlink_to("▶ Play", url);
                        ui.label(RichText::new(url).small().weak());
                    });
                }
                _ => {
                    ui.label(
                        RichText::new(METADATA_ONLY_NOTICE)
                            .small()
                            .color(Color32::from_rgb(180, 83, 9))
                            .background_color(Color32::from_rgb(255, 251, 235)),
                    );
                }
            }
        });
    });
}
