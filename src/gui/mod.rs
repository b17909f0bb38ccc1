#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(backend: crate::backend::http::HttpBackend, allow_metadata_only: bool) {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };

    let backend = std::sync::Arc::new(backend);
    if let Err(e) = eframe::run_native(
        "Full-Track Music Player",
        options,
        Box::new(move |cc| Ok(Box::new(app::FulltrackApp::new(cc, backend, allow_metadata_only)))),
    ) {
        tracing::error!("window closed with error: {}", e);
    }
}
