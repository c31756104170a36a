//! Channel Chat Desktop — application entry.

mod app;

fn main() -> anyhow::Result<()> {
    app::install_logger();
    let chat_app = app::ChatApp::load()?;
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Channel Chat",
        options,
        Box::new(move |_cc| Box::new(chat_app)),
    )
    .map_err(|e| anyhow::anyhow!("desktop exited: {}", e))
}
