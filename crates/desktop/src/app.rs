//! Channel Chat Desktop — egui app state and UI.

use eframe::egui;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use lib::config::Config;
use lib::reveal::{visible_prefix, RevealFrame, Revealer};
use lib::session::{ChatSession, Controls, SessionEvent};
use lib::transcript::{Category, Entry, EntryId, Sender};

const LOG_BUFFER_MAX_LINES: usize = 2000;
const REPAINT_WHILE_BUSY: Duration = Duration::from_millis(16);

/// Ring buffer of log lines for the Logs screen. Written by DesktopLogger.
static LOG_LINES: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

fn log_buffer() -> &'static Mutex<VecDeque<String>> {
    LOG_LINES.get_or_init(|| Mutex::new(VecDeque::new()))
}

fn push_log_line(line: String) {
    if let Ok(mut buf) = log_buffer().lock() {
        buf.push_back(line);
        while buf.len() > LOG_BUFFER_MAX_LINES {
            buf.pop_front();
        }
    }
}

/// Logger that appends to LOG_LINES for display in the Logs screen.
struct DesktopLogger;

impl log::Log for DesktopLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Debug
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        let secs = t.as_secs();
        push_log_line(format!(
            "{:02}:{:02}:{:02}.{:03} [{}] {}",
            (secs / 3600) % 24,
            (secs / 60) % 60,
            secs % 60,
            t.subsec_millis(),
            record.level(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

static LOGGER: DesktopLogger = DesktopLogger;

pub fn install_logger() {
    let _ = log_buffer();
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Debug);
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
enum Screen {
    #[default]
    Chat,
    Logs,
}

pub struct ChatApp {
    /// Runs backend requests and reveal tasks off the UI thread.
    runtime: tokio::runtime::Runtime,
    session: ChatSession,
    events: broadcast::Receiver<SessionEvent>,
    revealer: Revealer,
    frames: mpsc::UnboundedReceiver<RevealFrame>,
    /// Local mirror of the transcript, updated from session events.
    entries: Vec<Entry>,
    /// Characters shown so far for entries still being revealed.
    revealing: HashMap<EntryId, usize>,
    controls: Controls,
    /// Operations spawned on the runtime and not yet finished.
    pending: Vec<JoinHandle<()>>,
    channel_input: String,
    message_input: String,
    backend_url: String,
    current_screen: Screen,
}

impl ChatApp {
    /// Load config and build the session. Call after [`install_logger`].
    pub fn load() -> anyhow::Result<Self> {
        let config = match lib::config::load_config(None) {
            Ok((config, _)) => config,
            Err(e) => {
                log::error!("failed to load config, using defaults: {:#}", e);
                Config::default()
            }
        };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let session = ChatSession::from_config(&config)?;
        let interval = if config.reveal.enabled {
            config.reveal.interval()
        } else {
            Duration::ZERO
        };
        let (revealer, frames) = Revealer::new(interval);
        let events = session.subscribe();
        let controls = session.controls();
        log::info!("desktop started");
        Ok(Self {
            runtime,
            session,
            events,
            revealer,
            frames,
            entries: Vec::new(),
            revealing: HashMap::new(),
            controls,
            pending: Vec::new(),
            channel_input: String::new(),
            message_input: String::new(),
            backend_url: lib::config::resolve_backend_url(&config),
            current_screen: Screen::default(),
        })
    }

    fn busy(&self) -> bool {
        !self.pending.is_empty() || !self.revealing.is_empty()
    }

    /// Apply session events and reveal frames. Call each frame.
    fn poll(&mut self) {
        self.pending.retain(|h| !h.is_finished());
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Appended(entry)) => {
                    if entry.sender == Sender::Bot {
                        let _enter = self.runtime.enter();
                        self.revealer.start(entry.id, &entry.text);
                        self.revealing.insert(entry.id, 0);
                    }
                    self.entries.push(entry);
                }
                Ok(SessionEvent::Removed(id)) => {
                    self.entries.retain(|e| e.id != id);
                }
                Ok(SessionEvent::Controls(c)) => self.controls = c,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    log::warn!("ui lagged {} session event(s), resyncing", n);
                    self.entries = self.session.transcript();
                    self.controls = self.session.controls();
                }
                Err(_) => break,
            }
        }
        while let Ok(frame) = self.frames.try_recv() {
            if !self.revealer.accept(&frame) {
                continue;
            }
            if frame.is_done() {
                self.revealing.remove(&frame.entry);
            } else {
                self.revealing.insert(frame.entry, frame.visible);
            }
        }
    }

    fn process_channel(&mut self) {
        let name = self.channel_input.trim().to_string();
        let session = self.session.clone();
        self.pending.push(self.runtime.spawn(async move {
            let _ = session.activate_channel(&name).await;
        }));
    }

    fn send_message(&mut self) {
        let text = self.message_input.trim().to_string();
        if text.is_empty() {
            return;
        }
        self.message_input.clear();
        let session = self.session.clone();
        self.pending.push(self.runtime.spawn(async move {
            let _ = session.send_message(&text).await;
        }));
    }

    fn render_entry(ui: &mut egui::Ui, entry: &Entry, shown: &str) {
        let visuals = ui.style().visuals.clone();
        let fill = match entry.sender {
            Sender::User => visuals.extreme_bg_color,
            _ => visuals.panel_fill,
        };
        let frame = egui::Frame::none()
            .fill(fill)
            .stroke(egui::Stroke::new(
                1.0,
                visuals.widgets.noninteractive.bg_stroke.color,
            ))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(8.0));

        let text = egui::RichText::new(shown);
        let text = match (entry.sender, entry.category) {
            (Sender::User, _) => text.strong(),
            (_, Category::Error) => text.color(visuals.error_fg_color),
            (_, Category::Success) => text.color(egui::Color32::from_rgb(80, 170, 90)),
            (_, Category::Loading) => text.italics().weak(),
            _ => text,
        };
        frame.show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(text);
        });
    }

    fn ui_chat(&mut self, ctx: &egui::Context) {
        let controls = self.controls;

        egui::TopBottomPanel::bottom("message_input").show(ctx, |ui| {
            ui.add_space(8.0);
            let mut send_now = false;
            ui.horizontal(|ui| {
                let width = (ui.available_width() - 80.0).max(120.0);
                let input = ui.add_enabled(
                    controls.message_input_enabled,
                    egui::TextEdit::singleline(&mut self.message_input)
                        .hint_text("Ask about the channel...")
                        .desired_width(width),
                );
                let send_button = ui.add_enabled(
                    controls.message_input_enabled,
                    egui::Button::new("Send"),
                );
                let entered = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                send_now = send_button.clicked() || entered;
            });
            if send_now && controls.message_input_enabled {
                self.send_message();
            }
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            let mut process_now = false;
            ui.horizontal(|ui| {
                ui.label("Channel");
                let input = ui.add_enabled(
                    controls.channel_input_enabled,
                    egui::TextEdit::singleline(&mut self.channel_input).hint_text("Channel name"),
                );
                let entered = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let button = ui.add_enabled(
                    controls.channel_input_enabled,
                    egui::Button::new("Process channel"),
                );
                process_now = button.clicked() || entered;
                if let Some(name) = self.session.channel_name() {
                    ui.label(egui::RichText::new(format!("active: {}", name)).weak());
                }
            });
            if process_now && controls.channel_input_enabled {
                self.process_channel();
            }
            ui.add_space(8.0);
            ui.separator();

            if self.entries.is_empty() {
                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Process a channel to start chatting.").weak());
                });
                return;
            }

            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in &self.entries {
                        let shown = match self.revealing.get(&entry.id) {
                            Some(&n) => visible_prefix(&entry.text, n),
                            None => entry.text.as_str(),
                        };
                        Self::render_entry(ui, entry, shown);
                        ui.add_space(8.0);
                    }
                });
        });
    }

    fn ui_logs(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let lines: Vec<String> = log_buffer()
                .lock()
                .map(|b| b.iter().cloned().collect())
                .unwrap_or_default();
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for line in &lines {
                        ui.monospace(line);
                    }
                    if lines.is_empty() {
                        ui.label("No log output yet.");
                    }
                });
        });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll();

        let current_screen = &mut self.current_screen;
        let backend_url = &self.backend_url;
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading("Channel Chat");
                ui.add_space(16.0);
                if ui
                    .selectable_label(*current_screen == Screen::Chat, "Chat")
                    .clicked()
                {
                    *current_screen = Screen::Chat;
                }
                if ui
                    .selectable_label(*current_screen == Screen::Logs, "Logs")
                    .clicked()
                {
                    *current_screen = Screen::Logs;
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(backend_url.as_str()).weak());
                });
            });
            ui.add_space(8.0);
        });

        match self.current_screen {
            Screen::Chat => self.ui_chat(ctx),
            Screen::Logs => self.ui_logs(ctx),
        }

        if self.busy() {
            ctx.request_repaint_after(REPAINT_WHILE_BUSY);
        }
    }
}
