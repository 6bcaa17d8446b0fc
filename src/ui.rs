use std::path::{Path, PathBuf};
use std::time::Duration;

use eframe::egui;
use tracing::{error, warn};

use crate::app::AppState;

#[cfg(windows)]
pub const EXPECTED_EXECUTABLE: &str = "vrx.exe";
#[cfg(not(windows))]
pub const EXPECTED_EXECUTABLE: &str = "vrx";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Contents of the modal "add feed" window.
#[derive(Debug, Default)]
struct AddFeedDialog {
    name: String,
    url: String,
    error: Option<String>,
}

enum DialogAction {
    None,
    Accept,
    Cancel,
}

pub struct VroidRssApp {
    state: AppState,
    dialog: Option<AddFeedDialog>,
    last_picked: Option<PathBuf>,
}

impl VroidRssApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            dialog: None,
            last_picked: None,
        }
    }

    fn pick_executable(&mut self) {
        let mut picker =
            rfd::FileDialog::new().set_title(format!("Select {}", EXPECTED_EXECUTABLE));
        if cfg!(windows) {
            picker = picker.add_filter(EXPECTED_EXECUTABLE, &["exe"]);
        }
        if let Some(dir) = self.last_picked.as_deref().and_then(Path::parent) {
            picker = picker.set_directory(dir);
        }

        let Some(path) = picker.pick_file() else {
            return;
        };
        if !is_expected_executable(&path) {
            warn!("Rejected executable {}", path.display());
            self.state
                .push_log(format!("{} is not {}.", path.display(), EXPECTED_EXECUTABLE));
            return;
        }

        self.state.set_executable_path(path.display().to_string());
        self.last_picked = Some(path);
    }

    fn save(&mut self) {
        if let Err(e) = self.state.save() {
            error!("Saving config failed: {}", e);
            self.state.push_log(format!("save fail {}.", e));
        }
    }

    fn play(&mut self) {
        if let Err(e) = self.state.start_play() {
            warn!("Play request rejected: {}", e);
            self.state.push_log(e.to_string());
        }
    }

    fn form(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("feed_row")
            .num_columns(3)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("RSS feed");
                let selected_name = self
                    .state
                    .selected_feed()
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                let mut selected = self.state.selected_index();
                egui::ComboBox::from_id_salt("feed_combo")
                    .selected_text(selected_name)
                    .width(280.0)
                    .show_ui(ui, |ui| {
                        for (i, feed) in self.state.feeds().iter().enumerate() {
                            ui.selectable_value(&mut selected, i, feed.name.as_str())
                                .on_hover_text(feed.url.as_str());
                        }
                    });
                self.state.select(selected);
                if ui.button("Add").clicked() {
                    self.dialog = Some(AddFeedDialog::default());
                }
                ui.end_row();

                ui.label(format!("{} path", EXPECTED_EXECUTABLE));
                ui.add(
                    egui::TextEdit::singleline(self.state.executable_path_mut())
                        .desired_width(280.0),
                );
                if ui.button("Open…").clicked() {
                    self.pick_executable();
                }
                ui.end_row();
            });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save();
            }
            if ui.button("Fetch & Play").clicked() {
                self.play();
            }
        });
    }

    fn log_area(&self, ui: &mut egui::Ui) {
        let mut text = self.state.log_text();
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut text)
                        .interactive(false)
                        .desired_width(f32::INFINITY)
                        .desired_rows(12),
                );
            });
    }

    fn dialog_window(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };

        let mut action = DialogAction::None;
        egui::Window::new("Add RSS feed")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .min_width(300.0)
            .show(ctx, |ui| {
                egui::Grid::new("add_feed_grid")
                    .num_columns(2)
                    .show(ui, |ui| {
                        ui.label("Title:");
                        ui.text_edit_singleline(&mut dialog.name);
                        ui.end_row();
                        ui.label("URL:");
                        ui.text_edit_singleline(&mut dialog.url);
                        ui.end_row();
                    });
                if let Some(err) = &dialog.error {
                    ui.colored_label(ui.visuals().error_fg_color, err.as_str());
                }
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        action = DialogAction::Accept;
                    }
                    if ui.button("Cancel").clicked() {
                        action = DialogAction::Cancel;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            action = DialogAction::Cancel;
        }

        match action {
            DialogAction::None => {}
            DialogAction::Cancel => self.dialog = None,
            DialogAction::Accept => {
                let (name, url) = (dialog.name.clone(), dialog.url.clone());
                match self.state.add_feed(&name, &url) {
                    Ok(_) => self.dialog = None,
                    Err(e) => {
                        if let Some(dialog) = self.dialog.as_mut() {
                            dialog.error = Some(e.to_string());
                        }
                    }
                }
            }
        }
    }
}

impl eframe::App for VroidRssApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }

        let enabled = !self.state.is_playing() && self.dialog.is_none();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| self.form(ui));
            ui.separator();
            self.log_area(ui);
        });

        self.dialog_window(ctx);
    }
}

fn is_expected_executable(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(EXPECTED_EXECUTABLE))
}

/// Open the main window and block until it closes.
pub fn run(state: AppState) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("VoiroRSS")
            .with_inner_size([560.0, 420.0])
            .with_min_inner_size([500.0, 75.0]),
        ..Default::default()
    };

    eframe::run_native(
        "VoiroRSS",
        options,
        Box::new(|_cc| Ok(Box::new(VroidRssApp::new(state)))),
    )
}
