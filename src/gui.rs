use crate::form::{FieldBinding, FieldInput};
use crate::paths::{AppSettings, Resources, ServerLayout};
use crate::store::ConfigStore;
use crate::{Session, statics};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::path::{Path, PathBuf};

/// Startup inputs for the window, resolved by the binary from flags and settings.
#[derive(Debug, Clone)]
pub struct GuiOptions {
    /// Base directory given on the command line; takes priority over the saved one.
    pub base_dir: Option<PathBuf>,
    pub resources: Resources,
    pub settings_path: PathBuf,
}

pub fn run_gui(options: GuiOptions) -> eframe::Result {
    let native = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([960.0, 720.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        native,
        Box::new(move |_cc| Ok(Box::new(ConfigApp::new(options)))),
    )
}

/// Window state. The loaded `Session` owns the store and bindings; everything else is UI.
struct ConfigApp {
    options: GuiOptions,
    session: Option<Session>,
    selected_tab: usize,
    status: String,
    last_error: Option<String>,

    warnings: Vec<String>,
    warnings_open: bool,
    files_open: bool,
    about_open: bool,

    // Close handling: the first close request is cancelled and turned into a prompt.
    exit_prompt_open: bool,
    allow_close: bool,

    theme_dark: bool,
}

impl ConfigApp {
    fn new(options: GuiOptions) -> Self {
        let start_dir = options.base_dir.clone().or_else(|| {
            AppSettings::load(&options.settings_path)
                .existing_base_dir()
                .map(Path::to_path_buf)
        });

        let mut app = Self {
            options,
            session: None,
            selected_tab: 0,
            status: String::new(),
            last_error: None,
            warnings: Vec::new(),
            warnings_open: false,
            files_open: false,
            about_open: false,
            exit_prompt_open: false,
            allow_close: false,
            theme_dark: true,
        };
        if let Some(dir) = start_dir {
            app.open_base_dir(&dir);
        }
        app
    }

    fn report_error(&mut self, message: &str, err: &anyhow::Error) {
        tracing::error!(error = %format!("{err:#}"), "{message}");
        self.last_error = Some(format!("{message}: {err:#}"));
    }

    fn open_base_dir(&mut self, dir: &Path) {
        match Session::open(ServerLayout::new(dir), &self.options.resources) {
            Ok((session, warnings)) => {
                self.status = format!("Loaded {}", dir.display());
                self.selected_tab = 0;
                self.session = Some(session);
                self.last_error = None;
                self.warnings_open = !warnings.is_empty();
                self.warnings = warnings;
            }
            Err(e) => self.report_error("Error during startup", &e),
        }
    }

    fn pick_base_dir(&mut self) {
        let mut dlg = rfd::FileDialog::new().set_title(statics::EN_PICK_BASE_DIR_TITLE);
        if let Some(session) = &self.session {
            dlg = dlg.set_directory(&session.layout.base_dir);
        }
        let Some(dir) = dlg.pick_folder() else {
            return;
        };

        let settings = AppSettings {
            base_directory: Some(dir.clone()),
        };
        if let Err(e) = settings.save(&self.options.settings_path) {
            self.report_error("Error saving settings", &e);
        }
        self.open_base_dir(&dir);
    }

    fn preset_dialog(dir: &Path) -> rfd::FileDialog {
        rfd::FileDialog::new()
            .add_filter(statics::EN_FILTER_JSON, &[statics::JSON_EXT])
            .set_directory(dir)
    }

    fn apply_changes(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let report = session.apply();
        if report.is_success() {
            self.status = report.summary().to_string();
            self.last_error = None;
        } else {
            let mut message = report.summary().to_string();
            for line in report.error_lines() {
                message.push('\n');
                message.push_str(&line);
            }
            self.last_error = Some(message);
        }
    }

    fn save_preset(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let presets_dir = session.layout.presets_dir.clone();
        if let Err(e) = std::fs::create_dir_all(&presets_dir) {
            tracing::warn!(dir = %presets_dir.display(), error = %e, "could not create presets dir");
        }

        let Some(mut path) = Self::preset_dialog(&presets_dir).save_file() else {
            return;
        };
        if path.extension().is_none() {
            path.set_extension(statics::JSON_EXT);
        }

        match session.save_preset(&path) {
            Ok(()) => {
                self.status = format!("{} ({})", statics::EN_MSG_PRESET_SAVED, path.display());
                self.last_error = None;
            }
            Err(e) => self.report_error("Error saving template", &e),
        }
    }

    fn load_preset(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(path) = Self::preset_dialog(&session.layout.presets_dir).pick_file() else {
            return;
        };

        match session.load_preset(&path) {
            Ok((replaced, warnings)) => {
                tracing::info!(path = %path.display(), files = replaced.len(), "preset loaded");
                self.status = statics::EN_MSG_PRESET_LOADED.to_string();
                self.last_error = None;
                if !warnings.is_empty() {
                    self.warnings = warnings;
                    self.warnings_open = true;
                }
            }
            Err(e) => self.report_error("Error loading template", &e),
        }
    }

    fn has_unapplied_state(&self) -> bool {
        self.session.as_ref().is_some_and(|s| {
            !s.store.dirty_files().is_empty() || s.form.pending_edits(&s.store) > 0
        })
    }

    /// Label + widget for one field. Returns true when a checkbox was clicked.
    fn render_field(ui: &mut egui::Ui, binding: &mut FieldBinding) -> bool {
        let valid = binding.value().is_ok();
        let label = ui.label(&binding.label);
        if let Some(desc) = &binding.description {
            label.on_hover_text(desc);
        }

        let (response, toggled) = match &mut binding.input {
            FieldInput::Toggle(on) => {
                let resp = ui.checkbox(on, statics::EN_EMPTY);
                let clicked = resp.changed();
                (resp, clicked)
            }
            FieldInput::Text(text) => {
                let mut edit = egui::TextEdit::singleline(text)
                    .desired_width(260.0)
                    .hint_text(binding.field_type.to_string());
                if !valid {
                    edit = edit.text_color(egui::Color32::RED);
                }
                (ui.add(edit), false)
            }
        };

        let hover = match &binding.description {
            Some(desc) => format!("{desc}\n\n{} ({})", binding.key, binding.field_type),
            None => format!("{} ({})", binding.key, binding.field_type),
        };
        response.on_hover_text(hover);
        toggled
    }

    fn render_form(&mut self, ui: &mut egui::Ui, session: &mut Session) {
        if session.form.tabs.is_empty() {
            ui.label(statics::EN_FORM_EMPTY);
            return;
        }
        if self.selected_tab >= session.form.tabs.len() {
            self.selected_tab = 0;
        }

        ui.horizontal_wrapped(|ui| {
            for (i, tab) in session.form.tabs.iter().enumerate() {
                ui.selectable_value(&mut self.selected_tab, i, tab.name.as_str());
            }
        });
        ui.separator();

        let tab_idx = self.selected_tab;
        let mut toggled = Vec::new();
        {
            let crate::form::Form { tabs, fields } = &mut session.form;
            let tab = &tabs[tab_idx];

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if tab.groups.is_empty() {
                        ui.label(statics::EN_TAB_EMPTY);
                    }
                    for group in &tab.groups {
                        egui::CollapsingHeader::new(egui::RichText::new(&group.name).strong())
                            .id_salt((tab_idx, group.name.as_str()))
                            .default_open(true)
                            .show(ui, |ui| {
                                egui::Grid::new((tab_idx, group.name.as_str(), "fields"))
                                    .num_columns(2)
                                    .spacing([12.0, 4.0])
                                    .striped(true)
                                    .show(ui, |ui| {
                                        for &idx in &group.fields {
                                            if Self::render_field(ui, &mut fields[idx]) {
                                                toggled.push(idx);
                                            }
                                            ui.end_row();
                                        }
                                    });
                            });
                    }
                });
        }

        for idx in toggled {
            if let Err(e) = session.form.toggle(idx, &mut session.store) {
                tracing::error!(error = %e, "toggle failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn render_files_window(&mut self, ctx: &egui::Context, session: &Session) {
        let mut open = self.files_open;
        egui::Window::new(statics::EN_WINDOW_FILES)
            .collapsible(false)
            .default_width(520.0)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} {}",
                    statics::EN_LABEL_PENDING_EDITS,
                    session.form.pending_edits(&session.store)
                ));
                ui.separator();

                let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
                TableBuilder::new(ui)
                    .striped(true)
                    .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                    .column(Column::initial(280.0).resizable(true))
                    .column(Column::initial(90.0))
                    .column(Column::remainder())
                    .header(row_h, |mut header| {
                        header.col(|ui| {
                            ui.strong(statics::EN_COL_FILE);
                        });
                        header.col(|ui| {
                            ui.strong(statics::EN_COL_STATUS);
                        });
                        header.col(|ui| {
                            ui.strong(statics::EN_COL_FIELDS);
                        });
                    })
                    .body(|mut body| {
                        for file in &session.required {
                            let status = file_status(&session.store, file);
                            body.row(row_h, |mut row| {
                                row.col(|ui| {
                                    ui.monospace(file);
                                });
                                row.col(|ui| {
                                    if status == statics::EN_STATUS_MISSING {
                                        ui.colored_label(egui::Color32::RED, status);
                                    } else {
                                        ui.label(status);
                                    }
                                });
                                row.col(|ui| {
                                    ui.label(session.form.fields_in(file).to_string());
                                });
                            });
                        }
                    });
            });
        self.files_open = open;
    }

    fn render_exit_prompt(&mut self, ctx: &egui::Context) {
        let mut choice = None;
        egui::Window::new(statics::EN_WINDOW_EXIT)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(statics::EN_EXIT_PROMPT);
                ui.horizontal(|ui| {
                    if ui.button(statics::EN_BTN_YES).clicked() {
                        choice = Some(ExitChoice::Apply);
                    }
                    if ui.button(statics::EN_BTN_NO).clicked() {
                        choice = Some(ExitChoice::Discard);
                    }
                    if ui.button(statics::EN_BTN_CANCEL).clicked() {
                        choice = Some(ExitChoice::Cancel);
                    }
                });
            });

        let Some(choice) = choice else {
            return;
        };
        self.exit_prompt_open = false;
        match choice {
            ExitChoice::Cancel => return,
            ExitChoice::Apply => {
                self.apply_changes();
                // Stay open so a failed apply can be seen and fixed.
                if self.last_error.is_some() {
                    return;
                }
            }
            ExitChoice::Discard => {}
        }
        self.allow_close = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitChoice {
    Apply,
    Discard,
    Cancel,
}

fn file_status(store: &ConfigStore, file: &str) -> &'static str {
    if !store.contains(file) {
        statics::EN_STATUS_MISSING
    } else if store.is_dirty(file) {
        statics::EN_STATUS_MODIFIED
    } else {
        statics::EN_STATUS_LOADED
    }
}

impl eframe::App for ConfigApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested())
            && !self.allow_close
            && self.has_unapplied_state()
        {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.exit_prompt_open = true;
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                let has_session = self.session.is_some();
                if ui
                    .add_enabled(has_session, egui::Button::new(statics::EN_BTN_APPLY))
                    .on_hover_text(statics::EN_TIP_APPLY)
                    .clicked()
                {
                    self.apply_changes();
                }
                if ui
                    .add_enabled(has_session, egui::Button::new(statics::EN_BTN_SAVE_PRESET))
                    .on_hover_text(statics::EN_TIP_SAVE_PRESET)
                    .clicked()
                {
                    self.save_preset();
                }
                if ui
                    .add_enabled(has_session, egui::Button::new(statics::EN_BTN_LOAD_PRESET))
                    .on_hover_text(statics::EN_TIP_LOAD_PRESET)
                    .clicked()
                {
                    self.load_preset();
                }

                ui.separator();
                if ui
                    .add_enabled(has_session, egui::Button::new(statics::EN_BTN_FILES))
                    .clicked()
                {
                    self.files_open = true;
                }
                if ui.button(statics::EN_BTN_CHANGE_FOLDER).clicked() {
                    self.pick_base_dir();
                }
                if ui.button(statics::EN_BTN_ABOUT).clicked() {
                    self.about_open = true;
                }
                if ui.button(statics::EN_BTN_TOGGLE_THEME).clicked() {
                    self.theme_dark = !self.theme_dark;
                    if self.theme_dark {
                        ctx.set_visuals(egui::Visuals::dark());
                    } else {
                        ctx.set_visuals(egui::Visuals::light());
                    }
                }

                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        if let Some(err) = self.last_error.clone() {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                        }
                    });
                });
            });
        }

        if self.about_open {
            let mut open = self.about_open;
            egui::Window::new(statics::EN_WINDOW_ABOUT)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.heading(statics::EN_APP_TITLE);
                    ui.label(format!(
                        "{} {}",
                        statics::EN_ABOUT_VERSION,
                        env!("CARGO_PKG_VERSION")
                    ));
                    ui.separator();
                    ui.label(statics::EN_ABOUT_BODY);
                    if let Some(session) = &self.session {
                        ui.label(format!(
                            "{} {}",
                            statics::EN_LABEL_BASE_DIR,
                            session.layout.base_dir.display()
                        ));
                    }
                });
            self.about_open = open;
        }

        if self.warnings_open {
            let mut open = self.warnings_open;
            let mut dismiss = false;
            egui::Window::new(statics::EN_WINDOW_WARNINGS)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().max_height(320.0).show(ui, |ui| {
                        for warning in &self.warnings {
                            ui.label(warning);
                        }
                    });
                    ui.separator();
                    if ui.button(statics::EN_BTN_CLOSE).clicked() {
                        dismiss = true;
                    }
                });
            self.warnings_open = open && !dismiss;
        }

        if self.exit_prompt_open {
            self.render_exit_prompt(ctx);
        }

        let Some(mut session) = self.session.take() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading(statics::EN_HOME_HEADING);
                ui.label(statics::EN_HOME_INSTRUCTIONS);
                if ui.button(statics::EN_BTN_SELECT_FOLDER).clicked() {
                    self.pick_base_dir();
                }
            });
            return;
        };

        if self.files_open {
            self.render_files_window(ctx, &session);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_form(ui, &mut session);
        });

        self.session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::file_status;
    use crate::statics;
    use crate::store::{ConfigFile, ConfigStore};

    #[test]
    fn file_status_reflects_store_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("core.json");
        std::fs::write(&path, r#"{ "a": 1 }"#).unwrap();

        let mut store = ConfigStore::new();
        store.insert("configs/core.json", ConfigFile::load_path(&path).unwrap());

        assert_eq!(file_status(&store, "configs/bot.json"), statics::EN_STATUS_MISSING);
        assert_eq!(file_status(&store, "configs/core.json"), statics::EN_STATUS_LOADED);

        store
            .set("configs/core.json", "a", crate::ConfigValue::Bool(true))
            .unwrap();
        assert_eq!(file_status(&store, "configs/core.json"), statics::EN_STATUS_MODIFIED);
    }
}
