//! User interface components for the physical graph template viewer.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main PgtViewerApp
//! - `canvas` - Template drawing, panning, zooming and fit-to-view
//! - `export` - Export controller (JSON / PNG / CWL) and service actions
//! - `download` - The platform "save file" primitive

mod canvas;
mod download;
mod export;
mod state;

#[cfg(test)]
mod tests;

pub use state::PgtViewerApp;

use eframe::egui;

/// Online documentation for the surrounding workflow system.
const DOCS_URL: &str = "https://daliuge.readthedocs.io/";

impl eframe::App for PgtViewerApp {
    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        // Apply results of finished background tasks first so this frame
        // already reflects them.
        self.process_service_events(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui, frame);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.draw_settings_modal(ctx, frame);
        self.draw_alert_modal(ctx);
        self.draw_about_modal(ctx);

        // The settings fields re-sync from storage on every hide transition,
        // after the modal had its chance to close this frame.
        if let Some(storage) = frame.storage() {
            self.sync_settings_fields(storage);
        }
    }
}

impl PgtViewerApp {
    /// Renders the toolbar with template, export and service actions.
    fn draw_toolbar(&mut self, ui: &mut egui::Ui, frame: &eframe::Frame) {
        ui.horizontal(|ui| {
            ui.label("Template:");
            ui.add(
                egui::TextEdit::singleline(&mut self.load_name)
                    .desired_width(160.0)
                    .hint_text("name.graph"),
            );
            if ui.button("Load").clicked() {
                self.load_template(ui.ctx());
            }

            ui.separator();

            let has_template = self.template.is_some();
            ui.add_enabled_ui(has_template, |ui| {
                if ui.button("Export JSON").clicked() {
                    if let Some(name) = self.pgt_name() {
                        self.export_json(ui.ctx(), &name);
                    }
                }
                if ui.button("Export PNG").clicked() {
                    if let Some(name) = self.pgt_name() {
                        self.export_png(ui.ctx(), &name);
                    }
                }
                if ui.button("Export CWL").clicked() {
                    if let Some(name) = self.pgt_name() {
                        self.export_cwl(ui.ctx(), &name);
                    }
                }
            });

            ui.separator();

            ui.add_enabled_ui(has_template, |ui| {
                if ui.button("Generate PG").clicked() {
                    self.generate(ui.ctx(), frame.storage(), false);
                }
                if ui.button("Generate & Deploy").clicked() {
                    self.generate(ui.ctx(), frame.storage(), true);
                }
            });

            ui.separator();

            if ui.button("Zoom to Fit").clicked() {
                self.zoom_to_fit();
            }
            ui.checkbox(&mut self.canvas.show_grid, "Show Grid");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.checkbox(&mut self.dark_mode, "Dark Mode");
                if ui.button("About").clicked() {
                    self.about_open = true;
                }
                if ui.button("Docs").clicked() {
                    ui.ctx().open_url(egui::OpenUrl::new_tab(DOCS_URL));
                }
                if ui.button("Settings").clicked() {
                    self.settings_panel.open = true;
                }
                ui.separator();
                if let Some(name) = self.pgt_name() {
                    ui.label(name);
                } else {
                    ui.label("No template");
                }
            });
        });
    }

    /// Renders the settings modal and persists the triple on Save.
    fn draw_settings_modal(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        if !self.settings_panel.open {
            return;
        }
        let mut save_clicked = false;
        let mut cancel_clicked = false;

        egui::Window::new("Translator Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Manager host");
                        ui.text_edit_singleline(&mut self.settings_panel.host);
                        ui.end_row();

                        ui.label("Manager port");
                        ui.text_edit_singleline(&mut self.settings_panel.port);
                        ui.end_row();

                        ui.label("Manager prefix");
                        ui.text_edit_singleline(&mut self.settings_panel.prefix);
                        ui.end_row();
                    });
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        save_clicked = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel_clicked = true;
                    }
                });
            });

        if save_clicked {
            if let Some(storage) = frame.storage_mut() {
                self.settings_panel.as_settings().save(storage);
            } else {
                log::warn!("no durable storage available; settings not saved");
            }
            self.settings_panel.open = false;
        }
        if cancel_clicked {
            self.settings_panel.open = false;
        }
    }

    /// Renders the blocking error dialog raised by archive-export and deploy
    /// failures.
    fn draw_alert_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        egui::Window::new("Export failed")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.alert = None;
                }
            });
    }

    /// Renders the about dialog.
    fn draw_about_modal(&mut self, ctx: &egui::Context) {
        if !self.about_open {
            return;
        }
        egui::Window::new("About")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!(
                    "Physical Graph Viewer {}",
                    env!("CARGO_PKG_VERSION")
                ));
                ui.label(format!("Service: {}", self.service_url));
                ui.hyperlink_to("Documentation", DOCS_URL);
                if ui.button("Close").clicked() {
                    self.about_open = false;
                }
            });
    }
}
