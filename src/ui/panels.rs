use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use data_sweeper::data::UploadedFile;

use crate::state::{AppState, Entry};

// ---------------------------------------------------------------------------
// Left side panel – uploaded files
// ---------------------------------------------------------------------------

/// Render the batch list. Clicking a file shows it in the central panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Files");
    ui.separator();

    if state.entries.is_empty() {
        ui.label("No files uploaded.");
        return;
    }

    let mut clicked = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (idx, entry) in state.entries.iter().enumerate() {
                let is_active = state.active == Some(idx);
                match entry {
                    Entry::Ready(session) => {
                        let label = format!(
                            "{}  ({:.2} KB)",
                            session.name(),
                            session.loaded.source.size as f64 / 1024.0
                        );
                        if ui.selectable_label(is_active, label).clicked() {
                            clicked = Some(idx);
                        }
                    }
                    Entry::Failed { name, error } => {
                        let text = RichText::new(format!("{name}  ✖")).color(Color32::RED);
                        if ui.selectable_label(is_active, text).on_hover_text(error).clicked() {
                            clicked = Some(idx);
                        }
                    }
                }
            }
        });

    if clicked.is_some() {
        state.active = clicked;
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Upload files…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let ready = state
            .entries
            .iter()
            .filter(|e| matches!(e, Entry::Ready(_)))
            .count();
        if !state.entries.is_empty() {
            ui.label(format!("{ready} of {} files loaded", state.entries.len()));
            if ready == state.entries.len() {
                ui.label(RichText::new("All files processed!").color(Color32::GREEN));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let Some(paths) = rfd::FileDialog::new()
        .set_title("Upload your files (CSV or Excel)")
        .add_filter("Supported files", &["csv", "xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .pick_files()
    else {
        return;
    };

    let mut uploads = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(&path) {
            Ok(bytes) => uploads.push(UploadedFile::new(name, bytes)),
            Err(e) => {
                log::error!("Failed to read {}: {e}", path.display());
                unreadable.push((name, format!("could not read file: {e}")));
            }
        }
    }

    state.set_uploads(uploads, unreadable);
}
