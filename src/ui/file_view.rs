use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use data_sweeper::data::inspect::{ColumnStats, Summary};
use data_sweeper::data::FileFormat;
use data_sweeper::SweeperConfig;

use crate::state::{AppState, Entry, FileSession, Notice, TableViews};
use crate::ui::chart;

// ---------------------------------------------------------------------------
// Central panel – one file at a time
// ---------------------------------------------------------------------------

/// Render the active file, or a hint when nothing is uploaded.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let config = state.config.clone();
    let Some(idx) = state.active else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Upload CSV or Excel files to get started  (File → Upload files…)");
        });
        return;
    };

    match state.active_entry_mut() {
        Some(Entry::Ready(session)) => {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| file_view(ui, session, &config, idx));
        }
        Some(Entry::Failed { name, error }) => {
            ui.heading(format!("Processing: {name}"));
            ui.label(
                RichText::new(format!("An error occurred while processing `{name}`: {error}"))
                    .color(Color32::RED),
            );
        }
        None => {}
    }
}

fn file_view(ui: &mut Ui, session: &mut FileSession, config: &SweeperConfig, salt: usize) {
    ui.heading(format!("Processing: {}", session.name()));
    ui.separator();

    if let Some(views) = session.views() {
        file_info(ui, session.name(), &views.summary);

        ui.add_space(8.0);
        ui.strong("Summary Statistics");
        stats_grid(ui, &views.summary, salt);

        ui.add_space(8.0);
        ui.strong("Preview");
        ui.push_id(("preview", salt), |ui: &mut Ui| preview_grid(ui, views));
        if !views.missing.is_empty() {
            let gaps: Vec<String> = views
                .missing
                .iter()
                .map(|(name, n)| format!("{name}: {n}"))
                .collect();
            ui.label(format!("Missing values: {}", gaps.join(", ")));
        }
    }

    ui.add_space(8.0);
    ui.strong("Data Cleaning Options");
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Remove Duplicates").clicked() {
            session.remove_duplicates();
        }
        if ui.button("Fill Missing Values").clicked() {
            session.fill_missing();
        }
    });

    ui.add_space(8.0);
    ui.strong("Select Columns to Keep");
    column_selector(ui, session);

    ui.add_space(8.0);
    ui.strong("Data Visualization");
    chart::chart_controls(ui, session, salt);
    chart::chart_plot(ui, session, config.chart_height, salt);

    ui.add_space(8.0);
    ui.strong("File Conversion");
    conversion(ui, session);

    if let Some(notice) = &session.notice {
        ui.add_space(4.0);
        match notice {
            Notice::Success(msg) => ui.colored_label(Color32::GREEN, msg),
            Notice::Error(msg) => ui.colored_label(Color32::RED, msg),
        };
    }
}

fn file_info(ui: &mut Ui, name: &str, summary: &Summary) {
    egui::Grid::new(("file_info", name)).show(ui, |ui: &mut Ui| {
        ui.label("File Name:");
        ui.monospace(name);
        ui.end_row();
        ui.label("File Size:");
        ui.monospace(format!("{:.2} KB", summary.size_kib()));
        ui.end_row();
        ui.label("Number of Rows:");
        ui.monospace(summary.row_count.to_string());
        ui.end_row();
        ui.label("Number of Columns:");
        ui.monospace(summary.column_count.to_string());
        ui.end_row();
    });
}

fn stats_grid(ui: &mut Ui, summary: &Summary, salt: usize) {
    if summary.stats.is_empty() {
        ui.label("No numeric columns.");
        return;
    }

    ScrollArea::horizontal()
        .id_salt(("stats", salt))
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new(("stats_grid", salt))
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    for s in &summary.stats {
                        ui.strong(&s.column);
                    }
                    ui.end_row();

                    let rows: [(&str, fn(&ColumnStats) -> f64); 8] = [
                        ("mean", |s| s.mean),
                        ("std", |s| s.std),
                        ("min", |s| s.min),
                        ("25%", |s| s.q25),
                        ("50%", |s| s.median),
                        ("75%", |s| s.q75),
                        ("max", |s| s.max),
                        ("count", |s| s.count as f64),
                    ];
                    for (label, field) in rows {
                        ui.label(label);
                        for s in &summary.stats {
                            let v = field(s);
                            ui.monospace(if v.is_nan() {
                                "NaN".to_string()
                            } else {
                                format!("{v:.4}")
                            });
                        }
                        ui.end_row();
                    }
                });
        });
}

/// Read-only grid of the cached preview rows.
fn preview_grid(ui: &mut Ui, views: &TableViews) {
    if views.preview_names.is_empty() {
        ui.label("(no columns)");
        return;
    }
    let rows = views.preview_cells.first().map_or(0, Vec::len);

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .columns(TableColumn::auto().at_least(60.0), views.preview_names.len())
            .header(20.0, |mut header| {
                for name in &views.preview_names {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|mut body| {
                for row in 0..rows {
                    body.row(18.0, |mut table_row| {
                        for cells in &views.preview_cells {
                            table_row.col(|ui: &mut Ui| {
                                ui.label(cells[row].to_string());
                            });
                        }
                    });
                }
            });
    });
}

fn column_selector(ui: &mut Ui, session: &mut FileSession) {
    let all = session.loaded.table.column_names();
    let mut toggled = None;
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for col in &all {
            let mut checked = session.selected.contains(col);
            if ui.checkbox(&mut checked, col).changed() {
                toggled = Some(col.clone());
            }
        }
    });
    if let Some(col) = toggled {
        session.toggle_column(&col);
    }
    ui.label(format!("Keeping: {}", session.selected.join(", ")));
}

fn conversion(ui: &mut Ui, session: &mut FileSession) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("Convert `{}` to:", session.name()));
        for format in FileFormat::ALL {
            if ui
                .radio_value(&mut session.export_target, format, format.label())
                .changed()
            {
                session.last_export = None;
            }
        }
    });

    let label = format!("Convert `{}` to {}", session.name(), session.export_target);
    if ui.button(label).clicked() {
        session.convert();
    }

    let Some(buffer) = &session.last_export else {
        return;
    };
    let file_name = buffer.file_name.clone();
    let format = session.export_target;
    if ui.button(format!("Download `{file_name}`")).clicked() {
        let target = rfd::FileDialog::new()
            .set_title("Save converted file")
            .set_file_name(&file_name)
            .add_filter(format.label(), &[format.extension()])
            .save_file();
        if let Some(path) = target {
            if let Err(e) = session.save_export(&path) {
                log::error!("Failed to save {}: {e:#}", path.display());
                session.notice = Some(Notice::Error(format!("Error: {e:#}")));
            }
        }
    }
}
