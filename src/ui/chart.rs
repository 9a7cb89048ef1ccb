use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use data_sweeper::data::chart::{Chart, ChartKind, Series};

use crate::color::series_color;
use crate::state::FileSession;

// ---------------------------------------------------------------------------
// Chart controls
// ---------------------------------------------------------------------------

/// Chart-type selector plus the column pickers that kind needs.
pub fn chart_controls(ui: &mut Ui, session: &mut FileSession, salt: usize) {
    let columns = session.selected.clone();
    let settings = &mut session.chart;

    egui::ComboBox::from_id_salt(("chart_kind", salt))
        .selected_text(settings.kind.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                ui.selectable_value(&mut settings.kind, kind, kind.to_string());
            }
        });

    match settings.kind {
        ChartKind::Bar | ChartKind::Line => {
            ui.label(format!(
                "Select columns for the {}:",
                settings.kind.to_string().to_lowercase()
            ));
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for col in &columns {
                    let mut checked = settings.columns.contains(col);
                    if ui.checkbox(&mut checked, col).changed() {
                        if checked {
                            settings.columns.push(col.clone());
                        } else {
                            settings.columns.retain(|c| c != col);
                        }
                    }
                }
            });
        }
        ChartKind::Scatter => {
            column_picker(ui, ("scatter_x", salt), "Select X-axis:", &columns, &mut settings.x);
            column_picker(ui, ("scatter_y", salt), "Select Y-axis:", &columns, &mut settings.y);
        }
        ChartKind::Histogram => {
            column_picker(
                ui,
                ("histogram", salt),
                "Select a column for the histogram:",
                &columns,
                &mut settings.histogram,
            );
        }
    }
}

fn column_picker(
    ui: &mut Ui,
    id: impl std::hash::Hash,
    label: &str,
    columns: &[String],
    current: &mut Option<String>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(current.clone().unwrap_or_default())
            .show_ui(ui, |ui: &mut Ui| {
                for col in columns {
                    ui.selectable_value(current, Some(col.clone()), col);
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Chart rendering
// ---------------------------------------------------------------------------

/// Draw the chart for the current controls, or say why there is none.
pub fn chart_plot(ui: &mut Ui, session: &mut FileSession, height: f32, salt: usize) {
    let chart = match session.chart() {
        None => return,
        Some(Ok(chart)) => chart,
        Some(Err(e)) => {
            ui.label(RichText::new(format!("Cannot draw chart: {e}")).color(Color32::RED));
            return;
        }
    };

    let plot = Plot::new(("chart", salt))
        .legend(Legend::default())
        .height(height)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true);

    match chart {
        Chart::Bars(series) => {
            let count = series.len();
            let width = 0.8 / count.max(1) as f64;
            plot.show(ui, |plot_ui| {
                for (i, s) in series.iter().enumerate() {
                    let offset = (i as f64 - (count as f64 - 1.0) / 2.0) * width;
                    let bars = s
                        .points
                        .iter()
                        .map(|[x, y]| Bar::new(x + offset, *y).width(width))
                        .collect();
                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .name(&s.name)
                            .color(series_color(i, count)),
                    );
                }
            });
        }
        Chart::Lines(series) => {
            let count = series.len();
            plot.show(ui, |plot_ui| {
                for (i, s) in series.iter().enumerate() {
                    plot_ui.line(
                        Line::new(plot_points(s))
                            .name(&s.name)
                            .color(series_color(i, count))
                            .width(1.5),
                    );
                }
            });
        }
        Chart::Scatter(series) => {
            plot.show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(plot_points(series))
                        .name(&series.name)
                        .color(series_color(0, 1))
                        .radius(3.0),
                );
            });
        }
        Chart::Histogram { column, counts } => {
            let labels: Vec<String> = counts.iter().map(|(value, _)| value.clone()).collect();
            let bars = counts
                .iter()
                .enumerate()
                .map(|(i, (value, n))| Bar::new(i as f64, *n as f64).name(value).width(0.8))
                .collect();
            plot.x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < f64::EPSILON && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(column).color(series_color(0, 1)));
            });
        }
    }
}

fn plot_points(series: &Series) -> PlotPoints {
    series.points.iter().copied().collect()
}
