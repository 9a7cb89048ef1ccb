use std::path::Path;

use anyhow::{Context, Result};

use data_sweeper::data::chart::{build_chart, Chart, ChartKind, ChartRequest};
use data_sweeper::data::clean::{fill_missing_numeric, remove_duplicates};
use data_sweeper::data::export::{ConversionRequest, ExportBuffer};
use data_sweeper::data::inspect::{missing_counts, preview, summarize, Summary};
use data_sweeper::data::loader::load_batch;
use data_sweeper::data::select::select_columns;
use data_sweeper::data::{CellValue, FileFormat, LoadedTable, Table, UploadedFile};
use data_sweeper::SweeperConfig;

// ---------------------------------------------------------------------------
// Per-file processing context
// ---------------------------------------------------------------------------

/// Feedback shown under the control that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Chart controls of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub kind: ChartKind,
    /// Columns for bar and line charts, in pick order.
    pub columns: Vec<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub histogram: Option<String>,
}

impl ChartSettings {
    fn new(columns: &[String]) -> Self {
        Self {
            kind: ChartKind::Bar,
            columns: Vec::new(),
            x: columns.first().cloned(),
            y: columns.first().cloned(),
            histogram: columns.first().cloned(),
        }
    }

    /// The request for the current kind, or `None` while inputs are missing.
    pub fn request(&self) -> Option<ChartRequest> {
        match self.kind {
            ChartKind::Bar | ChartKind::Line if self.columns.is_empty() => None,
            ChartKind::Bar => Some(ChartRequest::Bar {
                columns: self.columns.clone(),
            }),
            ChartKind::Line => Some(ChartRequest::Line {
                columns: self.columns.clone(),
            }),
            ChartKind::Scatter => Some(ChartRequest::Scatter {
                x: self.x.clone()?,
                y: self.y.clone()?,
            }),
            ChartKind::Histogram => Some(ChartRequest::Histogram {
                column: self.histogram.clone()?,
            }),
        }
    }

    /// Forget any column that is no longer selected.
    fn retain(&mut self, selected: &[String]) {
        let keep = |c: &Option<String>| c.clone().filter(|c| selected.contains(c));
        self.columns.retain(|c| selected.contains(c));
        self.x = keep(&self.x).or_else(|| selected.first().cloned());
        self.y = keep(&self.y).or_else(|| selected.first().cloned());
        self.histogram = keep(&self.histogram).or_else(|| selected.first().cloned());
    }
}

/// What the file view shows about the working table. Rebuilt only when the
/// table changes.
#[derive(Debug, Clone)]
pub struct TableViews {
    pub summary: Summary,
    pub preview_names: Vec<String>,
    /// Preview cells, one `Vec` per column.
    pub preview_cells: Vec<Vec<CellValue>>,
    /// Columns with at least one missing cell.
    pub missing: Vec<(String, usize)>,
}

impl TableViews {
    fn build(loaded: &LoadedTable, preview_rows: usize) -> data_sweeper::Result<Self> {
        let head = preview(&loaded.table, preview_rows);
        Ok(Self {
            summary: summarize(loaded)?,
            preview_names: head.column_names(),
            preview_cells: head.cells()?,
            missing: missing_counts(&loaded.table)
                .into_iter()
                .filter(|(_, n)| *n > 0)
                .collect(),
        })
    }
}

/// Chart data built for one set of controls.
struct PlottedChart {
    settings: ChartSettings,
    chart: Option<std::result::Result<Chart, String>>,
}

/// Everything the UI keeps about one uploaded file.
///
/// Each upload owns its table exclusively; nothing is shared between files.
pub struct FileSession {
    pub loaded: LoadedTable,
    /// Columns to keep, in the order the user picked them.
    pub selected: Vec<String>,
    pub chart: ChartSettings,
    pub export_target: FileFormat,
    pub last_export: Option<ExportBuffer>,
    pub notice: Option<Notice>,
    preview_rows: usize,
    views: Option<TableViews>,
    plotted: Option<PlottedChart>,
}

impl FileSession {
    pub fn new(loaded: LoadedTable, config: &SweeperConfig) -> Self {
        let selected = loaded.table.column_names();
        let export_target = config.export_target(loaded.source.format);
        let mut session = Self {
            chart: ChartSettings::new(&selected),
            selected,
            export_target,
            last_export: None,
            notice: None,
            preview_rows: config.preview_rows,
            views: None,
            plotted: None,
            loaded,
        };
        session.refresh();
        session
    }

    pub fn name(&self) -> &str {
        &self.loaded.source.name
    }

    /// Cached summary, preview and missing counts; `None` if they could not
    /// be computed.
    pub fn views(&self) -> Option<&TableViews> {
        self.views.as_ref()
    }

    /// Recompute every cached view after the table or selection changed.
    fn refresh(&mut self) {
        self.last_export = None;
        self.plotted = None;
        match TableViews::build(&self.loaded, self.preview_rows) {
            Ok(views) => self.views = Some(views),
            Err(e) => {
                log::error!("Summarizing `{}` failed: {e}", self.name());
                self.notice = Some(Notice::Error(format!("Error: {e}")));
                self.views = None;
            }
        }
    }

    pub fn remove_duplicates(&mut self) {
        match remove_duplicates(&mut self.loaded.table) {
            Ok(removed) => {
                self.notice = Some(Notice::Success(format!(
                    "Duplicates removed! ({removed} rows dropped)"
                )));
            }
            Err(e) => {
                log::error!("Removing duplicates from `{}` failed: {e}", self.name());
                self.notice = Some(Notice::Error(format!("Error: {e}")));
            }
        }
        self.refresh();
    }

    pub fn fill_missing(&mut self) {
        match fill_missing_numeric(&mut self.loaded.table) {
            Ok(filled) => {
                self.notice = Some(Notice::Success(format!(
                    "Missing values filled! ({filled} cells)"
                )));
            }
            Err(e) => {
                log::error!("Filling missing values of `{}` failed: {e}", self.name());
                self.notice = Some(Notice::Error(format!("Error: {e}")));
            }
        }
        self.refresh();
    }

    /// Add or drop a column from the selection. Newly added columns go last.
    pub fn toggle_column(&mut self, name: &str) {
        if let Some(pos) = self.selected.iter().position(|c| c == name) {
            self.selected.remove(pos);
        } else {
            self.selected.push(name.to_string());
        }
        self.chart.retain(&self.selected);
        self.last_export = None;
        self.plotted = None;
    }

    /// The table restricted to the selected columns.
    pub fn selected_table(&self) -> data_sweeper::Result<Table> {
        select_columns(&self.loaded.table, &self.selected)
    }

    /// Chart data for the current controls; `None` until enough inputs are
    /// chosen. Rebuilt only when the controls or the data changed.
    pub fn chart(&mut self) -> Option<&std::result::Result<Chart, String>> {
        let stale = self
            .plotted
            .as_ref()
            .map_or(true, |p| p.settings != self.chart);
        if stale {
            let chart = self.chart.request().map(|request| {
                self.selected_table()
                    .and_then(|t| build_chart(&t, &request))
                    .map_err(|e| e.to_string())
            });
            self.plotted = Some(PlottedChart {
                settings: self.chart.clone(),
                chart,
            });
        }
        self.plotted.as_ref().and_then(|p| p.chart.as_ref())
    }

    /// Serialize the selected columns into the chosen target format.
    pub fn convert(&mut self) {
        let outcome = self.selected_table().and_then(|table| {
            ConversionRequest {
                table: &table,
                target: self.export_target,
                source_name: &self.loaded.source.name,
            }
            .execute()
        });

        match outcome {
            Ok(buffer) => {
                self.notice = Some(Notice::Success(format!(
                    "File converted to {} and ready for download!",
                    self.export_target
                )));
                self.last_export = Some(buffer);
            }
            Err(e) => {
                log::error!("Conversion of `{}` failed: {e}", self.name());
                self.notice = Some(Notice::Error(format!("Error: {e}")));
                self.last_export = None;
            }
        }
    }

    /// Write the last converted buffer to `path`.
    pub fn save_export(&mut self, path: &Path) -> Result<()> {
        let buffer = self
            .last_export
            .as_ref()
            .context("nothing has been converted yet")?;
        std::fs::write(path, buffer.bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Saved `{}` to {}", buffer.file_name, path.display());
        self.notice = Some(Notice::Success(format!("Saved {}", path.display())));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One row of the batch: a usable session or the reason the file was skipped.
pub enum Entry {
    Ready(FileSession),
    Failed { name: String, error: String },
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    pub config: SweeperConfig,
    /// Files of the current batch, in upload order.
    pub entries: Vec<Entry>,
    /// Index into `entries` of the file shown in the central panel.
    pub active: Option<usize>,
    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: SweeperConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the batch with `files` plus the `(name, error)` pairs of files
    /// that could not be read from disk. Every file is processed on its own;
    /// failures become `Entry::Failed` and the rest still load.
    pub fn set_uploads(&mut self, files: Vec<UploadedFile>, unreadable: Vec<(String, String)>) {
        let options = self.config.loader_options();
        let outcomes = load_batch(&files, &options);

        self.entries = files
            .iter()
            .zip(outcomes)
            .map(|(file, outcome)| match outcome {
                Ok(loaded) => Entry::Ready(FileSession::new(loaded, &self.config)),
                Err(e) => Entry::Failed {
                    name: file.name.clone(),
                    error: e.to_string(),
                },
            })
            .chain(
                unreadable
                    .into_iter()
                    .map(|(name, error)| Entry::Failed { name, error }),
            )
            .collect();

        let failed = self
            .entries
            .iter()
            .filter(|e| matches!(e, Entry::Failed { .. }))
            .count();
        let total = self.entries.len();
        self.status_message = (failed > 0).then(|| format!("{failed} of {total} files failed"));
        self.active = (!self.entries.is_empty()).then_some(0);
    }

    pub fn active_entry_mut(&mut self) -> Option<&mut Entry> {
        self.entries.get_mut(self.active?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_sweeper::data::loader::{load, LoaderOptions};

    fn upload(name: &str, text: &str) -> UploadedFile {
        UploadedFile::new(name, text.as_bytes().to_vec())
    }

    fn session(text: &str) -> FileSession {
        let mut state = AppState::default();
        state.set_uploads(vec![upload("a.csv", text)], Vec::new());
        match state.entries.pop() {
            Some(Entry::Ready(session)) => session,
            _ => panic!("expected a loaded file"),
        }
    }

    #[test]
    fn batch_keeps_going_after_a_bad_file() {
        let mut state = AppState::default();
        state.set_uploads(
            vec![upload("data.txt", "a\n1\n"), upload("good.csv", "a\n1\n")],
            Vec::new(),
        );
        assert!(matches!(&state.entries[0], Entry::Failed { error, .. } if error.contains(".txt")));
        assert!(matches!(&state.entries[1], Entry::Ready(_)));
        assert_eq!(state.status_message.as_deref(), Some("1 of 2 files failed"));
        assert_eq!(state.active, Some(0));
    }

    #[test]
    fn unreadable_files_count_as_failures() {
        let mut state = AppState::default();
        state.set_uploads(
            vec![upload("good.csv", "a\n1\n")],
            vec![("gone.csv".into(), "permission denied".into())],
        );
        assert_eq!(state.entries.len(), 2);
        assert!(matches!(&state.entries[1], Entry::Failed { name, .. } if name == "gone.csv"));
        assert_eq!(state.status_message.as_deref(), Some("1 of 2 files failed"));
    }

    #[test]
    fn views_follow_cleaning() {
        let mut s = session("x,y\n1,\n1,\n2,4\n");
        let views = s.views().unwrap();
        assert_eq!(views.summary.row_count, 3);
        assert_eq!(views.missing, vec![("y".to_string(), 2)]);
        assert_eq!(views.preview_names, vec!["x", "y"]);

        s.remove_duplicates();
        assert_eq!(s.views().unwrap().summary.row_count, 2);
        s.fill_missing();
        assert!(s.views().unwrap().missing.is_empty());
    }

    #[test]
    fn preview_holds_only_the_configured_rows() {
        let rows: String = (0..20).map(|i| format!("{i}\n")).collect();
        let s = session(&format!("n\n{rows}"));
        let views = s.views().unwrap();
        assert_eq!(views.preview_cells[0].len(), SweeperConfig::default().preview_rows);
        assert_eq!(views.summary.row_count, 20);
    }

    #[test]
    fn chart_is_reused_until_inputs_change() {
        let mut s = session("A,B\n1,2\n");
        s.chart.columns = vec!["A".into()];
        assert!(matches!(s.chart(), Some(Ok(Chart::Bars(b))) if b[0].points.len() == 1));

        // A table swapped in behind the session's back is not picked up...
        let bigger = upload("a.csv", "A,B\n1,2\n3,4\n");
        s.loaded.table = load(&bigger, &LoaderOptions::default()).unwrap().table;
        assert!(matches!(s.chart(), Some(Ok(Chart::Bars(b))) if b[0].points.len() == 1));

        // ...until the controls change.
        s.chart.kind = ChartKind::Line;
        assert!(matches!(s.chart(), Some(Ok(Chart::Lines(l))) if l[0].points.len() == 2));
    }

    #[test]
    fn selection_order_follows_picks() {
        let mut s = session("A,B,C\n1,2,3\n");
        s.toggle_column("A");
        s.toggle_column("B");
        s.toggle_column("A");
        assert_eq!(s.selected, vec!["C", "A"]);
        assert_eq!(s.selected_table().unwrap().column_names(), vec!["C", "A"]);
    }

    #[test]
    fn cleaning_then_conversion() {
        let mut s = session("x,y\n1,\n1,\n2,4\n");
        s.remove_duplicates();
        s.fill_missing();
        assert_eq!(s.loaded.table.row_count(), 2);
        assert_eq!(s.loaded.table.values("y").unwrap()[0], CellValue::Float(4.0));

        assert_eq!(s.export_target, FileFormat::Xlsx);
        s.export_target = FileFormat::Csv;
        s.convert();
        let buffer = s.last_export.as_ref().unwrap();
        assert_eq!(buffer.file_name, "a.csv");
        assert_eq!(buffer.bytes(), b"x,y\n1,4.0\n2,4.0\n");
    }

    #[test]
    fn deselected_columns_leave_the_chart() {
        let mut s = session("A,B\n1,2\n");
        s.chart.kind = ChartKind::Line;
        s.chart.columns = vec!["A".into(), "B".into()];
        s.toggle_column("A");
        assert_eq!(s.chart.columns, vec!["B"]);
        assert_eq!(s.chart.histogram.as_deref(), Some("B"));
        assert!(matches!(s.chart(), Some(Ok(Chart::Lines(_)))));
    }

    #[test]
    fn save_writes_the_converted_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session("a\n1\n");
        assert!(s.save_export(&dir.path().join("x.csv")).is_err());

        s.export_target = FileFormat::Csv;
        s.convert();
        let path = dir.path().join("a.csv");
        s.save_export(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"a\n1\n");
    }
}
