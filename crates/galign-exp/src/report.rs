//! Text and CSV renderings of score cubes and sweep grids.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use csv::WriterBuilder;
use galign_core::errors::{AlignError, ErrorInfo};

use crate::experiment::DataCube;

/// Digits after the decimal point in every rendered score.
pub const PRECISION_DECIMALS: usize = 3;

/// Rendering of a cell without a value.
pub const UNRESOLVED: &str = "NA";

/// Formats a score at [`PRECISION_DECIMALS`].
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.*}", PRECISION_DECIMALS, value),
        None => UNRESOLVED.to_string(),
    }
}

fn format_rank(rank: Option<f64>) -> String {
    match rank {
        Some(rank) => format!("{}", rank.round() as u64),
        None => UNRESOLVED.to_string(),
    }
}

/// Two dimensional table of optional scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGrid {
    /// Header of the label column.
    pub corner: String,
    /// Row labels.
    pub rows: Vec<String>,
    /// Column labels.
    pub columns: Vec<String>,
    /// Values indexed `[row][column]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl ScoreGrid {
    /// Grid with every cell unresolved.
    pub fn new(corner: impl Into<String>, rows: Vec<String>, columns: Vec<String>) -> Self {
        let values = vec![vec![None; columns.len()]; rows.len()];
        Self {
            corner: corner.into(),
            rows,
            columns,
            values,
        }
    }

    fn header(&self) -> Vec<String> {
        std::iter::once(self.corner.clone())
            .chain(self.columns.iter().cloned())
            .collect()
    }
}

fn push_line(out: &mut String, cells: &[String]) {
    let _ = writeln!(out, "{}", cells.join("\t"));
}

/// Tab separated text rendering of a grid.
pub fn render_grid_text(title: &str, grid: &ScoreGrid) -> String {
    let mut out = String::new();
    if !title.is_empty() {
        let _ = writeln!(out, "# {title}");
    }
    push_line(&mut out, &grid.header());
    for (label, row) in grid.rows.iter().zip(&grid.values) {
        let cells: Vec<String> = std::iter::once(label.clone())
            .chain(row.iter().map(|value| format_value(*value)))
            .collect();
        push_line(&mut out, &cells);
    }
    out
}

/// Text report of a cube: per measure a score block, a rank block and the
/// mean rank of each method.
pub fn render_cube_text(name: &str, cube: &DataCube) -> String {
    let ranked = cube.rankings();
    let mut out = String::new();
    if !name.is_empty() {
        let _ = writeln!(out, "# experiment {name}");
    }
    let header: Vec<String> = std::iter::once("pair".to_string())
        .chain(cube.methods().iter().cloned())
        .collect();
    for (mi, measure) in cube.measures().iter().enumerate() {
        let _ = writeln!(out, "== {measure}: scores ==");
        push_line(&mut out, &header);
        for (pi, pair) in cube.pairs().iter().enumerate() {
            let cells: Vec<String> = std::iter::once(pair.label())
                .chain(cube.row(mi, pi).into_iter().map(format_value))
                .collect();
            push_line(&mut out, &cells);
        }
        let _ = writeln!(out, "== {measure}: ranks ==");
        push_line(&mut out, &header);
        for (pi, pair) in cube.pairs().iter().enumerate() {
            let cells: Vec<String> = std::iter::once(pair.label())
                .chain(ranked.row(mi, pi).into_iter().map(format_rank))
                .collect();
            push_line(&mut out, &cells);
        }
        let means: Vec<String> = std::iter::once("mean rank".to_string())
            .chain(cube.mean_ranks(mi).into_iter().map(format_value))
            .collect();
        push_line(&mut out, &means);
        out.push('\n');
    }
    out
}

fn ensure_parent(path: &Path) -> Result<(), AlignError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                AlignError::Io(
                    ErrorInfo::new("report-create-dir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
    }
    Ok(())
}

/// Writes a rendered report, creating parent directories.
pub fn write_report(path: &Path, text: &str) -> Result<(), AlignError> {
    ensure_parent(path)?;
    fs::write(path, text).map_err(|err| {
        AlignError::Io(
            ErrorInfo::new("report-write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> AlignError {
    AlignError::Serde(
        ErrorInfo::new(code, "CSV report failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

fn write_rows(path: &Path, rows: Vec<Vec<String>>) -> Result<(), AlignError> {
    ensure_parent(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| wrap_csv("report-csv-open", path, err))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|err| wrap_csv("report-csv-row", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_csv("report-csv-flush", path, err.into()))
}

/// CSV rows of a cube: `measure,block,pair,<methods...>` with one score row
/// and one rank row per (measure, pair).
pub fn cube_csv_rows(cube: &DataCube) -> Vec<Vec<String>> {
    let ranked = cube.rankings();
    let mut rows = Vec::with_capacity(1 + 2 * cube.measures().len() * cube.pairs().len());
    rows.push(
        ["measure", "block", "pair"]
            .iter()
            .map(|cell| cell.to_string())
            .chain(cube.methods().iter().cloned())
            .collect(),
    );
    for (mi, measure) in cube.measures().iter().enumerate() {
        for (pi, pair) in cube.pairs().iter().enumerate() {
            let label = [measure.clone(), "score".to_string(), pair.label()];
            rows.push(
                label
                    .into_iter()
                    .chain(cube.row(mi, pi).into_iter().map(format_value))
                    .collect(),
            );
        }
        for (pi, pair) in cube.pairs().iter().enumerate() {
            let label = [measure.clone(), "rank".to_string(), pair.label()];
            rows.push(
                label
                    .into_iter()
                    .chain(ranked.row(mi, pi).into_iter().map(format_rank))
                    .collect(),
            );
        }
    }
    rows
}

/// Writes the cube CSV report.
pub fn write_cube_csv(path: &Path, cube: &DataCube) -> Result<(), AlignError> {
    write_rows(path, cube_csv_rows(cube))
}

/// Writes a grid as CSV with the same layout as its text rendering.
pub fn write_grid_csv(path: &Path, grid: &ScoreGrid) -> Result<(), AlignError> {
    let mut rows = Vec::with_capacity(grid.rows.len() + 1);
    rows.push(grid.header());
    for (label, row) in grid.rows.iter().zip(&grid.values) {
        rows.push(
            std::iter::once(label.clone())
                .chain(row.iter().map(|value| format_value(*value)))
                .collect(),
        );
    }
    write_rows(path, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use galign_core::NetworkPair;

    fn cube() -> DataCube {
        let mut cube = DataCube::new(
            vec!["nc".into()],
            vec!["A".into(), "B".into(), "C".into()],
            vec![NetworkPair::new("yeast", "human")],
        );
        cube.set(0, 0, 0, 0.8);
        cube.set(0, 1, 0, 0.6);
        cube
    }

    #[test]
    fn values_use_fixed_precision() {
        assert_eq!(format_value(Some(0.8)), "0.800");
        assert_eq!(format_value(Some(1.0 / 3.0)), "0.333");
        assert_eq!(format_value(None), "NA");
    }

    #[test]
    fn cube_text_has_score_and_rank_blocks() {
        let text = render_cube_text("demo", &cube());
        assert!(text.contains("yeast-human\t0.800\t0.600\tNA"));
        assert!(text.contains("yeast-human\t1\t2\tNA"));
        assert!(text.contains("mean rank\t1.000\t2.000\tNA"));
    }

    #[test]
    fn cube_csv_rows_pair_scores_with_ranks() {
        let rows = cube_csv_rows(&cube());
        assert_eq!(rows[0], vec!["measure", "block", "pair", "A", "B", "C"]);
        assert_eq!(rows[1], vec!["nc", "score", "yeast-human", "0.800", "0.600", "NA"]);
        assert_eq!(rows[2], vec!["nc", "rank", "yeast-human", "1", "2", "NA"]);
    }

    #[test]
    fn grid_text_renders_unresolved_cells() {
        let mut grid = ScoreGrid::new("k\\l", vec!["1".into(), "2".into()], vec!["0.5".into()]);
        grid.values[0][0] = Some(0.25);
        let text = render_grid_text("", &grid);
        assert_eq!(text, "k\\l\t0.5\n1\t0.250\n2\tNA\n");
    }
}
