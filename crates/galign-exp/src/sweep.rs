//! Two parameter grid sweeps submitted to a cluster and harvested later.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use galign_core::errors::{AlignError, ErrorInfo};
use galign_core::{Alignment, Measure, NetworkPair};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::hash::stable_hash_string;
use crate::measures::MeasureProvider;
use crate::report::{render_grid_text, write_grid_csv, write_report, ScoreGrid};
use crate::scheduler::ClusterScheduler;
use crate::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes};

/// Manifest file written into the experiment folder on submission.
pub const MANIFEST_FILE: &str = "sweep_manifest.json";

fn io_error(code: &str, path: &Path, err: impl ToString) -> AlignError {
    AlignError::Io(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Sweep configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    /// Measure scored on every output.
    pub measure: String,
    /// Source graph name.
    pub g1: String,
    /// Target graph name.
    pub g2: String,
    /// Values of the first parameter (grid rows).
    pub k_values: Vec<f64>,
    /// Values of the second parameter (grid columns).
    pub l_values: Vec<f64>,
    /// Folder receiving scripts, alignments and the manifest.
    pub experiment_folder: PathBuf,
    /// Method run by every job.
    #[serde(default = "SweepPlan::default_method")]
    pub method: String,
    /// Aligner flag receiving `k`.
    #[serde(default = "SweepPlan::default_k_flag")]
    pub k_flag: String,
    /// Aligner flag receiving `l`.
    #[serde(default = "SweepPlan::default_l_flag")]
    pub l_flag: String,
    /// Time budget per job.
    #[serde(default = "SweepPlan::default_minutes")]
    pub minutes: f64,
    /// Aligner executable invoked by the scripts.
    #[serde(default = "SweepPlan::default_aligner")]
    pub aligner: String,
    /// Working directory of the scripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_folder: Option<PathBuf>,
}

impl SweepPlan {
    fn default_method() -> String {
        "sana".to_string()
    }

    fn default_k_flag() -> String {
        "-k".to_string()
    }

    fn default_l_flag() -> String {
        "-l".to_string()
    }

    const fn default_minutes() -> f64 {
        60.0
    }

    fn default_aligner() -> String {
        "./sana".to_string()
    }

    /// Loads a YAML plan; a relative experiment folder is resolved against
    /// the plan's directory.
    pub fn load(path: &Path) -> Result<Self, AlignError> {
        if !path.exists() {
            return Err(AlignError::missing_file(path));
        }
        let bytes = fs::read(path).map_err(|err| io_error("sweep-plan-read", path, err))?;
        let mut plan: SweepPlan = from_yaml_slice(&bytes)?;
        if plan.experiment_folder.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            plan.experiment_folder = base.join(&plan.experiment_folder);
        }
        plan.validate()?;
        Ok(plan)
    }

    /// Rejects empty, non-finite or repeated parameter values.
    pub fn validate(&self) -> Result<(), AlignError> {
        for (field, values) in [("k_values", &self.k_values), ("l_values", &self.l_values)] {
            if values.is_empty() {
                return Err(AlignError::missing_field(field));
            }
            let mut seen = BTreeSet::new();
            for value in values {
                if !value.is_finite() {
                    return Err(AlignError::invalid_value(
                        field,
                        value.to_string(),
                        "parameter values must be finite",
                    ));
                }
                // -0.0 and 0.0 address the same grid cell.
                let key = if *value == 0.0 { 0.0f64 } else { *value };
                if !seen.insert(key.to_bits()) {
                    return Err(AlignError::invalid_value(
                        field,
                        value.to_string(),
                        "parameter value listed twice",
                    ));
                }
            }
        }
        if self.minutes.is_nan() || self.minutes <= 0.0 {
            return Err(AlignError::invalid_value(
                "minutes",
                self.minutes.to_string(),
                "time budget must be positive",
            ));
        }
        Ok(())
    }

    /// Graph pair of the sweep.
    pub fn pair(&self) -> NetworkPair {
        NetworkPair::new(self.g1.clone(), self.g2.clone())
    }

    /// All grid points, row major over `k`.
    pub fn points(&self) -> Vec<GridPoint> {
        self.k_values
            .iter()
            .flat_map(|&k| self.l_values.iter().map(move |&l| GridPoint { k, l }))
            .collect()
    }

    fn job_name(&self, point: &GridPoint) -> String {
        format!("{}_{}", self.method, point.label())
    }

    /// Run script of a grid point.
    pub fn script_path(&self, point: &GridPoint) -> PathBuf {
        self.experiment_folder
            .join("scripts")
            .join(format!("{}.sh", self.job_name(point)))
    }

    /// Alignment written by the job of a grid point.
    pub fn output_path(&self, point: &GridPoint) -> PathBuf {
        self.experiment_folder
            .join("alignments")
            .join(self.job_name(point))
    }

    /// Manifest location.
    pub fn manifest_path(&self) -> PathBuf {
        self.experiment_folder.join(MANIFEST_FILE)
    }

    /// Bash script running the aligner for one grid point.
    pub fn render_script(&self, point: &GridPoint) -> String {
        let mut script = String::from("#!/bin/bash\nset -e\n");
        if let Some(folder) = &self.project_folder {
            script.push_str(&format!("cd {}\n", shell_word(&folder.display().to_string())));
        }
        let words = [
            shell_word(&self.aligner),
            "-method".to_string(),
            shell_word(&self.method),
            "-g1".to_string(),
            shell_word(&self.g1),
            "-g2".to_string(),
            shell_word(&self.g2),
            "-objfuntype generic".to_string(),
            shell_word(&format!("-{}", self.measure)),
            "1 -t".to_string(),
            self.minutes.to_string(),
            shell_word(&self.k_flag),
            point.k.to_string(),
            shell_word(&self.l_flag),
            point.l.to_string(),
            "-o".to_string(),
            shell_word(&self.output_path(point).display().to_string()),
        ];
        script.push_str(&words.join(" "));
        script.push('\n');
        script
    }
}

/// Single-quotes `word` for bash unless it only holds inert characters.
fn shell_word(word: &str) -> String {
    let inert = |c: char| c.is_ascii_alphanumeric() || "-_./=+:,@%".contains(c);
    if !word.is_empty() && word.chars().all(inert) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', "'\\''"))
}

/// One (k, l) configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// First parameter.
    pub k: f64,
    /// Second parameter.
    pub l: f64,
}

impl GridPoint {
    /// Name fragment `k<k>_l<l>`; distinct points give distinct labels.
    pub fn label(&self) -> String {
        format!("k{}_l{}", self.k, self.l)
    }
}

/// Lifecycle of a grid point as observed by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointState {
    /// No submission recorded.
    NotSubmitted,
    /// Submitted in this process, not collected yet.
    Submitted,
    /// Submitted earlier, output not available yet.
    Pending,
    /// Output present and scored.
    Completed,
}

/// Record of what has been handed to the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepManifest {
    /// Hash of the plan the points were submitted from.
    pub plan_hash: String,
    /// Submitted points, in submission order.
    pub submitted: Vec<GridPoint>,
    /// RFC 3339 time of the last submission pass.
    pub submitted_at: String,
}

impl SweepManifest {
    /// Reads the manifest at `path`, `None` when nothing was submitted.
    pub fn load(path: &Path) -> Result<Option<Self>, AlignError> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|err| io_error("sweep-manifest-read", path, err))?;
        from_json_slice(&bytes).map(Some)
    }

    /// Writes the manifest as canonical JSON.
    pub fn save(&self, path: &Path) -> Result<(), AlignError> {
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| io_error("sweep-manifest-write", path, err))
    }

    /// True when `point` was submitted.
    pub fn contains(&self, point: &GridPoint) -> bool {
        self.submitted.iter().any(|known| known == point)
    }
}

/// State and score of every grid point, indexed `[k][l]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    k_values: Vec<f64>,
    l_values: Vec<f64>,
    states: Vec<PointState>,
    scores: Vec<Option<f64>>,
}

impl SweepGrid {
    fn new(plan: &SweepPlan) -> Self {
        let cells = plan.k_values.len() * plan.l_values.len();
        Self {
            k_values: plan.k_values.clone(),
            l_values: plan.l_values.clone(),
            states: vec![PointState::NotSubmitted; cells],
            scores: vec![None; cells],
        }
    }

    fn index(&self, point: &GridPoint) -> Option<usize> {
        let ki = self.k_values.iter().position(|&k| k == point.k)?;
        let li = self.l_values.iter().position(|&l| l == point.l)?;
        Some(ki * self.l_values.len() + li)
    }

    fn update(&mut self, point: &GridPoint, state: PointState, score: Option<f64>) {
        if let Some(idx) = self.index(point) {
            self.states[idx] = state;
            self.scores[idx] = score;
        }
    }

    /// State of a point; points outside the grid are never submitted.
    pub fn state(&self, point: &GridPoint) -> PointState {
        self.index(point)
            .map(|idx| self.states[idx])
            .unwrap_or(PointState::NotSubmitted)
    }

    /// Score of a point, if collected.
    pub fn score(&self, point: &GridPoint) -> Option<f64> {
        self.index(point).and_then(|idx| self.scores[idx])
    }

    /// Report grid: rows are `k`, columns are `l`.
    pub fn to_score_grid(&self) -> ScoreGrid {
        let mut grid = ScoreGrid::new(
            "k\\l",
            self.k_values.iter().map(f64::to_string).collect(),
            self.l_values.iter().map(f64::to_string).collect(),
        );
        for (ki, row) in grid.values.iter_mut().enumerate() {
            for (li, cell) in row.iter_mut().enumerate() {
                *cell = self.scores[ki * self.l_values.len() + li];
            }
        }
        grid
    }
}

/// Point counts of one collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Points with a score.
    pub completed: usize,
    /// Submitted points still without output.
    pub pending: usize,
    /// Points never submitted.
    pub not_submitted: usize,
}

/// Submits the grid of a [`SweepPlan`] and harvests whatever finished.
pub struct ParameterSweep {
    plan: SweepPlan,
    measure: Arc<dyn Measure>,
    grid: SweepGrid,
}

impl ParameterSweep {
    /// Binds the plan's measure to its graph pair.
    pub fn new(plan: SweepPlan, measures: &dyn MeasureProvider) -> Result<Self, AlignError> {
        plan.validate()?;
        let measure = measures.measure(&plan.pair(), &plan.measure)?;
        let grid = SweepGrid::new(&plan);
        Ok(Self {
            plan,
            measure,
            grid,
        })
    }

    /// Sweep configuration.
    pub fn plan(&self) -> &SweepPlan {
        &self.plan
    }

    /// Point states and scores.
    pub fn grid(&self) -> &SweepGrid {
        &self.grid
    }

    /// Writes one script per grid point and submits it. Returns once every
    /// submission was accepted; jobs are never awaited.
    pub fn submit_scripts_to_cluster(
        &mut self,
        scheduler: &dyn ClusterScheduler,
    ) -> Result<SweepManifest, AlignError> {
        let folder = &self.plan.experiment_folder;
        for dir in [folder.join("scripts"), folder.join("alignments")] {
            fs::create_dir_all(&dir).map_err(|err| io_error("sweep-create-dir", &dir, err))?;
        }
        let plan_hash = stable_hash_string(&self.plan)?;
        let mut manifest = SweepManifest::load(&self.plan.manifest_path())?
            .filter(|previous| previous.plan_hash == plan_hash)
            .unwrap_or_else(|| SweepManifest {
                plan_hash: plan_hash.clone(),
                submitted: Vec::new(),
                submitted_at: String::new(),
            });

        let manifest_path = self.plan.manifest_path();
        for point in self.plan.points() {
            let script_path = self.plan.script_path(&point);
            fs::write(&script_path, self.plan.render_script(&point))
                .map_err(|err| io_error("sweep-script-write", &script_path, err))?;
            scheduler.submit(&script_path)?;
            debug!(point = %point.label(), script = %script_path.display(), "grid point submitted");
            if !manifest.contains(&point) {
                manifest.submitted.push(point);
            }
            // Accepted jobs are recorded before the next submission can fail.
            manifest.submitted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            manifest.save(&manifest_path)?;
            self.grid.update(&point, PointState::Submitted, None);
        }

        info!(
            points = manifest.submitted.len(),
            plan_hash = %manifest.plan_hash,
            "sweep submitted"
        );
        Ok(manifest)
    }

    /// Pure query: has the job of `point` produced its output file.
    pub fn alignment_exists(&self, point: &GridPoint) -> bool {
        self.plan.output_path(point).is_file()
    }

    /// Scores every finished point. Absent or unreadable outputs leave their
    /// cell unresolved; repeated passes give the same result for finished points.
    pub fn collect_data(&mut self) -> Result<SweepSummary, AlignError> {
        let manifest = SweepManifest::load(&self.plan.manifest_path())?;
        if let Some(manifest) = &manifest {
            let plan_hash = stable_hash_string(&self.plan)?;
            if manifest.plan_hash != plan_hash {
                warn!(
                    recorded = %manifest.plan_hash,
                    current = %plan_hash,
                    "sweep manifest was written for a different plan"
                );
            }
        }
        let submitted =
            |point: &GridPoint| manifest.as_ref().is_some_and(|known| known.contains(point));

        let mut grid = SweepGrid::new(&self.plan);
        let mut summary = SweepSummary::default();
        for point in self.plan.points() {
            let waiting = if submitted(&point)
                || self.grid.state(&point) == PointState::Submitted
            {
                PointState::Pending
            } else {
                PointState::NotSubmitted
            };
            if !self.alignment_exists(&point) {
                grid.update(&point, waiting, None);
                continue;
            }
            let path = self.plan.output_path(&point);
            let alignment = match Alignment::load(&path) {
                Ok(alignment) => alignment,
                Err(err @ AlignError::Serde(_)) => {
                    warn!(point = %point.label(), %err, "output not readable yet");
                    grid.update(&point, PointState::Pending, None);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let score = self.measure.eval(&alignment)?;
            debug!(point = %point.label(), score, "grid point collected");
            grid.update(&point, PointState::Completed, Some(score));
        }
        for point in self.plan.points() {
            match grid.state(&point) {
                PointState::Completed => summary.completed += 1,
                PointState::NotSubmitted => summary.not_submitted += 1,
                PointState::Pending | PointState::Submitted => summary.pending += 1,
            }
        }

        info!(
            completed = summary.completed,
            pending = summary.pending,
            not_submitted = summary.not_submitted,
            "sweep collection pass finished"
        );
        self.grid = grid;
        Ok(summary)
    }

    fn title(&self) -> String {
        format!(
            "{} {} {}",
            self.plan.method,
            self.plan.measure,
            self.plan.pair().label()
        )
    }

    /// Text report of the collected grid.
    pub fn render_text(&self) -> String {
        render_grid_text(&self.title(), &self.grid.to_score_grid())
    }

    /// Writes the text report.
    pub fn print_data(&self, path: &Path) -> Result<(), AlignError> {
        write_report(path, &self.render_text())
    }

    /// Writes the grid as CSV.
    pub fn print_data_csv(&self, path: &Path) -> Result<(), AlignError> {
        write_grid_csv(path, &self.grid.to_score_grid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(folder: &Path) -> SweepPlan {
        SweepPlan {
            measure: "nc".into(),
            g1: "yeast".into(),
            g2: "human".into(),
            k_values: vec![1.0, 2.0],
            l_values: vec![0.5],
            experiment_folder: folder.to_path_buf(),
            method: SweepPlan::default_method(),
            k_flag: SweepPlan::default_k_flag(),
            l_flag: SweepPlan::default_l_flag(),
            minutes: SweepPlan::default_minutes(),
            aligner: SweepPlan::default_aligner(),
            project_folder: None,
        }
    }

    #[test]
    fn names_depend_only_on_coordinates() {
        let plan = plan(Path::new("/runs/sweep"));
        let points = plan.points();
        assert_eq!(points.len(), 2);
        assert_eq!(
            plan.script_path(&points[0]),
            PathBuf::from("/runs/sweep/scripts/sana_k1_l0.5.sh")
        );
        assert_eq!(
            plan.output_path(&points[1]),
            PathBuf::from("/runs/sweep/alignments/sana_k2_l0.5")
        );
    }

    #[test]
    fn repeated_values_are_rejected() {
        let mut plan = plan(Path::new("/runs/sweep"));
        plan.l_values = vec![0.5, 0.5];
        let err = plan.validate().unwrap_err();
        assert!(matches!(err, AlignError::Config(_)));
        assert_eq!(err.info().context.get("field").map(String::as_str), Some("l_values"));
    }

    #[test]
    fn script_passes_both_parameters_and_output() {
        let plan = plan(Path::new("/runs/sweep"));
        let script = plan.render_script(&GridPoint { k: 2.0, l: 0.5 });
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("-k 2 -l 0.5"));
        assert!(script.contains("-o /runs/sweep/alignments/sana_k2_l0.5"));
    }

    #[test]
    fn script_quotes_untrusted_words() {
        let mut plan = plan(Path::new("/runs/my sweep"));
        plan.g1 = "yeast; rm -rf ~".into();
        plan.g2 = "it's".into();
        let script = plan.render_script(&GridPoint { k: 1.0, l: 0.5 });
        assert!(script.contains("-method sana -g1 'yeast; rm -rf ~' -g2 'it'\\''s'"));
        assert!(script.contains("-o '/runs/my sweep/alignments/sana_k1_l0.5'"));
    }

    #[test]
    fn signed_zero_counts_as_repeat() {
        let mut plan = plan(Path::new("/runs/sweep"));
        plan.k_values = vec![0.0, -0.0];
        let err = plan.validate().unwrap_err();
        assert_eq!(err.info().context.get("field").map(String::as_str), Some("k_values"));
    }
}
