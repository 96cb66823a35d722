#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use galign_core::{AlignError, Alignment, Measure};
use galign_exp::{
    ObjectiveCalibrator, ScoreTable, ScoreTableEntry, SearchDriver, SearchRequest,
};

/// Measure with a fixed name and score.
pub struct Constant {
    pub name: &'static str,
    pub local: bool,
}

impl Measure for Constant {
    fn name(&self) -> &str {
        self.name
    }

    fn eval(&self, _alignment: &Alignment) -> Result<f64, AlignError> {
        Ok(0.0)
    }

    fn is_local(&self) -> bool {
        self.local
    }
}

pub fn constant(name: &'static str) -> Arc<dyn Measure> {
    Arc::new(Constant { name, local: false })
}

/// Driver returning the identity alignment and keeping every request.
#[derive(Default)]
pub struct RecordingDriver {
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl SearchDriver for RecordingDriver {
    fn search(&self, request: &SearchRequest) -> Result<Alignment, AlignError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Alignment::identity(request.g1_nodes))
    }
}

pub fn entry(method: &str, topology: f64, sequence: f64) -> ScoreTableEntry {
    ScoreTableEntry {
        method: method.to_string(),
        g1: "yeast".to_string(),
        g2: "human".to_string(),
        topology,
        sequence,
    }
}

/// Calibrator over a small table for the `yeast`/`human` pair.
pub fn calibrator() -> ObjectiveCalibrator {
    let table = ScoreTable::from_entries(
        "fixture",
        vec![
            entry("lgraal", 0.3, 0.1),
            entry("sanaec", 0.4, 0.4),
            entry("tabuec", 0.2, 0.6),
        ],
    )
    .unwrap();
    ObjectiveCalibrator::new(Arc::new(table))
}
