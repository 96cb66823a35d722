mod common;

use std::sync::Arc;

use galign_core::{
    AlignError, Alignment, Budget, MeasureCombination, NamedGraph, RestartScheme,
};
use galign_exp::methods::ScheduleSetting;
use galign_exp::{
    KernelTerm, LazyScoreTable, MethodArgs, MethodFactory, ObjectiveArgs, ObjectiveCalibrator,
    SearchDriver,
};

use common::{calibrator, constant, Constant, RecordingDriver};

fn graphs() -> (NamedGraph, NamedGraph) {
    (NamedGraph::new("yeast", 4), NamedGraph::new("human", 6))
}

fn objective() -> MeasureCombination {
    MeasureCombination::new()
        .with_measure(constant("ec"), 0.5)
        .unwrap()
        .with_measure(constant("seq"), 0.5)
        .unwrap()
}

fn factory(driver: &Arc<RecordingDriver>) -> MethodFactory {
    let driver: Arc<dyn SearchDriver> = driver.clone();
    MethodFactory::new(calibrator(), driver)
}

fn method(name: &str) -> MethodArgs {
    MethodArgs {
        method: Some(name.to_string()),
        ..Default::default()
    }
}

fn objective_args(objfuntype: &str, alpha: Option<f64>, beta: Option<f64>) -> ObjectiveArgs {
    ObjectiveArgs {
        objfuntype: Some(objfuntype.to_string()),
        alpha,
        beta,
        top_measure: Some("ec".to_string()),
    }
}

fn sana_args() -> MethodArgs {
    MethodArgs {
        t_initial: Some(ScheduleSetting::Text("auto".into())),
        t_decay: Some(ScheduleSetting::Value(0.01)),
        minutes: Some(5.0),
        restart: true,
        tnew: Some(1.0),
        iter_per_step: Some(10_000_000),
        num_cand: Some(5),
        tcand: Some(0.05),
        tfin: Some(0.001),
        ..method("sana")
    }
}

#[test]
fn unknown_method_names_the_method() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let err = factory(&driver)
        .build(&g1, &g2, &method("magna"), &mut objective())
        .err()
        .unwrap();
    assert!(matches!(err, AlignError::Config(_)));
    assert_eq!(err.info().code, "method-unknown");
    assert_eq!(err.info().context.get("method").map(String::as_str), Some("magna"));
}

#[test]
fn eval_path_overrides_method() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        eval: Some("runs/best.align".into()),
        ..method("magna")
    };
    let built = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .unwrap();
    assert_eq!(built.name(), "none");
}

#[test]
fn tabu_alpha_reweights_objective() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        objective: objective_args("alpha", Some(0.7), None),
        minutes: Some(1.0),
        ntabus: Some(10),
        nneighbors: Some(20),
        ..method("tabu")
    };
    let mut combination = objective();
    let mut built = factory(&driver)
        .build(&g1, &g2, &args, &mut combination)
        .unwrap();
    assert!((combination.weight("ec").unwrap() - 0.7).abs() < 1e-12);
    assert!((combination.weight("seq").unwrap() - 0.3).abs() < 1e-12);

    let alignment = built
        .produce_alignment(&g1, &g2, &combination, &Budget::minutes(1.0))
        .unwrap();
    assert_eq!(alignment.len(), 4);
    let requests = driver.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "tabu");
    assert_eq!(requests[0].objective, combination.weights());
}

#[test]
fn tabu_beta_uses_suffixed_score_key() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        objective: objective_args("beta", None, Some(0.5)),
        minutes: Some(1.0),
        ntabus: Some(10),
        nneighbors: Some(20),
        ..method("tabu")
    };
    let mut combination = objective();
    factory(&driver)
        .build(&g1, &g2, &args, &mut combination)
        .unwrap();
    // tabuec baselines 0.2 / 0.6
    assert!((combination.weight("ec").unwrap() - 0.25).abs() < 1e-12);
}

#[test]
fn absent_score_row_names_all_keys() {
    let driver = Arc::new(RecordingDriver::default());
    let g1 = NamedGraph::new("worm", 4);
    let g2 = NamedGraph::new("fly", 6);
    let args = MethodArgs {
        objective: objective_args("beta", None, Some(0.5)),
        minutes: Some(1.0),
        ntabus: Some(10),
        nneighbors: Some(20),
        ..method("tabu")
    };
    let err = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .err()
        .unwrap();
    assert!(matches!(err, AlignError::LookupNotFound(_)));
    let context = &err.info().context;
    assert_eq!(context.get("method").map(String::as_str), Some("tabuec"));
    assert_eq!(context.get("g1").map(String::as_str), Some("worm"));
    assert_eq!(context.get("g2").map(String::as_str), Some("fly"));
}

#[test]
fn lgraal_rejects_generic_objective() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        lgraal_iter: Some(100),
        minutes: Some(1.0),
        ..method("lgraal")
    };
    let err = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .err()
        .unwrap();
    assert!(matches!(err, AlignError::Config(_)));
    assert_eq!(err.info().context.get("field").map(String::as_str), Some("objfuntype"));
}

#[test]
fn hubalign_receives_complement_of_alpha() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        objective: objective_args("beta", None, Some(0.5)),
        ..method("hubalign")
    };
    let built = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .unwrap();
    // lgraal baselines 0.3 / 0.1 give alpha 0.75
    let alpha = built.parameters()["alpha"].as_f64().unwrap();
    assert!((alpha - 0.25).abs() < 1e-12);
}

#[test]
fn sana_restart_scheme_is_enabled_once() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let mut built = factory(&driver)
        .build(&g1, &g2, &sana_args(), &mut objective())
        .unwrap();
    let control = built.as_annealing().unwrap();
    assert_eq!(control.restart_scheme().map(|scheme| scheme.candidates), Some(5));

    let again = RestartScheme {
        warm_temperature: 2.0,
        iterations_per_step: 1,
        candidates: 1,
        candidate_temperature: 0.1,
        final_temperature: 0.01,
    };
    let err = control.enable_restart_scheme(again).unwrap_err();
    assert_eq!(err.info().code, "annealing-restart-twice");
}

#[test]
fn sana_auto_calibration_is_one_shot() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let mut built = factory(&driver)
        .build(&g1, &g2, &sana_args(), &mut objective())
        .unwrap();
    assert_eq!(built.parameters()["t_initial"], "auto");
    let control = built.as_annealing().unwrap();
    let err = control.set_initial_temperature_automatically().unwrap_err();
    assert_eq!(err.info().code, "annealing-auto-twice");
    let err = control.set_decay_automatically().unwrap_err();
    assert_eq!(err.info().code, "annealing-auto-conflict");
}

#[test]
fn sana_without_restart_fields_is_config_error() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        tfin: None,
        ..sana_args()
    };
    let err = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .err()
        .unwrap();
    assert_eq!(err.info().context.get("field").map(String::as_str), Some("tfin"));
}

#[test]
fn non_annealing_methods_expose_no_controls() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let mut built = factory(&driver)
        .build(&g1, &g2, &method("hc"), &mut objective())
        .unwrap();
    assert!(built.as_annealing().is_none());
}

#[test]
fn lazy_table_reports_missing_file_on_first_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let table = Arc::new(LazyScoreTable::new(dir.path().join("absent.cnf")));
    let calibrator = ObjectiveCalibrator::new(table.clone());
    let driver: Arc<dyn SearchDriver> = Arc::new(RecordingDriver::default());
    let factory = MethodFactory::new(calibrator, driver);
    let (g1, g2) = graphs();

    let generic = factory.build(&g1, &g2, &method("hc"), &mut objective());
    assert!(generic.is_ok());
    assert!(!table.is_loaded());

    let args = MethodArgs {
        objective: objective_args("beta", None, Some(0.5)),
        ..method("hubalign")
    };
    let err = factory
        .build(&g1, &g2, &args, &mut objective())
        .err()
        .unwrap();
    assert!(matches!(err, AlignError::MissingFile(_)));
}

fn missing_field(err: &AlignError) -> Option<&str> {
    assert!(matches!(err, AlignError::Config(_)));
    assert_eq!(err.info().code, "config-missing-field");
    err.info().context.get("field").map(String::as_str)
}

fn wave_args() -> MethodArgs {
    MethodArgs {
        wave_node_sim: Some("nodesim".to_string()),
        ..method("wave")
    }
}

#[test]
fn wave_accepts_local_node_similarity() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let mut combination = objective()
        .with_measure(
            Arc::new(Constant {
                name: "nodesim",
                local: true,
            }),
            0.0,
        )
        .unwrap();
    let mut built = factory(&driver)
        .build(&g1, &g2, &wave_args(), &mut combination)
        .unwrap();
    assert_eq!(built.name(), "wave");
    assert_eq!(built.parameters()["node_sim"], "nodesim");
    built
        .produce_alignment(&g1, &g2, &combination, &Budget::default())
        .unwrap();
    assert_eq!(driver.requests.lock().unwrap()[0].method, "wave");
}

#[test]
fn wave_accepts_kernel_scored_local_term() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let mut combination = MeasureCombination::new()
        .with_measure(Arc::new(KernelTerm::new("ec")), 0.5)
        .unwrap()
        .with_measure(Arc::new(KernelTerm::local("nodesim")), 0.5)
        .unwrap();
    let built = factory(&driver)
        .build(&g1, &g2, &wave_args(), &mut combination)
        .unwrap();
    assert_eq!(built.name(), "wave");
}

#[test]
fn wave_rejects_global_or_absent_node_similarity() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let mut global = objective().with_measure(constant("nodesim"), 0.0).unwrap();
    let err = factory(&driver)
        .build(&g1, &g2, &wave_args(), &mut global)
        .err()
        .unwrap();
    assert_eq!(err.info().code, "config-invalid-value");
    assert_eq!(err.info().context.get("field").map(String::as_str), Some("wave_node_sim"));

    let err = factory(&driver)
        .build(&g1, &g2, &wave_args(), &mut objective())
        .err()
        .unwrap();
    assert_eq!(err.info().context.get("value").map(String::as_str), Some("nodesim"));

    let err = factory(&driver)
        .build(&g1, &g2, &method("wave"), &mut objective())
        .err()
        .unwrap();
    assert_eq!(missing_field(&err), Some("wave_node_sim"));
}

#[test]
fn greedy_forwards_optional_start_alignment() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let built = factory(&driver)
        .build(&g1, &g2, &method("greedylccs"), &mut objective())
        .unwrap();
    assert_eq!(built.name(), "greedylccs");
    assert!(built.parameters()["start_alignment"].is_null());

    let args = MethodArgs {
        start_alignment: Some("runs/seed.align".into()),
        ..method("greedylccs")
    };
    let built = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .unwrap();
    assert_eq!(built.parameters()["start_alignment"], "runs/seed.align");
}

#[test]
fn random_aligner_is_seeded_and_injective() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        seed: Some(7),
        ..method("random")
    };
    let mut first = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .unwrap();
    let mut second = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .unwrap();
    let combination = objective();
    let a = first
        .produce_alignment(&g1, &g2, &combination, &Budget::default())
        .unwrap();
    let b = second
        .produce_alignment(&g1, &g2, &combination, &Budget::default())
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 4);
    assert!(a.is_injective());
    assert!(driver.requests.lock().unwrap().is_empty());
}

#[test]
fn none_reads_start_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("start.align");
    Alignment::new(vec![3, 2, 1, 0]).write(&path).unwrap();
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let args = MethodArgs {
        start_alignment: Some(path),
        ..method("none")
    };
    let mut built = factory(&driver)
        .build(&g1, &g2, &args, &mut objective())
        .unwrap();
    let alignment = built
        .produce_alignment(&g1, &g2, &objective(), &Budget::default())
        .unwrap();
    assert_eq!(alignment.mapping(), &[3, 2, 1, 0]);
}

#[test]
fn none_requires_start_alignment() {
    let driver = Arc::new(RecordingDriver::default());
    let (g1, g2) = graphs();
    let err = factory(&driver)
        .build(&g1, &g2, &method("none"), &mut objective())
        .err()
        .unwrap();
    assert_eq!(missing_field(&err), Some("start_alignment"));
}
