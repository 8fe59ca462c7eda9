use dnapc_bench::loader::{write_points, PointTable};
use dnapc_bench::names::extract_name;
use dnapc_bench::sequencer::{aligned_io_files, load_records};
use dnapc_bench::{
    dispatch, load_file, load_io_files, BenchConfig, BenchError, EvaluationMetric, Record,
    Services,
};
use ndarray::{array, ArrayD, IxDyn};
use ndarray_npy::write_npy;
use serde_pickle::{SerOptions, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_npy_block(dir: &Path, name: &str, fill: f64) {
    fs::create_dir_all(dir).unwrap();
    let array = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2]), vec![fill; 4]).unwrap();
    write_npy(dir.join(format!("{name}.npy")), &array).unwrap();
}

fn write_pkl_block(dir: &Path, name: &str, values: [f64; 2]) {
    fs::create_dir_all(dir).unwrap();
    let value = Value::List(values.iter().map(|&v| Value::F64(v)).collect());
    let bytes = serde_pickle::value_to_vec(&value, SerOptions::new()).unwrap();
    fs::write(dir.join(format!("{name}.pkl")), bytes).unwrap();
}

fn write_ply_block(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    let cloud = PointTable::from_coordinates(array![[0.0, 1.0, 2.0], [1.0, 1.0, 1.0]]);
    write_points(dir.join(format!("{name}.ply")), &cloud).unwrap();
}

/// x holds a, b, c; y and x_hat only a and b.
fn mixed_format_tree() -> (TempDir, BenchConfig) {
    let root = tempfile::tempdir().unwrap();
    let (x, y, x_hat) = (
        root.path().join("x"),
        root.path().join("y"),
        root.path().join("x_hat"),
    );
    for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
        write_npy_block(&x, name, i as f64);
    }
    for name in ["a", "b"] {
        write_pkl_block(&y, name, [1.0, 2.0]);
        write_ply_block(&x_hat, name);
    }
    let config = BenchConfig::new("play")
        .with_io("x", x)
        .with_io("y", y)
        .with_io("x_hat", x_hat);
    (root, config)
}

#[test]
fn test_mixed_formats_align_on_shared_names() {
    let (_root, config) = mixed_format_tree();

    let (roles, files) = aligned_io_files(&config, &[]).unwrap();
    assert_eq!(roles, vec!["x", "y", "x_hat"]);
    for list in &files {
        let names: Vec<String> = list.iter().map(extract_name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    let groups: Vec<_> = load_io_files(&config, &[])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(groups.len(), 2);
    let kinds: Vec<&str> = groups[0].records.iter().map(Record::kind).collect();
    assert_eq!(kinds, vec!["array", "object", "points"]);
    // the leading singleton axis of the npy blocks is squeezed away
    assert_eq!(groups[1].records[0].shape(), vec![2, 2]);
}

#[test]
fn test_lazy_matches_eager() {
    let (_root, config) = mixed_format_tree();
    let (_, files) = aligned_io_files(&config, &[]).unwrap();

    let eager: Vec<Vec<Record>> = files
        .iter()
        .map(|list| load_records(list).unwrap())
        .collect();
    // the npy blocks are written as [1, 2, 2]
    assert_eq!(eager[0][0].shape(), vec![2, 2]);

    let mut pulled = 0;
    for (k, group) in load_io_files(&config, &[]).unwrap().enumerate() {
        let group = group.unwrap();
        for (role, record) in group.records.iter().enumerate() {
            assert_eq!(record, &eager[role][k]);
        }
        pulled += 1;
    }
    assert_eq!(pulled, eager[0].len());
}

#[test]
fn test_written_point_cloud_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let cloud = PointTable::new(
        vec!["x".into(), "y".into(), "z".into(), "red".into()],
        array![[0.5, 1.5, 2.5, 255.0], [3.0, 4.0, 5.0, 0.0]],
    )
    .unwrap();
    let path = dir.path().join("cloud.ply");
    write_points(&path, &cloud).unwrap();

    let loaded = load_file(&path).unwrap();
    let points = loaded.as_points().unwrap();
    assert_eq!(points.columns(), cloud.columns());
    assert_eq!(points.data(), cloud.data());
}

#[test]
fn test_play_has_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BenchConfig::new("play");
    config.output_dir = dir.path().to_path_buf();

    let report = dispatch("play", config, &Services::default()).unwrap();
    assert!(report.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_unknown_task_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BenchConfig::new("play");
    config.output_dir = dir.path().join("never_created");

    let err = dispatch("nonexistent_task", config, &Services::default()).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(err, BenchError::UnknownTask { .. }));
    assert!(!dir.path().join("never_created").exists());
}

#[test]
fn test_evaluate_y_reconstruction_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let y: PathBuf = root.path().join("y");
    let y_hat: PathBuf = root.path().join("y_hat");
    write_pkl_block(&y, "a", [1.0, -1.0]);
    write_pkl_block(&y, "b", [2.0, 0.0]);
    write_pkl_block(&y_hat, "a", [1.0, 1.0]);
    write_pkl_block(&y_hat, "b", [2.0, 0.0]);

    let config = BenchConfig::new("evaluate_y_reconstruction")
        .with_io("y", &y)
        .with_io("y_hat", &y_hat);
    let report = dispatch("evaluate_y_reconstruction", config, &Services::default()).unwrap();

    assert_eq!(report.metric("mse"), Some(&EvaluationMetric::Float(1.0)));
    assert_eq!(report.metric("max"), Some(&EvaluationMetric::Float(2.0)));
    assert_eq!(report.metric("min"), Some(&EvaluationMetric::Float(-1.0)));
}

#[test]
fn test_unmatched_block_is_dropped() {
    let root = tempfile::tempdir().unwrap();
    let mut config = BenchConfig::new("play");
    for role in ["x", "y", "x_hat"] {
        let dir = root.path().join(role);
        write_npy_block(&dir, "a", 0.0);
        write_npy_block(&dir, "b", 1.0);
        config = config.with_io(role, dir);
    }
    write_npy_block(&root.path().join("x"), "c", 2.0);

    let (_, files) = aligned_io_files(&config, &[]).unwrap();
    assert_eq!(files.len(), 3);
    for (list, role) in files.iter().zip(["x", "y", "x_hat"]) {
        assert_eq!(
            list,
            &vec![
                root.path().join(role).join("a.npy"),
                root.path().join(role).join("b.npy"),
            ]
        );
    }

    // a single role is grouped one path at a time
    let single: Vec<_> = load_io_files(&config, &["y", "x_hat"])
        .unwrap()
        .map(|group| group.unwrap().into_single().unwrap())
        .collect();
    assert_eq!(single.len(), 3);
}
