use std::path::Path;

use fare_app::artifact::{self, FORMAT_VERSION};
use fare_app::{load_model, ArtifactLoader, DecodeError, FareModel, LoadError, LoaderConfig, ModelHandle};
use tempfile::TempDir;

fn config_for(path: &Path) -> LoaderConfig {
    let value = path.as_os_str().to_os_string();
    LoaderConfig::from_lookup(move |key| (key == "MODEL_PATH").then(|| value.clone()))
}

fn write_good(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("good.model");
    artifact::write_artifact(&path, &FareModel::baseline()).unwrap();
    path
}

fn deserialization_reason(err: LoadError) -> DecodeError {
    match err {
        LoadError::Deserialization { reason, .. } => reason,
        other => panic!("expected Deserialization, got {:?}", other),
    }
}

#[test]
fn good_artifact_loads_to_the_serialized_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_good(&dir);
    let before = std::fs::read(&path).unwrap();

    let handle = load_model(&config_for(&path)).unwrap();
    assert_eq!(handle, ModelHandle::new(FareModel::baseline()).unwrap());

    // Loading never touches the file.
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn repeated_loads_are_independent_and_equal() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_good(&dir);
    let loader = ArtifactLoader::new(config_for(&path));

    let first = loader.load().unwrap();
    let second = loader.load().unwrap();
    assert_eq!(first, second);

    // Each load re-reads: removing the file afterwards doesn't affect the
    // handles already returned, and the next load sees it gone.
    std::fs::remove_file(&path).unwrap();
    assert_eq!(first.kind(), "linear");
    assert!(matches!(loader.load(), Err(LoadError::NotFound { .. })));
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.model");
    match load_model(&config_for(&path)) {
        Err(LoadError::NotFound { path: reported }) => assert_eq!(reported, path),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn empty_file_is_a_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.model");
    std::fs::write(&path, b"").unwrap();

    let reason = deserialization_reason(load_model(&config_for(&path)).unwrap_err());
    assert!(matches!(reason, DecodeError::Empty));
}

#[test]
fn random_text_is_a_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.model");
    std::fs::write(&path, "airline,price\nVistara,5400\nIndigo,4100\n").unwrap();

    let reason = deserialization_reason(load_model(&config_for(&path)).unwrap_err());
    assert!(matches!(reason, DecodeError::BadMagic { .. }));
}

#[test]
fn truncated_artifact_is_a_deserialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_good(&dir);
    let bytes = std::fs::read(&good).unwrap();

    let path = dir.path().join("truncated.model");
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    let reason = deserialization_reason(load_model(&config_for(&path)).unwrap_err());
    assert!(matches!(reason, DecodeError::LengthMismatch { .. }));

    std::fs::write(&path, &bytes[..20]).unwrap();
    let reason = deserialization_reason(load_model(&config_for(&path)).unwrap_err());
    assert!(matches!(reason, DecodeError::TruncatedHeader { actual: 20, .. }));
}

#[test]
fn artifact_with_a_foreign_schema_is_rejected() {
    let mut model = FareModel::baseline();
    if let FareModel::Linear(m) = &mut model {
        m.feature_names.reverse();
    }
    // Written by hand since write_artifact refuses invalid models.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.model");
    std::fs::write(&path, artifact::encode(&model).unwrap()).unwrap();

    let reason = deserialization_reason(load_model(&config_for(&path)).unwrap_err());
    assert!(matches!(reason, DecodeError::Shape(_)));
    assert!(artifact::write_artifact(&path, &model).is_err());
}

#[test]
fn describe_reports_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_good(&dir);

    let summary = artifact::describe(&path).unwrap();
    assert_eq!(summary.version, FORMAT_VERSION);
    assert_eq!(summary.path, path);
    assert!(summary.to_string().contains("model:     linear"));
}
