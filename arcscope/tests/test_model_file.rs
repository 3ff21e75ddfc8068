use arcscope::app::App;
use arcscope::config::ViewConfig;
use arcscope::domain::{ExportError, ModelError, Tid};
use arcscope::export::{load_model, save_model, DEFAULT_MODEL_FILE_NAME};
use arcscope::trace_model::TraceModel;
use arcscope_common::EventKind;
use std::fs;

const FIXTURE: &str = "tests/fixtures/simple_model.json";

#[test]
fn test_load_fixture() {
    let model = load_model(FIXTURE.as_ref()).expect("Failed to load fixture");

    assert_eq!(model.duration, 20000);
    assert_eq!(model.system.cpu.len(), 2);
    assert_eq!(model.android.buffers.len(), 1);
    assert_eq!(model.chrome.buffers[0][4].kind, EventKind::ChromeOsSwapDone);
    assert_eq!(model.views[0].activity, "MainActivity");
    assert_eq!(model.task(7).map(|t| t.title.as_str()), Some("Game"));
    assert_eq!(model.thread(Tid(202)).map(|t| t.name.as_str()), Some("VizCompositor"));
}

#[test]
fn test_saved_copy_loads_equal() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = App::new(ViewConfig::default());
    app.load_file(FIXTURE.as_ref()).unwrap();

    // A directory gets the default file name
    let path = app.save_model(Some(dir.path())).unwrap();
    assert_eq!(path, dir.path().join(DEFAULT_MODEL_FILE_NAME));

    let reloaded = load_model(&path).unwrap();
    assert_eq!(&reloaded, &**app.model().unwrap());

    let original: serde_json::Value = serde_json::from_str(&fs::read_to_string(FIXTURE).unwrap()).unwrap();
    assert_eq!(reloaded.raw(), &original);
}

#[test]
fn test_unknown_event_type_is_rejected() {
    let err = TraceModel::from_json_str(r#"{"chrome": {"buffers": [[[500, 10], [777, 20]]]}}"#).unwrap_err();
    match err {
        ModelError::UnknownEventType { code, list, index } => {
            assert_eq!(code, 777);
            assert_eq!(list, "chrome.buffers[0]");
            assert_eq!(index, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_backwards_timestamps_are_rejected() {
    let err = TraceModel::from_json_str(r#"{"system": {"memory": [[10001, 50, 1], [10001, 40, 2]]}}"#).unwrap_err();
    assert!(matches!(err, ModelError::OutOfOrder { timestamp: 40, previous: 50, .. }));
}

#[test]
fn test_failed_load_keeps_current_model() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();

    let mut app = App::new(ViewConfig::default());
    app.load_file(FIXTURE.as_ref()).unwrap();
    assert!(app.load_file(&broken).is_err());
    assert_eq!(app.model().unwrap().duration, 20000);
}

#[test]
fn test_save_into_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let model = load_model(FIXTURE.as_ref()).unwrap();
    let err = save_model(&model, &dir.path().join("nope/model.json")).unwrap_err();
    assert!(matches!(err, ExportError::WriteFailed(_)));
}
