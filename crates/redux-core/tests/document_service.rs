use redux_core::{CoreError, DocumentService, PathPolicy};
use redux_document::{parse, KeyPath, Value};
use std::path::PathBuf;

const CONFIG: &str = include_str!("../../redux-document/tests/fixtures/config.json5");

fn fixture() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tmp");
    let file = dir.path().join("config.json5");
    std::fs::write(&file, CONFIG).expect("write fixture");
    (dir, file)
}

#[tokio::test]
async fn auto_load_reads_the_default_document() {
    let (_dir, file) = fixture();
    let service = DocumentService::new(PathPolicy::default(), file.clone());

    let loaded = service.auto_load().await.expect("auto load");
    assert_eq!(loaded.text, CONFIG);
    assert_eq!(loaded.path, file.canonicalize().expect("canon"));
}

#[tokio::test]
async fn auto_load_reports_missing_default() {
    let dir = tempfile::tempdir().expect("tmp");
    let service = DocumentService::new(
        PathPolicy::default(),
        dir.path().join("Kynexis-SoftcoreRedux/config/config.json5"),
    );
    let err = service.auto_load().await.expect_err("missing");
    assert!(err.to_string().contains("Cannot resolve"));
}

#[tokio::test]
async fn load_rejects_broken_documents() {
    let (_dir, file) = fixture();
    std::fs::write(&file, "{\n  \"a\": 1,\n  oops\n}").expect("write");
    let service = DocumentService::new(PathPolicy::default(), file.clone());
    match service.load_document(&file).await {
        Err(CoreError::Parse(message)) => assert!(message.contains("line 3")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[tokio::test]
async fn patches_rebase_on_the_current_file() {
    let (_dir, file) = fixture();
    let service = DocumentService::new(PathPolicy::default(), file.clone());

    // an edit made behind the editor's back survives the next patch
    let outside = CONFIG.replace("\"questChanges\": true", "\"questChanges\": false");
    std::fs::write(&file, &outside).expect("external edit");

    let price = KeyPath::from("hideoutOptions.fasterBitcoinFarming.bitcoinPrice");
    service
        .patch_value(&file, &price, &Value::Null)
        .await
        .expect("patch");

    let text = std::fs::read_to_string(&file).expect("read");
    let doc = parse(&text).expect("still parses");
    assert_eq!(doc.get(&price), Some(Value::Null));
    assert_eq!(
        doc.get(&KeyPath::from("otherTweaks.questChanges")),
        Some(Value::from(false))
    );
    assert!(text.contains("// Price of bitcoin in the handbook."));
    assert_eq!(text, outside.replace("\"bitcoinPrice\": 100000", "\"bitcoinPrice\": null"));
}

#[tokio::test]
async fn subtree_patch_and_full_save() {
    let (_dir, file) = fixture();
    let service = DocumentService::new(PathPolicy::default(), file.clone());

    let stacks = KeyPath::from("otherTweaks.currencyStackSizes");
    let value = Value::Object(vec![
        ("euros".to_string(), Value::from(100_000_i64)),
        ("dollars".to_string(), Value::from(100_000_i64)),
        ("gpcoin".to_string(), Value::from(100_i64)),
        ("roubles".to_string(), Value::from(1_000_000_i64)),
    ]);
    service.patch_value(&file, &stacks, &value).await.expect("patch subtree");
    let text = std::fs::read_to_string(&file).expect("read");
    assert_eq!(parse(&text).expect("parse").get(&stacks), Some(value));

    service.save_document(&file, CONFIG).await.expect("save");
    assert_eq!(std::fs::read_to_string(&file).expect("read"), CONFIG);
}

#[tokio::test]
async fn failed_write_is_an_io_error_and_keeps_the_file() {
    let (_dir, file) = fixture();
    let mut permissions = std::fs::metadata(&file).expect("metadata").permissions();
    permissions.set_readonly(true);
    std::fs::set_permissions(&file, permissions).expect("make read-only");
    if std::fs::OpenOptions::new().write(true).open(&file).is_ok() {
        // privileged users write through read-only bits
        eprintln!("skipping: read-only file is still writable");
        return;
    }

    let service = DocumentService::new(PathPolicy::default(), file.clone());
    let err = service
        .patch_value(
            &file,
            &KeyPath::from("hideoutOptions.fasterBitcoinFarming.gpuEfficiency"),
            &Value::from(3_i64),
        )
        .await
        .expect_err("write fails");
    assert_eq!(err.kind(), redux_ipc::ErrorKind::Io);
    assert!(err.message().starts_with("Cannot write to"), "{}", err.message());

    let err = service.save_document(&file, "{}").await.expect_err("save fails");
    assert_eq!(err.kind(), redux_ipc::ErrorKind::Io);
    assert_eq!(std::fs::read_to_string(&file).expect("read"), CONFIG);
}
