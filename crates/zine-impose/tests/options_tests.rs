use tempfile::NamedTempFile;
use zine_impose::*;

#[test]
fn test_default_options() {
    let options = ExportOptions::default();
    assert!(!options.show_page_numbers);
    assert!(!options.show_fold_marks);
    assert!(!options.show_cut_marks);
    assert_eq!(options.pixel_ratio, 2.0);
    assert_eq!(options.bleed, 0.0);
    assert!(options.validate().is_ok());
}

#[test]
fn test_validation_rejects_bad_values() {
    for options in [
        ExportOptions {
            pixel_ratio: -1.0,
            ..Default::default()
        },
        ExportOptions {
            pixel_ratio: f32::NAN,
            ..Default::default()
        },
        ExportOptions {
            bleed: -3.0,
            ..Default::default()
        },
        ExportOptions {
            bleed: f32::INFINITY,
            ..Default::default()
        },
    ] {
        match options.validate() {
            Err(ExportError::Config(_)) => {}
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}

#[test]
fn test_partial_json_uses_defaults() {
    let options: ExportOptions = serde_json::from_str(r#"{ "showFoldMarks": true }"#).unwrap();
    assert!(options.show_fold_marks);
    assert_eq!(options.pixel_ratio, 2.0);
}

#[tokio::test]
async fn test_save_and_load_options() {
    let temp = NamedTempFile::new().unwrap();
    let options = ExportOptions {
        pixel_ratio: 3.0,
        settle_delay_ms: 25,
        ..ExportOptions::default().with_all_guides()
    };

    options.save(temp.path()).await.unwrap();
    let loaded = ExportOptions::load(temp.path()).await.unwrap();
    assert_eq!(loaded, options);
}

#[tokio::test]
async fn test_load_invalid_json_is_config_error() {
    let temp = NamedTempFile::new().unwrap();
    tokio::fs::write(temp.path(), b"not json").await.unwrap();
    let err = ExportOptions::load(temp.path()).await.unwrap_err();
    assert!(matches!(err, ExportError::Config(_)));
}
