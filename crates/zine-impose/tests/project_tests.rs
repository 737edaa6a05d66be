use tempfile::TempDir;
use zine_impose::model::{
    Content, ContentKind, Page, ShapeKind, ShapeProperties, TextProperties,
};
use zine_impose::*;

fn sample_project() -> Project {
    let template = TemplateCatalog::builtin()
        .get_template("quarter-fold-letter")
        .unwrap();
    let mut project = Project::new("Sample Zine", template);
    let page = project.pages.iter_mut().find(|p| p.page_number == 2).unwrap();
    page.content.push(Content::new(
        "title",
        10.0,
        20.0,
        150.0,
        40.0,
        ContentKind::Text(TextProperties {
            text: "Hello zine".into(),
            ..Default::default()
        }),
    ));
    page.content.push(
        Content::new(
            "box",
            0.0,
            0.0,
            50.0,
            50.0,
            ContentKind::Shape(ShapeProperties {
                shape_type: ShapeKind::Circle,
                fill: "#ff0000".into(),
                ..Default::default()
            }),
        )
        .with_z_index(3),
    );
    project
}

#[test]
fn test_new_project_pages() {
    let project = sample_project();
    assert_eq!(project.page_count(), 8);
    assert_eq!(project.page(1).unwrap().title, "Front Cover");
    assert_eq!(project.page(4).unwrap().title, "Page 4");
    assert_eq!(project.page(8).unwrap().title, "Back Cover");
    assert!(project.page(9).is_none());
}

#[test]
fn test_json_round_trip_keeps_pages_content_and_dates() {
    let project = sample_project();
    let json = project.to_json().unwrap();
    assert!(json.contains("\"createdAt\""));

    let restored = Project::from_json(&json).unwrap();
    assert_eq!(restored, project);
    assert_eq!(restored.created_at, project.created_at);
    assert_eq!(restored.page(2).unwrap().content.len(), 2);
}

#[test]
fn test_unversioned_project_is_migrated() {
    let mut project = sample_project();
    project.format_version = None;
    let json = project.to_json().unwrap();
    assert!(!json.contains("formatVersion"));

    let restored = Project::from_json(&json).unwrap();
    assert_eq!(restored.format_version, Some(2));
}

#[test]
fn test_unknown_format_survives_load() {
    let mut project = sample_project();
    project.template.format = Format::Other("z-fold".into());
    let restored = Project::from_json(&project.to_json().unwrap()).unwrap();
    assert_eq!(restored.template.format, Format::Other("z-fold".into()));
}

#[test]
fn test_paint_order_is_stable() {
    let mut page = Page::blank(1, "p");
    for (id, z) in [("a", 1), ("b", 0), ("c", 1), ("d", 0)] {
        page.content.push(
            Content::new(id, 0.0, 0.0, 1.0, 1.0, ContentKind::Shape(Default::default()))
                .with_z_index(z),
        );
    }
    let order: Vec<&str> = page
        .content_in_paint_order()
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(order, vec!["b", "d", "a", "c"]);
}

#[tokio::test]
async fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zine.json");

    let project = sample_project();
    project.save(&path).await.unwrap();
    let loaded = Project::load(&path).await.unwrap();
    assert_eq!(loaded, project);
}

#[tokio::test]
async fn test_load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Project::load(dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
}

#[tokio::test]
async fn test_load_rejects_invalid_utf8() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zine.json");
    let json = sample_project().to_json().unwrap();
    let corrupted = json.replacen("Sample Zine", "Sample \u{1}Zine", 1);
    let bytes: Vec<u8> = corrupted
        .into_bytes()
        .into_iter()
        .map(|b| if b == 0x01 { 0xFF } else { b })
        .collect();
    tokio::fs::write(&path, bytes).await.unwrap();

    let err = Project::load(&path).await.unwrap_err();
    assert!(matches!(err, ExportError::Json(_)));
}
