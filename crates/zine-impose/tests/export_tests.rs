use base64::Engine;
use std::io::Cursor;
use tempfile::TempDir;
use zine_impose::model::{Content, ContentKind, ImageProperties};
use zine_impose::*;

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn red_png_data_uri() -> String {
    let image = image::RgbaImage::from_pixel(8, 8, image::Rgba(RED));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

fn project(template_id: &str) -> Project {
    let template = TemplateCatalog::builtin().get_template(template_id).unwrap();
    Project::new("Export Test", template)
}

fn options() -> ExportOptions {
    ExportOptions {
        pixel_ratio: 0.5,
        ..Default::default()
    }
}

fn image_content(id: &str, x: f32, y: f32, props: ImageProperties) -> Content {
    Content::new(id, x, y, 100.0, 100.0, ContentKind::Image(props))
}

#[tokio::test]
async fn test_missing_asset_degrades_only_that_element() {
    let mut project = project("half-fold-letter");
    let page = project.pages.iter_mut().find(|p| p.page_number == 1).unwrap();
    page.content.push(image_content(
        "photo",
        20.0,
        20.0,
        ImageProperties {
            src: red_png_data_uri(),
            ..Default::default()
        },
    ));
    page.content.push(image_content(
        "missing",
        200.0,
        300.0,
        ImageProperties {
            asset_id: Some(42),
            ..Default::default()
        },
    ));

    let fonts = FontBook::without_system_fonts();
    let result = export_project(
        &project,
        &TemplateCatalog::builtin(),
        &NoAssets,
        &fonts,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(result.warnings.len(), 1);
    let warning = &result.warnings[0];
    assert!(warning.is_asset_not_found());
    assert_eq!(warning.page_number, 1);
    assert_eq!(warning.content_id.as_deref(), Some("missing"));

    // Page 1 is the right half of the front: the photo spans sheet
    // points (416..516, 20..120), the missing image (596..696, 300..400).
    let front = &result.images[0];
    assert_eq!(front.side, SheetSide::Front);
    assert_eq!(front.image.get_pixel(233, 35).0, RED);
    assert_eq!(front.image.get_pixel(323, 175).0, WHITE);
}

#[tokio::test]
async fn test_assets_come_from_the_provider() {
    let mut project = project("half-fold-letter");
    let page = project.pages.iter_mut().find(|p| p.page_number == 4).unwrap();
    page.content.push(image_content(
        "managed",
        0.0,
        0.0,
        ImageProperties {
            asset_id: Some(7),
            ..Default::default()
        },
    ));

    let png = base64::engine::general_purpose::STANDARD
        .decode(red_png_data_uri().trim_start_matches("data:image/png;base64,"))
        .unwrap();
    let assets = std::collections::HashMap::from([(7u64, png)]);

    let fonts = FontBook::without_system_fonts();
    let result = export_project(
        &project,
        &TemplateCatalog::builtin(),
        &assets,
        &fonts,
        &options(),
    )
    .await
    .unwrap();

    assert!(result.warnings.is_empty());
    // Page 4 is the left half of the front.
    assert_eq!(result.images[0].image.get_pixel(25, 25).0, RED);
}

#[tokio::test]
async fn test_document_has_one_page_per_side() {
    let mut project = project("booklet-half-letter-20");
    project.pages.truncate(8);

    let fonts = FontBook::without_system_fonts();
    let result = export_project(
        &project,
        &TemplateCatalog::builtin(),
        &NoAssets,
        &fonts,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(result.images.len(), 4);
    assert_eq!((result.width, result.height), (396, 306));
    assert!(
        result
            .images
            .iter()
            .all(|s| s.image.dimensions() == (result.width, result.height))
    );

    let doc = lopdf::Document::load_mem(&result.document).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 4);
    for page_id in pages.values() {
        let page = doc.get_dictionary(*page_id).unwrap();
        let media_box: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media_box, vec![0.0, 0.0, 792.0, 612.0]);
    }
}

#[tokio::test]
async fn test_project_template_copy_is_not_used() {
    let mut project = project("quarter-fold-letter");
    // A stale embedded copy with a bogus format must not matter.
    project.template.format = Format::Other("stale".into());

    let fonts = FontBook::without_system_fonts();
    let result = export_project(
        &project,
        &TemplateCatalog::builtin(),
        &NoAssets,
        &fonts,
        &options(),
    )
    .await
    .unwrap();
    assert_eq!(result.images.len(), 1);
}

#[tokio::test]
async fn test_unknown_template_id_is_fatal() {
    let mut project = project("quarter-fold-letter");
    project.template.id = "no-such-template".into();

    let fonts = FontBook::without_system_fonts();
    let err = export_project(
        &project,
        &TemplateCatalog::builtin(),
        &NoAssets,
        &fonts,
        &options(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExportError::MissingTemplate(ref id) if id == "no-such-template"));
}

#[tokio::test]
async fn test_save_artifacts() {
    let project = project("half-fold-letter");
    let fonts = FontBook::without_system_fonts();
    let result = export_project(
        &project,
        &TemplateCatalog::builtin(),
        &NoAssets,
        &fonts,
        &options().with_all_guides(),
    )
    .await
    .unwrap();

    let dir = TempDir::new().unwrap();
    let written = result.save_images(dir.path(), "zine").await.unwrap();
    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("zine-sheet1-front.png"));
    assert!(written[1].ends_with("zine-sheet1-back.png"));

    let decoded = image::open(&written[0]).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (396, 306));

    let pdf_path = dir.path().join("zine.pdf");
    save_document(&result.document, &pdf_path).await.unwrap();
    let doc = lopdf::Document::load(&pdf_path).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}
