//! Project export - sheets of pixels and a printable PDF
//!
//! The pipeline for one project:
//! 1. Look the template up again by id and resolve the sheet sides
//! 2. Compose every slot of a side (all image loads awaited)
//! 3. Overlay fold and cut guides
//! 4. Settle, then rasterize on the shared surface
//! 5. Assemble every side into a document
//!
//! Sides are handled one at a time, in output order.

use image::RgbaImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::assemble::{DocumentInfo, assemble_with_info};
use crate::assets::AssetProvider;
use crate::catalog::TemplateProvider;
use crate::compose::Compositor;
use crate::fonts::FontBook;
use crate::guides::{GuideOptions, guides};
use crate::layout::{SheetSide, SheetSideLayout, resolve};
use crate::model::{Page, Project, Template};
use crate::options::ExportOptions;
use crate::raster::{Surface, settle};
use crate::scene::Scene;
use crate::types::*;

const PRODUCER: &str = concat!("zine-impose ", env!("CARGO_PKG_VERSION"));

/// One rendered side of one physical sheet
#[derive(Debug, Clone)]
pub struct SheetImage {
    pub sheet_index: usize,
    pub side: SheetSide,
    pub image: RgbaImage,
}

impl SheetImage {
    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }

    /// File name for this side, e.g. `zine-sheet1-front.png`
    pub fn file_name(&self, stem: &str) -> String {
        let side = match self.side {
            SheetSide::Front => "front",
            SheetSide::Back => "back",
        };
        format!("{}-sheet{}-{}.png", stem, self.sheet_index + 1, side)
    }
}

/// Everything an export produced
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Sheet sides in output order
    pub images: Vec<SheetImage>,
    /// PDF bytes, one page per image
    pub document: Vec<u8>,
    /// Raster width in pixels
    pub width: u32,
    /// Raster height in pixels
    pub height: u32,
    pub warnings: Vec<ExportWarning>,
}

impl ExportResult {
    /// Write every sheet image as PNG into `dir`, returning the paths written.
    pub async fn save_images(&self, dir: impl AsRef<Path>, stem: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let mut written = Vec::with_capacity(self.images.len());
        for sheet in &self.images {
            let path = dir.join(sheet.file_name(stem));
            tokio::fs::write(&path, sheet.to_png()?).await?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Export `project` to sheet images and a PDF.
///
/// The template is always fetched from `templates` by the project's
/// template id; the copy stored in the project is never used for layout.
/// Problems with single elements end up in [`ExportResult::warnings`],
/// anything that prevents a correct layout is an error.
pub async fn export_project<T, A>(
    project: &Project,
    templates: &T,
    assets: &A,
    fonts: &FontBook,
    options: &ExportOptions,
) -> Result<ExportResult>
where
    T: TemplateProvider + ?Sized,
    A: AssetProvider,
{
    options.validate()?;

    let template_id = &project.template.id;
    let template = templates
        .get_template(template_id)
        .ok_or_else(|| ExportError::MissingTemplate(template_id.clone()))?;
    let sides = resolve(&template, project.page_count())?;
    if sides.is_empty() {
        return Err(ExportError::Config(format!(
            "project {} has no pages to print",
            project.id
        )));
    }

    let (sheet_width, sheet_height) = template.sheet_size();
    let (width, height) = options.raster_size(sheet_width, sheet_height);
    log::info!(
        "exporting {} with {}: {} side(s) at {}x{}px",
        project.name,
        template.id,
        sides.len(),
        width,
        height
    );

    let compositor = Compositor::new(assets, fonts, options);
    let guide_options = GuideOptions::from(options);
    let mut surface = Surface::new();
    let mut sheets = Vec::with_capacity(sides.len());
    let mut warnings = Vec::new();

    for (index, side) in sides.iter().enumerate() {
        log::debug!(
            "rendering sheet {} {:?} ({}/{})",
            side.sheet_index + 1,
            side.side,
            index + 1,
            sides.len()
        );
        let scene = build_scene(
            project,
            &template,
            side,
            &compositor,
            &guide_options,
            &mut warnings,
        )
        .await;

        settle(options.settle_delay_ms).await;

        let pixel_ratio = options.pixel_ratio;
        let (returned, image) = tokio::task::spawn_blocking(move || {
            let image = surface.render(&scene, pixel_ratio);
            (surface, image)
        })
        .await?;
        surface = returned;

        sheets.push(((side.sheet_index, side.side), image?));
    }

    let info = DocumentInfo {
        title: Some(project.name.clone()).filter(|name| !name.is_empty()),
        producer: Some(PRODUCER.to_string()),
    };
    let (keys, images): (Vec<_>, Vec<_>) = sheets.into_iter().unzip();
    let (images, document) = tokio::task::spawn_blocking(move || {
        let document = assemble_with_info(&images, sheet_width, sheet_height, &info);
        (images, document)
    })
    .await?;
    let document = document?;

    let images = keys
        .into_iter()
        .zip(images)
        .map(|((sheet_index, side), image)| SheetImage {
            sheet_index,
            side,
            image,
        })
        .collect();

    if !warnings.is_empty() {
        log::warn!("export finished with {} warning(s)", warnings.len());
    }

    Ok(ExportResult {
        images,
        document,
        width,
        height,
        warnings,
    })
}

async fn build_scene<A: AssetProvider>(
    project: &Project,
    template: &Template,
    side: &SheetSideLayout,
    compositor: &Compositor<'_, A>,
    guide_options: &GuideOptions,
    warnings: &mut Vec<ExportWarning>,
) -> Scene {
    let (sheet_width, sheet_height) = template.sheet_size();
    let mut scene = Scene::new(sheet_width, sheet_height);
    let filler = Page::blank(0, "");

    for slot in &side.slots {
        let page = if slot.is_blank_filler() {
            &filler
        } else {
            match project.page(slot.page_number) {
                Some(page) => page,
                None => {
                    log::warn!(
                        "page {} is not in project {}, leaving its slot empty",
                        slot.page_number,
                        project.id
                    );
                    continue;
                }
            }
        };
        let composed = compositor.compose(page, slot).await;
        scene.push(composed.node);
        warnings.extend(composed.warnings);
    }

    for line in guides(&template.format, sheet_width, sheet_height, guide_options) {
        scene.push(line.into_node());
    }

    scene
}
