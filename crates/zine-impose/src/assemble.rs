//! Document assembly
//!
//! Sheet images become a PDF with one page per image. Every page's MediaBox
//! is exactly the sheet size in points and the raster is drawn over the
//! whole page, so the physical size is independent of the pixel ratio.

use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::Path;

use crate::types::*;

/// Optional document information entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub producer: Option<String>,
}

/// Assemble sheet images into PDF bytes.
pub fn assemble(images: &[RgbaImage], sheet_width_pt: f32, sheet_height_pt: f32) -> Result<Vec<u8>> {
    assemble_with_info(images, sheet_width_pt, sheet_height_pt, &DocumentInfo::default())
}

/// Assemble sheet images into PDF bytes with an Info dictionary.
pub fn assemble_with_info(
    images: &[RgbaImage],
    sheet_width_pt: f32,
    sheet_height_pt: f32,
    info: &DocumentInfo,
) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(ExportError::Config(
            "Cannot assemble a document from zero images".to_string(),
        ));
    }
    if !(sheet_width_pt.is_finite() && sheet_height_pt.is_finite())
        || sheet_width_pt <= 0.0
        || sheet_height_pt <= 0.0
    {
        return Err(ExportError::Config(format!(
            "Invalid sheet size {}x{}pt",
            sheet_width_pt, sheet_height_pt
        )));
    }

    let orientation = Orientation::from_points(sheet_width_pt, sheet_height_pt);
    log::debug!(
        "assembling {} page(s) at {:.2}x{:.2}in ({:?})",
        images.len(),
        sheet_width_pt / crate::constants::POINTS_PER_INCH,
        sheet_height_pt / crate::constants::POINTS_PER_INCH,
        orientation
    );

    let mut output = Document::with_version("1.5");
    let pages_id = output.new_object_id();

    let mut page_refs = Vec::with_capacity(images.len());
    for image in images {
        let page_id = add_image_page(&mut output, image, sheet_width_pt, sheet_height_pt, pages_id)?;
        page_refs.push(Object::Reference(page_id));
    }

    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    if info.title.is_some() || info.producer.is_some() {
        let mut info_dict = Dictionary::new();
        if let Some(title) = &info.title {
            info_dict.set("Title", Object::string_literal(title.as_str()));
        }
        if let Some(producer) = &info.producer {
            info_dict.set("Producer", Object::string_literal(producer.as_str()));
        }
        let info_id = output.add_object(info_dict);
        output.trailer.set("Info", info_id);
    }

    let mut writer = Vec::new();
    output.save_to(&mut writer)?;
    Ok(writer)
}

/// One page showing `image` stretched over the full MediaBox
fn add_image_page(
    output: &mut Document,
    image: &RgbaImage,
    width_pt: f32,
    height_pt: f32,
    parent_pages_id: lopdf::ObjectId,
) -> Result<lopdf::ObjectId> {
    let (px_width, px_height) = image.dimensions();
    if px_width == 0 || px_height == 0 {
        return Err(ExportError::Config("Cannot embed an empty image".to_string()));
    }

    let image_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(px_width as i64)),
        ("Height", Object::Integer(px_height as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ]);
    let mut image_stream = Stream::new(image_dict, rgb_over_white(image));
    image_stream.compress()?;
    let image_id = output.add_object(image_stream);

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = format!("q\n{} 0 0 {} 0 0 cm\n/Im0 Do\nQ\n", width_pt, height_pt);
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width_pt),
            Object::Real(height_pt),
        ]),
    );
    page_dict.set("Resources", Object::Dictionary(resources));
    page_dict.set("Contents", Object::Reference(content_id));

    Ok(output.add_object(page_dict))
}

/// Packed 8-bit RGB, compositing any translucent pixel over white
fn rgb_over_white(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.as_raw().len() / 4 * 3);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        if a == 255 {
            rgb.extend_from_slice(&[r, g, b]);
        } else {
            let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16) + 127) / 255) as u8;
            rgb.extend_from_slice(&[blend(r), blend(g), blend(b)]);
        }
    }
    rgb
}

/// Write document bytes to disk
pub async fn save_document(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
