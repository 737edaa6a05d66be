//! Font resolution for text elements
//!
//! A [`FontBook`] answers "which font face draws this family/weight/style".
//! Fonts registered by the caller win, then the fallback font; otherwise
//! the system font database is queried by the fonts' own family names.
//! Lookups that miss everywhere return `None` and the text element is
//! reported as a `FontUnavailable` warning.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use crate::model::{FontStyle, FontWeight};
use crate::types::{ExportError, Result};

/// Parsed-once font file bytes
pub struct FontData {
    bytes: Arc<Vec<u8>>,
    index: u32,
    name: String,
}

impl FontData {
    /// Validate `bytes` as a TrueType/OpenType font (first face of a collection).
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        Self::from_collection(name, bytes, 0)
    }

    /// Validate face `index` of a font file or collection.
    pub fn from_collection(name: impl Into<String>, bytes: Vec<u8>, index: u32) -> Result<Self> {
        let name = name.into();
        ttf_parser::Face::parse(&bytes, index)
            .map_err(|e| ExportError::Config(format!("Font '{}' is not usable: {}", name, e)))?;
        Ok(Self {
            bytes: Arc::new(bytes),
            index,
            name,
        })
    }

    /// Parse the face for outlines and metrics. Bytes were validated on construction.
    pub fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.bytes, self.index).ok()
    }

    /// Parse the face for shaping
    pub fn shaping_face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.bytes, self.index)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontData")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("len", &self.bytes.len())
            .finish()
    }
}

struct RegisteredFont {
    family: String,
    weight: FontWeight,
    style: FontStyle,
    data: Arc<FontData>,
}

/// Registered fonts plus optional system font lookup
pub struct FontBook {
    registered: Vec<RegisteredFont>,
    fallback: Option<Arc<FontData>>,
    system_fonts: bool,
    system_cache: Mutex<HashMap<fontdb::ID, Arc<FontData>>>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook")
            .field("registered", &self.registered.len())
            .field("fallback", &self.fallback.is_some())
            .field("system_fonts", &self.system_fonts)
            .finish()
    }
}

impl FontBook {
    /// Font book that also queries the system font database
    pub fn new() -> Self {
        Self {
            registered: Vec::new(),
            fallback: None,
            system_fonts: true,
            system_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Font book limited to explicitly registered fonts
    pub fn without_system_fonts() -> Self {
        Self {
            system_fonts: false,
            ..Self::new()
        }
    }

    /// Register a font for a family/weight/style combination.
    pub fn register(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let data = FontData::from_bytes(family, bytes)?;
        self.registered.push(RegisteredFont {
            family: normalize_family(family),
            weight,
            style,
            data: Arc::new(data),
        });
        Ok(())
    }

    /// Register a font used for any family nothing else matches.
    pub fn register_fallback(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.fallback = Some(Arc::new(FontData::from_bytes("fallback", bytes)?));
        Ok(())
    }

    /// Read a font file and register it.
    pub async fn register_file(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        self.register(family, weight, style, bytes)
    }

    /// Resolve a CSS font-family list (`"Inter, Arial, sans-serif"`).
    pub fn resolve(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<Arc<FontData>> {
        let families: Vec<String> = family
            .split(',')
            .map(normalize_family)
            .filter(|f| !f.is_empty())
            .collect();

        for wanted in &families {
            if let Some(font) = self.registered_match(wanted, weight, style) {
                return Some(font);
            }
        }
        if let Some(fallback) = &self.fallback {
            return Some(fallback.clone());
        }
        if !self.system_fonts {
            return None;
        }
        self.system_font(&families, weight, style)
    }

    fn registered_match(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<Arc<FontData>> {
        let same_family = || self.registered.iter().filter(move |f| f.family == family);
        same_family()
            .find(|f| f.weight == weight && f.style == style)
            .or_else(|| same_family().find(|f| f.style == style))
            .or_else(|| same_family().next())
            .map(|f| f.data.clone())
    }

    /// Query the system database; sans-serif is always the last resort.
    fn system_font(
        &self,
        families: &[String],
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<Arc<FontData>> {
        let db = system_database();
        let mut query_families: Vec<fontdb::Family<'_>> =
            families.iter().map(|f| to_fontdb_family(f)).collect();
        query_families.push(fontdb::Family::SansSerif);

        let query = fontdb::Query {
            families: &query_families,
            weight: to_fontdb_weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: to_fontdb_style(style),
        };
        let Some(id) = db.query(&query) else {
            log::debug!("no system font for {:?} ({:?} {:?})", families, weight, style);
            return None;
        };

        if let Ok(cache) = self.system_cache.lock() {
            if let Some(font) = cache.get(&id) {
                return Some(font.clone());
            }
        }

        let name = db
            .face(id)
            .map(|info| info.post_script_name.clone())
            .unwrap_or_else(|| families.join(","));
        let loaded = db
            .with_face_data(id, |data, index| {
                FontData::from_collection(name.clone(), data.to_vec(), index)
            })
            .and_then(|parsed| match parsed {
                Ok(font) => Some(Arc::new(font)),
                Err(e) => {
                    log::debug!("system font {} failed to load: {}", name, e);
                    None
                }
            })?;
        log::debug!("resolved {:?} ({:?} {:?}) to {}", families, weight, style, name);

        if let Ok(mut cache) = self.system_cache.lock() {
            cache.insert(id, loaded.clone());
        }
        Some(loaded)
    }
}

fn normalize_family(family: &str) -> String {
    family
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_ascii_lowercase()
}

// =============================================================================
// System Fonts
// =============================================================================

/// System fonts plus any directories listed in `ZINE_FONT_DIR`, loaded on first use.
fn system_database() -> &'static fontdb::Database {
    static DATABASE: OnceLock<fontdb::Database> = OnceLock::new();
    DATABASE.get_or_init(|| {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(extra) = std::env::var_os("ZINE_FONT_DIR") {
            for dir in std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()) {
                db.load_fonts_dir(dir);
            }
        }
        assign_generic_families(&mut db);
        log::debug!("system font database holds {} faces", db.len());
        db
    })
}

/// Point the generic families at fonts that are actually installed.
fn assign_generic_families(db: &mut fontdb::Database) {
    let installed = |db: &fontdb::Database, names: &[&'static str]| -> Option<&'static str> {
        names.iter().copied().find(|name| {
            db.faces()
                .any(|face| face.families.iter().any(|(family, _)| family == name))
        })
    };

    if let Some(name) = installed(
        &*db,
        &["Arial", "Helvetica", "Liberation Sans", "DejaVu Sans", "Noto Sans"],
    ) {
        db.set_sans_serif_family(name);
    }
    if let Some(name) = installed(
        &*db,
        &["Times New Roman", "Times", "Liberation Serif", "DejaVu Serif", "Noto Serif"],
    ) {
        db.set_serif_family(name);
    }
    if let Some(name) = installed(
        &*db,
        &["Courier New", "Courier", "Liberation Mono", "DejaVu Sans Mono", "Noto Sans Mono"],
    ) {
        db.set_monospace_family(name);
    }
}

/// CSS generic names map to fontdb generics; anything else is a family name.
/// Family names match case-insensitively in fontdb, so the lowercased form is fine.
fn to_fontdb_family(family: &str) -> fontdb::Family<'_> {
    match family {
        "sans-serif" | "system-ui" => fontdb::Family::SansSerif,
        "serif" => fontdb::Family::Serif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        name => fontdb::Family::Name(name),
    }
}

fn to_fontdb_weight(weight: FontWeight) -> fontdb::Weight {
    match weight {
        FontWeight::Normal => fontdb::Weight::NORMAL,
        FontWeight::Bold => fontdb::Weight::BOLD,
    }
}

fn to_fontdb_style(style: FontStyle) -> fontdb::Style {
    match style {
        FontStyle::Normal => fontdb::Style::Normal,
        FontStyle::Italic => fontdb::Style::Italic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_family() {
        assert_eq!(normalize_family(" 'Open Sans' "), "open sans");
        assert_eq!(normalize_family("\"Arial\""), "arial");
    }

    #[test]
    fn test_empty_book_resolves_nothing() {
        let book = FontBook::without_system_fonts();
        assert!(
            book.resolve("Arial", FontWeight::Normal, FontStyle::Normal)
                .is_none()
        );
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut book = FontBook::without_system_fonts();
        let err = book
            .register("Junk", FontWeight::Normal, FontStyle::Normal, vec![0, 1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn test_generic_families_map_to_fontdb() {
        assert_eq!(to_fontdb_family("sans-serif"), fontdb::Family::SansSerif);
        assert_eq!(to_fontdb_family("monospace"), fontdb::Family::Monospace);
        assert_eq!(
            to_fontdb_family("open sans"),
            fontdb::Family::Name("open sans")
        );
    }

    #[test]
    fn test_italic_request_gets_slanted_face() {
        let book = FontBook::new();
        for family in ["DejaVu Sans", "DejaVu Sans Mono"] {
            let upright = book.resolve(family, FontWeight::Normal, FontStyle::Normal);
            let Some(upright) = upright else {
                eprintln!("{family} is not installed, skipping");
                continue;
            };
            let italic = book
                .resolve(family, FontWeight::Normal, FontStyle::Italic)
                .unwrap();
            let face = italic.face().unwrap();
            assert!(
                face.is_italic() || face.is_oblique(),
                "{family} italic resolved to {}",
                italic.name()
            );
            assert_ne!(italic.name(), upright.name());
        }
    }

    #[test]
    fn test_bold_request_gets_bold_face() {
        let book = FontBook::new();
        let Some(bold) = book.resolve("DejaVu Sans", FontWeight::Bold, FontStyle::Normal) else {
            eprintln!("DejaVu Sans is not installed, skipping");
            return;
        };
        assert!(bold.face().unwrap().is_bold(), "resolved to {}", bold.name());
    }
}
