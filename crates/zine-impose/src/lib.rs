pub mod assemble;
pub mod assets;
pub mod catalog;
pub mod color;
pub mod compose;
mod constants;
pub mod export;
pub mod fonts;
pub mod guides;
pub mod layout;
pub mod model;
mod options;
pub mod raster;
pub mod scene;
mod stats;
mod types;

pub use assemble::{DocumentInfo, assemble, assemble_with_info, save_document};
pub use assets::{AssetProvider, DirectoryAssets, NoAssets};
pub use catalog::{TemplateCatalog, TemplateProvider};
pub use export::{ExportResult, SheetImage, export_project};
pub use fonts::FontBook;
pub use guides::guides;
pub use layout::{SheetSide, SheetSideLayout, Slot, resolve};
pub use model::{Format, Project, Template};
pub use options::*;
pub use stats::{ImpositionPlan, plan_statistics};
pub use types::*;
