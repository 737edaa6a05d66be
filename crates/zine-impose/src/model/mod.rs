//! Zine document model
//!
//! Projects, pages and content as the editor persists them, plus the
//! template definitions they are bound to.

mod content;
mod project;
mod template;

pub use content::*;
pub use project::*;
pub use template::*;
