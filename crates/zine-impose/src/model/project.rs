use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Content, Template};
use crate::types::Result;

/// Format version written for new projects (corrected cover placement)
pub const CURRENT_FORMAT_VERSION: u32 = 2;

/// One logical page of a zine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    /// 1-based page number
    pub page_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Vec<Content>,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Page {
    pub fn blank(page_number: u32, title: impl Into<String>) -> Self {
        Self {
            id: format!("page-{page_number}"),
            page_number,
            title: title.into(),
            content: Vec::new(),
            background_color: default_background(),
            background_image: None,
        }
    }

    /// Stable ascending sort by z-index; equal indices keep their list order.
    pub fn sort_by_z_index(&mut self) {
        self.content.sort_by_key(|c| c.z_index);
    }

    /// Reassign z-indices following `order` (content ids, bottom first).
    ///
    /// Ids not present on the page are ignored. Items missing from `order`
    /// are stacked above the listed ones in their current relative order.
    pub fn reorder_content(&mut self, order: &[&str]) {
        let mut next = 0;
        for id in order {
            if let Some(item) = self.content.iter_mut().find(|c| c.id == *id) {
                item.z_index = next;
                next += 1;
            }
        }
        self.sort_by_z_index();
        for item in self
            .content
            .iter_mut()
            .filter(|c| !order.contains(&c.id.as_str()))
        {
            item.z_index = next;
            next += 1;
        }
        self.sort_by_z_index();
    }

    /// Content in paint order (ascending z-index) without mutating the page
    pub fn content_in_paint_order(&self) -> Vec<&Content> {
        let mut items: Vec<&Content> = self.content.iter().collect();
        items.sort_by_key(|c| c.z_index);
        items
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectMetadata {
    pub author: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A zine document: a template binding plus its pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Copy of the template at creation time; export re-resolves it by id
    pub template: Template,
    pub pages: Vec<Page>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,
}

impl Project {
    /// Create a project with blank pages for every page the template declares.
    pub fn new(name: impl Into<String>, template: Template) -> Self {
        let now = Utc::now();
        let page_count = template.page_count;
        let pages = (1..=page_count)
            .map(|n| {
                let title = if n == 1 {
                    "Front Cover".to_string()
                } else if n == page_count {
                    "Back Cover".to_string()
                } else {
                    format!("Page {n}")
                };
                Page::blank(n, title)
            })
            .collect();

        Self {
            id: format!("project-{}", now.timestamp_millis()),
            name: name.into(),
            template,
            pages,
            created_at: now,
            modified_at: now,
            metadata: ProjectMetadata::default(),
            format_version: Some(CURRENT_FORMAT_VERSION),
        }
    }

    /// Parse the persisted document shape.
    ///
    /// Dates are re-hydrated from ISO-8601 strings; projects saved before
    /// format versioning are migrated to the current version.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut project: Project = serde_json::from_str(json)?;
        project.migrate();
        Ok(project)
    }

    /// Serialize to the persisted document shape (dates as ISO-8601).
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a project document from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mut project: Project = serde_json::from_slice(&bytes)?;
        project.migrate();
        Ok(project)
    }

    /// Save a project document to disk
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    fn migrate(&mut self) {
        if self.format_version.unwrap_or(0) == 0 {
            log::debug!(
                "project {} has no format version, migrating to {}",
                self.id,
                CURRENT_FORMAT_VERSION
            );
            self.format_version = Some(CURRENT_FORMAT_VERSION);
        }
    }

    /// Look up a page by its 1-based page number
    pub fn page(&self, page_number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
