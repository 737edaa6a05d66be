use std::collections::BTreeSet;

use crate::layout::resolve;
use crate::model::{Project, Template};
use crate::types::*;

/// Summary of what an export of a project will print
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImpositionPlan {
    /// Physical sheets
    pub sheet_count: usize,
    /// Printed sheet sides (= output images / PDF pages)
    pub side_count: usize,
    pub slot_count: usize,
    /// Page-0 filler cells
    pub blank_slots: usize,
    /// Page numbers placed on a sheet that the project does not have
    pub missing_pages: Vec<u32>,
}

impl ImpositionPlan {
    pub fn is_complete(&self) -> bool {
        self.missing_pages.is_empty()
    }
}

/// Calculate the imposition plan for `project` laid out with `template`
pub fn plan_statistics(project: &Project, template: &Template) -> Result<ImpositionPlan> {
    let sides = resolve(template, project.page_count())?;

    let sheets: BTreeSet<usize> = sides.iter().map(|s| s.sheet_index).collect();
    let mut plan = ImpositionPlan {
        sheet_count: sheets.len(),
        side_count: sides.len(),
        ..Default::default()
    };

    let mut missing = BTreeSet::new();
    for slot in sides.iter().flat_map(|s| &s.slots) {
        plan.slot_count += 1;
        if slot.is_blank_filler() {
            plan.blank_slots += 1;
        } else if project.page(slot.page_number).is_none() {
            missing.insert(slot.page_number);
        }
    }
    plan.missing_pages = missing.into_iter().collect();

    Ok(plan)
}
