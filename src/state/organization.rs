//! Organization selection state
//!
//! [`OrganizationStore`] keeps what the user confirmed (checked persons and
//! areas); [`OrganizationPicker`] holds the in-progress selection of one
//! picker screen until it is confirmed.

use crate::api::{AreaItem, Personnel};
use crate::error::{Error, Result};
use serde::Serialize;

/// Areas flattened for form submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaCheckedInfo {
    /// Every selected area id
    pub area_id: Vec<String>,
    /// `area_id` joined with commas
    pub area_ids: String,
    /// Names of the selected root areas, joined with commas
    pub area_names: String,
}

impl AreaCheckedInfo {
    pub fn from_areas(areas: &[AreaItem]) -> Self {
        let area_id: Vec<String> = areas.iter().map(|a| a.id.clone()).collect();
        let area_ids = area_id.join(",");
        let area_names = areas
            .iter()
            .filter(|a| a.parent_id == "0")
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            area_id,
            area_ids,
            area_names,
        }
    }
}

/// Confirmed selections
#[derive(Debug, Clone, Default)]
pub struct OrganizationStore {
    checked_persons: Vec<Personnel>,
    areas: Vec<AreaItem>,
    area_info: AreaCheckedInfo,
}

impl OrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checked_persons(&self) -> &[Personnel] {
        &self.checked_persons
    }

    pub fn set_checked_persons(&mut self, persons: Vec<Personnel>) {
        self.checked_persons = persons;
    }

    pub fn clear_checked_persons(&mut self) {
        self.checked_persons.clear();
    }

    pub fn areas(&self) -> &[AreaItem] {
        &self.areas
    }

    /// Replace the area list and recompute [`AreaCheckedInfo`]
    pub fn set_areas(&mut self, areas: Vec<AreaItem>) {
        self.area_info = AreaCheckedInfo::from_areas(&areas);
        self.areas = areas;
    }

    pub fn area_info(&self) -> &AreaCheckedInfo {
        &self.area_info
    }

    pub fn clear_all(&mut self) {
        self.checked_persons.clear();
        self.areas.clear();
        self.area_info = AreaCheckedInfo::default();
    }
}

/// A fetched record annotated with its selection state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerRow {
    #[serde(flatten)]
    pub person: Personnel,
    pub checked: bool,
}

/// In-progress person selection, keyed by record `id`
///
/// Department rows (`is_parent`) navigate the tree and are never selected.
#[derive(Debug, Clone)]
pub struct OrganizationPicker {
    multiple: bool,
    max_selected: Option<usize>,
    selected: Vec<Personnel>,
}

impl Default for OrganizationPicker {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OrganizationPicker {
    pub fn new(multiple: bool) -> Self {
        Self {
            multiple,
            max_selected: None,
            selected: Vec::new(),
        }
    }

    pub fn with_max_selected(mut self, max: usize) -> Self {
        self.max_selected = Some(max);
        self
    }

    /// Start from a previous confirmation
    pub fn with_selected(mut self, persons: impl IntoIterator<Item = Personnel>) -> Self {
        for person in persons {
            if !person.is_parent && !self.is_selected(&person.id) {
                self.selected.push(person);
            }
        }
        self
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|p| p.id == id)
    }

    pub fn selected(&self) -> &[Personnel] {
        &self.selected
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    fn is_full(&self) -> bool {
        self.max_selected.is_some_and(|max| self.selected.len() >= max)
    }

    /// Flip one person's selection; returns whether it is now selected
    ///
    /// Single-select pickers replace the current selection.
    pub fn toggle(&mut self, person: &Personnel) -> Result<bool> {
        if person.is_parent {
            return Err(Error::invalid("Departments cannot be selected"));
        }

        if let Some(index) = self.selected.iter().position(|p| p.id == person.id) {
            self.selected.remove(index);
            return Ok(false);
        }

        if !self.multiple {
            self.selected.clear();
        } else if let Some(max) = self.max_selected.filter(|_| self.is_full()) {
            return Err(Error::Invalid {
                message: format!("At most {max} people can be selected"),
            });
        }

        self.selected.push(person.clone());
        Ok(true)
    }

    /// Select every record on the current page, up to the limit
    ///
    /// Returns how many were newly selected. No-op for single-select pickers.
    pub fn select_all(&mut self, page: &[Personnel]) -> usize {
        if !self.multiple {
            return 0;
        }

        let mut added = 0;
        for person in page.iter().filter(|p| !p.is_parent) {
            if self.is_full() {
                break;
            }
            if !self.is_selected(&person.id) {
                self.selected.push(person.clone());
                added += 1;
            }
        }
        added
    }

    /// Whether every selectable record on `page` is selected
    pub fn is_all_selected(&self, page: &[Personnel]) -> bool {
        let mut people = page.iter().filter(|p| !p.is_parent).peekable();
        people.peek().is_some() && people.all(|p| self.is_selected(&p.id))
    }

    /// Deselect every record on the current page
    pub fn deselect_all(&mut self, page: &[Personnel]) {
        self.selected
            .retain(|s| !page.iter().any(|p| p.id == s.id));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Mark fetched records with their selection state
    pub fn annotate(&self, records: &[Personnel]) -> Vec<PickerRow> {
        records
            .iter()
            .map(|person| PickerRow {
                person: person.clone(),
                checked: !person.is_parent && self.is_selected(&person.id),
            })
            .collect()
    }

    /// Commit the selection into `store`
    pub fn confirm(&self, store: &mut OrganizationStore) -> Vec<Personnel> {
        store.set_checked_persons(self.selected.clone());
        self.selected.clone()
    }
}
