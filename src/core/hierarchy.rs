//! Hierarchy navigation over a flat list of line items.
//!
//! Ownership is positional: a section owns every following row up to the next
//! section, and a subsection owns every following row up to the next
//! subsection or section. Nothing here caches a tree; callers re-derive on
//! every read, so reorders and deletions can never leave a stale parent.

use crate::core::line_item::LineItem;

/// Index of the section owning the row at `index`, scanning backward from
/// `index - 1`. `None` for orphaned rows.
#[must_use]
pub fn owner_section(items: &[LineItem], index: usize) -> Option<usize> {
    items[..index.min(items.len())]
        .iter()
        .rposition(LineItem::is_section)
}

/// Index of the subsection owning the row at `index`.
///
/// The backward scan stops at the first section: a subsection only owns rows
/// that come after it within the same section.
#[must_use]
pub fn owner_subsection(items: &[LineItem], index: usize) -> Option<usize> {
    for (i, item) in items[..index.min(items.len())].iter().enumerate().rev() {
        if item.is_section() {
            return None;
        }
        if item.is_subsection() {
            return Some(i);
        }
    }
    None
}

/// Indices of the billable rows owned by the heading at `index`.
///
/// Empty when `index` is not a section or subsection.
#[must_use]
pub fn owned_billable_rows(items: &[LineItem], index: usize) -> Vec<usize> {
    let Some(owner) = items.get(index) else {
        return Vec::new();
    };
    let stops_at_subsection = if owner.is_section() {
        false
    } else if owner.is_subsection() {
        true
    } else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .skip(index + 1)
        .take_while(|(_, item)| {
            !(item.is_section() || (stops_at_subsection && item.is_subsection()))
        })
        .filter(|(_, item)| item.is_billable())
        .map(|(i, _)| i)
        .collect()
}

/// Display numbers for every row.
///
/// Sections are numbered 1, 2, 3...; subsections `{section}.{n}` with `n`
/// restarting in each section; billable rows inherit the number of their
/// nearest heading. Text rows, orphaned billable rows, and subsections placed
/// before any section have no number.
#[must_use]
pub fn renumber(items: &[LineItem]) -> Vec<Option<String>> {
    let mut section_no = 0_u32;
    let mut subsection_no = 0_u32;
    let mut current: Option<String> = None;

    items
        .iter()
        .map(|item| {
            if item.is_section() {
                section_no += 1;
                subsection_no = 0;
                current = Some(section_no.to_string());
                current.clone()
            } else if item.is_subsection() {
                if section_no == 0 {
                    current = None;
                } else {
                    subsection_no += 1;
                    current = Some(format!("{section_no}.{subsection_no}"));
                }
                current.clone()
            } else if item.is_billable() {
                current.clone()
            } else {
                None
            }
        })
        .collect()
}

/// Orders rows by `position`, keeping the relative order of equal positions.
pub fn sort_by_position(items: &mut [LineItem]) {
    items.sort_by_key(|item| item.position);
}

/// Rewrites positions to 1..=n following the current order.
pub fn reindex_positions(items: &mut [LineItem]) {
    for (position, item) in (1..).zip(items.iter_mut()) {
        item.position = position;
    }
}
