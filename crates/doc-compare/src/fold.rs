//! Folding hunk streams into change records.

use crate::types::{ChangeKey, ChangeRecord, Operation, OperationKind, PageComparison};
use indexmap::IndexMap;
use std::collections::HashMap;

/// A unit of change found while scanning a hunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlannedChange<'a> {
    /// A delete immediately followed by an insert
    Replace {
        delete: &'a Operation,
        insert: &'a Operation,
    },
    Single(&'a Operation),
}

impl PlannedChange<'_> {
    /// Replacements are keyed by the deleted text's origin
    pub fn key(&self, page_index: usize) -> ChangeKey {
        match self {
            PlannedChange::Replace { delete, .. } => ChangeKey::new(page_index, &delete.rect),
            PlannedChange::Single(op) => ChangeKey::new(page_index, &op.rect),
        }
    }

    fn to_record(self, page_index: usize) -> ChangeRecord {
        let mut record = ChangeRecord {
            page_index,
            ..Default::default()
        };
        match self {
            PlannedChange::Replace { delete, insert } => {
                apply_operation(&mut record, delete);
                apply_operation(&mut record, insert);
            }
            PlannedChange::Single(op) => apply_operation(&mut record, op),
        }
        record
    }
}

fn apply_operation(record: &mut ChangeRecord, op: &Operation) {
    match op.kind {
        OperationKind::Delete => {
            record.del = true;
            record.delete_text = Some(op.text.clone());
            record.original_rect = Some(op.rect);
        }
        OperationKind::Insert => {
            record.insert = true;
            record.insert_text = Some(op.text.clone());
            record.changed_rect = Some(op.rect);
        }
        OperationKind::Equal => {}
    }
}

/// Pair each delete with an insert that directly follows it; `equal`
/// operations are dropped before pairing.
pub fn plan_operations<'a, I>(operations: I) -> Vec<PlannedChange<'a>>
where
    I: IntoIterator<Item = &'a Operation>,
{
    let ops: Vec<&Operation> = operations
        .into_iter()
        .filter(|op| op.kind != OperationKind::Equal)
        .collect();

    let mut planned = Vec::with_capacity(ops.len());
    let mut i = 0;
    while i < ops.len() {
        let op = ops[i];
        match ops.get(i + 1) {
            Some(&next)
                if op.kind == OperationKind::Delete && next.kind == OperationKind::Insert =>
            {
                planned.push(PlannedChange::Replace {
                    delete: op,
                    insert: next,
                });
                i += 2;
            }
            _ => {
                planned.push(PlannedChange::Single(op));
                i += 1;
            }
        }
    }
    planned
}

/// Every planned change of a page, hunk by hunk
pub fn plan_page(page: &PageComparison) -> Vec<PlannedChange<'_>> {
    page.hunks
        .iter()
        .flat_map(|hunk| plan_operations(&hunk.operations))
        .collect()
}

fn merge_text(into: &mut Option<String>, from: Option<String>) {
    let Some(text) = from else {
        return;
    };
    match into {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(&text);
        }
        None => *into = Some(text),
    }
}

/// Ordered change records plus the annotation-id lookup.
///
/// Order is page order, then discovery order within the page. Records that
/// share a [`ChangeKey`] are merged, never duplicated.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    records: IndexMap<ChangeKey, ChangeRecord>,
    by_annotation: HashMap<String, usize>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold all pages without creating annotations
    pub fn from_pages<'a, I>(pages: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a PageComparison)>,
    {
        let mut set = Self::new();
        for (page_index, page) in pages {
            for change in plan_page(page) {
                set.record(page_index, change);
            }
        }
        set
    }

    /// Insert or merge a change; returns the record's position
    pub fn record(&mut self, page_index: usize, change: PlannedChange<'_>) -> usize {
        let key = change.key(page_index);
        let incoming = change.to_record(page_index);
        let entry = self.records.entry(key);
        let index = entry.index();
        match entry {
            indexmap::map::Entry::Occupied(mut slot) => {
                log::debug!("merging change at {}", slot.key());
                let existing = slot.get_mut();
                existing.del |= incoming.del;
                existing.insert |= incoming.insert;
                merge_text(&mut existing.delete_text, incoming.delete_text);
                merge_text(&mut existing.insert_text, incoming.insert_text);
                existing.original_rect = existing.original_rect.or(incoming.original_rect);
                existing.changed_rect = existing.changed_rect.or(incoming.changed_rect);
            }
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
        }
        index
    }

    /// Attach a created annotation to a record and index it
    pub fn attach_annotation(&mut self, index: usize, id: String) {
        if let Some((_, record)) = self.records.get_index_mut(index) {
            record.annotation_ids.push(id.clone());
            self.by_annotation.insert(id, index);
        }
    }

    pub fn index_of_annotation(&self, id: &str) -> Option<usize> {
        self.by_annotation.get(id).copied()
    }

    pub fn get(&self, index: usize) -> Option<&ChangeRecord> {
        self.records.get_index(index).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChangeKey, &ChangeRecord)> {
        self.records.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.by_annotation.clear();
    }
}
