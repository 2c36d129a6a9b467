use crate::work_item::WorkItem;
use std::collections::HashSet;
use thiserror::Error;

pub const MIN_COMPLEXITY: u8 = 1;
pub const MAX_COMPLEXITY: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ItemValidationError {
    message: String,
}

impl ItemValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn validate_item(item: &WorkItem) -> Result<(), ItemValidationError> {
    if item.id.trim().is_empty() {
        return Err(ItemValidationError::new(format!(
            "work item '{}' has a blank id",
            item.title
        )));
    }

    if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&item.complexity) {
        return Err(ItemValidationError::new(format!(
            "work item {} has complexity {} (must be between {} and {})",
            item.id, item.complexity, MIN_COMPLEXITY, MAX_COMPLEXITY
        )));
    }

    for (idx, declaration) in item.dependencies.iter().enumerate() {
        if declaration.target.trim().is_empty() {
            return Err(ItemValidationError::new(format!(
                "work item {} dependency #{} requires a non-empty target",
                item.id, idx
            )));
        }
    }

    Ok(())
}

pub fn validate_item_collection(items: &[WorkItem]) -> Result<(), ItemValidationError> {
    let mut seen_ids = HashSet::with_capacity(items.len());
    for item in items {
        if !seen_ids.insert(item.id.as_str()) {
            return Err(ItemValidationError::new(format!(
                "duplicate work item id {}",
                item.id
            )));
        }
        validate_item(item)?;
    }
    Ok(())
}
