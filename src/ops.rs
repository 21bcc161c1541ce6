//! Rule operations - post-aggregation edits to a property's rule list.
//!
//! Operations exist to let a consumer override auto-discovered rule text
//! without silently masking a typo that no longer matches anything, so
//! every operation fails fast when its target is gone.

use crate::error::EnrichError;
use crate::rules::{PropertyPath, ValidationRule};

/// An edit applied to a property's aggregated rule list.
///
/// Operations run only after every rule source has contributed; they never
/// see partial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOperation {
    /// Rewrite the message of the unique rule whose message equals
    /// `old_message`.
    Alter {
        old_message: String,
        new_message: String,
    },
    /// Delete the unique rule whose message equals `message`.
    Remove { message: String },
    /// Clear the (non-empty) rule list.
    RemoveAll,
}

impl RuleOperation {
    pub fn alter(old_message: impl Into<String>, new_message: impl Into<String>) -> Self {
        RuleOperation::Alter {
            old_message: old_message.into(),
            new_message: new_message.into(),
        }
    }

    pub fn remove(message: impl Into<String>) -> Self {
        RuleOperation::Remove {
            message: message.into(),
        }
    }
}

/// Apply queued operations to a property's rule list, in declaration order.
///
/// `Alter` and `Remove` require exactly one rule whose message matches;
/// `RemoveAll` requires a non-empty list. Anything else is a configuration
/// error surfaced at document-build time, never silently ignored.
///
/// # Errors
///
/// Returns [`EnrichError`] naming the property and the unmatched message.
pub fn apply_operations(
    rules: &mut Vec<ValidationRule>,
    ops: &[RuleOperation],
    path: &PropertyPath,
) -> Result<(), EnrichError> {
    for op in ops {
        match op {
            RuleOperation::Alter {
                old_message,
                new_message,
            } => {
                let index = find_unique(rules, old_message, path, Target::Alter)?;
                rules[index].message = new_message.clone();
            }
            RuleOperation::Remove { message } => {
                let index = find_unique(rules, message, path, Target::Remove)?;
                rules.remove(index);
            }
            RuleOperation::RemoveAll => {
                if rules.is_empty() {
                    return Err(EnrichError::RemoveAllOnEmpty {
                        path: path.to_string(),
                    });
                }
                rules.clear();
            }
        }
    }
    Ok(())
}

enum Target {
    Alter,
    Remove,
}

fn find_unique(
    rules: &[ValidationRule],
    message: &str,
    path: &PropertyPath,
    target: Target,
) -> Result<usize, EnrichError> {
    let mut matches = rules
        .iter()
        .enumerate()
        .filter(|(_, r)| r.message == message);

    let first = matches.next();
    let count = 1 + matches.count();

    match first {
        None => Err(match target {
            Target::Alter => EnrichError::AlterTargetMissing {
                path: path.to_string(),
                message: message.to_string(),
            },
            Target::Remove => EnrichError::RemoveTargetMissing {
                path: path.to_string(),
                message: message.to_string(),
            },
        }),
        Some((index, _)) if count == 1 => Ok(index),
        Some(_) => Err(EnrichError::AmbiguousMessage {
            path: path.to_string(),
            message: message.to_string(),
            count,
        }),
    }
}
