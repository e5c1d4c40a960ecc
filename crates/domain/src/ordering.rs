//! Ordering-completion rule for owned children.
//!
//! A parent stores an explicit, possibly partial, list of child ids. The
//! resolved order is: every listed id that still exists, in list order,
//! followed by every unlisted child in natural (creation) order. Stale ids
//! are dropped and a child is never emitted twice.

use std::collections::HashMap;
use std::hash::Hash;

/// A record with a stable identifier.
pub trait Identified {
    type Id: Copy + Eq + Hash;

    fn id(&self) -> Self::Id;
}

/// Apply the ordering-completion rule.
///
/// `children` must already be in natural order.
#[must_use]
pub fn resolve_order<T: Identified>(children: Vec<T>, order: &[T::Id]) -> Vec<T> {
    if order.is_empty() {
        return children;
    }

    let index: HashMap<T::Id, usize> = children
        .iter()
        .enumerate()
        .map(|(pos, child)| (child.id(), pos))
        .collect();
    let mut slots: Vec<Option<T>> = children.into_iter().map(Some).collect();
    let mut resolved = Vec::with_capacity(slots.len());

    for id in order {
        if let Some(child) = index.get(id).and_then(|&pos| slots[pos].take()) {
            resolved.push(child);
        }
    }
    resolved.extend(slots.into_iter().flatten());
    resolved
}
