//! Definition-to-usage grouping.

use super::scope::{Bindings, DefId};
use super::Reference;

/// One [`Reference`] per definition, in declaration order, each listing the
/// ranges of the identifiers that resolve to it.
pub fn resolve(bindings: &Bindings) -> Vec<Reference> {
    bindings
        .definitions
        .iter()
        .enumerate()
        .map(|(i, def)| Reference {
            name: def.name.clone(),
            kind: def.kind.reference_kind(),
            definition: def.range,
            usages: bindings.uses_of(DefId(i)).map(|u| u.range).collect(),
        })
        .collect()
}
