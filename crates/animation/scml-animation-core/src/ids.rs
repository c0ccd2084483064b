//! Identifiers for document records.
//!
//! Every record in a loaded document is addressed by the integer id the
//! document itself assigns. The format's `-1` "none" sentinel never becomes an
//! id; it maps to `Option::None` at load time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<$name> for u32 {
            #[inline]
            fn from(v: $name) -> u32 {
                v.0
            }
        }
    };
}

document_id!(
    /// Entity (character) id within a document.
    EntityId
);
document_id!(
    /// Animation id within an entity.
    AnimId
);
document_id!(
    /// Key id within a mainline or a timeline.
    KeyId
);
document_id!(TimelineId);
document_id!(
    /// Bone or object slot id inside a mainline key. Bones and objects are
    /// separate namespaces.
    SlotId
);
document_id!(FolderId);
document_id!(FileId);
document_id!(CharacterMapId);

/// Convert the format's signed id (where any negative value means "none").
#[inline]
pub(crate) fn optional_id<T: From<u32>>(raw: i64) -> Option<T> {
    u32::try_from(raw).ok().map(T::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_map_to_none() {
        assert_eq!(optional_id::<SlotId>(-1), None);
        assert_eq!(optional_id::<SlotId>(3), Some(SlotId(3)));
    }

    #[test]
    fn ids_order_by_value() {
        let mut ids = vec![KeyId(3), KeyId(1), KeyId(2)];
        ids.sort();
        assert_eq!(ids, vec![KeyId(1), KeyId(2), KeyId(3)]);
    }
}
