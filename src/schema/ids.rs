use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares an opaque, globally unique id newtype over a v4 UUID.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an id from its hyphenated string form.
            pub fn parse(input: &str) -> Option<Self> {
                Uuid::parse_str(input).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Story
define_id!(StoryId);
define_id!(ElementId);
define_id!(PlotPointId);
define_id!(EventId);
define_id!(BranchId);

// Level
define_id!(LevelId);
define_id!(PoiId);
define_id!(ConnectionId);

// Quests
define_id!(QuestId);
define_id!(RequirementId);
define_id!(ObjectiveId);
define_id!(RewardId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = QuestId::new();
        let b = QuestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_accepts_display_form() {
        let id = PoiId::new();
        assert_eq!(PoiId::parse(&id.to_string()), Some(id));
        assert_eq!(PoiId::parse("not-a-uuid"), None);
    }
}
