use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a research site (base/facility) in the campaign world.
    pub struct SiteId;
}

/// Identifies a topic in the catalog. Dense index assigned at build time,
/// stable for the lifetime of the session. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId(pub u32);

/// Identifies an item type in the collaborator inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies an alien species in the collaborator containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u32);

/// Identifies a product (item/building/craft) a topic provides. Interned
/// from the `provides` strings at catalog build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u32);

impl TopicId {
    /// Index into the catalog's dense topic array.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
