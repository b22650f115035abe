//! Collaborator surfaces the engine consumes, plus a reference
//! implementation.
//!
//! The engine never owns sites, inventories, or personnel; it reads them
//! through [`Inventory`] and mutates worker bookkeeping through
//! [`Workforce`]. [`CampaignWorld`] is a self-contained implementation of
//! both, used by the data pipeline, the integration tests, and the benches.

use crate::id::{ItemId, SiteId, SpeciesId};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Whether a captured specimen is alive or dead. Site containment tracks
/// the two populations separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vitality {
    Alive,
    Dead,
}

/// Read-only inventory queries used by requirement evaluation.
pub trait Inventory {
    /// Units of `item` stocked at `site`.
    fn item_count(&self, site: SiteId, item: ItemId) -> u32;

    /// Specimens of `species` with the given vitality held at `site`.
    fn specimen_count(&self, site: SiteId, species: SpeciesId, vitality: Vitality) -> u32;

    /// All specimens campaign-wide, any site, any vitality.
    fn specimen_count_global(&self) -> u32;
}

// ---------------------------------------------------------------------------
// Workforce
// ---------------------------------------------------------------------------

/// Laboratory capacity at a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabCapacity {
    /// Lab seats currently occupied. Mirrors the sum of workers assigned to
    /// topics pinned to this site.
    pub used: u32,
    /// Seat ceiling.
    pub max: u32,
}

impl LabCapacity {
    pub fn free(self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

/// Worker-pool queries and bookkeeping used by the allocation scheduler.
/// The engine is the only caller of `occupy`/`release`, and calls them in
/// matched pairs per worker.
pub trait Workforce {
    /// Unassigned workers idling at `site`.
    fn free_workers(&self, site: SiteId) -> u32;

    /// Current lab seat usage and ceiling at `site`.
    fn capacity(&self, site: SiteId) -> LabCapacity;

    /// Move one worker from the idle pool into a lab seat.
    fn occupy(&mut self, site: SiteId);

    /// Return one worker from a lab seat to the idle pool.
    fn release(&mut self, site: SiteId);

    /// Whether research effort accrues at `site` this tick. A site that is
    /// not operational freezes progress without halting anything.
    fn research_allowed(&self, site: SiteId) -> bool;
}

// ---------------------------------------------------------------------------
// CampaignWorld — reference implementation
// ---------------------------------------------------------------------------

/// Per-site state in the reference world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    /// Lab seat ceiling.
    pub lab_space: u32,
    /// Lab seats occupied.
    pub lab_used: u32,
    /// Workers hired but not assigned to any topic.
    pub idle_workers: u32,
    /// False while the site is under attack or its lab is down.
    pub operational: bool,
    stock: HashMap<ItemId, u32>,
    specimens: HashMap<(SpeciesId, Vitality), u32>,
}

/// A minimal campaign world: interned item/species names and a slot map of
/// sites. Implements both collaborator traits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignWorld {
    item_names: Vec<String>,
    item_ids: HashMap<String, ItemId>,
    species_names: Vec<String>,
    species_ids: HashMap<String, SpeciesId>,
    pub sites: SlotMap<SiteId, Site>,
}

impl CampaignWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item name, returning its id. Idempotent per name.
    pub fn register_item(&mut self, name: &str) -> ItemId {
        if let Some(&id) = self.item_ids.get(name) {
            return id;
        }
        let id = ItemId(self.item_names.len() as u32);
        self.item_names.push(name.to_string());
        self.item_ids.insert(name.to_string(), id);
        id
    }

    /// Register a species name, returning its id. Idempotent per name.
    pub fn register_species(&mut self, name: &str) -> SpeciesId {
        if let Some(&id) = self.species_ids.get(name) {
            return id;
        }
        let id = SpeciesId(self.species_names.len() as u32);
        self.species_names.push(name.to_string());
        self.species_ids.insert(name.to_string(), id);
        id
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_ids.get(name).copied()
    }

    pub fn species_id(&self, name: &str) -> Option<SpeciesId> {
        self.species_ids.get(name).copied()
    }

    /// Add a site with the given lab ceiling and hired (idle) workers.
    pub fn add_site(&mut self, name: &str, lab_space: u32, workers: u32) -> SiteId {
        self.sites.insert(Site {
            name: name.to_string(),
            lab_space,
            lab_used: 0,
            idle_workers: workers,
            operational: true,
            stock: HashMap::new(),
            specimens: HashMap::new(),
        })
    }

    pub fn add_items(&mut self, site: SiteId, item: ItemId, amount: u32) {
        if let Some(s) = self.sites.get_mut(site) {
            *s.stock.entry(item).or_insert(0) += amount;
        }
    }

    /// Remove up to `amount` of `item` from the site's stock.
    pub fn remove_items(&mut self, site: SiteId, item: ItemId, amount: u32) {
        if let Some(s) = self.sites.get_mut(site)
            && let Some(held) = s.stock.get_mut(&item)
        {
            *held = held.saturating_sub(amount);
        }
    }

    pub fn add_specimens(
        &mut self,
        site: SiteId,
        species: SpeciesId,
        vitality: Vitality,
        amount: u32,
    ) {
        if let Some(s) = self.sites.get_mut(site) {
            *s.specimens.entry((species, vitality)).or_insert(0) += amount;
        }
    }

    pub fn set_operational(&mut self, site: SiteId, operational: bool) {
        if let Some(s) = self.sites.get_mut(site) {
            s.operational = operational;
        }
    }

    /// Shrink a site's lab ceiling (a destroyed facility). The caller is
    /// expected to run the engine's capacity enforcement afterwards.
    pub fn set_lab_space(&mut self, site: SiteId, lab_space: u32) {
        if let Some(s) = self.sites.get_mut(site) {
            s.lab_space = lab_space;
        }
    }

    pub fn hire_workers(&mut self, site: SiteId, amount: u32) {
        if let Some(s) = self.sites.get_mut(site) {
            s.idle_workers += amount;
        }
    }
}

impl Inventory for CampaignWorld {
    fn item_count(&self, site: SiteId, item: ItemId) -> u32 {
        self.sites
            .get(site)
            .and_then(|s| s.stock.get(&item).copied())
            .unwrap_or(0)
    }

    fn specimen_count(&self, site: SiteId, species: SpeciesId, vitality: Vitality) -> u32 {
        self.sites
            .get(site)
            .and_then(|s| s.specimens.get(&(species, vitality)).copied())
            .unwrap_or(0)
    }

    fn specimen_count_global(&self) -> u32 {
        self.sites
            .values()
            .flat_map(|s| s.specimens.values())
            .sum()
    }
}

impl Workforce for CampaignWorld {
    fn free_workers(&self, site: SiteId) -> u32 {
        self.sites.get(site).map(|s| s.idle_workers).unwrap_or(0)
    }

    fn capacity(&self, site: SiteId) -> LabCapacity {
        self.sites
            .get(site)
            .map(|s| LabCapacity {
                used: s.lab_used,
                max: s.lab_space,
            })
            .unwrap_or(LabCapacity { used: 0, max: 0 })
    }

    fn occupy(&mut self, site: SiteId) {
        if let Some(s) = self.sites.get_mut(site) {
            s.idle_workers = s.idle_workers.saturating_sub(1);
            s.lab_used += 1;
        }
    }

    fn release(&mut self, site: SiteId) {
        if let Some(s) = self.sites.get_mut(site) {
            s.lab_used = s.lab_used.saturating_sub(1);
            s.idle_workers += 1;
        }
    }

    fn research_allowed(&self, site: SiteId) -> bool {
        self.sites
            .get(site)
            .map(|s| s.operational && s.lab_space > 0)
            .unwrap_or(false)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
