//! The catalog: every topic, built once from definitions, with id and
//! provides indices.
//!
//! Construction is the single point where symbolic references (tech ids,
//! item names, species names, redirect targets, description gates) become
//! direct ids. Any unresolved reference or duplicate is a [`CatalogError`]
//! naming the offending topic; nothing is deferred to evaluation time.

use crate::effort::Fixed64;
use crate::id::{ItemId, ProductId, SpeciesId, TopicId};
use crate::requirement::{Requirement, RequirementSet};
use crate::topic::{DescriptionList, MailState, ResearchStatus, Topic, TopicKind};
use crate::world::Vitality;
use std::collections::HashMap;

/// Default research-result text when the data files define none.
pub const DEFAULT_DESCRIPTION: &str = "No description available.";
/// Default research-proposal text when the data files define none.
pub const DEFAULT_PROPOSAL: &str = "No research proposal available.";

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

/// Maps external symbolic names (items, species) to ids. Implemented by the
/// campaign world and by the data crate's directory loader.
pub trait NameResolver {
    fn item(&self, name: &str) -> Option<ItemId>;
    fn species(&self, name: &str) -> Option<SpeciesId>;
}

impl NameResolver for crate::world::CampaignWorld {
    fn item(&self, name: &str) -> Option<ItemId> {
        self.item_id(name)
    }

    fn species(&self, name: &str) -> Option<SpeciesId> {
        self.species_id(name)
    }
}

// ---------------------------------------------------------------------------
// Definitions (builder input)
// ---------------------------------------------------------------------------

/// A single unresolved requirement as it appears in the data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementDef {
    Tech(String),
    TechAbsent(String),
    Item { id: String, amount: u32 },
    SpecimenAlive { id: String, amount: u32 },
    SpecimenDead { id: String, amount: u32 },
    SpecimenGlobal { amount: u32 },
    Event(String),
}

/// A description variant gated on another topic being finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionDef {
    pub gate: String,
    pub text: String,
}

/// One topic as loaded from the data files, references still symbolic.
#[derive(Debug, Clone)]
pub struct TopicDef {
    pub id: String,
    pub name: Option<String>,
    pub kind: TopicKind,
    /// Nominal effort units. Zero means auto-research.
    pub cost: Fixed64,
    pub provides: Option<String>,
    pub redirect: Option<String>,
    pub researched_at_start: bool,
    pub requires_all: Vec<RequirementDef>,
    pub requires_any: Vec<RequirementDef>,
    pub production_requires: Vec<RequirementDef>,
    pub description: Option<String>,
    pub description_variants: Vec<DescriptionDef>,
    pub proposal: Option<String>,
    pub proposal_variants: Vec<DescriptionDef>,
}

impl TopicDef {
    pub fn new(id: impl Into<String>, kind: TopicKind, cost: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind,
            cost: Fixed64::from_num(cost),
            provides: None,
            redirect: None,
            researched_at_start: false,
            requires_all: Vec::new(),
            requires_any: Vec::new(),
            production_requires: Vec::new(),
            description: None,
            description_variants: Vec::new(),
            proposal: None,
            proposal_variants: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration errors raised while building the catalog. All fatal.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate topic id '{0}'")]
    DuplicateTopic(String),

    #[error("topics '{first}' and '{second}' both provide '{product}'")]
    DuplicateProvides {
        product: String,
        first: String,
        second: String,
    },

    #[error("topic '{topic}' requires unknown tech '{reference}'")]
    UnknownTechRef { topic: String, reference: String },

    #[error("topic '{topic}' requires unknown item '{reference}'")]
    UnknownItemRef { topic: String, reference: String },

    #[error("topic '{topic}' requires unknown species '{reference}'")]
    UnknownSpeciesRef { topic: String, reference: String },

    #[error("topic '{topic}' redirects to unknown topic '{reference}'")]
    UnknownRedirect { topic: String, reference: String },

    #[error("topic '{topic}' gates a description on unknown tech '{reference}'")]
    UnknownDescriptionGate { topic: String, reference: String },
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The full indexed topic collection. Owned by the research engine; the
/// lookup maps are derived at build time and never persisted.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) topics: Vec<Topic>,
    by_id: HashMap<String, TopicId>,
    by_provides: HashMap<ProductId, TopicId>,
    product_names: Vec<String>,
    product_ids: HashMap<String, ProductId>,
}

impl Catalog {
    /// Build the catalog from definitions, resolving every symbolic
    /// reference via `resolver`. Topics keep their definition order; the
    /// dense [`TopicId`] is the position in that order.
    pub fn build(defs: Vec<TopicDef>, resolver: &dyn NameResolver) -> Result<Self, CatalogError> {
        // Pass 1: ids, indices, and product interning.
        let mut by_id: HashMap<String, TopicId> = HashMap::new();
        for (i, def) in defs.iter().enumerate() {
            if by_id.insert(def.id.clone(), TopicId(i as u32)).is_some() {
                return Err(CatalogError::DuplicateTopic(def.id.clone()));
            }
        }

        let mut product_names: Vec<String> = Vec::new();
        let mut product_ids: HashMap<String, ProductId> = HashMap::new();
        let mut by_provides: HashMap<ProductId, TopicId> = HashMap::new();

        // Pass 2: resolve references and materialize topics.
        let mut topics = Vec::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            let index = TopicId(i as u32);

            let provides = match &def.provides {
                Some(product) => {
                    let pid = *product_ids.entry(product.clone()).or_insert_with(|| {
                        let pid = ProductId(product_names.len() as u32);
                        product_names.push(product.clone());
                        pid
                    });
                    if let Some(prev) = by_provides.insert(pid, index) {
                        return Err(CatalogError::DuplicateProvides {
                            product: product.clone(),
                            first: defs[prev.index()].id.clone(),
                            second: def.id.clone(),
                        });
                    }
                    Some(pid)
                }
                None => None,
            };

            let redirect = match &def.redirect {
                Some(target) => Some(*by_id.get(target).ok_or_else(|| {
                    CatalogError::UnknownRedirect {
                        topic: def.id.clone(),
                        reference: target.clone(),
                    }
                })?),
                None => None,
            };

            let requires = RequirementSet {
                all: resolve_requirements(&def.requires_all, &def.id, &by_id, resolver)?,
                any: resolve_requirements(&def.requires_any, &def.id, &by_id, resolver)?,
            };
            let production_requires = RequirementSet {
                all: resolve_requirements(&def.production_requires, &def.id, &by_id, resolver)?,
                any: Vec::new(),
            };

            let description = resolve_descriptions(
                def.description.as_deref().unwrap_or(DEFAULT_DESCRIPTION),
                &def.description_variants,
                &def.id,
                &by_id,
            )?;
            let proposal = resolve_descriptions(
                def.proposal.as_deref().unwrap_or(DEFAULT_PROPOSAL),
                &def.proposal_variants,
                &def.id,
                &by_id,
            )?;

            topics.push(Topic {
                id: def.id.clone(),
                index,
                name: def.name.clone().unwrap_or_else(|| def.id.clone()),
                kind: def.kind,
                base_cost: def.cost,
                requires,
                production_requires,
                provides,
                redirect,
                researched_at_start: def.researched_at_start,
                description,
                proposal,
                status: ResearchStatus::Unstarted,
                remaining_cost: def.cost,
                discoverable: false,
                collected: false,
                site: None,
                workers: 0,
                mail: MailState::None,
                first_discoverable: None,
                finished_at: None,
            });
        }

        Ok(Self {
            topics,
            by_id,
            by_provides,
            product_names,
            product_ids,
        })
    }

    // -- Queries --

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, id: TopicId) -> Option<&Topic> {
        self.topics.get(id.index())
    }

    /// O(1) lookup by the stable string id.
    pub fn by_id(&self, id: &str) -> Option<&Topic> {
        self.by_id.get(id).map(|&t| &self.topics[t.index()])
    }

    pub fn topic_id(&self, id: &str) -> Option<TopicId> {
        self.by_id.get(id).copied()
    }

    /// O(1) lookup of the topic providing a product.
    pub fn by_provides(&self, product: ProductId) -> Option<&Topic> {
        self.by_provides
            .get(&product)
            .map(|&t| &self.topics[t.index()])
    }

    pub fn product_id(&self, name: &str) -> Option<ProductId> {
        self.product_ids.get(name).copied()
    }

    pub fn product_name(&self, product: ProductId) -> Option<&str> {
        self.product_names.get(product.0 as usize).map(|s| s.as_str())
    }

    /// Convenience: the topic providing the named product.
    pub fn topic_for_product(&self, name: &str) -> Option<&Topic> {
        self.product_id(name).and_then(|p| self.by_provides(p))
    }

    /// Follow a redirect alias one hop; non-redirect topics map to
    /// themselves.
    pub fn resolve_redirect(&self, id: TopicId) -> TopicId {
        match self.topic(id).and_then(|t| t.redirect) {
            Some(target) => target,
            None => id,
        }
    }

    /// Side-effect-free finished check. The engine layers the
    /// progression-disabled shortcut on top of this.
    #[inline]
    pub fn is_finished(&self, id: TopicId) -> bool {
        self.topics
            .get(id.index())
            .map(|t| t.is_finished())
            .unwrap_or(false)
    }

    /// Non-fatal lint over the built catalog, one complaint per finding.
    pub fn sanity_check(&self) -> Vec<String> {
        let mut complaints = Vec::new();
        for topic in &self.topics {
            if topic.kind.expects_provides() && topic.provides.is_none() {
                complaints.push(format!(
                    "topic '{}' ({:?}) does not provide anything",
                    topic.id, topic.kind
                ));
            }
            if topic.kind != TopicKind::Logic
                && topic.description.default_text == DEFAULT_DESCRIPTION
                && topic.description.variants.is_empty()
            {
                complaints.push(format!("topic '{}' has no description text", topic.id));
            }
        }
        complaints
    }
}

// ---------------------------------------------------------------------------
// Resolution helpers
// ---------------------------------------------------------------------------

fn resolve_requirements(
    defs: &[RequirementDef],
    topic: &str,
    by_id: &HashMap<String, TopicId>,
    resolver: &dyn NameResolver,
) -> Result<Vec<Requirement>, CatalogError> {
    defs.iter()
        .map(|def| resolve_requirement(def, topic, by_id, resolver))
        .collect()
}

fn resolve_requirement(
    def: &RequirementDef,
    topic: &str,
    by_id: &HashMap<String, TopicId>,
    resolver: &dyn NameResolver,
) -> Result<Requirement, CatalogError> {
    let tech = |reference: &str| {
        by_id
            .get(reference)
            .copied()
            .ok_or_else(|| CatalogError::UnknownTechRef {
                topic: topic.to_string(),
                reference: reference.to_string(),
            })
    };
    let item = |reference: &str| {
        resolver
            .item(reference)
            .ok_or_else(|| CatalogError::UnknownItemRef {
                topic: topic.to_string(),
                reference: reference.to_string(),
            })
    };
    let species = |reference: &str| {
        resolver
            .species(reference)
            .ok_or_else(|| CatalogError::UnknownSpeciesRef {
                topic: topic.to_string(),
                reference: reference.to_string(),
            })
    };

    Ok(match def {
        RequirementDef::Tech(reference) => Requirement::TechResearched(tech(reference)?),
        RequirementDef::TechAbsent(reference) => Requirement::TechMissing(tech(reference)?),
        RequirementDef::Item { id, amount } => Requirement::ItemStock {
            item: item(id)?,
            amount: *amount,
        },
        RequirementDef::SpecimenAlive { id, amount } => Requirement::SpecimenHeld {
            species: species(id)?,
            vitality: Vitality::Alive,
            amount: *amount,
        },
        RequirementDef::SpecimenDead { id, amount } => Requirement::SpecimenHeld {
            species: species(id)?,
            vitality: Vitality::Dead,
            amount: *amount,
        },
        RequirementDef::SpecimenGlobal { amount } => {
            Requirement::SpecimenGlobal { amount: *amount }
        }
        RequirementDef::Event(trigger) => Requirement::Event {
            trigger: trigger.clone(),
        },
    })
}

fn resolve_descriptions(
    default_text: &str,
    variants: &[DescriptionDef],
    topic: &str,
    by_id: &HashMap<String, TopicId>,
) -> Result<DescriptionList, CatalogError> {
    let resolved = variants
        .iter()
        .map(|v| {
            by_id
                .get(&v.gate)
                .copied()
                .map(|gate| (gate, v.text.clone()))
                .ok_or_else(|| CatalogError::UnknownDescriptionGate {
                    topic: topic.to_string(),
                    reference: v.gate.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DescriptionList {
        default_text: default_text.to_string(),
        variants: resolved,
        locked: None,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CampaignWorld;

    fn resolver() -> CampaignWorld {
        let mut world = CampaignWorld::new();
        world.register_item("laser_rifle");
        world.register_species("sectoid");
        world
    }

    // -----------------------------------------------------------------------
    // Build and indices
    // -----------------------------------------------------------------------

    #[test]
    fn build_assigns_dense_indices_in_definition_order() {
        let defs = vec![
            TopicDef::new("rs_alpha", TopicKind::Tech, 10.0),
            TopicDef::new("rs_beta", TopicKind::Tech, 20.0),
        ];
        let catalog = Catalog::build(defs, &resolver()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.topic_id("rs_alpha"), Some(TopicId(0)));
        assert_eq!(catalog.topic_id("rs_beta"), Some(TopicId(1)));
        assert_eq!(catalog.by_id("rs_beta").unwrap().index, TopicId(1));
    }

    #[test]
    fn provides_index_resolves_products() {
        let mut def = TopicDef::new("rs_laser", TopicKind::Weapon, 50.0);
        def.provides = Some("laser_rifle".to_string());
        let catalog = Catalog::build(vec![def], &resolver()).unwrap();

        let product = catalog.product_id("laser_rifle").unwrap();
        assert_eq!(catalog.by_provides(product).unwrap().id, "rs_laser");
        assert_eq!(catalog.product_name(product), Some("laser_rifle"));
        assert_eq!(catalog.topic_for_product("laser_rifle").unwrap().id, "rs_laser");
        assert!(catalog.topic_for_product("plasma_rifle").is_none());
    }

    #[test]
    fn duplicate_topic_id_is_fatal() {
        let defs = vec![
            TopicDef::new("rs_alpha", TopicKind::Tech, 10.0),
            TopicDef::new("rs_alpha", TopicKind::Tech, 20.0),
        ];
        let err = Catalog::build(defs, &resolver()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateTopic(id) if id == "rs_alpha"));
    }

    #[test]
    fn duplicate_provides_is_fatal() {
        let mut a = TopicDef::new("rs_alpha", TopicKind::Weapon, 10.0);
        a.provides = Some("laser_rifle".to_string());
        let mut b = TopicDef::new("rs_beta", TopicKind::Weapon, 10.0);
        b.provides = Some("laser_rifle".to_string());

        let err = Catalog::build(vec![a, b], &resolver()).unwrap_err();
        match err {
            CatalogError::DuplicateProvides {
                product,
                first,
                second,
            } => {
                assert_eq!(product, "laser_rifle");
                assert_eq!(first, "rs_alpha");
                assert_eq!(second, "rs_beta");
            }
            other => panic!("expected DuplicateProvides, got: {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Reference resolution
    // -----------------------------------------------------------------------

    #[test]
    fn tech_references_resolve_regardless_of_order() {
        // rs_alpha requires rs_beta, which is defined later.
        let mut a = TopicDef::new("rs_alpha", TopicKind::Tech, 10.0);
        a.requires_all = vec![RequirementDef::Tech("rs_beta".to_string())];
        let b = TopicDef::new("rs_beta", TopicKind::Tech, 10.0);

        let catalog = Catalog::build(vec![a, b], &resolver()).unwrap();
        assert_eq!(
            catalog.by_id("rs_alpha").unwrap().requires.all,
            vec![Requirement::TechResearched(TopicId(1))]
        );
    }

    #[test]
    fn unknown_tech_reference_is_fatal_and_names_the_topic() {
        let mut def = TopicDef::new("rs_alpha", TopicKind::Tech, 10.0);
        def.requires_any = vec![RequirementDef::Tech("rs_ghost".to_string())];
        let err = Catalog::build(vec![def], &resolver()).unwrap_err();
        match err {
            CatalogError::UnknownTechRef { topic, reference } => {
                assert_eq!(topic, "rs_alpha");
                assert_eq!(reference, "rs_ghost");
            }
            other => panic!("expected UnknownTechRef, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_item_reference_is_fatal() {
        let mut def = TopicDef::new("rs_alpha", TopicKind::Tech, 10.0);
        def.requires_all = vec![RequirementDef::Item {
            id: "vaporware".to_string(),
            amount: 1,
        }];
        let err = Catalog::build(vec![def], &resolver()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownItemRef { .. }));
    }

    #[test]
    fn unknown_species_reference_is_fatal() {
        let mut def = TopicDef::new("rs_alpha", TopicKind::Tech, 10.0);
        def.requires_all = vec![RequirementDef::SpecimenDead {
            id: "chupacabra".to_string(),
            amount: 1,
        }];
        let err = Catalog::build(vec![def], &resolver()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSpeciesRef { .. }));
    }

    #[test]
    fn production_requirements_resolve_but_stay_separate() {
        let mut def = TopicDef::new("rs_laser", TopicKind::Weapon, 50.0);
        def.production_requires = vec![RequirementDef::Item {
            id: "laser_rifle".to_string(),
            amount: 1,
        }];
        let catalog = Catalog::build(vec![def], &resolver()).unwrap();
        let topic = catalog.by_id("rs_laser").unwrap();
        assert_eq!(topic.production_requires.all.len(), 1);
        assert!(topic.requires.is_empty());
    }

    #[test]
    fn redirect_resolves_to_target() {
        let a = TopicDef::new("rs_target", TopicKind::Tech, 10.0);
        let mut b = TopicDef::new("rs_alias", TopicKind::Logic, 0.0);
        b.redirect = Some("rs_target".to_string());

        let catalog = Catalog::build(vec![a, b], &resolver()).unwrap();
        assert_eq!(catalog.resolve_redirect(TopicId(1)), TopicId(0));
        assert_eq!(catalog.resolve_redirect(TopicId(0)), TopicId(0));
    }

    #[test]
    fn unknown_redirect_is_fatal() {
        let mut def = TopicDef::new("rs_alias", TopicKind::Logic, 0.0);
        def.redirect = Some("rs_ghost".to_string());
        let err = Catalog::build(vec![def], &resolver()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownRedirect { .. }));
    }

    #[test]
    fn description_gates_resolve() {
        let a = TopicDef::new("rs_gate", TopicKind::Tech, 10.0);
        let mut b = TopicDef::new("rs_alpha", TopicKind::Tech, 10.0);
        b.description = Some("plain text".to_string());
        b.description_variants = vec![DescriptionDef {
            gate: "rs_gate".to_string(),
            text: "gated text".to_string(),
        }];

        let catalog = Catalog::build(vec![a, b], &resolver()).unwrap();
        let topic = catalog.by_id("rs_alpha").unwrap();
        assert_eq!(topic.description.variants, vec![(TopicId(0), "gated text".to_string())]);
        assert_eq!(topic.description.default_text, "plain text");
    }

    #[test]
    fn unknown_description_gate_is_fatal() {
        let mut def = TopicDef::new("rs_alpha", TopicKind::Tech, 10.0);
        def.proposal_variants = vec![DescriptionDef {
            gate: "rs_ghost".to_string(),
            text: "never".to_string(),
        }];
        let err = Catalog::build(vec![def], &resolver()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDescriptionGate { .. }));
    }

    // -----------------------------------------------------------------------
    // Defaults and lint
    // -----------------------------------------------------------------------

    #[test]
    fn name_falls_back_to_id() {
        let catalog =
            Catalog::build(vec![TopicDef::new("rs_alpha", TopicKind::Tech, 10.0)], &resolver())
                .unwrap();
        assert_eq!(catalog.by_id("rs_alpha").unwrap().name, "rs_alpha");
    }

    #[test]
    fn fresh_topics_start_unstarted_with_full_cost() {
        let catalog =
            Catalog::build(vec![TopicDef::new("rs_alpha", TopicKind::Tech, 42.0)], &resolver())
                .unwrap();
        let topic = catalog.by_id("rs_alpha").unwrap();
        assert_eq!(topic.status, ResearchStatus::Unstarted);
        assert_eq!(topic.remaining_cost, topic.base_cost);
        assert!(!topic.discoverable);
        assert_eq!(topic.workers, 0);
        assert_eq!(topic.site, None);
    }

    #[test]
    fn sanity_check_flags_missing_provides_and_description() {
        let weapon = TopicDef::new("rs_laser", TopicKind::Weapon, 50.0);
        let logic = TopicDef::new("rs_logic", TopicKind::Logic, 0.0);
        let catalog = Catalog::build(vec![weapon, logic], &resolver()).unwrap();

        let complaints = catalog.sanity_check();
        // The weapon lacks both a provides and a description; the logic
        // node is exempt from both checks.
        assert_eq!(complaints.len(), 2);
        assert!(complaints.iter().all(|c| c.contains("rs_laser")));
    }

    #[test]
    fn sanity_check_passes_clean_catalog() {
        let mut def = TopicDef::new("rs_laser", TopicKind::Weapon, 50.0);
        def.provides = Some("laser_rifle".to_string());
        def.description = Some("A shiny rifle.".to_string());
        let catalog = Catalog::build(vec![def], &resolver()).unwrap();
        assert!(catalog.sanity_check().is_empty());
    }
}
