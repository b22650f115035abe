//! Serde structs for the research data files.
//!
//! These define the on-disk shape of topic definitions and the item/species
//! name directory. They deserialize from RON, JSON, or TOML and convert
//! into `xenotech-core` definition types for catalog construction; all
//! references stay symbolic strings at this layer.

use serde::Deserialize;
use xenotech_core::catalog::{DescriptionDef, RequirementDef, TopicDef};
use xenotech_core::topic::TopicKind;

// ===========================================================================
// Topics
// ===========================================================================

/// One topic definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicData {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: TopicKindData,
    /// Effort units; 0 means auto-research. Converted to fixed-point once
    /// at load.
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub provides: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
    /// Finished silently at campaign start.
    #[serde(default)]
    pub researched: bool,
    #[serde(default)]
    pub require_and: Vec<RequirementData>,
    #[serde(default)]
    pub require_or: Vec<RequirementData>,
    #[serde(default)]
    pub require_for_production: Vec<RequirementData>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_variants: Vec<VariantData>,
    #[serde(default)]
    pub proposal: Option<String>,
    #[serde(default)]
    pub proposal_variants: Vec<VariantData>,
}

/// Topic kind keyword in the data files.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKindData {
    #[default]
    Tech,
    Weapon,
    Armour,
    Craft,
    Craftitem,
    Building,
    Alien,
    Ugv,
    News,
    Logic,
}

/// One requirement entry. Counted kinds carry `(reference, amount)`.
#[derive(Debug, Clone, Deserialize)]
pub enum RequirementData {
    Tech(String),
    TechNot(String),
    Item(String, u32),
    Alien(String, u32),
    AlienDead(String, u32),
    AlienGlobal(u32),
    Event(String),
}

/// A description variant gated on another tech.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantData {
    pub tech: String,
    pub text: String,
}

/// Wrapper for a list of topics in TOML format (TOML has no top-level
/// arrays).
#[derive(Debug, Clone, Deserialize)]
pub struct TomlTopics {
    pub topics: Vec<TopicData>,
}

// ===========================================================================
// Directory
// ===========================================================================

/// The item/species name directory that requirement references resolve
/// against.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryData {
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub species: Vec<String>,
}

// ===========================================================================
// Conversion into core definition types
// ===========================================================================

impl From<TopicKindData> for TopicKind {
    fn from(kind: TopicKindData) -> Self {
        match kind {
            TopicKindData::Tech => TopicKind::Tech,
            TopicKindData::Weapon => TopicKind::Weapon,
            TopicKindData::Armour => TopicKind::Armour,
            TopicKindData::Craft => TopicKind::Craft,
            TopicKindData::Craftitem => TopicKind::CraftItem,
            TopicKindData::Building => TopicKind::Building,
            TopicKindData::Alien => TopicKind::Alien,
            TopicKindData::Ugv => TopicKind::Ugv,
            TopicKindData::News => TopicKind::News,
            TopicKindData::Logic => TopicKind::Logic,
        }
    }
}

impl From<RequirementData> for RequirementDef {
    fn from(req: RequirementData) -> Self {
        match req {
            RequirementData::Tech(id) => RequirementDef::Tech(id),
            RequirementData::TechNot(id) => RequirementDef::TechAbsent(id),
            RequirementData::Item(id, amount) => RequirementDef::Item { id, amount },
            RequirementData::Alien(id, amount) => RequirementDef::SpecimenAlive { id, amount },
            RequirementData::AlienDead(id, amount) => RequirementDef::SpecimenDead { id, amount },
            RequirementData::AlienGlobal(amount) => RequirementDef::SpecimenGlobal { amount },
            RequirementData::Event(trigger) => RequirementDef::Event(trigger),
        }
    }
}

impl From<VariantData> for DescriptionDef {
    fn from(v: VariantData) -> Self {
        DescriptionDef {
            gate: v.tech,
            text: v.text,
        }
    }
}

impl From<TopicData> for TopicDef {
    fn from(data: TopicData) -> Self {
        let mut def = TopicDef::new(data.id, data.kind.into(), data.time);
        def.name = data.name;
        def.provides = data.provides;
        def.redirect = data.redirect;
        def.researched_at_start = data.researched;
        def.requires_all = data.require_and.into_iter().map(Into::into).collect();
        def.requires_any = data.require_or.into_iter().map(Into::into).collect();
        def.production_requires = data
            .require_for_production
            .into_iter()
            .map(Into::into)
            .collect();
        def.description = data.description;
        def.description_variants = data
            .description_variants
            .into_iter()
            .map(Into::into)
            .collect();
        def.proposal = data.proposal;
        def.proposal_variants = data.proposal_variants.into_iter().map(Into::into).collect();
        def
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // RON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn topic_data_from_ron() {
        let ron = r#"
            (
                id: "rs_laser_rifle",
                name: Some("Laser Rifle"),
                kind: weapon,
                time: 16.0,
                provides: Some("laser_rifle"),
                require_and: [Tech("rs_laser_theory"), Item("alien_cell", 2)],
                require_or: [AlienGlobal(5)],
            )
        "#;
        let topic: TopicData = ron::from_str(ron).unwrap();
        assert_eq!(topic.id, "rs_laser_rifle");
        assert_eq!(topic.name.as_deref(), Some("Laser Rifle"));
        assert!(matches!(topic.kind, TopicKindData::Weapon));
        assert_eq!(topic.time, 16.0);
        assert_eq!(topic.require_and.len(), 2);
        assert!(matches!(
            &topic.require_and[1],
            RequirementData::Item(id, 2) if id == "alien_cell"
        ));
        assert!(matches!(topic.require_or[0], RequirementData::AlienGlobal(5)));
    }

    #[test]
    fn topic_data_defaults_from_ron() {
        let ron = r#"(id: "rs_minimal")"#;
        let topic: TopicData = ron::from_str(ron).unwrap();
        assert!(matches!(topic.kind, TopicKindData::Tech));
        assert_eq!(topic.time, 0.0);
        assert!(topic.name.is_none());
        assert!(topic.require_and.is_empty());
        assert!(topic.require_or.is_empty());
        assert!(!topic.researched);
    }

    #[test]
    fn requirement_variants_from_ron() {
        let ron = r#"[
            Tech("rs_a"),
            TechNot("rs_b"),
            Item("laser_rifle", 1),
            Alien("sectoid", 2),
            AlienDead("sectoid", 1),
            AlienGlobal(10),
            Event("ufo_crash"),
        ]"#;
        let reqs: Vec<RequirementData> = ron::from_str(ron).unwrap();
        assert_eq!(reqs.len(), 7);
        assert!(matches!(&reqs[6], RequirementData::Event(t) if t == "ufo_crash"));
    }

    #[test]
    fn directory_data_from_ron() {
        let ron = r#"(items: ["laser_rifle", "alien_cell"], species: ["sectoid"])"#;
        let dir: DirectoryData = ron::from_str(ron).unwrap();
        assert_eq!(dir.items.len(), 2);
        assert_eq!(dir.species, vec!["sectoid"]);
    }

    // -----------------------------------------------------------------------
    // JSON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn topic_data_from_json() {
        let json = r#"{
            "id": "rs_alien_origins",
            "kind": "tech",
            "time": 40.0,
            "require_and": [{"AlienDead": ["sectoid", 1]}],
            "description": "Where do they come from?"
        }"#;
        let topic: TopicData = serde_json::from_str(json).unwrap();
        assert_eq!(topic.id, "rs_alien_origins");
        assert!(matches!(
            &topic.require_and[0],
            RequirementData::AlienDead(id, 1) if id == "sectoid"
        ));
        assert_eq!(topic.description.as_deref(), Some("Where do they come from?"));
    }

    // -----------------------------------------------------------------------
    // TOML deserialization (wrapper table)
    // -----------------------------------------------------------------------

    #[test]
    fn topics_from_toml() {
        let toml_str = r#"
            [[topics]]
            id = "rs_laser_theory"
            kind = "tech"
            time = 8.0

            [[topics]]
            id = "rs_laser_rifle"
            kind = "weapon"
            time = 16.0
            provides = "laser_rifle"
            require_and = [{ Tech = "rs_laser_theory" }]
        "#;
        let wrapper: TomlTopics = toml::from_str(toml_str).unwrap();
        assert_eq!(wrapper.topics.len(), 2);
        assert_eq!(wrapper.topics[1].provides.as_deref(), Some("laser_rifle"));
    }

    #[test]
    fn directory_from_toml() {
        let toml_str = r#"
            items = ["laser_rifle"]
            species = ["sectoid", "floater"]
        "#;
        let dir: DirectoryData = toml::from_str(toml_str).unwrap();
        assert_eq!(dir.items, vec!["laser_rifle"]);
        assert_eq!(dir.species.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Conversion into core defs
    // -----------------------------------------------------------------------

    #[test]
    fn conversion_preserves_everything() {
        let ron = r#"
            (
                id: "rs_laser_rifle",
                kind: weapon,
                time: 16.0,
                provides: Some("laser_rifle"),
                researched: true,
                require_and: [Tech("rs_laser_theory")],
                require_for_production: [Item("alien_cell", 1)],
                description: Some("Pew pew."),
                description_variants: [(tech: "rs_alien_origins", text: "Informed pew pew.")],
            )
        "#;
        let data: TopicData = ron::from_str(ron).unwrap();
        let def: TopicDef = data.into();

        assert_eq!(def.id, "rs_laser_rifle");
        assert_eq!(def.kind, TopicKind::Weapon);
        assert!(def.researched_at_start);
        assert_eq!(def.provides.as_deref(), Some("laser_rifle"));
        assert_eq!(def.requires_all, vec![RequirementDef::Tech("rs_laser_theory".into())]);
        assert_eq!(
            def.production_requires,
            vec![RequirementDef::Item {
                id: "alien_cell".into(),
                amount: 1
            }]
        );
        assert_eq!(def.description.as_deref(), Some("Pew pew."));
        assert_eq!(
            def.description_variants,
            vec![DescriptionDef {
                gate: "rs_alien_origins".into(),
                text: "Informed pew pew.".into()
            }]
        );
    }

    #[test]
    fn kind_keywords_map_onto_core_kinds() {
        for (keyword, expected) in [
            ("tech", TopicKind::Tech),
            ("weapon", TopicKind::Weapon),
            ("armour", TopicKind::Armour),
            ("craft", TopicKind::Craft),
            ("craftitem", TopicKind::CraftItem),
            ("building", TopicKind::Building),
            ("alien", TopicKind::Alien),
            ("ugv", TopicKind::Ugv),
            ("news", TopicKind::News),
            ("logic", TopicKind::Logic),
        ] {
            let data: TopicKindData = ron::from_str(keyword).unwrap();
            assert_eq!(TopicKind::from(data), expected, "keyword '{keyword}'");
        }
    }
}
