//! Toggle-driven additions to a profile's architecture layers and trade-offs.
//!
//! Both lists are rebuilt from the profile's base data on every call, so the
//! output depends only on the current toggle set and never accumulates.

use crate::assumptions::ConsistencyModel;
use crate::profile::{toggles, ProfileDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy)]
pub struct LayerRule {
    pub toggle: &'static str,
    pub layer: &'static str,
    pub placement: Placement,
}

pub const LAYER_RULES: &[LayerRule] = &[
    LayerRule {
        toggle: toggles::USE_CDN,
        layer: "CDN",
        placement: Placement::Front,
    },
    LayerRule {
        toggle: toggles::REGION_LOCKING,
        layer: "Geo-Sharded DB",
        placement: Placement::Back,
    },
    LayerRule {
        toggle: toggles::DISASTER_RECOVERY,
        layer: "Hot Standby Cluster",
        placement: Placement::Back,
    },
    LayerRule {
        toggle: toggles::STORES_PII,
        layer: "Vault/KMS",
        placement: Placement::Back,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct TradeoffRule {
    pub toggle: &'static str,
    pub note: &'static str,
}

pub const TRADEOFF_RULES: &[TradeoffRule] = &[
    TradeoffRule {
        toggle: toggles::COMPRESSION,
        note: "Saves bandwidth, increases CPU usage",
    },
    TradeoffRule {
        toggle: toggles::STORES_PII,
        note: "Must implement strict access controls and audit logging",
    },
    TradeoffRule {
        toggle: toggles::REGION_LOCKING,
        note: "Increased complexity due to geo-partitioning",
    },
    TradeoffRule {
        toggle: toggles::DISASTER_RECOVERY,
        note: "Higher infra cost but faster recovery",
    },
];

pub const STRONG_CONSISTENCY_NOTE: &str = "Lower availability under partition";

/// Base layers of `profile` with every enabled rule applied in table order.
///
/// Front rules keep their relative order ahead of the base layers; a layer
/// already in the list is never added twice.
pub fn architecture_layers(profile: &ProfileDefinition) -> Vec<String> {
    let mut front: Vec<String> = Vec::new();
    let mut back: Vec<String> = Vec::new();

    for rule in LAYER_RULES.iter().filter(|r| profile.toggle(r.toggle)) {
        let present = profile.architecture_layers.iter().any(|l| l == rule.layer)
            || front.iter().any(|l| l == rule.layer)
            || back.iter().any(|l| l == rule.layer);
        if present {
            continue;
        }
        match rule.placement {
            Placement::Front => front.push(rule.layer.to_string()),
            Placement::Back => back.push(rule.layer.to_string()),
        }
    }

    front
        .into_iter()
        .chain(profile.architecture_layers.iter().cloned())
        .chain(back)
        .collect()
}

/// The profile's own trade-off note followed by consistency and toggle notes.
pub fn tradeoffs(profile: &ProfileDefinition, consistency: ConsistencyModel) -> Vec<String> {
    let mut notes = Vec::new();
    if !profile.tradeoffs.trim().is_empty() {
        notes.push(profile.tradeoffs.clone());
    }
    if consistency == ConsistencyModel::Strong {
        notes.push(STRONG_CONSISTENCY_NOTE.to_string());
    }
    notes.extend(
        TRADEOFF_RULES
            .iter()
            .filter(|r| profile.toggle(r.toggle))
            .map(|r| r.note.to_string()),
    );
    notes
}
