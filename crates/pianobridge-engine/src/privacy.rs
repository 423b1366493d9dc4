// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Privacy rule registry and the include/exclude update protocol.
//
// Each of the six privacy modes owns one `ModeRules` record. Updates are
// additive (set union) and never remove anything; a name may sit in both
// the allowed and forbidden side of a mode, and it is the SDK that decides
// which side wins.
//
// Concurrency: the whole registry sits behind one `RwLock`. An update takes
// the write lock once and applies to every requested mode under it, so a
// concurrent reader sees either none or all of a call's changes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use pianobridge_core::error::Result;
use pianobridge_core::types::{Event, PrivacyMode, StorageFeature};

/// Rules attached to a single privacy mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRules {
    pub allowed_storage_features: BTreeSet<StorageFeature>,
    pub forbidden_storage_features: BTreeSet<StorageFeature>,
    pub allowed_event_names: BTreeSet<String>,
    pub forbidden_event_names: BTreeSet<String>,
    /// Event name (or [`Event::ANY`]) to property names.
    pub allowed_property_keys: BTreeMap<String, BTreeSet<String>>,
    pub forbidden_property_keys: BTreeMap<String, BTreeSet<String>>,
}

/// Which side of a mode's rules an update writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Include,
    Exclude,
}

impl RuleAction {
    pub fn from_include(include: bool) -> Self {
        if include { Self::Include } else { Self::Exclude }
    }
}

/// What an update adds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    StorageFeatures(BTreeSet<StorageFeature>),
    EventNames(BTreeSet<String>),
    PropertyNames {
        property_names: BTreeSet<String>,
        /// Event names the property names are keyed under.
        event_names: Vec<String>,
    },
}

/// A fully resolved rule update.
///
/// Constructors resolve every feature and mode name up front, so an update
/// that exists is guaranteed to apply without error. An unknown name fails
/// construction and leaves the registry untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleUpdate {
    pub modes: Vec<PrivacyMode>,
    pub action: RuleAction,
    pub target: RuleTarget,
}

impl RuleUpdate {
    pub fn storage_features<F, M>(features: &[F], modes: &[M], action: RuleAction) -> Result<Self>
    where
        F: AsRef<str>,
        M: AsRef<str>,
    {
        let features = features
            .iter()
            .map(|f| StorageFeature::from_name(f.as_ref()))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self {
            modes: resolve_modes(modes)?,
            action,
            target: RuleTarget::StorageFeatures(features),
        })
    }

    pub fn event_names<E, M>(event_names: &[E], modes: &[M], action: RuleAction) -> Result<Self>
    where
        E: AsRef<str>,
        M: AsRef<str>,
    {
        Ok(Self {
            modes: resolve_modes(modes)?,
            action,
            target: RuleTarget::EventNames(owned_set(event_names)),
        })
    }

    /// Property names keyed under `event_names`, or under [`Event::ANY`] when
    /// no event names are given.
    pub fn property_names<P, M, E>(
        property_names: &[P],
        modes: &[M],
        action: RuleAction,
        event_names: Option<&[E]>,
    ) -> Result<Self>
    where
        P: AsRef<str>,
        M: AsRef<str>,
        E: AsRef<str>,
    {
        let event_names = match event_names {
            Some(names) => names.iter().map(|n| n.as_ref().to_owned()).collect(),
            None => vec![Event::ANY.to_owned()],
        };
        Ok(Self {
            modes: resolve_modes(modes)?,
            action,
            target: RuleTarget::PropertyNames {
                property_names: owned_set(property_names),
                event_names,
            },
        })
    }
}

fn resolve_modes<M: AsRef<str>>(modes: &[M]) -> Result<Vec<PrivacyMode>> {
    modes
        .iter()
        .map(|m| PrivacyMode::from_name(m.as_ref()))
        .collect()
}

fn owned_set<S: AsRef<str>>(names: &[S]) -> BTreeSet<String> {
    names.iter().map(|n| n.as_ref().to_owned()).collect()
}

impl ModeRules {
    fn apply(&mut self, action: RuleAction, target: &RuleTarget) {
        match (target, action) {
            (RuleTarget::StorageFeatures(features), RuleAction::Include) => {
                self.allowed_storage_features.extend(features.iter().copied());
            }
            (RuleTarget::StorageFeatures(features), RuleAction::Exclude) => {
                self.forbidden_storage_features.extend(features.iter().copied());
            }
            (RuleTarget::EventNames(names), RuleAction::Include) => {
                self.allowed_event_names.extend(names.iter().cloned());
            }
            (RuleTarget::EventNames(names), RuleAction::Exclude) => {
                self.forbidden_event_names.extend(names.iter().cloned());
            }
            (
                RuleTarget::PropertyNames {
                    property_names,
                    event_names,
                },
                action,
            ) => {
                let keys = match action {
                    RuleAction::Include => &mut self.allowed_property_keys,
                    RuleAction::Exclude => &mut self.forbidden_property_keys,
                };
                for event_name in event_names {
                    keys.entry(event_name.clone())
                        .or_default()
                        .extend(property_names.iter().cloned());
                }
            }
        }
    }
}

/// Registry holding the rules of all six privacy modes.
#[derive(Debug)]
pub struct PrivacyRegistry {
    modes: RwLock<BTreeMap<PrivacyMode, ModeRules>>,
}

impl Default for PrivacyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivacyRegistry {
    /// Registry with empty rules for every mode.
    pub fn new() -> Self {
        Self::with_rules(std::iter::empty())
    }

    /// Registry seeded with the given rules; modes not listed start empty.
    pub fn with_rules(seed: impl IntoIterator<Item = (PrivacyMode, ModeRules)>) -> Self {
        let mut modes: BTreeMap<PrivacyMode, ModeRules> = PrivacyMode::ALL
            .into_iter()
            .map(|mode| (mode, ModeRules::default()))
            .collect();
        modes.extend(seed);
        Self {
            modes: RwLock::new(modes),
        }
    }

    /// Copy of one mode's current rules.
    pub fn snapshot(&self, mode: PrivacyMode) -> ModeRules {
        self.modes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mode)
            .cloned()
            .unwrap_or_default()
    }

    /// Apply a resolved update to every mode it names, atomically.
    #[instrument(skip_all, fields(modes = update.modes.len(), action = ?update.action))]
    pub fn apply(&self, update: &RuleUpdate) {
        // A poisoned lock still holds valid sets.
        let mut modes = self.modes.write().unwrap_or_else(PoisonError::into_inner);
        for mode in &update.modes {
            modes
                .entry(*mode)
                .or_default()
                .apply(update.action, &update.target);
        }
        debug!(rule = ?update.target, "privacy rules updated");
    }

    /// Resolve and apply a storage-feature update.
    pub fn update_storage_features<F, M>(&self, features: &[F], modes: &[M], include: bool) -> Result<()>
    where
        F: AsRef<str>,
        M: AsRef<str>,
    {
        let update = RuleUpdate::storage_features(features, modes, RuleAction::from_include(include))?;
        self.apply(&update);
        Ok(())
    }

    /// Resolve and apply an event-name update.
    pub fn update_event_names<E, M>(&self, event_names: &[E], modes: &[M], include: bool) -> Result<()>
    where
        E: AsRef<str>,
        M: AsRef<str>,
    {
        let update = RuleUpdate::event_names(event_names, modes, RuleAction::from_include(include))?;
        self.apply(&update);
        Ok(())
    }

    /// Resolve and apply a property-name update.
    pub fn update_property_names<P, M, E>(
        &self,
        property_names: &[P],
        modes: &[M],
        include: bool,
        event_names: Option<&[E]>,
    ) -> Result<()>
    where
        P: AsRef<str>,
        M: AsRef<str>,
        E: AsRef<str>,
    {
        let update = RuleUpdate::property_names(
            property_names,
            modes,
            RuleAction::from_include(include),
            event_names,
        )?;
        self.apply(&update);
        Ok(())
    }
}
