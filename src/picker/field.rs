//! The asset field shared by every editor
//!
//! One `AssetField` per open editor, parametrized by the entity's
//! `AssetFieldSpec`. It owns the picker list and the persisted reference the
//! list was seeded from, and is the only place that answers "will the record
//! carry an asset after saving".

use log::debug;

use super::list::PickerList;
use super::normalizer::PickerEvent;
use super::selection::SelectionSource;
use crate::entity::AssetFieldSpec;
use crate::error::{OverflowWarning, Result};
use crate::media::{AssetEncoder, EncodingPolicy};
use crate::reconcile::{reconcile, AssetReconciliationOutcome};
use crate::submit::AssetBinding;

#[derive(Debug, Clone)]
pub struct AssetField {
    spec: AssetFieldSpec,
    /// Reference the stored record carries
    prior: Option<String>,
    list: PickerList,
}

impl AssetField {
    /// Field of a new entity: nothing persisted, empty list
    pub fn new(spec: AssetFieldSpec) -> Self {
        Self {
            spec,
            prior: None,
            list: PickerList::new(),
        }
    }

    /// Field of an existing entity; an empty reference counts as none
    pub fn seeded(spec: AssetFieldSpec, prior: Option<String>) -> Self {
        let prior = prior.filter(|reference| !reference.is_empty());
        let list = PickerList::seeded(prior.as_deref());
        Self { spec, prior, list }
    }

    pub fn key(&self) -> &'static str {
        self.spec.key
    }

    pub fn prior(&self) -> Option<&str> {
        self.prior.as_deref()
    }

    pub fn list(&self) -> &PickerList {
        &self.list
    }

    /// Forward a picker interaction
    pub fn apply(&mut self, event: PickerEvent) -> Option<OverflowWarning> {
        self.list.apply(event)
    }

    /// Whether the record will carry an asset after saving. Mirrors the
    /// reconciliation table.
    pub fn has_asset(&self) -> bool {
        if !self.list.is_touched() {
            return self.prior.is_some();
        }
        match self.list.selected().map(|s| &s.source) {
            None => false,
            Some(SelectionSource::Local(_)) => true,
            Some(SelectionSource::Persisted(_)) => self.prior.is_some(),
        }
    }

    /// Required asset with nothing to keep and nothing new
    pub fn is_missing(&self) -> bool {
        self.spec.required && !self.has_asset()
    }

    /// The entity's encoding policy, built on the configured base policy
    pub fn encoder_for(&self, base: &EncodingPolicy) -> EncodingPolicy {
        base.with_variant(self.spec.policy)
    }

    /// Reconcile the list against the persisted reference. Entry statuses
    /// move to `Done` or `Error` with the encode result.
    pub async fn reconcile<E: AssetEncoder>(
        &mut self,
        encoder: &E,
    ) -> Result<AssetReconciliationOutcome> {
        let outcome = reconcile(self.prior.as_deref(), &mut self.list, encoder).await?;
        debug!("{} {}", self.spec.key, outcome.label());
        Ok(outcome)
    }

    /// Pair an outcome with this field's key and persisted reference
    pub fn binding<'a>(&'a self, outcome: &'a AssetReconciliationOutcome) -> AssetBinding<'a> {
        AssetBinding {
            key: self.spec.key,
            prior: self.prior.as_deref(),
            outcome,
        }
    }
}
