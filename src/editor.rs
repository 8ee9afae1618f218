//! Edit sessions
//!
//! One session per open editor: it owns the form values and the picker list,
//! validates on save, reconciles the asset, assembles the record and hands
//! it to the store. Nothing is shared between sessions.

use log::{debug, info};
use serde_json::Value;

use crate::entity::EntityKind;
use crate::error::{AssetError, OverflowWarning, Result};
use crate::media::{AssetEncoder, EncodingPolicy};
use crate::picker::{AssetField, PickerEvent};
use crate::store::RecordStore;
use crate::submit::{FormFields, NumericDefaults, OutboundRecord, SubmitAssembler};

#[derive(Debug)]
pub struct EditSession {
    kind: EntityKind,
    /// `None` until the record exists in the store
    id: Option<i64>,
    form: FormFields,
    asset: AssetField,
}

impl EditSession {
    /// Session for a new entity: empty form, empty picker
    pub fn create(kind: EntityKind) -> Self {
        Self {
            kind,
            id: None,
            form: FormFields::new(),
            asset: AssetField::new(kind.asset_field()),
        }
    }

    /// Session for an existing record; the picker is seeded with its asset
    pub fn edit(kind: EntityKind, id: i64, mut record: OutboundRecord) -> Self {
        let spec = kind.asset_field();
        let prior = match record.remove(spec.key) {
            Some(Value::String(reference)) => Some(reference),
            _ => None,
        };

        Self {
            kind,
            id: Some(id),
            form: record,
            asset: AssetField::seeded(spec, prior),
        }
    }

    /// Load a stored record and open an edit session on it
    pub fn open<S: RecordStore>(store: &S, kind: EntityKind, id: i64) -> Result<Self> {
        let record = store.get(kind, id)?;
        Ok(Self::edit(kind, id, record))
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn asset(&self) -> &AssetField {
        &self.asset
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.form.insert(name.into(), value);
    }

    /// Merge several form values at once (later values win)
    pub fn set_fields(&mut self, fields: FormFields) {
        self.form.extend(fields);
    }

    /// Forward a picker interaction
    pub fn pick(&mut self, event: PickerEvent) -> Option<OverflowWarning> {
        self.asset.apply(event)
    }

    /// Required-field rules, checked before anything is encoded
    pub fn validate(&self) -> Result<()> {
        let mut missing: Vec<&str> = self
            .kind
            .fields()
            .iter()
            .filter(|field| field.required && is_blank(self.form.get(field.name)))
            .map(|field| field.name)
            .collect();

        if self.asset.is_missing() {
            missing.push(self.asset.key());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AssetError::Validation(format!(
                "{} required: {}",
                if missing.len() == 1 { "field" } else { "fields" },
                missing.join(", ")
            )))
        }
    }

    /// The entity's encoding policy, built on the configured base policy
    pub fn encoder_for(&self, base: &EncodingPolicy) -> EncodingPolicy {
        self.asset.encoder_for(base)
    }

    /// Validate, reconcile and assemble the outbound record.
    ///
    /// Fails before producing anything if validation or encoding fails; the
    /// session stays usable for another attempt.
    pub async fn prepare<E: AssetEncoder>(
        &mut self,
        encoder: &E,
        defaults: NumericDefaults,
    ) -> Result<OutboundRecord> {
        self.validate()?;

        let outcome = self.asset.reconcile(encoder).await?;
        let binding = self.asset.binding(&outcome);
        Ok(SubmitAssembler::new(self.kind.fields(), defaults).assemble(&self.form, &binding))
    }

    /// Prepare the record and persist it. Returns the record id.
    ///
    /// The session is meant to be dropped after a successful save.
    pub async fn save<E: AssetEncoder, S: RecordStore>(
        &mut self,
        store: &mut S,
        encoder: &E,
        defaults: NumericDefaults,
    ) -> Result<i64> {
        let record = self.prepare(encoder, defaults).await?;

        let id = match self.id {
            Some(id) => {
                store.update(self.kind, id, &record)?;
                id
            }
            None => store.create(self.kind, &record)?,
        };
        self.id = Some(id);

        info!("✅ saved {} #{}", self.kind, id);
        Ok(id)
    }

    /// Close the editor without saving. Pending encodes are simply not used.
    pub fn cancel(self) {
        debug!("edit session for {} discarded", self.kind);
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
