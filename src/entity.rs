//! Editors that carry an asset
//!
//! The six editors share one asset field implementation and differ only in
//! the record key, whether an asset is mandatory, the encoding policy and
//! their other form fields.

use std::fmt;
use std::str::FromStr;

use crate::media::PolicyVariant;
use crate::submit::{FieldSpec, FieldType};

/// Entity-specific part of the shared asset field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetFieldSpec {
    /// Record key holding the asset
    pub key: &'static str,
    /// An asset must exist unless one is already persisted and kept
    pub required: bool,
    pub policy: PolicyVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    BoardMember,
    Company,
    Gallery,
    Benefit,
    Training,
    Document,
}

const BOARD_MEMBER_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("full_name", FieldType::Text),
    FieldSpec::required("position", FieldType::Text),
    FieldSpec::optional("phone", FieldType::Phone),
    FieldSpec::optional("email", FieldType::Text),
    FieldSpec::optional("sort_order", FieldType::Quantity),
];

const COMPANY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", FieldType::Text),
    FieldSpec::optional("tax_code", FieldType::Code),
    FieldSpec::optional("phone", FieldType::Phone),
    FieldSpec::optional("website", FieldType::Text),
    FieldSpec::optional("description", FieldType::Text),
];

const GALLERY_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("taken_on", FieldType::Date),
];

const BENEFIT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("promo_code", FieldType::Code),
    FieldSpec::optional("discount", FieldType::Price),
    FieldSpec::optional("valid_until", FieldType::Date),
    FieldSpec::optional("phone", FieldType::Phone),
];

const TRAINING_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::required("starts_at", FieldType::DateTime),
    FieldSpec::optional("price", FieldType::Price),
    FieldSpec::optional("seats", FieldType::Quantity),
    FieldSpec::optional("contact_phone", FieldType::Phone),
];

const DOCUMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("title", FieldType::Text),
    FieldSpec::optional("published_on", FieldType::Date),
    FieldSpec::optional("registry_code", FieldType::Code),
];

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::BoardMember,
        EntityKind::Company,
        EntityKind::Gallery,
        EntityKind::Benefit,
        EntityKind::Training,
        EntityKind::Document,
    ];

    /// Stable name, used as the catalog table key and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::BoardMember => "board-member",
            EntityKind::Company => "company",
            EntityKind::Gallery => "gallery",
            EntityKind::Benefit => "benefit",
            EntityKind::Training => "training",
            EntityKind::Document => "document",
        }
    }

    pub fn asset_field(&self) -> AssetFieldSpec {
        let (key, required, policy) = match self {
            EntityKind::BoardMember => ("photo", true, PolicyVariant::Standard),
            EntityKind::Company => ("image", false, PolicyVariant::Standard),
            EntityKind::Gallery => ("image", true, PolicyVariant::Standard),
            EntityKind::Benefit => ("image", false, PolicyVariant::Standard),
            EntityKind::Training => ("image", false, PolicyVariant::Standard),
            EntityKind::Document => ("file", true, PolicyVariant::DocumentsOnly),
        };
        AssetFieldSpec {
            key,
            required,
            policy,
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            EntityKind::BoardMember => BOARD_MEMBER_FIELDS,
            EntityKind::Company => COMPANY_FIELDS,
            EntityKind::Gallery => GALLERY_FIELDS,
            EntityKind::Benefit => BENEFIT_FIELDS,
            EntityKind::Training => TRAINING_FIELDS,
            EntityKind::Document => DOCUMENT_FIELDS,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown entity {:?}, expected one of: {}", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!("board_member".parse::<EntityKind>().unwrap(), EntityKind::BoardMember);
        assert!("event".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_documents_never_compress() {
        let spec = EntityKind::Document.asset_field();
        assert_eq!(spec.key, "file");
        assert_eq!(spec.policy, PolicyVariant::DocumentsOnly);
        for kind in EntityKind::ALL.into_iter().filter(|k| *k != EntityKind::Document) {
            assert_eq!(kind.asset_field().policy, PolicyVariant::Standard);
        }
    }

    #[test]
    fn test_asset_key_is_not_a_form_field() {
        for kind in EntityKind::ALL {
            let key = kind.asset_field().key;
            assert!(kind.fields().iter().all(|f| f.name != key));
        }
    }
}
