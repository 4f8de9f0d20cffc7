//! External record shape and its normalization into [`Individual`]s.
//!
//! The record store hands back loosely-typed JSON: any field may be missing,
//! ids may arrive as numbers, and gender may be spelled `sex`. [`RawRecord`]
//! accepts all of that. Nothing past the graph builder's ingestion boundary
//! sees a `RawRecord`; it is converted by [`RawRecord::normalize`] into the
//! strict model, or classified as a malformed record.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use pedigree_core::{
    identifier::Id,
    individual::{Gender, Individual},
};

/// One individual as returned by the external record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default, deserialize_with = "loose_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub prefix: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub suffix: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub species: Option<String>,
    #[serde(default, alias = "sex", deserialize_with = "loose_string")]
    pub gender: Option<String>,
    #[serde(default, alias = "sire_id", alias = "sire", deserialize_with = "loose_string")]
    pub sire_id: Option<String>,
    #[serde(default, alias = "dam_id", alias = "dam", deserialize_with = "loose_string")]
    pub dam_id: Option<String>,
    #[serde(
        default,
        alias = "imageUrl",
        alias = "image_url",
        deserialize_with = "loose_string"
    )]
    pub image: Option<String>,
    /// Set by the expander for records that came from the owner's list.
    #[serde(skip)]
    pub(crate) owned: bool,
}

impl RawRecord {
    /// Creates a record with the three fields every valid record needs.
    pub fn new(id: &str, name: &str, species: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            species: Some(species.to_string()),
            ..Self::default()
        }
    }

    pub fn with_gender(mut self, gender: &str) -> Self {
        self.gender = Some(gender.to_string());
        self
    }

    pub fn with_sire(mut self, sire_id: &str) -> Self {
        self.sire_id = Some(sire_id.to_string());
        self
    }

    pub fn with_dam(mut self, dam_id: &str) -> Self {
        self.dam_id = Some(dam_id.to_string());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    /// Marks the record as part of (or outside) the owner's own set.
    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = owned;
        self
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// The interned id of this record, if it carries a non-blank one.
    pub fn key(&self) -> Option<Id> {
        clean(&self.id).as_deref().map(Id::new)
    }

    pub fn sire_key(&self) -> Option<Id> {
        clean(&self.sire_id).as_deref().map(Id::new)
    }

    pub fn dam_key(&self) -> Option<Id> {
        clean(&self.dam_id).as_deref().map(Id::new)
    }

    /// Validates the record and converts it into an [`Individual`].
    ///
    /// Self references and identical sire/dam references are removed from the
    /// returned individual and reported alongside it.
    ///
    /// # Errors
    ///
    /// Returns a [`Diagnostic`] if the record has no id or no species; such a
    /// record is dropped from the node set entirely.
    pub fn normalize(&self) -> Result<(Individual, Vec<Diagnostic>), Diagnostic> {
        let id = self
            .key()
            .ok_or_else(|| Diagnostic::new(None, DiagnosticKind::MissingId))?;
        let species = clean(&self.species)
            .ok_or_else(|| Diagnostic::new(Some(id), DiagnosticKind::MissingSpecies))?;

        let mut issues = Vec::new();
        let mut sire_id = self.sire_key();
        let mut dam_id = self.dam_key();

        if sire_id == Some(id) {
            issues.push(Diagnostic::new(Some(id), DiagnosticKind::SelfParent));
            sire_id = None;
        }
        if dam_id == Some(id) {
            issues.push(Diagnostic::new(Some(id), DiagnosticKind::SelfParent));
            dam_id = None;
        }
        if sire_id.is_some() && sire_id == dam_id {
            issues.push(Diagnostic::new(Some(id), DiagnosticKind::SameSireAndDam));
            sire_id = None;
            dam_id = None;
        }

        let name = clean(&self.name).unwrap_or_else(|| id.to_string());
        let gender = clean(&self.gender)
            .map(|gender| Gender::parse(&gender))
            .unwrap_or_default();

        let individual = Individual::new(id, name, species, gender)
            .with_prefix(clean(&self.prefix))
            .with_suffix(clean(&self.suffix))
            .with_sire(sire_id)
            .with_dam(dam_id)
            .with_image(clean(&self.image))
            .with_owned(self.owned);

        Ok((individual, issues))
    }
}

/// Trimmed, non-empty copy of an optional field.
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accepts strings, numbers, booleans and null for a text field.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        Some(serde_json::Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a string or number, found {other}"
            )));
        }
    })
}

/// Classification of a malformed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// No usable id; the record is dropped.
    MissingId,
    /// No usable species; the record is dropped.
    MissingSpecies,
    /// A parent reference points at the individual itself; the reference is dropped.
    SelfParent,
    /// Sire and dam reference the same id; both references are dropped.
    SameSireAndDam,
    /// A parent reference points at a record that was itself dropped; the
    /// reference is removed and no placeholder stands in for it.
    MalformedParent,
    /// A parent edge would close a parentage cycle; it is not ranked.
    CyclicParentage,
}

/// A malformed-record finding, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    id: Option<Id>,
    kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(id: Option<Id>, kind: DiagnosticKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.kind {
            DiagnosticKind::MissingId => "record has no id and was dropped",
            DiagnosticKind::MissingSpecies => "record has no species and was dropped",
            DiagnosticKind::SelfParent => "record names itself as a parent; reference dropped",
            DiagnosticKind::SameSireAndDam => {
                "record names the same individual as sire and dam; references dropped"
            }
            DiagnosticKind::MalformedParent => {
                "record names a malformed record as a parent; reference dropped"
            }
            DiagnosticKind::CyclicParentage => {
                "parentage forms a cycle; ranking edge dropped"
            }
        };
        match self.id {
            Some(id) => write!(f, "{id}: {message}"),
            None => f.write_str(message),
        }
    }
}
