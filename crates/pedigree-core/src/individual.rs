//! The strict individual model shared by every pedigree stage.
//!
//! An [`Individual`] is only ever created from a validated record or as a
//! placeholder for a parent that is referenced but was never fetched. Apart
//! from the transient selection flag it is immutable once built.

use std::fmt;

use serde::Serialize;

use crate::identifier::Id;

/// Gender of an individual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Parses the free-form gender strings found in external records.
    ///
    /// Matching is case-insensitive; anything unrecognised maps to
    /// [`Gender::Unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use pedigree_core::individual::Gender;
    /// assert_eq!(Gender::parse("Male"), Gender::Male);
    /// assert_eq!(Gender::parse(" f "), Gender::Female);
    /// assert_eq!(Gender::parse("neutered"), Gender::Unknown);
    /// ```
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "sire" | "buck" | "stallion" => Self::Male,
            "female" | "f" | "dam" | "doe" | "mare" => Self::Female,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        };
        f.write_str(text)
    }
}

/// One animal record participating in the pedigree graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Individual {
    id: Id,
    name: String,
    prefix: Option<String>,
    suffix: Option<String>,
    species: String,
    gender: Gender,
    sire_id: Option<Id>,
    dam_id: Option<Id>,
    image: Option<String>,
    is_owned: bool,
    selected: bool,
}

impl Individual {
    /// Creates an individual with no parents, decorations or image.
    pub fn new(id: Id, name: impl Into<String>, species: impl Into<String>, gender: Gender) -> Self {
        Self {
            id,
            name: name.into(),
            prefix: None,
            suffix: None,
            species: species.into(),
            gender,
            sire_id: None,
            dam_id: None,
            image: None,
            is_owned: false,
            selected: false,
        }
    }

    /// Creates a placeholder for a parent referenced by a child but absent
    /// from the fetched set.
    ///
    /// The placeholder is named after its id and is never owned.
    pub fn placeholder(id: Id, gender: Gender, species: impl Into<String>) -> Self {
        Self::new(id, id.to_string(), species, gender)
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_suffix(mut self, suffix: Option<String>) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn with_sire(mut self, sire_id: Option<Id>) -> Self {
        self.sire_id = sire_id;
        self
    }

    pub fn with_dam(mut self, dam_id: Option<Id>) -> Self {
        self.dam_id = dam_id;
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_owned(mut self, is_owned: bool) -> Self {
        self.is_owned = is_owned;
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn sire_id(&self) -> Option<Id> {
        self.sire_id
    }

    pub fn dam_id(&self) -> Option<Id> {
        self.dam_id
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// True if the record came from the owner's own list rather than being
    /// discovered as a relative or synthesized as a placeholder.
    pub fn is_owned(&self) -> bool {
        self.is_owned
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Sets the transient UI selection flag.
    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// The parent used to rank this individual: the sire, else the dam.
    pub fn representative_parent(&self) -> Option<Id> {
        self.sire_id.or(self.dam_id)
    }

    /// Name with its prefix and suffix decorations, space separated.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pedigree_core::{identifier::Id, individual::{Gender, Individual}};
    /// let rex = Individual::new(Id::new("doc-rex"), "Rex", "dog", Gender::Male)
    ///     .with_prefix(Some("CH".to_string()))
    ///     .with_suffix(Some("CD".to_string()));
    /// assert_eq!(rex.display_name(), "CH Rex CD");
    /// ```
    pub fn display_name(&self) -> String {
        [self.prefix.as_deref(), Some(self.name.as_str()), self.suffix.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id)
    }
}
