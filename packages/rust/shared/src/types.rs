//! Core domain types: canonical feed records and the OpenActive club object
//! they carry.
//!
//! Field names follow the OpenActive JSON-LD vocabulary, so the structs
//! serialize directly into the published artifact.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// JSON-LD contexts attached to every club object.
pub const OPENACTIVE_CONTEXT: [&str; 2] = ["https://openactive.io/", "https://openactive.io/ns-beta"];

/// Licence URL advertised on every feed page.
pub const DEFAULT_LICENSE: &str = "https://creativecommons.org/licenses/by/4.0/";

// ---------------------------------------------------------------------------
// CanonicalRecord
// ---------------------------------------------------------------------------

/// Item kind. This pipeline only ever publishes clubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Club,
}

/// RPDE item state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Updated,
    Deleted,
}

/// One item of the opportunities collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// `{spreadsheetId}-{Y}-{M}-{D}-{h}-{m}-{s}`.
    pub id: String,
    pub kind: RecordKind,
    pub state: RecordState,
    /// The id's six timestamp tokens concatenated; sortable, not a date.
    pub modified: u64,
    pub data: Club,
}

// ---------------------------------------------------------------------------
// Club JSON-LD
// ---------------------------------------------------------------------------

/// `Club` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub identifier: String,
    pub activity: Vec<Concept>,
    pub accessibility_support: Vec<Concept>,
    pub accessibility_information: String,
    pub location: Place,
    pub organizer: Organization,
}

/// A controlled-vocabulary concept reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub pref_label: String,
    pub in_scheme: String,
}

/// `Place` object describing where the club meets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub address: PostalAddress,
    pub geo: GeoCoordinates,
    pub telephone: String,
    pub email: String,
    pub url: String,
    pub image: Vec<ImageObject>,
    pub amenity_feature: Vec<LocationFeatureSpecification>,
}

/// `Organization` object describing who runs the club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "@type")]
    pub type_: String,
    #[serde(rename = "@id")]
    pub id: String,
    pub identifier: String,
    pub name: String,
    pub legal_name: String,
    pub description: String,
    pub address: PostalAddress,
    pub telephone: String,
    pub email: String,
    pub url: String,
    pub logo: Logo,
    pub same_as: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(rename = "@type")]
    pub type_: String,
    pub street_address: String,
    pub address_locality: String,
    pub address_region: String,
    pub address_country: String,
    pub postal_code: String,
}

/// Coordinates are `null` (not `0`, not `""`) when the cell was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    #[serde(rename = "@type")]
    pub type_: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Image reference. Width and height are reserved and never populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageObject {
    #[serde(rename = "@type")]
    pub type_: String,
    pub url: String,
}

impl ImageObject {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            type_: "ImageObject".into(),
            url: url.into(),
        }
    }
}

/// Organiser logo: one image, or an empty object `{}` when none was given.
///
/// Consumers expect an object in both cases, never a list and never a
/// missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Logo {
    Image(ImageObject),
    Empty {},
}

impl Logo {
    /// Build from a cleaned URL cell.
    pub fn from_url(url: &str) -> Self {
        if url.is_empty() {
            Self::Empty {}
        } else {
            Self::Image(ImageObject::new(url))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFeatureSpecification {
    #[serde(rename = "@type")]
    pub type_: String,
    pub name: String,
    pub value: bool,
}

impl LocationFeatureSpecification {
    /// An amenity the location offers.
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            type_: "LocationFeatureSpecification".into(),
            name: name.into(),
            value: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// One entry of a published concept scheme document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyConcept {
    pub id: String,
    pub pref_label: String,
}

/// A concept scheme flattened to a label → concept URI lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    /// Scheme URI, emitted as `inScheme` on every resolved concept.
    pub scheme: String,
    by_label: HashMap<String, String>,
}

impl Taxonomy {
    /// Build from a scheme's concepts. A repeated label keeps its last id.
    pub fn new(scheme: impl Into<String>, concepts: impl IntoIterator<Item = TaxonomyConcept>) -> Self {
        Self {
            scheme: scheme.into(),
            by_label: concepts
                .into_iter()
                .map(|c| (c.pref_label, c.id))
                .collect(),
        }
    }

    /// Concept URI for an exact `prefLabel`.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.by_label.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}
