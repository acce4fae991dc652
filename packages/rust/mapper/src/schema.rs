//! Binding a sheet's header row to the column schema.
//!
//! Each spreadsheet is bound once: header names are resolved to positions,
//! and every data row is then read into a typed [`ClubRow`] by position.

use clubfeed_shared::{ClubfeedError, ColumnSchema, Result};
use tracing::warn;

use crate::clean::clean_string;

/// Every logical field read from a form response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    Verified,
    PrimaryEmail,
    Activities,
    AccessibilitySupport,
    AccessibilityDescription,
    LocationName,
    LocationDescription,
    LocationStreet,
    LocationLocality,
    LocationRegion,
    LocationPostcode,
    LocationLatitude,
    LocationLongitude,
    LocationTelephone,
    LocationEmail,
    LocationUrl,
    LocationImages,
    LocationAmenities,
    OrganiserName,
    OrganiserLegalName,
    OrganiserDescription,
    OrganiserAddress,
    OrganiserStreet,
    OrganiserLocality,
    OrganiserRegion,
    OrganiserPostcode,
    OrganiserTelephone,
    OrganiserEmail,
    OrganiserUrl,
    OrganiserLogo,
    OrganiserSocial,
}

impl Column {
    pub const ALL: [Column; 32] = [
        Column::Timestamp,
        Column::Verified,
        Column::PrimaryEmail,
        Column::Activities,
        Column::AccessibilitySupport,
        Column::AccessibilityDescription,
        Column::LocationName,
        Column::LocationDescription,
        Column::LocationStreet,
        Column::LocationLocality,
        Column::LocationRegion,
        Column::LocationPostcode,
        Column::LocationLatitude,
        Column::LocationLongitude,
        Column::LocationTelephone,
        Column::LocationEmail,
        Column::LocationUrl,
        Column::LocationImages,
        Column::LocationAmenities,
        Column::OrganiserName,
        Column::OrganiserLegalName,
        Column::OrganiserDescription,
        Column::OrganiserAddress,
        Column::OrganiserStreet,
        Column::OrganiserLocality,
        Column::OrganiserRegion,
        Column::OrganiserPostcode,
        Column::OrganiserTelephone,
        Column::OrganiserEmail,
        Column::OrganiserUrl,
        Column::OrganiserLogo,
        Column::OrganiserSocial,
    ];

    /// Rows cannot be identified or filtered without these.
    pub fn is_required(self) -> bool {
        matches!(self, Column::Timestamp | Column::Verified)
    }

    /// Header text for this field under `schema`.
    pub fn header(self, schema: &ColumnSchema) -> &str {
        match self {
            Column::Timestamp => &schema.timestamp,
            Column::Verified => &schema.verified,
            Column::PrimaryEmail => &schema.primary_email,
            Column::Activities => &schema.activities,
            Column::AccessibilitySupport => &schema.accessibility_support,
            Column::AccessibilityDescription => &schema.accessibility_description,
            Column::LocationName => &schema.location_name,
            Column::LocationDescription => &schema.location_description,
            Column::LocationStreet => &schema.location_street,
            Column::LocationLocality => &schema.location_locality,
            Column::LocationRegion => &schema.location_region,
            Column::LocationPostcode => &schema.location_postcode,
            Column::LocationLatitude => &schema.location_latitude,
            Column::LocationLongitude => &schema.location_longitude,
            Column::LocationTelephone => &schema.location_telephone,
            Column::LocationEmail => &schema.location_email,
            Column::LocationUrl => &schema.location_url,
            Column::LocationImages => &schema.location_images,
            Column::LocationAmenities => &schema.location_amenities,
            Column::OrganiserName => &schema.organiser_name,
            Column::OrganiserLegalName => &schema.organiser_legal_name,
            Column::OrganiserDescription => &schema.organiser_description,
            Column::OrganiserAddress => &schema.organiser_address,
            Column::OrganiserStreet => &schema.organiser_street,
            Column::OrganiserLocality => &schema.organiser_locality,
            Column::OrganiserRegion => &schema.organiser_region,
            Column::OrganiserPostcode => &schema.organiser_postcode,
            Column::OrganiserTelephone => &schema.organiser_telephone,
            Column::OrganiserEmail => &schema.organiser_email,
            Column::OrganiserUrl => &schema.organiser_url,
            Column::OrganiserLogo => &schema.organiser_logo,
            Column::OrganiserSocial => &schema.organiser_social,
        }
    }
}

/// Header positions for one sheet.
#[derive(Debug, Clone)]
pub struct BoundSchema {
    positions: [Option<usize>; Column::ALL.len()],
    missing_optional: Vec<String>,
}

impl BoundSchema {
    /// Resolve every column of `schema` against a header row.
    ///
    /// Missing required columns fail the whole sheet. Missing optional
    /// columns are logged and read as empty cells. When a header repeats,
    /// the rightmost occurrence wins.
    pub fn bind(spreadsheet_id: &str, headers: &[String], schema: &ColumnSchema) -> Result<Self> {
        let mut positions = [None; Column::ALL.len()];
        let mut missing_required = Vec::new();
        let mut missing_optional = Vec::new();

        for (slot, column) in positions.iter_mut().zip(Column::ALL) {
            let name = column.header(schema);
            *slot = headers.iter().rposition(|h| h.trim() == name);
            if slot.is_none() {
                if column.is_required() {
                    missing_required.push(name.to_string());
                } else {
                    missing_optional.push(name.to_string());
                }
            }
        }

        if !missing_required.is_empty() {
            return Err(ClubfeedError::Schema {
                spreadsheet_id: spreadsheet_id.to_string(),
                missing: missing_required,
            });
        }

        if !missing_optional.is_empty() {
            warn!(
                spreadsheet_id,
                columns = ?missing_optional,
                "optional columns missing, reading them as empty"
            );
        }

        Ok(Self {
            positions,
            missing_optional,
        })
    }

    /// Optional columns absent from the header row.
    pub fn missing_optional(&self) -> &[String] {
        &self.missing_optional
    }

    /// Cleaned cell for `column`; short rows read as empty.
    fn cell(&self, row: &[String], column: Column) -> String {
        // `ALL` lists the variants in declaration order.
        self.positions[column as usize]
            .and_then(|i| row.get(i))
            .map(|v| clean_string(v))
            .unwrap_or_default()
    }

    /// Read one data row.
    pub fn read(&self, row: &[String]) -> ClubRow {
        let cell = |column| self.cell(row, column);
        ClubRow {
            timestamp: cell(Column::Timestamp),
            verified: cell(Column::Verified),
            primary_email: cell(Column::PrimaryEmail),
            activities: cell(Column::Activities),
            accessibility_support: cell(Column::AccessibilitySupport),
            accessibility_description: cell(Column::AccessibilityDescription),
            location: LocationCells {
                name: cell(Column::LocationName),
                description: cell(Column::LocationDescription),
                street: cell(Column::LocationStreet),
                locality: cell(Column::LocationLocality),
                region: cell(Column::LocationRegion),
                postcode: cell(Column::LocationPostcode),
                latitude: cell(Column::LocationLatitude),
                longitude: cell(Column::LocationLongitude),
                telephone: cell(Column::LocationTelephone),
                email: cell(Column::LocationEmail),
                url: cell(Column::LocationUrl),
                images: cell(Column::LocationImages),
                amenities: cell(Column::LocationAmenities),
            },
            organiser: OrganiserCells {
                name: cell(Column::OrganiserName),
                legal_name: cell(Column::OrganiserLegalName),
                description: cell(Column::OrganiserDescription),
                address: cell(Column::OrganiserAddress),
                street: cell(Column::OrganiserStreet),
                locality: cell(Column::OrganiserLocality),
                region: cell(Column::OrganiserRegion),
                postcode: cell(Column::OrganiserPostcode),
                telephone: cell(Column::OrganiserTelephone),
                email: cell(Column::OrganiserEmail),
                url: cell(Column::OrganiserUrl),
                logo: cell(Column::OrganiserLogo),
                social: cell(Column::OrganiserSocial),
            },
        }
    }
}

/// One form response, every cell already cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClubRow {
    pub timestamp: String,
    pub verified: String,
    pub primary_email: String,
    /// Comma-separated activity labels.
    pub activities: String,
    /// Comma-separated accessibility-support labels.
    pub accessibility_support: String,
    pub accessibility_description: String,
    pub location: LocationCells,
    pub organiser: OrganiserCells,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationCells {
    pub name: String,
    pub description: String,
    pub street: String,
    pub locality: String,
    pub region: String,
    pub postcode: String,
    pub latitude: String,
    pub longitude: String,
    pub telephone: String,
    /// Address, or the "same as primary contact" answer.
    pub email: String,
    pub url: String,
    /// Newline-separated image URLs.
    pub images: String,
    /// Newline-separated amenity names.
    pub amenities: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganiserCells {
    pub name: String,
    pub legal_name: String,
    pub description: String,
    /// Only consulted for the "same as the location" answer.
    pub address: String,
    pub street: String,
    pub locality: String,
    pub region: String,
    pub postcode: String,
    pub telephone: String,
    pub email: String,
    pub url: String,
    pub logo: String,
    /// Newline-separated social media URLs.
    pub social: String,
}
