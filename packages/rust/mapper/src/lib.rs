//! Row mapper: one club form response → one canonical feed record.
//!
//! The mapper is a pure function of the row, the two taxonomies and the
//! spreadsheet it came from. It never touches the network or the clock, so
//! the same sheet always maps to byte-identical records.
//!
//! - [`clean`] cleans cells and splits lists
//! - [`schema`] binds header rows and reads the typed [`ClubRow`]
//! - [`timestamp`] turns the submission timestamp into the record id and `modified`
//! - [`same_as`] resolves "same as …" answers
//! - [`map_row`] is the entry point

pub mod clean;
mod record;
pub mod same_as;
pub mod schema;
pub mod timestamp;

use clubfeed_shared::{CanonicalRecord, RecordKind, RecordState, Taxonomy};

pub use clean::{clean_string, list_from_string};
pub use schema::{BoundSchema, ClubRow, Column, LocationCells, OrganiserCells};
pub use timestamp::SubmissionStamp;

/// Why a verified row could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// Fewer than six numeric tokens in the `Timestamp` cell.
    #[error("malformed timestamp '{raw}' (expected D/M/Y H:M:S)")]
    MalformedTimestamp { raw: String },

    /// A listed label is not a `prefLabel` of its taxonomy.
    #[error("unknown concept '{label}' in {scheme}")]
    UnknownConcept { scheme: String, label: String },

    /// A non-empty coordinate cell that is not a finite number.
    #[error("malformed {field} '{raw}'")]
    MalformedCoordinate { field: &'static str, raw: String },
}

/// Everything a row needs besides its own cells.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    /// Spreadsheet the row came from; prefixes the record id.
    pub spreadsheet_id: &'a str,
    /// Prefix of the `@id` URIs.
    pub id_base_url: &'a str,
    /// Country written into every postal address.
    pub address_country: &'a str,
    pub activities: &'a Taxonomy,
    pub accessibility: &'a Taxonomy,
}

/// Whether the row was marked verified by a reviewer.
pub fn is_verified(row: &ClubRow) -> bool {
    row.verified.eq_ignore_ascii_case("yes")
}

/// Map one row. `Ok(None)` means the row is not verified and is skipped.
pub fn map_row(row: &ClubRow, ctx: &MapContext<'_>) -> Result<Option<CanonicalRecord>, MapError> {
    if !is_verified(row) {
        return Ok(None);
    }

    let stamp = SubmissionStamp::parse(&row.timestamp)?;
    let id = stamp.record_id(ctx.spreadsheet_id);
    let data = record::build_club(row, &id, ctx)?;

    Ok(Some(CanonicalRecord {
        id,
        kind: RecordKind::Club,
        state: RecordState::Updated,
        modified: stamp.modified(),
        data,
    }))
}

#[cfg(test)]
mod tests {
    use clubfeed_shared::{Logo, TaxonomyConcept};

    use super::*;

    const ACTIVITY_SCHEME: &str = "https://openactive.io/activity-list";
    const ACCESSIBILITY_SCHEME: &str = "https://openactive.io/accessibility-support";

    fn taxonomies() -> (Taxonomy, Taxonomy) {
        let concept = |id: &str, label: &str| TaxonomyConcept {
            id: id.into(),
            pref_label: label.into(),
        };
        (
            Taxonomy::new(
                ACTIVITY_SCHEME,
                vec![
                    concept("https://openactive.io/activity-list#netball", "Netball"),
                    concept("https://openactive.io/activity-list#walking-netball", "Walking Netball"),
                ],
            ),
            Taxonomy::new(
                ACCESSIBILITY_SCHEME,
                vec![concept(
                    "https://openactive.io/accessibility-support#visual",
                    "Visual impairment",
                )],
            ),
        )
    }

    fn verified_row() -> ClubRow {
        let mut row = ClubRow {
            timestamp: "5/3/2024 9:15:02".into(),
            verified: "Yes".into(),
            primary_email: "a@x.com".into(),
            activities: "Netball, Walking Netball".into(),
            accessibility_support: "Visual impairment".into(),
            accessibility_description: "Step-free access".into(),
            ..ClubRow::default()
        };
        row.location.name = "Leeds Sports Hall".into();
        row.location.street = "1 Park Lane".into();
        row.location.locality = "Leeds".into();
        row.location.postcode = "LS1 1AA".into();
        row.location.latitude = "51.1234567".into();
        row.location.email = "same as the primary contact email for this form".into();
        row.location.images = "https://x.org/1.jpg\nhttps://x.org/2.jpg".into();
        row.location.amenities = "Changing rooms\nParking".into();
        row.organiser.name = "Leeds Netball Club".into();
        row.organiser.email = "same as the location email".into();
        row.organiser.address = "same as the location physical address".into();
        row.organiser.social = "https://social.example/leedsnetball".into();
        row
    }

    fn map(row: &ClubRow) -> Result<Option<CanonicalRecord>, MapError> {
        let (activities, accessibility) = taxonomies();
        let ctx = MapContext {
            spreadsheet_id: "sheet1",
            id_base_url: "https://www.openactive.io",
            address_country: "GB",
            activities: &activities,
            accessibility: &accessibility,
        };
        map_row(row, &ctx)
    }

    #[test]
    fn unverified_rows_are_skipped() {
        for verified in ["", "no", "yes please", "y", "pending"] {
            let row = ClubRow {
                verified: verified.into(),
                timestamp: "not even a timestamp".into(),
                ..verified_row()
            };
            assert_eq!(map(&row), Ok(None), "verified = {verified:?}");
        }
    }

    #[test]
    fn maps_full_record() {
        let record = map(&verified_row()).expect("map").expect("verified");
        assert_eq!(record.id, "sheet1-2024-3-5-9-15-02");
        assert_eq!(record.modified, 20243591502);
        assert_eq!(record.kind, RecordKind::Club);
        assert_eq!(record.state, RecordState::Updated);

        let club = &record.data;
        assert_eq!(club.id, "https://www.openactive.io/sheet1-2024-3-5-9-15-02");
        assert_eq!(club.identifier, record.id);
        assert_eq!(club.activity.len(), 2);
        assert_eq!(club.activity[1].pref_label, "Walking Netball");
        assert_eq!(club.activity[1].in_scheme, ACTIVITY_SCHEME);
        assert_eq!(club.accessibility_support[0].in_scheme, ACCESSIBILITY_SCHEME);

        let location = &club.location;
        assert_eq!(location.identifier, "sheet1-2024-3-5-9-15-02-loc");
        assert_eq!(location.email, "a@x.com");
        assert_eq!(location.geo.latitude, Some(51.123457));
        assert_eq!(location.geo.longitude, None);
        assert_eq!(location.image.len(), 2);
        assert_eq!(location.amenity_feature[1].name, "Parking");

        let organizer = &club.organizer;
        assert_eq!(organizer.id, "https://www.openactive.io/sheet1-2024-3-5-9-15-02-org");
        assert_eq!(organizer.email, "a@x.com");
        assert_eq!(organizer.address, location.address);
        assert_eq!(organizer.logo, Logo::Empty {});
        assert_eq!(organizer.same_as, vec!["https://social.example/leedsnetball"]);
    }

    #[test]
    fn serialized_shape() {
        let record = map(&verified_row()).unwrap().unwrap();
        let json = serde_json::to_value(&record).expect("serialize");

        assert_eq!(json["kind"], "Club");
        assert_eq!(json["state"], "updated");
        assert_eq!(json["data"]["@type"], "Club");
        assert_eq!(json["data"]["@context"][1], "https://openactive.io/ns-beta");
        assert_eq!(json["data"]["activity"][0]["@type"], "Concept");
        assert_eq!(json["data"]["location"]["geo"]["longitude"], serde_json::Value::Null);
        assert_eq!(json["data"]["location"]["address"]["addressCountry"], "GB");
        assert_eq!(json["data"]["organizer"]["logo"], serde_json::json!({}));
        assert_eq!(json["data"]["location"]["amenityFeature"][0]["value"], true);
    }

    #[test]
    fn unknown_activity_fails_row() {
        let row = ClubRow {
            activities: "Netball, Quidditch".into(),
            ..verified_row()
        };
        let err = map(&row).unwrap_err();
        assert!(matches!(err, MapError::UnknownConcept { ref label, .. } if label == "Quidditch"));
    }

    #[test]
    fn unknown_accessibility_label_fails_row() {
        let row = ClubRow {
            accessibility_support: "Visual impairment, Telepathy".into(),
            ..verified_row()
        };
        match map(&row).unwrap_err() {
            MapError::UnknownConcept { scheme, label } => {
                assert_eq!(scheme, ACCESSIBILITY_SCHEME);
                assert_eq!(label, "Telepathy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_timestamp_fails_row() {
        let row = ClubRow {
            timestamp: "5/3/2024".into(),
            ..verified_row()
        };
        assert!(matches!(map(&row), Err(MapError::MalformedTimestamp { .. })));
    }

    #[test]
    fn logo_becomes_single_object() {
        let mut row = verified_row();
        row.organiser.logo = "https://x.org/logo.png".into();
        let record = map(&row).unwrap().unwrap();
        match &record.data.organizer.logo {
            Logo::Image(image) => assert_eq!(image.url, "https://x.org/logo.png"),
            Logo::Empty {} => panic!("expected an image"),
        }
    }

    #[test]
    fn mapping_is_deterministic() {
        let first = serde_json::to_vec(&map(&verified_row()).unwrap()).unwrap();
        let second = serde_json::to_vec(&map(&verified_row()).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
