//! Building the OpenActive `Club` object from a cleaned row.

use clubfeed_shared::{
    Club, Concept, GeoCoordinates, ImageObject, LocationFeatureSpecification, Logo,
    OPENACTIVE_CONTEXT, Organization, Place, PostalAddress, Taxonomy,
};

use crate::clean::list_from_string;
use crate::same_as;
use crate::schema::ClubRow;
use crate::{MapContext, MapError};

/// Decimal places kept on coordinates.
const COORDINATE_DECIMALS: i32 = 6;

pub(crate) fn build_club(row: &ClubRow, id: &str, ctx: &MapContext<'_>) -> Result<Club, MapError> {
    let base = ctx.id_base_url.trim_end_matches('/');

    let activity = resolve_concepts(&row.activities, ctx.activities)?;
    let accessibility_support = resolve_concepts(&row.accessibility_support, ctx.accessibility)?;

    let loc = &row.location;
    let org = &row.organiser;

    let location_address = postal_address(
        &loc.street,
        &loc.locality,
        &loc.region,
        &loc.postcode,
        ctx.address_country,
    );
    let organiser_address = postal_address(
        &org.street,
        &org.locality,
        &org.region,
        &org.postcode,
        ctx.address_country,
    );
    let contacts = same_as::resolve(row, &location_address, organiser_address);

    let geo = GeoCoordinates {
        type_: "GeoCoordinates".into(),
        latitude: parse_coordinate(&loc.latitude, "latitude")?,
        longitude: parse_coordinate(&loc.longitude, "longitude")?,
    };

    let location = Place {
        type_: "Place".into(),
        id: format!("{base}/{id}-loc"),
        identifier: format!("{id}-loc"),
        name: loc.name.clone(),
        description: loc.description.clone(),
        address: location_address,
        geo,
        telephone: loc.telephone.clone(),
        email: contacts.location_email,
        url: loc.url.clone(),
        image: list_from_string(&loc.images, '\n')
            .into_iter()
            .map(ImageObject::new)
            .collect(),
        amenity_feature: list_from_string(&loc.amenities, '\n')
            .into_iter()
            .map(LocationFeatureSpecification::present)
            .collect(),
    };

    let organizer = Organization {
        type_: "Organization".into(),
        id: format!("{base}/{id}-org"),
        identifier: format!("{id}-org"),
        name: org.name.clone(),
        legal_name: org.legal_name.clone(),
        description: org.description.clone(),
        address: contacts.organiser_address,
        telephone: contacts.organiser_telephone,
        email: contacts.organiser_email,
        url: contacts.organiser_url,
        logo: Logo::from_url(&org.logo),
        same_as: list_from_string(&org.social, '\n'),
    };

    Ok(Club {
        context: OPENACTIVE_CONTEXT.iter().map(|s| s.to_string()).collect(),
        type_: "Club".into(),
        id: format!("{base}/{id}"),
        identifier: id.to_string(),
        activity,
        accessibility_support,
        accessibility_information: row.accessibility_description.clone(),
        location,
        organizer,
    })
}

/// Look up every comma-separated label; the first unknown label fails the row.
fn resolve_concepts(cell: &str, taxonomy: &Taxonomy) -> Result<Vec<Concept>, MapError> {
    list_from_string(cell, ',')
        .into_iter()
        .map(|label| match taxonomy.resolve(&label) {
            Some(uri) => Ok(Concept {
                type_: "Concept".into(),
                id: uri.to_string(),
                pref_label: label,
                in_scheme: taxonomy.scheme.clone(),
            }),
            None => Err(MapError::UnknownConcept {
                scheme: taxonomy.scheme.clone(),
                label,
            }),
        })
        .collect()
}

fn postal_address(
    street: &str,
    locality: &str,
    region: &str,
    postcode: &str,
    country: &str,
) -> PostalAddress {
    PostalAddress {
        type_: "PostalAddress".into(),
        street_address: street.to_string(),
        address_locality: locality.to_string(),
        address_region: region.to_string(),
        address_country: country.to_string(),
        postal_code: postcode.to_string(),
    }
}

/// Empty cell → `None`. Otherwise parse and round half away from zero to
/// [`COORDINATE_DECIMALS`] places. Values too large to scale are kept as
/// parsed.
pub(crate) fn parse_coordinate(cell: &str, field: &'static str) -> Result<Option<f64>, MapError> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| MapError::MalformedCoordinate {
            field,
            raw: cell.to_string(),
        })?;
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return Ok(Some(value));
    }
    Ok(Some(scaled.round() / scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_round_to_six_places() {
        assert_eq!(parse_coordinate("51.1234567", "latitude").unwrap(), Some(51.123457));
        assert_eq!(parse_coordinate("-1.5491221", "longitude").unwrap(), Some(-1.549122));
        assert_eq!(parse_coordinate("53", "latitude").unwrap(), Some(53.0));
    }

    #[test]
    fn huge_coordinate_stays_finite() {
        let parsed = parse_coordinate("1e305", "latitude").unwrap();
        assert_eq!(parsed, Some(1e305));
        let json = serde_json::to_value(parsed).unwrap();
        assert!(json.is_number());
    }

    #[test]
    fn empty_coordinate_is_none() {
        assert_eq!(parse_coordinate("", "latitude").unwrap(), None);
    }

    #[test]
    fn unparseable_coordinate_fails() {
        let err = parse_coordinate("51°N", "latitude").unwrap_err();
        assert!(matches!(err, MapError::MalformedCoordinate { field: "latitude", .. }));
        assert!(parse_coordinate("NaN", "longitude").is_err());
        assert!(parse_coordinate("inf", "longitude").is_err());
    }

    #[test]
    fn unknown_label_names_scheme_and_label() {
        let taxonomy = Taxonomy::new("https://openactive.io/activity-list", vec![]);
        let err = resolve_concepts("Quidditch", &taxonomy).unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownConcept {
                scheme: "https://openactive.io/activity-list".into(),
                label: "Quidditch".into(),
            }
        );
    }
}
