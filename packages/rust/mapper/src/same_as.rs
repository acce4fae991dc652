//! "Same as …" answers on the club form.
//!
//! Several organiser questions (and the location email) let the submitter
//! answer with a fixed sentence instead of a value. Each such cell is first
//! parsed into a [`Sourced`] choice, then all choices are resolved together
//! in dependency order: location fields before organiser fields, because the
//! organiser email may point at the location email, which may itself point
//! at the primary contact email.

use clubfeed_shared::PostalAddress;

use crate::schema::ClubRow;

/// Answer meaning "use the form's primary contact email".
pub const SAME_AS_PRIMARY_CONTACT_EMAIL: &str = "same as the primary contact email for this form";
pub const SAME_AS_LOCATION_TELEPHONE: &str = "same as the location telephone";
pub const SAME_AS_LOCATION_EMAIL: &str = "same as the location email";
pub const SAME_AS_LOCATION_URL: &str = "same as the location main web address";
pub const SAME_AS_LOCATION_ADDRESS: &str = "same as the location physical address";

/// Where a field's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sourced<T> {
    /// The submitted value itself.
    Verbatim(T),
    /// The matching location field, after its own resolution.
    SameAsLocation,
    /// The primary contact email of the form.
    SameAsPrimaryContact,
}

fn answers(cell: &str, phrase: &str) -> bool {
    cell.eq_ignore_ascii_case(phrase)
}

/// The parsed choices of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactChoices<'a> {
    pub location_email: Sourced<&'a str>,
    pub organiser_telephone: Sourced<&'a str>,
    pub organiser_email: Sourced<&'a str>,
    pub organiser_url: Sourced<&'a str>,
    /// `Verbatim(())` means "use the organiser's own address cells".
    pub organiser_address: Sourced<()>,
}

impl<'a> ContactChoices<'a> {
    pub fn parse(row: &'a ClubRow) -> Self {
        let location_email = if answers(&row.location.email, SAME_AS_PRIMARY_CONTACT_EMAIL) {
            Sourced::SameAsPrimaryContact
        } else {
            Sourced::Verbatim(row.location.email.as_str())
        };

        let organiser = &row.organiser;
        let organiser_email = if answers(&organiser.email, SAME_AS_PRIMARY_CONTACT_EMAIL) {
            Sourced::SameAsPrimaryContact
        } else if answers(&organiser.email, SAME_AS_LOCATION_EMAIL) {
            Sourced::SameAsLocation
        } else {
            Sourced::Verbatim(organiser.email.as_str())
        };

        Self {
            location_email,
            organiser_telephone: same_as_location(&organiser.telephone, SAME_AS_LOCATION_TELEPHONE),
            organiser_email,
            organiser_url: same_as_location(&organiser.url, SAME_AS_LOCATION_URL),
            organiser_address: if answers(&organiser.address, SAME_AS_LOCATION_ADDRESS) {
                Sourced::SameAsLocation
            } else {
                Sourced::Verbatim(())
            },
        }
    }
}

fn same_as_location<'a>(cell: &'a str, phrase: &str) -> Sourced<&'a str> {
    if answers(cell, phrase) {
        Sourced::SameAsLocation
    } else {
        Sourced::Verbatim(cell)
    }
}

/// Final contact values for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContacts {
    pub location_email: String,
    pub organiser_telephone: String,
    pub organiser_email: String,
    pub organiser_url: String,
    pub organiser_address: PostalAddress,
}

/// Resolve every choice of `row`. `location_address` and `organiser_address`
/// are the addresses built from each party's own cells.
pub fn resolve(
    row: &ClubRow,
    location_address: &PostalAddress,
    organiser_address: PostalAddress,
) -> ResolvedContacts {
    let choices = ContactChoices::parse(row);
    let primary = row.primary_email.as_str();

    // Location first: the organiser email may defer to it.
    let location_email = match choices.location_email {
        Sourced::Verbatim(v) => v,
        Sourced::SameAsLocation | Sourced::SameAsPrimaryContact => primary,
    }
    .to_string();

    let organiser_email = match choices.organiser_email {
        Sourced::Verbatim(v) => v.to_string(),
        Sourced::SameAsLocation => location_email.clone(),
        Sourced::SameAsPrimaryContact => primary.to_string(),
    };

    let organiser_telephone = match choices.organiser_telephone {
        Sourced::Verbatim(v) => v,
        _ => row.location.telephone.as_str(),
    }
    .to_string();

    let organiser_url = match choices.organiser_url {
        Sourced::Verbatim(v) => v,
        _ => row.location.url.as_str(),
    }
    .to_string();

    let organiser_address = match choices.organiser_address {
        Sourced::Verbatim(()) => organiser_address,
        _ => location_address.clone(),
    };

    ResolvedContacts {
        location_email,
        organiser_telephone,
        organiser_email,
        organiser_url,
        organiser_address,
    }
}
