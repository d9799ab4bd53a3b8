use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::processing::dictionaries::Dictionaries;

// Order matters: the first city found in the location wins
const CITY_REGIONS: &[(&str, &str)] = &[
    ("paris", "Île-de-France"),
    ("lyon", "Auvergne-Rhône-Alpes"),
    ("marseille", "Provence-Alpes-Côte d'Azur"),
    ("toulouse", "Occitanie"),
    ("nantes", "Pays de la Loire"),
    ("strasbourg", "Grand Est"),
    ("lille", "Hauts-de-France"),
    ("rennes", "Bretagne"),
    ("bordeaux", "Nouvelle-Aquitaine"),
];

static POSTAL_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5})\b").expect("postal code regex is valid"));

/// Region from a free-text location, by substring match on a fixed city table.
pub fn extract_region_from_location(location: Option<&str>) -> Option<String> {
    let lowered = location?.to_lowercase();
    CITY_REGIONS
        .iter()
        .find(|(city, _)| lowered.contains(city))
        .map(|(_, region)| region.to_string())
}

/// Region for a postal code: exact match first, then the two-digit department prefix.
pub fn region_from_postal_code(dicts: &Dictionaries, postal_code: Option<&str>) -> Option<String> {
    let code = postal_code?.trim();
    if code.is_empty() {
        return None;
    }
    dicts
        .region(code)
        .or_else(|| code.get(..2).and_then(|prefix| dicts.region(prefix)))
        .map(str::to_string)
}

/// City table first; if no known city appears, a five-digit postal code in the text is tried.
pub fn region_for_location(dicts: &Dictionaries, location: Option<&str>) -> Option<String> {
    extract_region_from_location(location).or_else(|| {
        let location = location?;
        let code = POSTAL_CODE.captures(location)?.get(1)?.as_str();
        region_from_postal_code(dicts, Some(code))
    })
}
