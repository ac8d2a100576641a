//! Folder routing: which storage zone receives a file, and which domain
//! serves it.
//!
//! Zone selection and delivery-domain lookup are independent. A custom
//! domain only changes the URL a file is served from, never the zone it is
//! stored in.

use std::collections::BTreeMap;

use mediadrop_core::{is_within_folder, normalize_path};

use crate::config::{BunnyConfig, CustomDomain, StorageZone};
use crate::error::BunnyError;

/// Pick the storage zone for `file_path`.
///
/// Zones are tried in order and the first one with a folder equal to, or a
/// parent of, the normalized path wins. Without a match the zone named
/// `default_zone` is used, and failing that the first zone. Only an empty
/// zone list is an error.
pub fn select_zone<'a>(
    file_path: &str,
    zones: &'a [StorageZone],
    default_zone: Option<&str>,
) -> Result<&'a StorageZone, BunnyError> {
    let path = normalize_path(file_path);

    if let Some(zone) = zones
        .iter()
        .find(|zone| zone.folders.iter().any(|folder| is_within_folder(&path, folder)))
    {
        return Ok(zone);
    }

    default_zone
        .and_then(|name| zones.iter().find(|zone| zone.name == name))
        .or_else(|| zones.first())
        .ok_or_else(|| BunnyError::NotConfigured("no Bunny storage zones are configured".into()))
}

/// The custom delivery domain for `path`, if any. When several folders
/// match, the longest (most specific) one wins.
pub fn custom_domain_for_path<'a>(
    path: &str,
    custom_domains: &'a [CustomDomain],
) -> Option<&'a str> {
    custom_domains
        .iter()
        .filter(|entry| {
            !entry.domain.trim().is_empty() && is_within_folder(path, &entry.folder)
        })
        .max_by_key(|entry| normalize_path(&entry.folder).len())
        .map(|entry| entry.domain.as_str())
}

/// Human-readable problems with the routing table that do not prevent
/// uploads but probably are not what the user meant.
pub fn routing_warnings(config: &BunnyConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(default) = config.default_zone.as_deref().filter(|d| !d.is_empty())
        && config.zone(default).is_none()
    {
        warnings.push(format!(
            "default zone {default:?} does not exist; the first zone is used instead"
        ));
    }

    let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for zone in &config.zones {
        for folder in &zone.folders {
            let folder = normalize_path(folder);
            if !folder.is_empty() {
                owners.entry(folder).or_default().push(&zone.name);
            }
        }
    }
    for (folder, zones) in owners {
        if zones.len() > 1 {
            warnings.push(format!(
                "folder {folder:?} is claimed by zones {}; {:?} wins",
                zones.join(", "),
                zones[0]
            ));
        }
    }

    for zone in config.zones.iter().filter(|zone| !zone.is_usable()) {
        warnings.push(format!("zone {:?} has no access key", zone.name));
    }

    warnings
}
