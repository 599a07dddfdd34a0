use serde::Deserialize;

use crate::domain::base_domain;
use crate::error::AnalysisError;

/// Permission levels that allow querying a property's search analytics.
pub const ACCEPTED_PERMISSION_LEVELS: [&str; 3] =
    ["siteOwner", "siteFullUser", "siteRestrictedUser"];

/// One entry from the Search Console site listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    pub permission_level: String,
}

/// Resolve a requested site identifier against the authorized property
/// listing, returning the exact `site_url` to use for subsequent queries.
///
/// Entries are scanned in listing order; the first entry on the same base
/// domain with an accepted permission level wins.
///
/// # Errors
///
/// - [`AnalysisError::InsufficientPermission`] when a property matches the
///   domain but none of the matches carries an accepted level.
/// - [`AnalysisError::NoMatchingSite`] when no property matches at all; the
///   error lists every available site identifier.
pub fn resolve_site(requested: &str, sites: &[SiteEntry]) -> Result<String, AnalysisError> {
    let domain = base_domain(requested);
    let mut blocked: Option<&SiteEntry> = None;

    for site in sites {
        if base_domain(&site.site_url) != domain {
            continue;
        }
        if ACCEPTED_PERMISSION_LEVELS.contains(&site.permission_level.as_str()) {
            return Ok(site.site_url.clone());
        }
        blocked.get_or_insert(site);
    }

    match blocked {
        Some(site) => Err(AnalysisError::InsufficientPermission {
            site_url: site.site_url.clone(),
            level: site.permission_level.clone(),
        }),
        None => Err(AnalysisError::NoMatchingSite {
            requested: requested.to_string(),
            domain,
            available: sites.iter().map(|s| s.site_url.clone()).collect(),
        }),
    }
}
