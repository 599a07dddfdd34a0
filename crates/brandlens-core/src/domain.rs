//! Canonical base-domain form for Search Console site identifiers.
//!
//! Properties come in several external representations (`sc-domain:` domain
//! properties, `https://`/`http://` URL-prefix properties, with or without
//! `www.`). Matching a user-supplied site against the authorized listing is
//! done by reducing both sides to the same base-domain form.

/// Reduce a site identifier to its comparable base domain.
///
/// Case-folds and trims, then strips any `scheme://` prefix, everything from
/// the first `/`, a `sc-domain:` prefix, and a leading `www.`. Idempotent:
/// applying it to its own output changes nothing.
#[must_use]
pub fn base_domain(url: &str) -> String {
    let mut rest = url.trim().to_lowercase();
    if let Some((_, after_scheme)) = rest.split_once("://") {
        rest = after_scheme.to_string();
    }
    if let Some((host, _)) = rest.split_once('/') {
        rest = host.to_string();
    }
    let rest = rest.strip_prefix("sc-domain:").unwrap_or(&rest);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest.to_string()
}

/// All external representations a property with this base domain can have,
/// in the order they should be tried against the authorized listing.
#[must_use]
pub fn candidate_representations(domain: &str) -> Vec<String> {
    let d = base_domain(domain);
    vec![
        format!("sc-domain:{d}"),
        format!("https://www.{d}/"),
        format!("https://{d}/"),
        format!("http://www.{d}/"),
        format!("http://{d}/"),
    ]
}
