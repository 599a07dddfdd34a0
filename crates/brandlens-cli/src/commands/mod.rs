pub mod analyze;
pub mod compare;

use brandlens_core::domain::candidate_representations;
use brandlens_core::{resolve_site, AnalysisError};
use brandlens_gsc::GscClient;

/// Build a client and resolve the requested site against the authorized
/// property listing.
pub(crate) async fn connect_and_resolve(
    access_token: &str,
    site: &str,
    timeout_secs: u64,
) -> anyhow::Result<(GscClient, String)> {
    let client = GscClient::new(access_token, timeout_secs).map_err(AnalysisError::from)?;
    let sites = client.list_sites().await.map_err(AnalysisError::from)?;

    let property = match resolve_site(site, &sites) {
        Ok(property) => property,
        Err(err @ AnalysisError::NoMatchingSite { .. }) => {
            eprintln!("Search Console may list this property under any of:");
            for candidate in candidate_representations(site) {
                eprintln!("  {candidate}");
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(%property, "resolved search console property");
    Ok((client, property))
}
