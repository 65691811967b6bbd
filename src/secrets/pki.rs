//! Certificate issuance pipeline.
//!
//! Issues every configured certificate spec, in order, against Vault's PKI
//! engine. The first failure aborts the whole call and discards anything
//! issued earlier in the same request: issuance is all-or-nothing per
//! request, and no partial bundle set ever reaches the renderer.

use std::collections::BTreeMap;

use tracing::{error, info};
use vaultrs::api::pki::requests::GenerateCertificateRequestBuilder;
use vaultrs::pki::cert;

use crate::config::CertSpec;
use crate::errors::{Error, Result};

use super::vault::VaultSession;

/// Output of one issuance: certificate, private key and the ordered CA
/// chain. Produced fresh per request; never persisted server-side.
#[derive(Debug, Clone)]
pub struct CertBundle {
    pub certificate: String,
    pub private_key: String,
    pub ca_chain: Vec<String>,
}

/// Issue every configured certificate, fail-fast, keyed by common name.
pub async fn issue_all(
    session: &VaultSession,
    specs: &[CertSpec],
) -> Result<BTreeMap<String, CertBundle>> {
    let mut bundles = BTreeMap::new();

    for spec in specs {
        let (mount, role) = spec.mount_and_role()?;

        let mut opts = GenerateCertificateRequestBuilder::default();
        opts.common_name(&spec.common_name);
        if let Some(ttl) = &spec.ttl {
            opts.ttl(ttl);
        }
        if let Some(format) = &spec.format {
            opts.format(format);
        }
        if let Some(alt_names) = &spec.alt_names {
            opts.alt_names(alt_names);
        }
        if let Some(ip_sans) = &spec.ip_sans {
            opts.ip_sans(ip_sans);
        }

        let response = cert::generate(session.client(), mount, role, Some(&mut opts))
            .await
            .map_err(|e| {
                error!(common_name = %spec.common_name, error = %e, "certificate issuance failed");
                Error::backend(format!(
                    "certificate issuance failed for '{}': {}",
                    spec.common_name, e
                ))
            })?;

        let ca_chain =
            response.ca_chain.unwrap_or_else(|| vec![response.issuing_ca.clone()]);

        info!(
            common_name = %spec.common_name,
            serial_number = %response.serial_number,
            "issued certificate"
        );

        bundles.insert(
            spec.common_name.clone(),
            CertBundle {
                certificate: response.certificate,
                private_key: response.private_key,
                ca_chain,
            },
        );
    }

    Ok(bundles)
}
