//! Serializable listing of an extraction, used by `emlsift list`.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{Envelope, Extraction, Role};

/// One listed result. The payload itself is represented by size and digest.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub name: String,
    pub role: Role,
    pub content_type: String,
    pub transfer_encoding: String,
    pub content_id: Option<String>,
    pub size: usize,
    /// Lowercase hex SHA-256 of the decoded data.
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(flatten)]
    pub envelope: Envelope,
    pub results: Vec<ManifestEntry>,
    pub warnings: Vec<String>,
}

/// Build the manifest for an extraction.
pub fn manifest(extraction: &Extraction) -> Manifest {
    let results = extraction
        .results
        .iter()
        .enumerate()
        .map(|(index, r)| ManifestEntry {
            index,
            name: r.name.clone(),
            role: r.role,
            content_type: r.content_type.clone(),
            transfer_encoding: r.transfer_encoding.clone(),
            content_id: r.content_id.clone(),
            size: r.data.len(),
            sha256: format!("{:x}", Sha256::digest(&r.data)),
        })
        .collect();

    Manifest {
        envelope: extraction.envelope.clone(),
        results,
        warnings: extraction.warnings.iter().map(|w| w.to_string()).collect(),
    }
}
