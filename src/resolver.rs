use crate::domain::{CompoundRecord, Provider};
use crate::error::PhytoError;
use crate::pubchem::PubchemClient;

/// What a provider needs to fetch one structure file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCompound {
    Cid(u64),
    Imppat(String),
}

/// Offline part of resolution: the key a compound is stored under. For
/// PubChem that is the display name, for IMPPAT the identifier column.
pub fn structure_key(record: &CompoundRecord, provider: Provider) -> Result<String, PhytoError> {
    match provider {
        Provider::Pubchem => {
            let name = record.name.trim();
            if name.is_empty() {
                return Err(PhytoError::IdentifierNotFound(record.name.clone()));
            }
            Ok(name.to_string())
        }
        Provider::Imppat => record
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PhytoError::MissingIdentifier(record.name.clone())),
    }
}

/// Maps a compound to the provider identifier. The PubChem lookup takes the
/// first CID when a name is ambiguous.
pub fn resolve<P: PubchemClient>(
    record: &CompoundRecord,
    provider: Provider,
    pubchem: &P,
) -> Result<ResolvedCompound, PhytoError> {
    let key = structure_key(record, provider)?;
    match provider {
        Provider::Pubchem => pubchem
            .lookup_cids(&key)?
            .first()
            .copied()
            .map(ResolvedCompound::Cid)
            .ok_or(PhytoError::IdentifierNotFound(key)),
        Provider::Imppat => Ok(ResolvedCompound::Imppat(key)),
    }
}
