//! Conversion of raw configuration into validated identities

use crate::mirror_config::MirrorConfig;
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;
use types::{
    Address, GasSettings, MirrorIdentities, PairIdentity, Participant, Signer, TypesError,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid address in {field}: {source}")]
    InvalidAddress { field: String, source: TypesError },

    #[error("No exchange pairs configured")]
    NoPairs,

    #[error("No participants configured")]
    NoParticipants,

    #[error("Duplicate {kind} {address}")]
    Duplicate { kind: &'static str, address: Address },

    #[error("Duplicate participant label '{0}'")]
    DuplicateLabel(String),

    #[error("Base asset {0} is also configured as a pair token")]
    BaseAssetIsToken(Address),

    #[error("Confirmation timeout must be positive")]
    ZeroTimeout,

    #[error("mirror.max_concurrent_reads must be positive")]
    ZeroConcurrency,
}

fn parse(field: impl Into<String>, value: &str) -> Result<Address, ValidationError> {
    let field = field.into();
    Address::from_hex(value).map_err(|source| ValidationError::InvalidAddress { field, source })
}

impl MirrorConfig {
    /// Validate and convert into the identities the core runs on
    pub fn identities(&self) -> Result<MirrorIdentities, ValidationError> {
        if self.network.confirmation_timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        if self.mirror.max_concurrent_reads == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }

        let base_asset = parse("contracts.base_asset", &self.contracts.base_asset)?;
        let factory = parse("contracts.factory", &self.contracts.factory)?;

        if self.contracts.pairs.is_empty() {
            return Err(ValidationError::NoPairs);
        }
        let mut seen = HashSet::new();
        let mut pairs = Vec::with_capacity(self.contracts.pairs.len());
        for (i, pair) in self.contracts.pairs.iter().enumerate() {
            let token = parse(format!("contracts.pairs[{i}].token"), &pair.token)?;
            let exchange = parse(format!("contracts.pairs[{i}].exchange"), &pair.exchange)?;
            if token == base_asset {
                return Err(ValidationError::BaseAssetIsToken(token));
            }
            if !seen.insert(token) {
                return Err(ValidationError::Duplicate {
                    kind: "token",
                    address: token,
                });
            }
            if !seen.insert(exchange) {
                return Err(ValidationError::Duplicate {
                    kind: "exchange",
                    address: exchange,
                });
            }
            pairs.push(PairIdentity { token, exchange });
        }

        if self.participants.is_empty() {
            return Err(ValidationError::NoParticipants);
        }
        let mut labels = HashSet::new();
        let mut addresses = HashSet::new();
        let mut participants = Vec::with_capacity(self.participants.len());
        for (i, p) in self.participants.iter().enumerate() {
            let address = parse(format!("participants[{i}].address"), &p.address)?;
            if !labels.insert(p.label.as_str()) {
                return Err(ValidationError::DuplicateLabel(p.label.clone()));
            }
            if !addresses.insert(address) {
                return Err(ValidationError::Duplicate {
                    kind: "participant",
                    address,
                });
            }
            participants.push(Participant {
                label: p.label.clone(),
                signer: Signer {
                    address,
                    key_ref: p.key_ref.clone(),
                },
            });
        }

        let observers = self
            .observers
            .iter()
            .enumerate()
            .map(|(i, o)| parse(format!("observers[{i}]"), o))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "✅ Configuration validated: {} pairs, {} participants, {} observers",
            pairs.len(),
            participants.len(),
            observers.len()
        );

        Ok(MirrorIdentities {
            base_asset,
            factory,
            pairs,
            participants,
            observers,
            gas: GasSettings {
                price: self.network.gas_price,
                limit: self.network.gas_limit,
            },
            confirmation_timeout: self.confirmation_timeout(),
            base_asset_is_fee_asset: self.mirror.base_asset_is_fee_asset,
        })
    }
}
