//! Validated identities the mirror and runner are constructed from

use crate::address::Address;
use std::collections::BTreeSet;
use std::time::Duration;

/// One configured exchange pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairIdentity {
    pub token: Address,
    pub exchange: Address,
}

/// Signing identity handed to the gateway on submission
///
/// `key_ref` is opaque to the core; the gateway resolves it to key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub address: Address,
    pub key_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub label: String,
    pub signer: Signer,
}

impl Participant {
    pub fn address(&self) -> Address {
        self.signer.address
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub price: u64,
    pub limit: u64,
}

/// Everything the core needs to know about the deployed network
#[derive(Debug, Clone)]
pub struct MirrorIdentities {
    pub base_asset: Address,
    pub factory: Address,
    pub pairs: Vec<PairIdentity>,
    pub participants: Vec<Participant>,
    pub observers: Vec<Address>,
    pub gas: GasSettings,
    pub confirmation_timeout: Duration,
    /// Network fees are paid in the base asset
    pub base_asset_is_fee_asset: bool,
}

impl MirrorIdentities {
    /// Participants and observers, deduplicated, in address order
    pub fn tracked_accounts(&self) -> Vec<Address> {
        self.participants
            .iter()
            .map(Participant::address)
            .chain(self.observers.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn exchanges(&self) -> Vec<Address> {
        self.pairs.iter().map(|p| p.exchange).collect()
    }

    pub fn tokens(&self) -> Vec<Address> {
        self.pairs.iter().map(|p| p.token).collect()
    }

    /// Every tracked asset: each token followed by the base asset
    pub fn assets(&self) -> Vec<Address> {
        let mut assets = self.tokens();
        assets.push(self.base_asset);
        assets
    }

    pub fn pair_for_exchange(&self, exchange: &Address) -> Option<PairIdentity> {
        self.pairs.iter().copied().find(|p| &p.exchange == exchange)
    }

    pub fn pair_for_token(&self, token: &Address) -> Option<PairIdentity> {
        self.pairs.iter().copied().find(|p| &p.token == token)
    }

    pub fn participant(&self, label: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.label == label)
    }

    pub fn is_base_asset(&self, asset: &Address) -> bool {
        &self.base_asset == asset
    }
}
