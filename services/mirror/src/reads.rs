//! Individual gateway reads issued by the mirror
//!
//! Base-asset balances and allowances go through the gateway's native asset
//! calls; everything else is a pre-executed contract call whose payload is
//! decoded here. Tokens and exchange shares answer the same token-style
//! methods.

use crate::gateway::{GatewayError, RemoteLedgerGateway};
use codec::{decode_address, decode_integer, methods, CallArg};
use std::fmt;
use tracing::trace;
use types::{Address, I256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Read {
    BaseBalance { account: Address },
    BaseAllowance { owner: Address, spender: Address },
    TokenBalance { token: Address, account: Address },
    TokenAllowance { token: Address, owner: Address, spender: Address },
    TokenSupply { token: Address },
    ShareBalance { exchange: Address, provider: Address },
    ShareSupply { exchange: Address },
    ExchangeToken { exchange: Address },
    ExchangeFactory { exchange: Address },
    RegisteredExchange { token: Address },
    RegisteredToken { exchange: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadValue {
    Amount(I256),
    Address(Address),
}

impl Read {
    pub async fn execute(
        &self,
        gateway: &dyn RemoteLedgerGateway,
        base_asset: Address,
        factory: Address,
    ) -> Result<ReadValue, GatewayError> {
        match *self {
            Read::BaseBalance { account } => gateway
                .get_balance(account, base_asset)
                .await
                .map(ReadValue::Amount),
            Read::BaseAllowance { owner, spender } => gateway
                .get_allowance(base_asset, owner, spender)
                .await
                .map(ReadValue::Amount),
            Read::TokenBalance { token, account } => {
                integer(gateway, token, methods::BALANCE_OF, &[CallArg::Account(account)]).await
            }
            Read::TokenAllowance {
                token,
                owner,
                spender,
            } => {
                integer(
                    gateway,
                    token,
                    methods::ALLOWANCE,
                    &[CallArg::Account(owner), CallArg::Account(spender)],
                )
                .await
            }
            Read::TokenSupply { token } => {
                integer(gateway, token, methods::TOTAL_SUPPLY, &[]).await
            }
            Read::ShareBalance { exchange, provider } => {
                integer(
                    gateway,
                    exchange,
                    methods::BALANCE_OF,
                    &[CallArg::Account(provider)],
                )
                .await
            }
            Read::ShareSupply { exchange } => {
                integer(gateway, exchange, methods::TOTAL_SUPPLY, &[]).await
            }
            Read::ExchangeToken { exchange } => {
                address(gateway, exchange, methods::TOKEN_ADDRESS, &[]).await
            }
            Read::ExchangeFactory { exchange } => {
                address(gateway, exchange, methods::FACTORY_ADDRESS, &[]).await
            }
            Read::RegisteredExchange { token } => {
                address(gateway, factory, methods::GET_EXCHANGE, &[CallArg::Contract(token)]).await
            }
            Read::RegisteredToken { exchange } => {
                address(gateway, factory, methods::GET_TOKEN, &[CallArg::Contract(exchange)]).await
            }
        }
    }
}

async fn fetch(
    gateway: &dyn RemoteLedgerGateway,
    contract: Address,
    method: &str,
    args: &[CallArg],
) -> Result<Vec<u8>, GatewayError> {
    let payload = gateway.call_read_only(contract, method, args).await?;
    trace!("{}.{} -> 0x{}", contract, method, hex::encode(&payload));
    Ok(payload)
}

async fn integer(
    gateway: &dyn RemoteLedgerGateway,
    contract: Address,
    method: &str,
    args: &[CallArg],
) -> Result<ReadValue, GatewayError> {
    let payload = fetch(gateway, contract, method, args).await?;
    Ok(ReadValue::Amount(decode_integer(&payload, method)?))
}

async fn address(
    gateway: &dyn RemoteLedgerGateway,
    contract: Address,
    method: &str,
    args: &[CallArg],
) -> Result<ReadValue, GatewayError> {
    let payload = fetch(gateway, contract, method, args).await?;
    Ok(ReadValue::Address(decode_address(&payload, method)?))
}

impl fmt::Display for Read {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Read::BaseBalance { account } => write!(f, "base balance of {account}"),
            Read::BaseAllowance { owner, spender } => {
                write!(f, "base allowance {owner} -> {spender}")
            }
            Read::TokenBalance { token, account } => {
                write!(f, "{token}.balanceOf({account})")
            }
            Read::TokenAllowance {
                token,
                owner,
                spender,
            } => write!(f, "{token}.allowance({owner}, {spender})"),
            Read::TokenSupply { token } => write!(f, "{token}.totalSupply()"),
            Read::ShareBalance { exchange, provider } => {
                write!(f, "{exchange}.balanceOf({provider})")
            }
            Read::ShareSupply { exchange } => write!(f, "{exchange}.totalSupply()"),
            Read::ExchangeToken { exchange } => write!(f, "{exchange}.tokenAddress()"),
            Read::ExchangeFactory { exchange } => write!(f, "{exchange}.factoryAddress()"),
            Read::RegisteredExchange { token } => write!(f, "factory.getExchange({token})"),
            Read::RegisteredToken { exchange } => write!(f, "factory.getToken({exchange})"),
        }
    }
}
