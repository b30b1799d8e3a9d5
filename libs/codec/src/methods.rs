//! Contract method names

// Factory
pub const GET_EXCHANGE: &str = "getExchange";
pub const GET_TOKEN: &str = "getToken";

// Exchange introspection
pub const TOKEN_ADDRESS: &str = "tokenAddress";
pub const FACTORY_ADDRESS: &str = "factoryAddress";

// Token-style reads, shared by tokens and exchange shares
pub const BALANCE_OF: &str = "balanceOf";
pub const ALLOWANCE: &str = "allowance";
pub const TOTAL_SUPPLY: &str = "totalSupply";

// Writes
pub const APPROVE: &str = "approve";
pub const ADD_LIQUIDITY: &str = "addLiquidity";
pub const REMOVE_LIQUIDITY: &str = "removeLiquidity";

pub const BASE_TO_TOKEN_SWAP_INPUT: &str = "ontToTokenSwapInput";
pub const BASE_TO_TOKEN_TRANSFER_INPUT: &str = "ontToTokenTransferInput";
pub const BASE_TO_TOKEN_SWAP_OUTPUT: &str = "ontToTokenSwapOutput";
pub const BASE_TO_TOKEN_TRANSFER_OUTPUT: &str = "ontToTokenTransferOutput";

pub const TOKEN_TO_BASE_SWAP_INPUT: &str = "tokenToOntSwapInput";
pub const TOKEN_TO_BASE_TRANSFER_INPUT: &str = "tokenToOntTransferInput";
pub const TOKEN_TO_BASE_SWAP_OUTPUT: &str = "tokenToOntSwapOutput";
pub const TOKEN_TO_BASE_TRANSFER_OUTPUT: &str = "tokenToOntTransferOutput";

pub const TOKEN_TO_TOKEN_SWAP_INPUT: &str = "tokenToTokenSwapInput";
pub const TOKEN_TO_TOKEN_TRANSFER_INPUT: &str = "tokenToTokenTransferInput";
pub const TOKEN_TO_TOKEN_SWAP_OUTPUT: &str = "tokenToTokenSwapOutput";
pub const TOKEN_TO_TOKEN_TRANSFER_OUTPUT: &str = "tokenToTokenTransferOutput";

pub const TOKEN_TO_EXCHANGE_SWAP_INPUT: &str = "tokenToExchangeSwapInput";
pub const TOKEN_TO_EXCHANGE_TRANSFER_INPUT: &str = "tokenToExchangeTransferInput";
pub const TOKEN_TO_EXCHANGE_SWAP_OUTPUT: &str = "tokenToExchangeSwapOutput";
pub const TOKEN_TO_EXCHANGE_TRANSFER_OUTPUT: &str = "tokenToExchangeTransferOutput";
