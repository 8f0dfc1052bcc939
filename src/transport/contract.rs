// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only contract call transport

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_json_rpc::{ErrorPayload, RpcError};
use alloy_network::{Ethereum, TransactionBuilder};
use alloy_primitives::Address;
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_rpc_client::ClientBuilder;
use alloy_rpc_types::TransactionRequest;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info};

use crate::chain::{ChainId, ChainRegistry};
use crate::errors::ContractCallError;

/// JSON-RPC error code for `execution reverted`
const EXECUTION_REVERTED: i64 = 3;

/// A read-only call to one contract function
///
/// `signature` is a human-readable function signature including its outputs,
/// e.g. `"balanceOf(address) returns (uint256)"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    /// Contract to call
    pub address: Address,
    /// Function signature with return types
    pub signature: String,
    /// Arguments, in declaration order
    pub args: Vec<DynSolValue>,
}

impl ContractCall {
    /// Create a call
    pub fn new(address: Address, signature: impl Into<String>, args: Vec<DynSolValue>) -> Self {
        Self {
            address,
            signature: signature.into(),
            args,
        }
    }
}

/// Executes read-only contract calls on a chain
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Perform one call and return its decoded outputs
    async fn call(
        &self,
        chain: ChainId,
        call: &ContractCall,
    ) -> Result<Vec<DynSolValue>, ContractCallError>;

    /// Perform independent calls concurrently
    ///
    /// Results are returned in the order of `calls`. The first failure is
    /// returned once every call has completed.
    async fn call_batch(
        &self,
        chain: ChainId,
        calls: &[ContractCall],
    ) -> Result<Vec<Vec<DynSolValue>>, ContractCallError> {
        join_all(calls.iter().map(|call| self.call(chain, call)))
            .await
            .into_iter()
            .collect()
    }
}

/// [`ContractTransport`] backed by one alloy HTTP provider per chain
#[derive(Clone, Default)]
pub struct AlloyContractTransport {
    providers: HashMap<ChainId, RootProvider<Ethereum>>,
}

impl fmt::Debug for AlloyContractTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chains: Vec<_> = self.providers.keys().collect();
        chains.sort();
        f.debug_struct("AlloyContractTransport")
            .field("chains", &chains)
            .finish()
    }
}

impl AlloyContractTransport {
    /// Create a transport with no providers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider for every chain in the registry that has an RPC URL
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_registry(
        registry: &ChainRegistry,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut transport = Self::new();

        for endpoint in registry.endpoints() {
            if let Some(url) = &endpoint.rpc_url {
                // We disable recommended fillers to return a RootProvider
                let rpc = ClientBuilder::default()
                    .transport(Http::with_client(client.clone(), url.clone()), false);
                let provider = ProviderBuilder::new()
                    .disable_recommended_fillers()
                    .network::<Ethereum>()
                    .connect_client(rpc);
                transport.providers.insert(endpoint.chain_id, provider);
            }
        }

        info!(
            chains = transport.providers.len(),
            "Created RPC providers for contract reads"
        );
        Ok(transport)
    }

    /// Register a provider for a chain
    pub fn with_provider(mut self, chain: ChainId, provider: RootProvider<Ethereum>) -> Self {
        self.providers.insert(chain, provider);
        self
    }

    /// Whether a provider exists for a chain
    pub fn has_provider(&self, chain: ChainId) -> bool {
        self.providers.contains_key(&chain)
    }
}

#[async_trait]
impl ContractTransport for AlloyContractTransport {
    async fn call(
        &self,
        chain: ChainId,
        call: &ContractCall,
    ) -> Result<Vec<DynSolValue>, ContractCallError> {
        let provider = self
            .providers
            .get(&chain)
            .ok_or(ContractCallError::NoProvider { chain })?;

        let function = parse_signature(&call.signature)?;
        let input = function
            .abi_encode_input(&call.args)
            .map_err(|e| ContractCallError::encode(&call.signature, e))?;

        let request = TransactionRequest::default()
            .with_to(call.address)
            .with_input(input);

        debug!(
            chain_id = %chain,
            contract = %call.address,
            function = %function.name,
            "Calling contract"
        );

        let output = provider
            .call(request)
            .await
            .map_err(|error| call_error(&call.signature, error))?;

        function
            .abi_decode_output(&output)
            .map_err(|e| ContractCallError::decode(&call.signature, e))
    }
}

fn parse_signature(signature: &str) -> Result<Function, ContractCallError> {
    Function::parse(signature).map_err(|e| ContractCallError::invalid_signature(signature, e))
}

fn call_error(signature: &str, error: TransportError) -> ContractCallError {
    match &error {
        RpcError::ErrorResp(payload) if is_revert(payload) => {
            ContractCallError::reverted(signature, payload.message.to_string())
        }
        _ => ContractCallError::transport(signature, error),
    }
}

/// Nodes differ in how they report reverts: some attach the revert data,
/// others only the code or a bare `execution reverted` message.
fn is_revert(payload: &ErrorPayload) -> bool {
    payload.code == EXECUTION_REVERTED
        || payload.as_revert_data().is_some()
        || payload.message.to_ascii_lowercase().contains("revert")
}
