//! # Inbound Port
//!
//! What collaborators call to get a transaction signed and submitted.

use async_trait::async_trait;
use ck_01_chain_client::SimulateOutcome;
use shared_types::{AccountType, Addr, ChainId, KeyHash, Message, Username};

use crate::domain::entities::{BroadcastOutcome, SignAndBroadcast};
use crate::domain::errors::PipelineError;

#[async_trait]
pub trait SigningApi: Send + Sync {
    /// Resolve chain id and sequence, sign with the active connector,
    /// resolve gas and broadcast.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` before any network I/O if the connector holds no
    ///   proven key
    /// - `ChainId` if the chain id cannot be resolved
    /// - `ConnectionChanged` if the connection moved while signing
    /// - `Broadcast` with the node's codespace, code and log
    async fn sign_and_broadcast(&self, request: SignAndBroadcast) -> Result<BroadcastOutcome, PipelineError>;

    /// Raw dry run of `msgs` from `sender`.
    async fn simulate(
        &self,
        chain_id: &ChainId,
        sender: Addr,
        msgs: Vec<Message>,
    ) -> Result<SimulateOutcome, PipelineError>;

    /// Simulated gas with the configured headroom applied.
    async fn estimate_gas(&self, chain_id: &ChainId, sender: Addr, msgs: Vec<Message>) -> Result<u64, PipelineError>;

    /// Address the account factory will assign to a new account.
    fn predict_account_address(
        &self,
        chain_id: &ChainId,
        username: &Username,
        key_hash: &KeyHash,
        account_type: AccountType,
    ) -> Result<Addr, PipelineError>;
}
