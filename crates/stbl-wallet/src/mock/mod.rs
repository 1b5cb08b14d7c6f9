use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stbl_solana::{Pubkey, Signature, VersionedTransaction};
use tokio::sync::{Mutex, Semaphore};

use crate::{ConnectOptions, Signer, SignerError};

/// Scripted [`Signer`]. Scripted responses are consumed in order, the default
/// responses are used once the script is exhausted.
pub struct MockSigner {
    address: String,

    connects: Mutex<VecDeque<Result<String, SignerError>>>,
    signatures: Mutex<VecDeque<Result<String, SignerError>>>,
    disconnect: Result<(), SignerError>,

    gate: Option<Arc<Semaphore>>,

    connect_options: Mutex<Vec<ConnectOptions>>,
    sign_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSigner {
    pub fn new() -> Self {
        Self {
            address: Pubkey::new_unique().to_string(),

            connects: Mutex::default(),
            signatures: Mutex::default(),
            disconnect: Ok(()),

            gate: None,

            connect_options: Mutex::default(),
            sign_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn with_connect(mut self, result: Result<String, SignerError>) -> Self {
        self.connects.get_mut().push_back(result);
        self
    }

    pub fn with_signature(mut self, result: Result<String, SignerError>) -> Self {
        self.signatures.get_mut().push_back(result);
        self
    }

    pub fn with_disconnect(mut self, result: Result<(), SignerError>) -> Self {
        self.disconnect = result;
        self
    }

    /// Holds every connect until a permit is added to the returned semaphore.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());

        (self, gate)
    }

    pub async fn connect_options(&self) -> Vec<ConnectOptions> {
        self.connect_options.lock().await.clone()
    }

    pub async fn connect_calls(&self) -> usize {
        self.connect_options.lock().await.len()
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn default_signature() -> String {
        Signature::default().to_string()
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn connect(&self, options: ConnectOptions) -> Result<String, SignerError> {
        self.connect_options.lock().await.push(options);

        if let Some(gate) = &self.gate {
            gate.acquire().await.map(|x| x.forget()).map_err(|e| SignerError::Failed(e.to_string()))?;
        }

        match self.connects.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(self.address.clone()),
        }
    }

    async fn disconnect(&self) -> Result<(), SignerError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.disconnect.clone()
    }

    async fn sign_and_send(&self, _transaction: &VersionedTransaction) -> Result<String, SignerError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);

        match self.signatures.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(Self::default_signature()),
        }
    }
}
