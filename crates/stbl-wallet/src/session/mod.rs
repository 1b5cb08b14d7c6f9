use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use stbl_common::log_if_error;
use stbl_common::service::tracing::{debug, instrument, warn};
use stbl_solana::constants::account_url;
use stbl_solana::format::truncate_address;
use stbl_solana::transaction::{parse_address, parse_signature};
use stbl_solana::VersionedTransaction;
use tokio::sync::{watch, Mutex};

use crate::{ConnectOptions, Error, Signer, SignerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    address: String,
}

impl WalletSession {
    pub fn new(address: String) -> Result<Self, Error> {
        parse_address(&address).map_err(|e| Error::Signer(e.to_string()))?;

        Ok(Self { address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn display_address(&self) -> String {
        truncate_address(&self.address)
    }

    pub fn explorer_url(&self) -> String {
        account_url(&self.address)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum WalletState {
    #[default]
    Disconnected,
    Connecting,
    Connected(WalletSession),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoReconnect {
    Reconnected(WalletSession),
    /// Nothing to reconnect, or the attempt failed. The state is left untouched.
    Skipped,
}

type Attempt = Shared<BoxFuture<'static, Result<WalletSession, Error>>>;

enum Begin {
    Started(Attempt),
    Joined(Attempt),
    /// A trusted-only attempt is pending, it never prompts the user
    Silent(Attempt),
    Connected(WalletSession),
}

#[derive(Default)]
struct Inner {
    // Bumped by every disconnect so an attempt started before it cannot reconnect
    epoch: u64,
    attempt: Option<(ConnectOptions, Attempt)>,
}

/// Owns the connection to the signing capability. At most one connect attempt is in
/// flight; concurrent callers share its result.
#[derive(Clone)]
pub struct WalletSessionManager {
    signer: Option<Arc<dyn Signer>>,

    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<WalletState>>,
}

impl WalletSessionManager {
    pub fn new(signer: Option<Arc<dyn Signer>>) -> Self {
        Self {
            signer,

            inner: Arc::default(),
            state: Arc::new(watch::Sender::new(WalletState::Disconnected)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.signer.is_some()
    }

    pub fn state(&self) -> WalletState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<WalletSession> {
        match &*self.state.borrow() {
            WalletState::Connected(session) => Some(session.clone()),
            _ => None,
        }
    }

    #[instrument(name = "connect", skip(self))]
    pub async fn connect(&self) -> Result<WalletSession, Error> {
        // A failed silent attempt is followed by a prompt, its error is never returned
        let result = loop {
            match self.begin(ConnectOptions::interactive()).await? {
                Begin::Started(attempt) | Begin::Joined(attempt) => break attempt.await,
                Begin::Silent(attempt) => match attempt.await {
                    Err(e) if e != Error::Interrupted => debug!("silent connect failed, prompting: {}", e),
                    result => break result,
                },
                Begin::Connected(session) => break Ok(session),
            }
        };

        log_if_error!(result)
    }

    /// Silently restores a previously trusted session. Never fails: any error leaves
    /// the manager disconnected.
    #[instrument(name = "try_auto_reconnect", skip(self))]
    pub async fn try_auto_reconnect(&self) -> AutoReconnect {
        let attempt = match self.begin(ConnectOptions::trusted_only()).await {
            Ok(Begin::Started(attempt)) => attempt,
            Ok(_) => return AutoReconnect::Skipped,
            Err(e) => {
                debug!("auto reconnect skipped: {}", e);
                return AutoReconnect::Skipped;
            },
        };

        match attempt.await {
            Ok(session) => AutoReconnect::Reconnected(session),
            Err(e) => {
                debug!("auto reconnect skipped: {}", e);
                AutoReconnect::Skipped
            },
        }
    }

    /// Notifies the signer, then disconnects whether or not the notification succeeded.
    #[instrument(name = "disconnect", skip(self))]
    pub async fn disconnect(&self) {
        if let Some(signer) = &self.signer {
            if let Err(e) = signer.disconnect().await {
                warn!("wallet disconnect failed: {}", e);
            }
        }

        self.reset().await;
    }

    /// Destroys the session after the signer reported the authorization as revoked.
    pub async fn revoke(&self) {
        warn!("wallet authorization revoked");
        self.reset().await;
    }

    #[instrument(name = "sign_and_send", skip_all)]
    pub async fn sign_and_send(&self, transaction: &VersionedTransaction) -> Result<String, Error> {
        let signer = self.signer.as_ref().ok_or_else(Error::provider_unavailable)?;
        if self.session().is_none() {
            return Err(Error::NotConnected);
        }

        match signer.sign_and_send(transaction).await {
            Ok(signature) => match parse_signature(&signature) {
                Ok(_) => Ok(signature),
                Err(e) => log_if_error!(Err(Error::Signer(e.to_string()))),
            },
            Err(SignerError::Revoked) => {
                self.revoke().await;
                Err(Error::Revoked)
            },
            Err(e) => log_if_error!(Err(Error::from(e))),
        }
    }

    async fn begin(&self, options: ConnectOptions) -> Result<Begin, Error> {
        let signer = self.signer.clone().ok_or_else(Error::provider_unavailable)?;

        let mut inner = self.inner.lock().await;
        if let Some((pending, attempt)) = &inner.attempt {
            return match (pending.only_if_trusted, options.only_if_trusted) {
                (true, false) => Ok(Begin::Silent(attempt.clone())),
                _ => Ok(Begin::Joined(attempt.clone())),
            };
        }

        if let Some(session) = self.session() {
            return Ok(Begin::Connected(session));
        }

        let epoch = inner.epoch;
        let manager = self.clone();

        // The attempt runs on its own task so it settles even if every caller goes away
        let handle = tokio::spawn(async move {
            let result = match signer.connect(options).await {
                Ok(address) => WalletSession::new(address),
                Err(e) => Err(Error::from(e)),
            };

            manager.settle(epoch, result).await
        });

        let attempt = async move { handle.await.unwrap_or_else(|e| Err(Error::Signer(e.to_string()))) }
            .boxed()
            .shared();

        inner.attempt = Some((options, attempt.clone()));
        self.state.send_replace(WalletState::Connecting);

        Ok(Begin::Started(attempt))
    }

    async fn settle(&self, epoch: u64, result: Result<WalletSession, Error>) -> Result<WalletSession, Error> {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return Err(Error::Interrupted);
        }

        inner.attempt = None;
        match &result {
            Ok(session) => self.state.send_replace(WalletState::Connected(session.clone())),
            Err(_) => self.state.send_replace(WalletState::Disconnected),
        };

        result
    }

    async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        inner.attempt = None;

        self.state.send_replace(WalletState::Disconnected);
    }
}
