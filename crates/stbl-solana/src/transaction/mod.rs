use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;

use crate::Error;

/// Maximum size in bytes of a serialized transaction accepted by the network
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Decodes the base64 transactions returned by the swap aggregator.
#[derive(Debug, Clone, Copy)]
pub struct TransactionDecoder {
    max_size: usize,
}

impl Default for TransactionDecoder {
    fn default() -> Self {
        Self::new(MAX_TRANSACTION_SIZE)
    }
}

impl TransactionDecoder {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn decode(&self, encoded: &str) -> Result<VersionedTransaction, Error> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidTransaction(e.to_string()))?;

        if bytes.is_empty() {
            return Err(Error::InvalidTransaction("empty payload".to_string()));
        }

        if bytes.len() > self.max_size {
            return Err(Error::InvalidTransaction(format!("{} bytes exceeds {}", bytes.len(), self.max_size)));
        }

        let transaction: VersionedTransaction = bincode::deserialize(&bytes).map_err(|e| Error::InvalidTransaction(e.to_string()))?;

        let required = transaction.message.header().num_required_signatures as usize;
        if transaction.signatures.len() != required {
            return Err(Error::InvalidTransaction(format!(
                "expected {} signature slots, found {}",
                required,
                transaction.signatures.len()
            )));
        }

        Ok(transaction)
    }
}

pub fn encode_transaction(transaction: &VersionedTransaction) -> Result<String, Error> {
    let bytes = bincode::serialize(transaction).map_err(|e| Error::InvalidTransaction(e.to_string()))?;

    Ok(STANDARD.encode(bytes))
}

/// Returns the account paying the fees of the transaction.
pub fn fee_payer(transaction: &VersionedTransaction) -> Option<Pubkey> {
    transaction.message.static_account_keys().first().copied()
}

pub fn parse_signature(value: &str) -> Result<Signature, Error> {
    Signature::from_str(value.trim()).map_err(|_| Error::InvalidSignature(value.to_string()))
}

pub fn parse_address(value: &str) -> Result<Pubkey, Error> {
    Pubkey::from_str(value.trim()).map_err(|_| Error::InvalidAddress(value.to_string()))
}

/// Builds an empty transaction paid by `payer`, with placeholder signatures.
#[cfg(any(test, feature = "testing"))]
pub fn unsigned_transaction(payer: &Pubkey) -> VersionedTransaction {
    use solana_sdk::message::{Message, VersionedMessage};

    let message = Message::new(&[], Some(payer));

    VersionedTransaction {
        signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
        message: VersionedMessage::Legacy(message),
    }
}
