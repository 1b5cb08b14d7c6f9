mod error;
pub use error::{Error, Precondition, SWAP_FAILED_MESSAGE};

mod settlement;
pub use settlement::{Settlement, SettlementContext, DEFAULT_AMOUNT};

mod view;
pub use view::{SettlementView, NETWORK_FEE};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum SettlementState {
    #[default]
    Idle,
    AwaitingQuote,
    QuoteReady,
    AwaitingSignature,
    Confirmed {
        signature: String,
    },
    Failed(Error),
}

impl SettlementState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SettlementState::AwaitingSignature)
    }
}
