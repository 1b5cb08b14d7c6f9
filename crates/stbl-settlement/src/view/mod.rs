use stbl_solana::constants::transaction_url;
use stbl_solana::format::{format_amount, format_grouped, format_price_impact, is_high_price_impact};
use stbl_solana::math::is_positive_amount;
use stbl_solana::Symbol;
use stbl_swap::Quote;
use stbl_wallet::WalletSession;

use crate::{Error, SettlementState};

pub const NETWORK_FEE: &str = "~0.000005 SOL";

const OUTPUT_DIGITS: usize = 6;
const RATE_DIGITS: usize = 4;

/// User intent and the results attached to it
#[derive(Debug, Clone)]
pub(crate) struct Form {
    pub input: Symbol,
    pub output: Symbol,
    pub amount: String,

    pub quote: Option<Quote>,
    pub quote_error: Option<Error>,
    pub signature: Option<String>,

    pub state: SettlementState,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            input: Symbol::Sol,
            output: Symbol::Usdc,
            amount: "1".to_string(),

            quote: None,
            quote_error: None,
            signature: None,

            state: SettlementState::Idle,
        }
    }
}

impl Form {
    pub fn is_swappable(&self, session: Option<&WalletSession>) -> bool {
        session.is_some() && self.quote.is_some() && self.state == SettlementState::QuoteReady && is_positive_amount(&self.amount)
    }
}

/// Display data of the swap widget.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementView {
    pub state: SettlementState,

    pub input: Symbol,
    pub output: Symbol,
    pub amount: String,

    /// Truncated address of the connected wallet
    pub wallet: Option<String>,
    pub wallet_url: Option<String>,

    pub output_amount: Option<String>,
    pub rate: Option<String>,
    pub price_impact: Option<String>,
    pub high_price_impact: bool,
    pub route: Option<String>,
    pub network_fee: &'static str,

    /// Approximate value of the input amount
    pub usd_value: Option<String>,

    pub quoting: bool,
    pub can_swap: bool,

    pub transaction_url: Option<String>,
    pub error: Option<String>,
}

impl Default for SettlementView {
    fn default() -> Self {
        SettlementView::render(&Form::default(), None, None)
    }
}

impl SettlementView {
    pub(crate) fn render(form: &Form, session: Option<&WalletSession>, input_price: Option<f64>) -> Self {
        let quote = form.quote.as_ref();

        let error = match &form.state {
            SettlementState::Failed(e) => Some(e.to_string()),
            _ => form.quote_error.as_ref().map(|e| e.to_string()),
        };

        Self {
            state: form.state.clone(),

            input: form.input,
            output: form.output,
            amount: form.amount.clone(),

            wallet: session.map(|x| x.display_address()),
            wallet_url: session.map(|x| x.explorer_url()),

            output_amount: quote.map(|x| format_amount(x.output_ui_amount(), OUTPUT_DIGITS)),
            rate: quote.and_then(Self::rate),
            price_impact: quote.map(|x| format_price_impact(x.price_impact_fraction)),
            high_price_impact: quote.is_some_and(|x| is_high_price_impact(x.price_impact_fraction)),
            route: quote.map(|x| Self::route(x.route_hops)),
            network_fee: NETWORK_FEE,

            usd_value: Self::usd_value(&form.amount, input_price),

            quoting: form.state == SettlementState::AwaitingQuote,
            can_swap: form.is_swappable(session),

            transaction_url: form.signature.as_deref().map(transaction_url),
            error,
        }
    }

    fn rate(quote: &Quote) -> Option<String> {
        let input = quote.input_ui_amount();
        if input <= 0.0 {
            return None;
        }

        Some(format!(
            "1 {} ≈ {} {}",
            quote.input,
            format_amount(quote.output_ui_amount() / input, RATE_DIGITS),
            quote.output
        ))
    }

    fn route(hops: usize) -> String {
        if hops == 1 {
            "1 hop via Jupiter".to_string()
        } else {
            format!("{} hops via Jupiter", hops)
        }
    }

    fn usd_value(amount: &str, price: Option<f64>) -> Option<String> {
        if !is_positive_amount(amount) {
            return None;
        }

        let amount = amount.trim().parse::<f64>().ok()?;
        let price = price.filter(|x| *x > 0.0)?;

        Some(format!("${}", format_grouped(price * amount, 2)))
    }
}
