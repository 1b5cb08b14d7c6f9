use std::sync::Arc;

use stbl_common::concurrency::Loader;
use stbl_common::{log_if_error, metric};
use stbl_prices::PriceFeed;
use stbl_solana::format::format_amount;
use stbl_solana::math::is_positive_amount;
use stbl_solana::transaction::{fee_payer, TransactionDecoder};
use stbl_solana::Symbol;
use stbl_swap::{Quote, QuoteFetcher, QuoteOutcome};
use stbl_wallet::{WalletSessionManager, WalletState};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::view::Form;
use crate::{Error, Precondition, SettlementState, SettlementView};

/// Amount the form starts with, and returns to after a confirmed swap
pub const DEFAULT_AMOUNT: &str = "1";

const SEEDED_AMOUNT_DIGITS: usize = 6;

#[derive(Clone)]
pub struct SettlementContext {
    pub fetcher: QuoteFetcher,
    pub wallet: WalletSessionManager,

    /// Used to value the input amount, optional
    pub prices: Option<PriceFeed>,
}

struct Inner {
    form: Form,

    // Bumped on every change of the form, a quote resolving under an older generation is dropped
    generation: u64,
}

/// Single authoritative swap flow of a widget session.
#[derive(Clone)]
pub struct Settlement {
    context: SettlementContext,
    decoder: Loader<TransactionDecoder>,

    inner: Arc<Mutex<Inner>>,
    view: Arc<watch::Sender<SettlementView>>,
    // Pending quotes and the view refresh, aborted on teardown
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl Settlement {
    pub fn new(context: SettlementContext) -> Self {
        let form = Form::default();
        let view = SettlementView::render(&form, context.wallet.session().as_ref(), None);

        // Subscribed before the first render is published so no change is missed
        let wallet = context.wallet.subscribe();
        let prices = context.prices.as_ref().map(|x| x.subscribe());

        let settlement = Self {
            context,
            decoder: Loader::new(),

            inner: Arc::new(Mutex::new(Inner { form, generation: 0 })),
            view: Arc::new(watch::Sender::new(view)),
            tasks: Arc::default(),
        };

        let follower = settlement.clone();
        match settlement.tasks.try_lock() {
            Ok(mut tasks) => {
                tasks.spawn(async move { follower.follow(wallet, prices).await });
            },
            Err(e) => warn!("view will not follow wallet and price changes: {}", e),
        }

        settlement
    }

    pub fn subscribe(&self) -> watch::Receiver<SettlementView> {
        self.view.subscribe()
    }

    /// Renders the current form against the current wallet session and prices.
    pub async fn view(&self) -> SettlementView {
        let inner = self.inner.lock().await;
        self.render(&inner.form).await
    }

    pub async fn state(&self) -> SettlementState {
        self.inner.lock().await.form.state.clone()
    }

    pub async fn quote(&self) -> Option<Quote> {
        self.inner.lock().await.form.quote.clone()
    }

    pub async fn set_amount(&self, amount: &str) -> Result<(), Error> {
        self.edit(|form| form.amount = amount.to_string()).await
    }

    /// Selecting the token of the output side swaps both sides.
    pub async fn set_input_token(&self, symbol: Symbol) -> Result<(), Error> {
        self.edit(|form| {
            if form.output == symbol {
                form.output = form.input;
            }
            form.input = symbol;
        })
        .await
    }

    /// Selecting the token of the input side swaps both sides.
    pub async fn set_output_token(&self, symbol: Symbol) -> Result<(), Error> {
        self.edit(|form| {
            if form.input == symbol {
                form.input = form.output;
            }
            form.output = symbol;
        })
        .await
    }

    /// Swaps the token roles, the quoted output becoming the new input amount.
    pub async fn flip(&self) -> Result<(), Error> {
        self.edit(|form| {
            let amount = match &form.quote {
                Some(quote) => format_amount(quote.output_ui_amount(), SEEDED_AMOUNT_DIGITS),
                None => DEFAULT_AMOUNT.to_string(),
            };

            std::mem::swap(&mut form.input, &mut form.output);
            form.amount = amount;
        })
        .await
    }

    /// Requests a new quote for the current input.
    pub async fn retry(&self) -> Result<(), Error> {
        self.edit(|_| {}).await
    }

    /// Dismisses a confirmation or a failure, quoting the current input again.
    pub async fn acknowledge(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        match inner.form.state {
            SettlementState::Confirmed { .. } | SettlementState::Failed(_) => {
                self.requote(&mut inner).await;
                Ok(())
            },
            SettlementState::AwaitingSignature => Err(Error::Busy),
            _ => Ok(()),
        }
    }

    /// Builds, signs and broadcasts the accepted quote, returning the transaction signature.
    /// None of the steps is retried.
    #[instrument(name = "swap", skip(self))]
    pub async fn swap(&self) -> Result<String, Error> {
        let (quote, session) = {
            let mut inner = self.inner.lock().await;
            let form = &mut inner.form;
            if form.state.is_busy() {
                return Err(Error::Busy);
            }

            let session = self
                .context
                .wallet
                .session()
                .ok_or(Error::SwapRejected(Precondition::NotConnected))?;

            if !is_positive_amount(&form.amount) {
                return Err(Error::SwapRejected(Precondition::InvalidAmount));
            }

            let quote = match (&form.quote, &form.state) {
                (Some(quote), SettlementState::QuoteReady) => quote.clone(),
                _ => return Err(Error::SwapRejected(Precondition::NoQuote)),
            };

            form.state = SettlementState::AwaitingSignature;
            form.signature = None;
            self.publish(&inner).await;

            (quote, session)
        };

        let result = log_if_error!(self.execute(&quote, session.address()).await);
        metric!(counter[swap] = 1, method = "swap");
        metric!(on error result => counter [ swap_error ] = 1, method = "swap");

        let mut inner = self.inner.lock().await;
        inner.generation += 1;

        let form = &mut inner.form;
        form.quote = None;
        match &result {
            Ok(signature) => {
                info!("swap {} -> {} confirmed {}", quote.input, quote.output, signature);

                form.state = SettlementState::Confirmed {
                    signature: signature.clone(),
                };
                form.signature = Some(signature.clone());
                form.amount = DEFAULT_AMOUNT.to_string();
            },
            Err(e) => form.state = SettlementState::Failed(e.clone()),
        }

        self.publish(&inner).await;
        result
    }

    /// Cancels the debounce timer, drops the quotes in flight and stops following the
    /// wallet and the prices. Results arriving afterwards are ignored.
    pub async fn teardown(&self) {
        self.inner.lock().await.generation += 1;
        self.context.fetcher.cancel().await;

        let mut tasks = self.tasks.lock().await;
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }

    async fn execute(&self, quote: &Quote, user: &str) -> Result<String, Error> {
        let encoded = self.context.fetcher.client().build(quote, user).await?;

        let decoder = self
            .decoder
            .load(|| async { Ok::<_, Error>(TransactionDecoder::default()) })
            .await?;
        let transaction = decoder.decode(&encoded)?;

        if fee_payer(&transaction).map(|x| x.to_string()).as_deref() != Some(user) {
            warn!("swap transaction is not paid by {}", user);
            return Err(Error::swap_failed(""));
        }

        Ok(self.context.wallet.sign_and_send(&transaction).await?)
    }

    async fn edit<F: FnOnce(&mut Form)>(&self, change: F) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        if inner.form.state.is_busy() {
            return Err(Error::Busy);
        }

        change(&mut inner.form);
        self.requote(&mut inner).await;

        Ok(())
    }

    async fn requote(&self, inner: &mut Inner) {
        inner.generation += 1;
        let generation = inner.generation;

        let form = &mut inner.form;
        form.quote = None;
        form.quote_error = None;
        form.signature = None;
        form.state = if is_positive_amount(&form.amount) {
            SettlementState::AwaitingQuote
        } else {
            SettlementState::Idle
        };

        let (input, output, amount) = (form.input, form.output, form.amount.clone());
        self.publish(inner).await;

        // Invalid amounts still go through the fetcher so the pending timer gets cancelled
        let settlement = self.clone();
        let mut tasks = self.tasks.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move { settlement.resolve_quote(generation, input, output, amount).await });
    }

    async fn resolve_quote(&self, generation: u64, input: Symbol, output: Symbol, amount: String) {
        let outcome = self.context.fetcher.request_quote(input, output, &amount).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("dropping quote of generation {}, form is at {}", generation, inner.generation);
            return;
        }

        let form = &mut inner.form;
        match outcome {
            Ok(QuoteOutcome::Ready(quote)) => {
                form.quote = Some(quote);
                form.state = SettlementState::QuoteReady;
            },
            Ok(QuoteOutcome::Empty) => form.state = SettlementState::Idle,
            Ok(QuoteOutcome::Superseded) => return,
            Err(e) => {
                form.state = SettlementState::Idle;
                form.quote_error = Some(e.into());
            },
        }

        self.publish(&inner).await;
    }

    // Connect, disconnect, revocation and price polls change the view without editing the form
    async fn follow(&self, mut wallet: watch::Receiver<WalletState>, mut prices: Option<watch::Receiver<u64>>) {
        loop {
            let changed = match prices.as_mut() {
                Some(prices) => tokio::select! {
                    changed = wallet.changed() => changed,
                    changed = prices.changed() => changed,
                },
                None => wallet.changed().await,
            };
            if changed.is_err() {
                return;
            }

            let inner = self.inner.lock().await;
            self.publish(&inner).await;
        }
    }

    async fn render(&self, form: &Form) -> SettlementView {
        let price = match &self.context.prices {
            Some(feed) => feed.price(form.input.as_str()).await.map(|x| x.price),
            None => None,
        };

        SettlementView::render(form, self.context.wallet.session().as_ref(), price)
    }

    async fn publish(&self, inner: &Inner) {
        let view = self.render(&inner.form).await;
        self.view.send_replace(view);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use stbl_prices::mock::FixedPriceSource;
    use stbl_swap::client::mock::FixedRateSwap;
    use stbl_swap::{SwapClient, DEFAULT_DEBOUNCE_DELAY};
    use stbl_wallet::mock::MockSigner;
    use stbl_wallet::{Signer, SignerError};
    use tokio::time;

    use super::*;

    struct Harness {
        settlement: Settlement,
        swap: Arc<FixedRateSwap>,
        signer: Arc<MockSigner>,
        wallet: WalletSessionManager,
    }

    async fn harness(swap: FixedRateSwap, signer: MockSigner) -> Harness {
        let swap = Arc::new(swap);
        let signer = Arc::new(signer);
        let wallet = WalletSessionManager::new(Some(signer.clone() as Arc<dyn Signer>));

        let settlement = Settlement::new(SettlementContext {
            fetcher: QuoteFetcher::new(SwapClient::Mock(swap.clone()), DEFAULT_DEBOUNCE_DELAY),
            wallet: wallet.clone(),
            prices: None,
        });

        Harness {
            settlement,
            swap,
            signer,
            wallet,
        }
    }

    async fn connected(swap: FixedRateSwap) -> Harness {
        let harness = harness(swap, MockSigner::new()).await;
        harness.wallet.connect().await.unwrap();
        harness
    }

    async fn until(settlement: &Settlement, mut predicate: impl FnMut(&SettlementView) -> bool) -> SettlementView {
        let mut views = settlement.subscribe();
        let view = views.wait_for(|x| predicate(x)).await.unwrap();
        view.clone()
    }

    async fn quote_ready(settlement: &Settlement) -> SettlementView {
        until(settlement, |x| x.state == SettlementState::QuoteReady).await
    }

    mod swap {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn should_confirm_and_reset_amount() {
            // Given
            let Harness {
                settlement, swap, signer, ..
            } = connected(FixedRateSwap::with_rate(142.5)).await;
            settlement.set_amount("1").await.unwrap();
            let view = quote_ready(&settlement).await;
            assert_eq!(view.output_amount.as_deref(), Some("142.5"));
            assert!(view.can_swap);

            // When
            let signature = settlement.swap().await.unwrap();

            // Then
            assert!(!signature.is_empty());
            assert_eq!(signature, MockSigner::default_signature());
            assert_eq!(settlement.state().await, SettlementState::Confirmed { signature: signature.clone() });
            assert_eq!(settlement.quote().await, None);

            let view = settlement.view().await;
            assert_eq!(view.amount, DEFAULT_AMOUNT);
            assert_eq!(view.transaction_url, Some(format!("https://solscan.io/tx/{}", signature)));
            assert!(!view.can_swap);

            assert_eq!(swap.build_calls(), 1);
            assert_eq!(signer.sign_calls(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn should_be_rejected_locally_without_wallet() {
            // Given
            let Harness { settlement, swap, signer, .. } = harness(FixedRateSwap::with_rate(1.0), MockSigner::new()).await;
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;

            // When
            let result = settlement.swap().await;

            // Then
            assert_eq!(result, Err(Error::SwapRejected(Precondition::NotConnected)));
            assert_eq!(settlement.state().await, SettlementState::QuoteReady);
            assert_eq!(swap.build_calls(), 0);
            assert_eq!(signer.sign_calls(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn should_be_rejected_locally_without_amount() {
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0)).await;

            for amount in ["0", ""] {
                settlement.set_amount(amount).await.unwrap();
                assert_eq!(settlement.state().await, SettlementState::Idle);

                let result = settlement.swap().await;

                assert_eq!(result, Err(Error::SwapRejected(Precondition::InvalidAmount)));
            }

            assert_eq!(swap.build_calls(), 0);
            assert!(swap.quote_requests().await.is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn should_be_rejected_locally_without_quote() {
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0)).await;
            settlement.set_amount("1").await.unwrap();

            let result = settlement.swap().await;

            assert_eq!(result, Err(Error::SwapRejected(Precondition::NoQuote)));
            assert_eq!(swap.build_calls(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn should_fail_when_build_fails() {
            // Given
            let Harness { settlement, signer, .. } = connected(FixedRateSwap::with_rate(1.0).with_build_error("Quote expired")).await;
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;

            // When
            let result = settlement.swap().await;

            // Then
            assert_eq!(result, Err(Error::SwapFailed("Quote expired".to_string())));
            assert_eq!(settlement.state().await, SettlementState::Failed(Error::SwapFailed("Quote expired".to_string())));
            assert_eq!(settlement.quote().await, None);
            assert_eq!(settlement.view().await.error.as_deref(), Some("Quote expired"));
            assert_eq!(signer.sign_calls(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn should_not_alarm_when_user_rejects() {
            let signer = MockSigner::new().with_signature(Err(SignerError::Rejected));
            let Harness { settlement, wallet, .. } = harness(FixedRateSwap::with_rate(1.0), signer).await;
            wallet.connect().await.unwrap();
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;

            let result = settlement.swap().await;

            assert_eq!(result, Err(Error::UserRejected));
            assert!(wallet.session().is_some());
        }

        #[tokio::test(start_paused = true)]
        async fn revoked_signer_destroys_session() {
            let signer = MockSigner::new().with_signature(Err(SignerError::Revoked));
            let Harness { settlement, wallet, .. } = harness(FixedRateSwap::with_rate(1.0), signer).await;
            wallet.connect().await.unwrap();
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;

            let result = settlement.swap().await;

            assert!(matches!(result, Err(Error::SwapFailed(_))));
            assert!(wallet.session().is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn edits_are_refused_while_awaiting_signature() {
            // Given
            let Harness { settlement, .. } = connected(FixedRateSwap::with_rate(1.0).with_delay(Duration::from_secs(1))).await;
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;

            let pending = tokio::spawn({
                let settlement = settlement.clone();
                async move { settlement.swap().await }
            });
            until(&settlement, |x| x.state == SettlementState::AwaitingSignature).await;

            // When
            let edit = settlement.set_amount("5").await;
            let flip = settlement.flip().await;
            let second = settlement.swap().await;

            // Then
            assert_eq!(edit, Err(Error::Busy));
            assert_eq!(flip, Err(Error::Busy));
            assert_eq!(second, Err(Error::Busy));
            assert!(pending.await.unwrap().is_ok());
        }

        #[tokio::test(start_paused = true)]
        async fn retry_after_failure_quotes_again() {
            // Given
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0).with_build_error("")).await;
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;
            assert!(settlement.swap().await.is_err());

            // When
            settlement.retry().await.unwrap();

            // Then
            assert_eq!(settlement.state().await, SettlementState::AwaitingQuote);
            quote_ready(&settlement).await;
            assert_eq!(swap.quote_requests().await.len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn acknowledge_confirmation_quotes_default_amount() {
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0)).await;
            settlement.set_amount("7").await.unwrap();
            quote_ready(&settlement).await;
            settlement.swap().await.unwrap();

            settlement.acknowledge().await.unwrap();

            let view = quote_ready(&settlement).await;
            assert_eq!(view.transaction_url, None);
            assert_eq!(swap.quote_requests().await.last().map(|x| x.amount_base_units), Some(1_000_000_000));
        }
    }

    mod quote {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn error_returns_to_idle_with_message() {
            // Given
            let Harness { settlement, .. } = connected(FixedRateSwap::with_rate(1.0).with_quote_error("Could not find any route")).await;

            // When
            settlement.set_amount("1").await.unwrap();
            assert_eq!(settlement.state().await, SettlementState::AwaitingQuote);

            // Then
            let view = until(&settlement, |x| x.error.is_some()).await;
            assert_eq!(view.state, SettlementState::Idle);
            assert_eq!(view.error.as_deref(), Some("Quote unavailable: Could not find any route"));
            assert!(!view.can_swap);
        }

        #[tokio::test(start_paused = true)]
        async fn invalid_amount_is_reported() {
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0)).await;

            settlement.set_amount("1.2.3").await.unwrap();

            let view = until(&settlement, |x| x.error.is_some()).await;
            assert_eq!(view.state, SettlementState::Idle);
            assert_eq!(view.error.as_deref(), Some("invalid amount"));
            assert!(swap.quote_requests().await.is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn stale_quote_never_reaches_the_form() {
            // Given
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0).with_delay(Duration::from_secs(2))).await;
            settlement.set_amount("1").await.unwrap();
            time::sleep(DEFAULT_DEBOUNCE_DELAY + Duration::from_millis(100)).await;
            assert_eq!(swap.quote_requests().await.len(), 1);

            // When
            settlement.set_amount("2").await.unwrap();
            let mut views = settlement.subscribe();

            // Then
            let view = quote_ready(&settlement).await;
            assert_eq!(view.amount, "2");
            assert_eq!(settlement.quote().await.map(|x| x.input_amount_base_units), Some(2_000_000_000));

            views.borrow_and_update();
            time::sleep(Duration::from_secs(5)).await;
            assert!(!views.has_changed().unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn burst_of_edits_quotes_once() {
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0)).await;

            for amount in ["1", "12", "12.", "12.5"] {
                settlement.set_amount(amount).await.unwrap();
                time::sleep(Duration::from_millis(100)).await;
            }
            quote_ready(&settlement).await;

            let requests = swap.quote_requests().await;
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].amount_base_units, 12_500_000_000);
        }

        #[tokio::test(start_paused = true)]
        async fn input_value_uses_price_feed() {
            // Given
            let swap = Arc::new(FixedRateSwap::with_rate(1.0));
            let feed = PriceFeed::new(
                stbl_prices::Client::Mock(Arc::new(FixedPriceSource::with_prices(&[("SOL", 142.5)]))),
                Duration::from_secs(30),
            );
            feed.poll().await;

            let settlement = Settlement::new(SettlementContext {
                fetcher: QuoteFetcher::new(SwapClient::Mock(swap), DEFAULT_DEBOUNCE_DELAY),
                wallet: WalletSessionManager::new(None),
                prices: Some(feed),
            });

            // When
            settlement.set_amount("2").await.unwrap();

            // Then
            assert_eq!(settlement.view().await.usd_value.as_deref(), Some("$285"));
        }
    }

    mod edit {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn flip_seeds_amount_from_quote() {
            // Given
            let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(142.5)).await;
            settlement.set_amount("1").await.unwrap();
            quote_ready(&settlement).await;

            // When
            settlement.flip().await.unwrap();

            // Then
            let view = settlement.view().await;
            assert_eq!(view.input, Symbol::Usdc);
            assert_eq!(view.output, Symbol::Sol);
            assert_eq!(view.amount, "142.5");
            assert_eq!(view.state, SettlementState::AwaitingQuote);
            assert_eq!(view.output_amount, None);

            quote_ready(&settlement).await;
            let requests = swap.quote_requests().await;
            assert_eq!(requests[1].input, Symbol::Usdc);
            assert_eq!(requests[1].amount_base_units, 142_500_000);
        }

        #[tokio::test(start_paused = true)]
        async fn flip_without_quote_uses_default_amount() {
            let Harness { settlement, .. } = connected(FixedRateSwap::with_rate(1.0)).await;
            settlement.set_amount("0").await.unwrap();

            settlement.flip().await.unwrap();

            let view = settlement.view().await;
            assert_eq!(view.amount, DEFAULT_AMOUNT);
            assert_eq!(view.state, SettlementState::AwaitingQuote);
        }

        #[tokio::test(start_paused = true)]
        async fn selecting_other_side_token_swaps_sides() {
            let Harness { settlement, .. } = connected(FixedRateSwap::with_rate(1.0)).await;

            settlement.set_input_token(Symbol::Usdc).await.unwrap();
            let view = settlement.view().await;
            assert_eq!((view.input, view.output), (Symbol::Usdc, Symbol::Sol));

            settlement.set_output_token(Symbol::Usdc).await.unwrap();
            let view = settlement.view().await;
            assert_eq!((view.input, view.output), (Symbol::Sol, Symbol::Usdc));

            settlement.set_output_token(Symbol::Usdt).await.unwrap();
            let view = settlement.view().await;
            assert_eq!((view.input, view.output), (Symbol::Sol, Symbol::Usdt));
        }
    }

    mod follow {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn connect_enables_swap_on_published_view() {
            // Given
            let Harness { settlement, wallet, .. } = harness(FixedRateSwap::with_rate(1.0), MockSigner::new()).await;
            settlement.retry().await.unwrap();
            let view = quote_ready(&settlement).await;
            assert!(!view.can_swap);
            assert_eq!(view.wallet, None);

            // When
            let session = wallet.connect().await.unwrap();

            // Then
            let view = until(&settlement, |x| x.wallet.is_some()).await;
            assert_eq!(view.wallet, Some(session.display_address()));
            assert!(view.can_swap);
        }

        #[tokio::test(start_paused = true)]
        async fn disconnect_disables_swap_on_published_view() {
            let Harness { settlement, wallet, .. } = connected(FixedRateSwap::with_rate(1.0)).await;
            settlement.retry().await.unwrap();
            until(&settlement, |x| x.can_swap).await;

            wallet.disconnect().await;

            let view = until(&settlement, |x| x.wallet.is_none()).await;
            assert!(!view.can_swap);
            assert_eq!(view.state, SettlementState::QuoteReady);
        }

        #[tokio::test(start_paused = true)]
        async fn price_poll_refreshes_input_value() {
            // Given
            let feed = PriceFeed::new(
                stbl_prices::Client::Mock(Arc::new(FixedPriceSource::with_prices(&[("SOL", 142.5)]))),
                Duration::from_secs(30),
            );
            let settlement = Settlement::new(SettlementContext {
                fetcher: QuoteFetcher::new(SwapClient::Mock(Arc::new(FixedRateSwap::with_rate(1.0))), DEFAULT_DEBOUNCE_DELAY),
                wallet: WalletSessionManager::new(None),
                prices: Some(feed.clone()),
            });
            settlement.retry().await.unwrap();
            let view = quote_ready(&settlement).await;
            assert_eq!(view.usd_value, None);

            // When
            feed.poll().await;

            // Then
            let view = until(&settlement, |x| x.usd_value.is_some()).await;
            assert_eq!(view.usd_value.as_deref(), Some("$142.5"));
        }

        #[tokio::test(start_paused = true)]
        async fn teardown_stops_following_wallet() {
            let Harness { settlement, wallet, .. } = harness(FixedRateSwap::with_rate(1.0), MockSigner::new()).await;
            settlement.teardown().await;
            let mut views = settlement.subscribe();
            views.borrow_and_update();

            wallet.connect().await.unwrap();
            time::sleep(Duration::from_secs(1)).await;

            assert!(!views.has_changed().unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_quote() {
        // Given
        let Harness { settlement, swap, .. } = connected(FixedRateSwap::with_rate(1.0)).await;
        settlement.set_amount("3").await.unwrap();

        // When
        settlement.teardown().await;
        time::sleep(Duration::from_secs(5)).await;

        // Then
        assert!(swap.quote_requests().await.is_empty());
        assert_eq!(settlement.quote().await, None);
    }
}
