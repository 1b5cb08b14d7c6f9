use std::sync::Arc;

use stbl_common::service::TokioServiceManager;
use stbl_prices::{PriceFeed, PriceFeedContext, PriceFeedService};
use stbl_settlement::{Settlement, SettlementContext};
use stbl_swap::{QuoteFetcher, SwapClient};
use stbl_wallet::{AutoReconnect, Signer, WalletSessionManager};
use tracing::{debug, info};

use crate::{Configuration, Error};

/// Hosting session of the swap widget: wallet session, price feed and settlement flow.
pub struct Widget {
    wallet: WalletSessionManager,
    prices: PriceFeed,
    settlement: Settlement,

    services: TokioServiceManager<PriceFeedContext>,
}

impl Widget {
    /// Starts polling prices, silently restores a trusted wallet session and quotes the
    /// default amount. `signer` is `None` when no wallet is installed.
    pub async fn start(configuration: &Configuration, signer: Option<Arc<dyn Signer>>) -> Result<Self, Error> {
        configuration.validate()?;

        let prices = PriceFeed::new(stbl_prices::Client::new(&configuration.price.provider)?, configuration.price.poll_period);
        let fetcher = QuoteFetcher::new(SwapClient::new(&configuration.swap.provider)?, configuration.swap.debounce);
        let wallet = WalletSessionManager::new(signer);

        let mut services = TokioServiceManager::new(PriceFeedContext { feed: prices.clone() });
        services.spawn::<PriceFeedService>();

        match wallet.try_auto_reconnect().await {
            AutoReconnect::Reconnected(session) => info!("wallet {} reconnected", session.display_address()),
            AutoReconnect::Skipped => debug!("no trusted wallet session"),
        }

        let settlement = Settlement::new(SettlementContext {
            fetcher,
            wallet: wallet.clone(),
            prices: Some(prices.clone()),
        });
        settlement.retry().await?;

        Ok(Self {
            wallet,
            prices,
            settlement,

            services,
        })
    }

    pub fn wallet(&self) -> &WalletSessionManager {
        &self.wallet
    }

    pub fn prices(&self) -> &PriceFeed {
        &self.prices
    }

    pub fn settlement(&self) -> &Settlement {
        &self.settlement
    }

    /// Stops the price feed and drops the pending quotes. Nothing mutates the widget state
    /// once this returns.
    pub async fn shutdown(mut self) {
        self.settlement.teardown().await;
        self.services.shutdown().await;

        info!("widget stopped");
    }
}
