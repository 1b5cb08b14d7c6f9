use std::time::Duration;

use log::{error, info};
use tokio::task::JoinSet;
use tokio::time;

use crate::service::Service;

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// Service manager used to spawn [`Service`] and manage their lifecycle.
/// All services run on the current Tokio runtime. Dropping the manager, or calling
/// [`TokioServiceManager::shutdown`], aborts every service it spawned.
pub struct TokioServiceManager<C> {
    context: C,
    services: JoinSet<()>,
}

impl<C> TokioServiceManager<C>
where
    C: 'static + Clone + Send,
{
    /// Create a new manager on the given context. The context will be cloned and passed
    /// to each service
    pub fn new(context: C) -> Self {
        Self {
            context,
            services: JoinSet::new(),
        }
    }

    /// Spawn a new service on the manager, giving it the bound context. Service will be restarted in
    /// case they throw an error.
    pub fn spawn<T: Service<Context = C>>(&mut self)
    where
        T: Send + 'static,
    {
        let ctx = self.context.clone();

        self.services.spawn(async move {
            loop {
                let service = T::new(ctx.clone()).await;

                info!(target: T::NAME , "starting service");
                if let Err(err) = service.run().await {
                    error!(target: T::NAME , "service terminated with error {} - restarting in {}ms", err, RESTART_DELAY.as_millis());
                    time::sleep(RESTART_DELAY).await;
                }
            }
        });
    }

    /// Abort every service and wait for them to stop.
    pub async fn shutdown(&mut self) {
        self.services.abort_all();
        while self.services.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::service::{Error, Service, TokioServiceManager};

    #[derive(Clone, Default)]
    struct Context {
        runs: Arc<AtomicUsize>,
    }

    struct Failing(Context);

    #[async_trait]
    impl Service for Failing {
        type Context = Context;

        const NAME: &'static str = "Failing";

        async fn new(context: Self::Context) -> Self {
            Self(context)
        }

        async fn run(self) -> Result<(), Error> {
            self.0.runs.fetch_add(1, Ordering::SeqCst);
            Err(Error::new("dummy"))
        }
    }

    struct Forever(Context);

    #[async_trait]
    impl Service for Forever {
        type Context = Context;

        const NAME: &'static str = "Forever";

        async fn new(context: Self::Context) -> Self {
            Self(context)
        }

        async fn run(self) -> Result<(), Error> {
            self.0.runs.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failing_service_is_restarted() {
        let context = Context::default();
        let mut services = TokioServiceManager::new(context.clone());
        services.spawn::<Failing>();

        tokio::time::sleep(Duration::from_millis(10_500)).await;

        assert!(context.runs.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_services() {
        let context = Context::default();
        let mut services = TokioServiceManager::new(context.clone());
        services.spawn::<Forever>();

        tokio::task::yield_now().await;
        assert_eq!(context.runs.load(Ordering::SeqCst), 1);

        services.shutdown().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(context.runs.load(Ordering::SeqCst), 1);
    }
}
