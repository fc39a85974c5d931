use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_bridge::config::AppConfig;
use talent_bridge::dashboard::DashboardAggregator;
use talent_bridge::directory::{
    AccessVerifier, DirectoryGate, RemoteAuthVerifier, SharedCodeVerifier,
};
use talent_bridge::drafts::DraftStore;
use talent_bridge::error::AppError;
use talent_bridge::forms::SubmissionService;
use talent_bridge::remote::{
    AuthUser, ChangeFeed, InMemoryDataService, RestDataService, SharedRemote, WebhookSecret,
};
use talent_bridge::review::ReviewService;
use tracing::{info, warn};

/// Buffered changes per subscriber before the slowest one starts lagging.
const FEED_CAPACITY: usize = 64;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) context: Arc<AppContext>,
}

/// Services shared by every request, built once from configuration.
pub(crate) struct AppContext {
    pub(crate) remote: SharedRemote,
    pub(crate) feed: ChangeFeed,
    pub(crate) dashboard: Arc<DashboardAggregator>,
    pub(crate) drafts: Arc<DraftStore>,
    pub(crate) submissions: SubmissionService,
    pub(crate) reviews: ReviewService,
    pub(crate) directory: DirectoryGate,
    pub(crate) webhook_secret: Option<WebhookSecret>,
}

impl AppContext {
    pub(crate) fn build(config: &AppConfig) -> Result<Self, AppError> {
        let feed = ChangeFeed::new(FEED_CAPACITY);
        let remote: SharedRemote = match &config.remote.url {
            Some(url) => {
                info!(%url, "using hosted data service");
                Arc::new(RestDataService::from_config(&config.remote)?)
            }
            None => {
                warn!("no remote url configured; using the in-memory backend");
                let memory = InMemoryDataService::with_feed(feed.clone());
                if let Some(token) = &config.remote.dev_admin_token {
                    memory.register_token(
                        token.clone(),
                        AuthUser {
                            id: "dev-admin".to_string(),
                            email: None,
                            role: Some("admin".to_string()),
                        },
                    );
                }
                Arc::new(memory)
            }
        };

        Self::assemble(config, remote, feed)
    }

    /// Wire the services around an already chosen backend.
    pub(crate) fn assemble(
        config: &AppConfig,
        remote: SharedRemote,
        feed: ChangeFeed,
    ) -> Result<Self, AppError> {
        let dashboard = Arc::new(DashboardAggregator::new(remote.clone(), &config.dashboard));
        let drafts = Arc::new(DraftStore::new(
            config.drafts.directory.clone(),
            config.drafts.debounce,
        ));
        let submissions = SubmissionService::new(remote.clone(), config.remote.cv_bucket.clone())
            .with_drafts(drafts.clone());
        let reviews = ReviewService::new(
            remote.clone(),
            dashboard.clone(),
            config.remote.cv_bucket.clone(),
        );
        let directory = DirectoryGate::new(
            directory_verifier(config, &remote)?,
            remote.clone(),
            config.directory.page_size,
        );
        let webhook_secret = config
            .remote
            .webhook_secret
            .as_deref()
            .and_then(WebhookSecret::new);
        if webhook_secret.is_none() {
            warn!("REALTIME_WEBHOOK_SECRET is not set; the realtime webhook rejects every call");
        }

        Ok(Self {
            remote,
            feed,
            dashboard,
            drafts,
            submissions,
            reviews,
            directory,
            webhook_secret,
        })
    }
}

/// A stored hash wins over a plaintext code; otherwise signed-in users of the
/// hosted service may browse. With none of these the directory stays locked.
fn directory_verifier(
    config: &AppConfig,
    remote: &SharedRemote,
) -> Result<Arc<dyn AccessVerifier>, AppError> {
    let directory = &config.directory;
    if let Some(hash) = &directory.access_code_hash {
        return Ok(Arc::new(SharedCodeVerifier::from_hash(hash.clone())?));
    }
    if let Some(code) = &directory.access_code {
        return Ok(Arc::new(SharedCodeVerifier::from_code(code)?));
    }
    if config.remote.url.is_some() {
        return Ok(Arc::new(RemoteAuthVerifier::new(remote.clone())));
    }
    warn!("no directory access code is configured; the talent directory cannot be unlocked");
    Ok(Arc::new(SharedCodeVerifier::unconfigured()))
}
