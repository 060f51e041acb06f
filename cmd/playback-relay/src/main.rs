//! # Playback Relay Binary
//!
//! Loads settings, picks the adapters they name and serves the webhook
//! router until Ctrl-C or SIGTERM.

#[cfg(not(feature = "web-axum"))]
compile_error!("playback-relay needs the `web-axum` feature");

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::{build_router, AppState, Metrics};
use configs::{CacheBackend, LogFormat, Settings};
use domains::{ImageCache, ImageProcessor, LocationLookup, Notifier};
use outbound_adapters::{DiscordNotifier, DisabledLookup, FreeGeoIpLookup, LogNotifier};
use services::{ImageService, NotificationDispatcher, PlaybackService, PlaybackSettings};
use storage_adapters::{MemoryImageCache, ThumbnailNormalizer};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings);
    tracing::info!(settings = %settings.summary(), "starting playback relay");

    let cache = build_cache(&settings).await?;
    let processor: Arc<dyn ImageProcessor> = Arc::new(ThumbnailNormalizer::default());
    let locator = build_locator(&settings)?;
    let notifier = build_notifier(&settings)?;

    let (dispatcher, worker) = NotificationDispatcher::new(notifier);
    let worker = tokio::spawn(worker.run());

    let playback = PlaybackService::new(
        cache.clone(),
        processor.clone(),
        locator,
        Arc::new(dispatcher),
        PlaybackSettings {
            public_url: settings.server.public_url.clone(),
            username: settings.notifier.username.clone(),
            thumbnail_ttl_seconds: settings.cache.ttl_seconds,
        },
    );
    let state = AppState {
        playback: Arc::new(playback),
        images: Arc::new(ImageService::new(cache, processor)),
        metrics: Arc::new(Metrics::new()),
    };
    let app = build_router(state, settings.server.max_upload_bytes);

    let addr = settings.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router held the last queue handle, so the worker finishes what is
    // queued and returns.
    let delivered = worker.await.context("notification worker panicked")?;
    tracing::info!(delivered, "notification queue drained");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn build_cache(settings: &Settings) -> anyhow::Result<Arc<dyn ImageCache>> {
    match settings.cache.backend {
        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            let cache = storage_adapters::RedisImageCache::from_url(&settings.cache.redis_url)?;
            cache.ping().await.context("redis is unreachable")?;
            Ok(Arc::new(cache))
        }
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => {
            anyhow::bail!("built without the `redis` feature; set cache.backend = \"memory\"")
        }
        CacheBackend::Memory => {
            tracing::warn!("using the in-memory image cache; thumbnails are lost on restart");
            let cache = Arc::new(MemoryImageCache::new());
            let purger = cache.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(PURGE_INTERVAL);
                loop {
                    ticker.tick().await;
                    let purged = purger.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "expired thumbnails dropped");
                    }
                }
            });
            Ok(cache)
        }
    }
}

fn build_locator(settings: &Settings) -> anyhow::Result<Arc<dyn LocationLookup>> {
    if !settings.geoip.enabled {
        return Ok(Arc::new(DisabledLookup));
    }
    let lookup = FreeGeoIpLookup::new(&settings.geoip.base_url, settings.geoip.timeout())?;
    Ok(Arc::new(lookup))
}

fn build_notifier(settings: &Settings) -> anyhow::Result<Arc<dyn Notifier>> {
    let notifier = &settings.notifier;
    match notifier.discord_webhook() {
        Some((id, token)) => Ok(Arc::new(DiscordNotifier::new(
            id,
            token,
            notifier.rich_attachments,
            notifier.timeout(),
        )?)),
        None => {
            tracing::warn!("no discord webhook configured; notifications are only logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
