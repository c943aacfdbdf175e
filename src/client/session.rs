//! Connection session and its holder
//!
//! A `Session` pairs one connected client with the `SessionConfig` it was
//! built from. Settings changes never patch a live session: `SessionHandle`
//! tears the old one down and swaps in a freshly built replacement, so an
//! intent turn that holds a snapshot keeps consistent credentials throughout.

use crate::client::{FhemClient, FhemHttpClient};
use crate::config::{FallbackTarget, SessionConfig, SkillSettings};
use crate::error::Result;
use crate::services::fallback::FallbackBackend;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// One connected backend plus the immutable settings view it serves
#[derive(Clone)]
pub struct Session {
    pub config: Arc<SessionConfig>,
    pub client: Arc<dyn FhemClient>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect to FHEM over HTTP and build a session from settings
    pub async fn establish(settings: &SkillSettings) -> Result<Self> {
        let mut client = FhemHttpClient::new(settings)?;
        client.connect().await?;
        Self::with_client(Arc::new(client), settings).await
    }

    /// Build a session around an already connected client
    pub async fn with_client(client: Arc<dyn FhemClient>, settings: &SkillSettings) -> Result<Self> {
        let fallback = detect_fallback(client.as_ref(), settings).await?;
        info!(
            room = %settings.room,
            fallback = ?fallback,
            "FHEM session ready"
        );

        Ok(Self {
            config: Arc::new(SessionConfig::from_settings(settings, fallback)),
            client,
        })
    }

    /// Session from explicit parts, skipping fallback detection
    pub fn from_parts(client: Arc<dyn FhemClient>, config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }
}

/// Look up the configured fallback device and recognize its wire convention
async fn detect_fallback(
    client: &dyn FhemClient,
    settings: &SkillSettings,
) -> Result<Option<FallbackTarget>> {
    let Some(device_name) = settings.fallback_device() else {
        debug!("Fallback disabled");
        return Ok(None);
    };

    let Some(device) = client.get_device(device_name).await? else {
        warn!("Fallback device {device_name} not found, fallback disabled");
        return Ok(None);
    };

    let device_type = device.device_type().unwrap_or_default();
    match FallbackBackend::from_fhem_type(device_type) {
        Some(backend) => {
            debug!("Fallback device {device_name} is of type {device_type}");
            Ok(Some(FallbackTarget {
                device_name: device_name.to_string(),
                backend,
            }))
        }
        None => {
            warn!("Fallback device {device_name} has unsupported type '{device_type}', fallback disabled");
            Ok(None)
        }
    }
}

/// Holder of the single live session
#[derive(Default)]
pub struct SessionHandle {
    inner: RwLock<Option<Arc<Session>>>,
}

impl SessionHandle {
    /// Empty handle; intents report a setup error until a session exists
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that starts with the given session
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: RwLock::new(Some(Arc::new(session))),
        }
    }

    /// Snapshot of the current session
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.inner.read().await.clone()
    }

    /// Tear down the current session and connect a new one from settings.
    ///
    /// On failure the handle is left empty rather than holding a session
    /// built from stale credentials.
    pub async fn reload(&self, settings: &SkillSettings) -> Result<()> {
        let mut guard = self.inner.write().await;
        guard.take();

        let session = Session::establish(settings).await?;
        *guard = Some(Arc::new(session));
        Ok(())
    }

    /// Swap in an already built session
    pub async fn replace(&self, session: Session) {
        *self.inner.write().await = Some(Arc::new(session));
    }

    /// Drop the current session
    pub async fn clear(&self) {
        self.inner.write().await.take();
    }
}
