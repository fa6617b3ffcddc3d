//! Overlay Manager - lifecycle of modal video overlays
//!
//! Coordinates:
//! - Classification and surface building for opened/preloaded videos
//! - The preloaded-overlay registry
//! - The single-active-playback invariant
//! - History entries, scroll locking and close semantics
//! - Promotion and analytics hand-off on media lifecycle events
//!
//! The manager never touches a DOM. Everything visible goes through an
//! [`OverlayHost`], which the browser binding implements with real elements
//! and the tests implement with a recorder.

use crate::analytics::{AnalyticsCache, AnalyticsService, DocumentEvent, VideoEventDetail};
use crate::classify::{classify, is_video_link, Classification};
use crate::feed::FeedSource;
use crate::history::HistoryEntry;
use crate::promotions::PromotionService;
use crate::surface::{build_surface, PlayerSurface, Surface};
use crate::{
    Error, MediaCommand, MediaEvent, MediaSnapshot, OverlayConfig, OverlayId, OverlayKind, Result,
    VideoReference,
};
use std::collections::HashMap;
use std::rc::Rc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Surface operations the manager needs from its environment
///
/// The host also owns input wiring: a click outside an overlay's surface
/// calls [`OverlayManager::close`], clicks inside the surface are stopped,
/// and one document-level Escape listener calls [`OverlayManager::escape`].
pub trait OverlayHost {
    /// Hard navigation to a URL (unplayable references)
    fn navigate(&self, url: &str);

    /// Lock or release document scrolling
    fn set_scroll_lock(&self, locked: bool);

    /// Create the overlay container and, when present, its surface
    fn mount(&self, id: &OverlayId, player: Option<&PlayerSurface>, visible: bool) -> Result<()>;

    /// Tear the overlay container down
    fn unmount(&self, id: &OverlayId);

    /// Show or hide a mounted overlay
    fn set_visible(&self, id: &OverlayId, visible: bool);

    /// Play or pause the overlay's surface (postMessage for iframes, direct for native media).
    /// Rejected play requests are swallowed by the host.
    fn send_command(&self, id: &OverlayId, command: MediaCommand);

    /// Seek native media
    fn seek(&self, id: &OverlayId, seconds: u32);

    /// Current state of the overlay's native media, if it has one
    fn media_snapshot(&self, id: &OverlayId) -> Option<MediaSnapshot>;

    /// Inject promotion HTML as a hidden block of the overlay
    fn attach_promotion(&self, id: &OverlayId, html: &str) -> Result<()>;

    /// Hide the media and make the attached promotion visible
    fn reveal_promotion(&self, id: &OverlayId);

    fn push_history(&self, entry: &HistoryEntry);

    /// Emit an event on the document
    fn dispatch(&self, event: &DocumentEvent);

    /// Path of the current page
    fn page_path(&self) -> String;
}

/// What `show` / `preload` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Overlay is mounted under this id
    Opened(OverlayId),
    /// Reference was not playable inline; the host navigated here
    Navigated(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayMode {
    Transient,
    Preloaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromotionState {
    None,
    Attached,
    Revealed,
}

#[derive(Debug)]
struct OverlayRecord {
    title: String,
    mode: OverlayMode,
    classification: Classification,
    player: Option<PlayerSurface>,
    promotion: PromotionState,
}

impl OverlayRecord {
    /// Primary source, start offset and autoplay flag of a native surface
    fn native(&self) -> Option<(&str, u32, bool)> {
        match self.player.as_ref().map(|p| &p.surface) {
            Some(Surface::Native {
                sources,
                start_offset,
                autoplay,
                ..
            }) => sources
                .first()
                .map(|s| (s.src.as_str(), *start_offset, *autoplay)),
            _ => None,
        }
    }
}

/// Overlay records plus the single active slot
#[derive(Debug, Default)]
struct Registry {
    overlays: HashMap<OverlayId, OverlayRecord>,
    active: Option<OverlayId>,
}

impl Registry {
    fn kind(&self, id: &OverlayId) -> Option<OverlayKind> {
        let record = self.overlays.get(id)?;
        Some(match record.mode {
            OverlayMode::Transient => OverlayKind::Active,
            OverlayMode::Preloaded if self.active.as_ref() == Some(id) => OverlayKind::PreloadedActive,
            OverlayMode::Preloaded => OverlayKind::PreloadedInactive,
        })
    }

    /// Whether displacing the active overlay closes a native surface
    fn active_needs_report(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|id| self.overlays.get(id))
            .is_some_and(|r| r.mode == OverlayMode::Transient && r.native().is_some())
    }
}

/// Owner of every overlay on the page
pub struct OverlayManager<H: OverlayHost> {
    host: H,
    config: OverlayConfig,
    analytics: AnalyticsService,
    promotions: PromotionService,
    registry: RwLock<Registry>,
}

impl<H: OverlayHost> OverlayManager<H> {
    /// Create a manager with explicitly constructed feed services
    pub fn new(host: H, config: OverlayConfig, analytics: AnalyticsService, promotions: PromotionService) -> Self {
        Self {
            host,
            config,
            analytics,
            promotions,
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Create a manager whose two feeds share one source, at the configured paths
    pub fn with_source(host: H, config: OverlayConfig, source: Rc<dyn FeedSource>) -> Self {
        let analytics = AnalyticsService::new(
            Box::new(source.clone()),
            config.analytics_feed.clone(),
            config.product.clone(),
        );
        let promotions = PromotionService::new(Box::new(source), config.promotions_feed_path());
        Self::new(host, config, analytics, promotions)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    pub fn promotions(&self) -> &PromotionService {
        &self.promotions
    }

    /// Classify a reference under the configured locale
    pub fn classify(&self, reference: &VideoReference) -> Classification {
        classify(reference, &self.config.locale())
    }

    /// Open a video in a new visible overlay
    #[instrument(skip(self, reference), fields(title = %reference.title()))]
    pub async fn show(&self, reference: &VideoReference, push_history: bool) -> Result<OpenOutcome> {
        if let Some(outcome) = self.navigate_if_unplayable(reference) {
            return Ok(outcome);
        }

        let analytics = self.analytics_for_displacement().await;
        let mut registry = self.registry.write().await;

        self.deactivate_locked(&mut registry, analytics);
        self.host.set_scroll_lock(true);

        let id = OverlayId::modal(reference.title());
        let record = self.build_record(reference, OverlayMode::Transient);
        self.host.mount(&id, record.player.as_ref(), true)?;
        registry.overlays.insert(id.clone(), record);
        registry.active = Some(id.clone());

        if push_history {
            self.push_history(reference);
        }

        info!(overlay = %id, "Overlay opened");
        Ok(OpenOutcome::Opened(id))
    }

    /// Build a hidden overlay ahead of time; `activate` shows it later
    #[instrument(skip(self, reference), fields(title = %reference.title()))]
    pub async fn preload(&self, reference: &VideoReference, push_history: bool) -> Result<OpenOutcome> {
        if let Some(outcome) = self.navigate_if_unplayable(reference) {
            return Ok(outcome);
        }

        let id = OverlayId::from_title(reference.title());
        let mut registry = self.registry.write().await;
        if registry.overlays.contains_key(&id) {
            debug!(overlay = %id, "Overlay already preloaded");
            return Ok(OpenOutcome::Opened(id));
        }

        let record = self.build_record(reference, OverlayMode::Preloaded);
        self.host.mount(&id, record.player.as_ref(), false)?;
        registry.overlays.insert(id.clone(), record);

        if push_history {
            self.push_history(reference);
        }

        info!(overlay = %id, "Overlay preloaded");
        Ok(OpenOutcome::Opened(id))
    }

    /// Make the preloaded overlay for `title` the single playing overlay
    ///
    /// Runs as one registry transaction: the previous active overlay is
    /// paused (or closed, when it was opened with `show`) before the target
    /// starts. An unknown title still deactivates whatever was playing.
    #[instrument(skip(self))]
    pub async fn activate(&self, title: &str) -> Result<OverlayId> {
        let target = OverlayId::from_title(title);
        let analytics = self.analytics_for_displacement().await;
        let mut registry = self.registry.write().await;

        if registry.active.as_ref() == Some(&target) {
            self.host.send_command(&target, MediaCommand::Play);
            return Ok(target);
        }

        self.deactivate_locked(&mut registry, analytics);

        let preloaded = registry
            .overlays
            .get(&target)
            .is_some_and(|r| r.mode == OverlayMode::Preloaded);
        if !preloaded {
            warn!(overlay = %target, "No preloaded overlay to activate");
            self.host.set_scroll_lock(false);
            return Err(Error::UnknownOverlay(target.to_string()));
        }

        registry.active = Some(target.clone());
        self.host.set_scroll_lock(true);
        self.host.set_visible(&target, true);
        self.host.send_command(&target, MediaCommand::Play);

        info!(overlay = %target, "Overlay activated");
        Ok(target)
    }

    /// Close an overlay
    ///
    /// `videoclosed` is emitted before anything is torn down, so listeners can
    /// still inspect the overlay.
    #[instrument(skip(self))]
    pub async fn close(&self, id: &OverlayId) -> Result<()> {
        let analytics = self.analytics.get().await;
        let mut registry = self.registry.write().await;
        self.close_locked(&mut registry, id, Some(analytics))
    }

    /// Close whatever overlay is active (the document Escape handler)
    pub async fn escape(&self) -> Result<Option<OverlayId>> {
        let Some(active) = self.active().await else {
            return Ok(None);
        };
        self.close(&active).await?;
        Ok(Some(active))
    }

    /// Forget a preloaded overlay and unmount it
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &OverlayId) -> Result<()> {
        let mut registry = self.registry.write().await;
        match registry.overlays.get(id).map(|r| r.mode) {
            None => return Err(Error::UnknownOverlay(id.to_string())),
            Some(OverlayMode::Transient) => {
                return Err(Error::InvalidStateTransition {
                    from: OverlayKind::Active.to_string(),
                    to: "removed".to_string(),
                })
            }
            Some(OverlayMode::Preloaded) => {}
        }

        if registry.active.as_ref() == Some(id) {
            self.host.send_command(id, MediaCommand::Pause);
            registry.active = None;
            self.host.set_scroll_lock(false);
        }
        registry.overlays.remove(id);
        self.host.unmount(id);

        info!(overlay = %id, "Preloaded overlay removed");
        Ok(())
    }

    /// React to a lifecycle event of an overlay's native media
    ///
    /// A promotion that cannot be attached is logged and skipped; the
    /// analytics event and the end-of-playback handling still run.
    #[instrument(skip(self))]
    pub async fn handle_media_event(&self, id: &OverlayId, event: MediaEvent) -> Result<()> {
        let Some((primary, start_offset, autoplay)) = self.native_info(id).await? else {
            return Ok(());
        };

        match event {
            MediaEvent::DataAvailable => {
                if start_offset > 0 {
                    self.host.seek(id, start_offset);
                }

                if let Some(html) = self.promotions.resolve(&primary).await {
                    let mut registry = self.registry.write().await;
                    if let Some(record) = registry.overlays.get_mut(id) {
                        if record.promotion == PromotionState::None && self.try_attach(id, &html) {
                            record.promotion = PromotionState::Attached;
                        }
                    }
                }

                if let Some(detail) = self.resolve_analytics(id).await {
                    self.host.dispatch(&DocumentEvent::VideoLoaded(detail));
                }

                if autoplay && self.active().await.as_ref() == Some(id) {
                    self.host.send_command(id, MediaCommand::Play);
                }
            }
            MediaEvent::Ended => {
                let Some(html) = self.promotions.resolve(&primary).await else {
                    return Ok(());
                };
                let mut registry = self.registry.write().await;
                let Some(record) = registry.overlays.get_mut(id) else {
                    return Ok(());
                };
                if record.promotion != PromotionState::Revealed {
                    self.host.send_command(id, MediaCommand::Pause);
                    if record.promotion == PromotionState::None && !self.try_attach(id, &html) {
                        return Ok(());
                    }
                    self.host.reveal_promotion(id);
                    record.promotion = PromotionState::Revealed;
                    info!(overlay = %id, "Promotion revealed");
                }
            }
        }
        Ok(())
    }

    /// Kind of a registered overlay
    pub async fn kind(&self, id: &OverlayId) -> Option<OverlayKind> {
        self.registry.read().await.kind(id)
    }

    /// The overlay currently active, if any
    pub async fn active(&self) -> Option<OverlayId> {
        self.registry.read().await.active.clone()
    }

    /// Ids of every registered overlay, sorted
    pub async fn overlay_ids(&self) -> Vec<OverlayId> {
        let mut ids: Vec<OverlayId> = self.registry.read().await.overlays.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Title an overlay was opened with
    pub async fn title(&self, id: &OverlayId) -> Option<String> {
        self.registry.read().await.overlays.get(id).map(|r| r.title.clone())
    }

    /// Classification an overlay was built from
    pub async fn classification(&self, id: &OverlayId) -> Option<Classification> {
        self.registry
            .read()
            .await
            .overlays
            .get(id)
            .map(|r| r.classification.clone())
    }

    fn navigate_if_unplayable(&self, reference: &VideoReference) -> Option<OpenOutcome> {
        if reference.urls().iter().any(|u| is_video_link(u)) {
            return None;
        }
        let url = reference.primary_url().to_string();
        info!(url = %url, "Not an inline video, navigating");
        self.host.navigate(&url);
        Some(OpenOutcome::Navigated(url))
    }

    /// Preloaded surfaces never autoplay; they start through `activate`
    fn build_record(&self, reference: &VideoReference, mode: OverlayMode) -> OverlayRecord {
        let classification = self.classify(reference);
        let autoplay = self.config.autoplay && mode == OverlayMode::Transient;
        let player = build_surface(&classification, reference.title(), autoplay);
        OverlayRecord {
            title: reference.title().to_string(),
            mode,
            classification,
            player,
            promotion: PromotionState::None,
        }
    }

    fn push_history(&self, reference: &VideoReference) {
        self.host.push_history(&HistoryEntry::new(
            reference.primary_url(),
            reference.title(),
            &self.config.document_title,
        ));
    }

    /// Warm the analytics cache only when the coming transaction will close a native surface
    async fn analytics_for_displacement(&self) -> Option<&AnalyticsCache> {
        if self.registry.read().await.active_needs_report() {
            Some(self.analytics.get().await)
        } else {
            None
        }
    }

    /// Empty the active slot: pause and hide a preloaded overlay, close a transient one
    fn deactivate_locked(&self, registry: &mut Registry, analytics: Option<&AnalyticsCache>) {
        let Some(active) = registry.active.take() else {
            return;
        };
        match registry.overlays.get(&active).map(|r| r.mode) {
            Some(OverlayMode::Preloaded) => {
                self.host.send_command(&active, MediaCommand::Pause);
                self.host.set_visible(&active, false);
                debug!(overlay = %active, "Overlay deactivated");
            }
            Some(OverlayMode::Transient) => {
                if let Err(e) = self.close_locked(registry, &active, analytics) {
                    warn!(overlay = %active, error = %e, "Failed to close displaced overlay");
                }
            }
            None => {}
        }
    }

    fn close_locked(&self, registry: &mut Registry, id: &OverlayId, analytics: Option<&AnalyticsCache>) -> Result<()> {
        let mode = registry
            .overlays
            .get(id)
            .map(|r| r.mode)
            .ok_or_else(|| Error::UnknownOverlay(id.to_string()))?;

        if let Some(cache) = analytics {
            if let Some(detail) = self.analytics_detail(cache, id) {
                self.host.dispatch(&DocumentEvent::VideoClosed(detail));
            }
        }

        if let Some(active) = registry.active.clone() {
            if registry.overlays.get(&active).map(|r| r.mode) == Some(OverlayMode::Preloaded) {
                self.host.send_command(&active, MediaCommand::Pause);
                self.host.set_visible(&active, false);
                registry.active = None;
            }
        }

        if mode == OverlayMode::Transient {
            registry.overlays.remove(id);
            if registry.active.as_ref() == Some(id) {
                registry.active = None;
            }
            self.host.unmount(id);
        }

        self.host.set_scroll_lock(false);
        info!(overlay = %id, "Overlay closed");
        Ok(())
    }

    fn analytics_detail(&self, cache: &AnalyticsCache, id: &OverlayId) -> Option<VideoEventDetail> {
        let media = self.host.media_snapshot(id)?;
        let page = self.host.page_path();
        cache
            .lookup(&page, &media.current_src)
            .map(|entry| VideoEventDetail::new(id.clone(), &media, entry, &self.config.product))
    }

    async fn resolve_analytics(&self, id: &OverlayId) -> Option<VideoEventDetail> {
        let media = self.host.media_snapshot(id)?;
        self.analytics.resolve(id, &self.host.page_path(), &media).await
    }

    fn try_attach(&self, id: &OverlayId, html: &str) -> bool {
        match self.host.attach_promotion(id, html) {
            Ok(()) => true,
            Err(e) => {
                warn!(overlay = %id, error = %e, "Failed to attach promotion");
                false
            }
        }
    }

    async fn native_info(&self, id: &OverlayId) -> Result<Option<(String, u32, bool)>> {
        let registry = self.registry.read().await;
        let record = registry
            .overlays
            .get(id)
            .ok_or_else(|| Error::UnknownOverlay(id.to_string()))?;
        Ok(record
            .native()
            .map(|(src, offset, autoplay)| (src.to_string(), offset, autoplay)))
    }
}
