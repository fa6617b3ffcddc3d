//! Integration tests for the overlay manager

use fastvideo_core::{
    DocumentEvent, Error, FeedSource, HistoryEntry, MediaCommand, MediaEvent, MediaSnapshot,
    OpenOutcome, OverlayConfig, OverlayHost, OverlayId, OverlayKind, OverlayManager, PlayerSurface,
    StaticFeedSource, Surface, VideoReference,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

const ORIGIN: &str = "https://www.example.com";

const ANALYTICS: &str = r#"{"data": [
    {"Page": "/express/create", "Filenames": "media_demo", "videoName": "Demo", "videoId": "d-1", "videoDescription": "A demo"}
]}"#;

const PROMOTIONS: &str = r#"{"data": [
    {"Video": "https://www.example.com/express/media_demo.mp4", "Promotion": "<a class=\"button\">Start now</a>"}
]}"#;

// =============================================================================
// Recording host
// =============================================================================

#[derive(Default)]
struct RecordingHost {
    log: RefCell<Vec<String>>,
    mounted: RefCell<HashMap<OverlayId, Option<PlayerSurface>>>,
    visible: RefCell<HashMap<OverlayId, bool>>,
    playing: RefCell<HashMap<OverlayId, bool>>,
    max_playing: Cell<usize>,
    scroll_locked: Cell<bool>,
    navigated: RefCell<Option<String>>,
    history: RefCell<Vec<HistoryEntry>>,
    events: RefCell<Vec<DocumentEvent>>,
    promotions: RefCell<HashMap<OverlayId, (String, bool)>>,
    seeks: RefCell<Vec<(OverlayId, u32)>>,
    fail_attach: Cell<bool>,
}

impl RecordingHost {
    fn log(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }

    fn is_playing(&self, id: &OverlayId) -> bool {
        self.playing.borrow().get(id).copied().unwrap_or(false)
    }

    fn is_visible(&self, id: &OverlayId) -> bool {
        self.visible.borrow().get(id).copied().unwrap_or(false)
    }

    fn position(&self, needle: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .position(|e| e == needle)
            .unwrap_or_else(|| panic!("{needle} not in log: {:?}", self.log.borrow()))
    }
}

impl OverlayHost for RecordingHost {
    fn navigate(&self, url: &str) {
        *self.navigated.borrow_mut() = Some(url.to_string());
    }

    fn set_scroll_lock(&self, locked: bool) {
        self.scroll_locked.set(locked);
    }

    fn mount(&self, id: &OverlayId, player: Option<&PlayerSurface>, visible: bool) -> fastvideo_core::Result<()> {
        self.log(format!("mount:{id}"));
        self.mounted.borrow_mut().insert(id.clone(), player.cloned());
        self.visible.borrow_mut().insert(id.clone(), visible);
        Ok(())
    }

    fn unmount(&self, id: &OverlayId) {
        self.log(format!("unmount:{id}"));
        self.mounted.borrow_mut().remove(id);
        self.visible.borrow_mut().remove(id);
        self.playing.borrow_mut().remove(id);
    }

    fn set_visible(&self, id: &OverlayId, visible: bool) {
        self.visible.borrow_mut().insert(id.clone(), visible);
    }

    fn send_command(&self, id: &OverlayId, command: MediaCommand) {
        self.playing
            .borrow_mut()
            .insert(id.clone(), command == MediaCommand::Play);
        let now_playing = self.playing.borrow().values().filter(|p| **p).count();
        self.max_playing.set(self.max_playing.get().max(now_playing));
    }

    fn seek(&self, id: &OverlayId, seconds: u32) {
        self.seeks.borrow_mut().push((id.clone(), seconds));
    }

    fn media_snapshot(&self, id: &OverlayId) -> Option<MediaSnapshot> {
        let mounted = self.mounted.borrow();
        let snapshot = match &mounted.get(id)?.as_ref()?.surface {
            Surface::Native { sources, .. } => Some(MediaSnapshot {
                current_src: format!("{ORIGIN}{}", sources.first()?.src),
                duration: Some(30.0),
            }),
            Surface::Iframe { .. } => None,
        };
        snapshot
    }

    fn attach_promotion(&self, id: &OverlayId, html: &str) -> fastvideo_core::Result<()> {
        self.log(format!("attach:{id}"));
        if self.fail_attach.get() {
            return Err(Error::host("append failed"));
        }
        self.promotions
            .borrow_mut()
            .insert(id.clone(), (html.to_string(), false));
        Ok(())
    }

    fn reveal_promotion(&self, id: &OverlayId) {
        if let Some(promo) = self.promotions.borrow_mut().get_mut(id) {
            promo.1 = true;
        }
    }

    fn push_history(&self, entry: &HistoryEntry) {
        self.history.borrow_mut().push(entry.clone());
    }

    fn dispatch(&self, event: &DocumentEvent) {
        self.log(format!("dispatch:{}", event.name()));
        self.events.borrow_mut().push(event.clone());
    }

    fn page_path(&self) -> String {
        "/express/create/logo".to_string()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn config() -> OverlayConfig {
    OverlayConfig {
        document_title: "Adobe Express".to_string(),
        ..Default::default()
    }
}

fn manager_with(source: StaticFeedSource) -> (OverlayManager<RecordingHost>, Rc<StaticFeedSource>) {
    let source = Rc::new(source);
    let shared: Rc<dyn FeedSource> = source.clone();
    (OverlayManager::with_source(RecordingHost::default(), config(), shared), source)
}

fn feeds() -> StaticFeedSource {
    StaticFeedSource::new()
        .with("/express/video-analytics.json", ANALYTICS)
        .with("/express/video-promotions.json", PROMOTIONS)
}

fn manager() -> OverlayManager<RecordingHost> {
    manager_with(feeds()).0
}

fn autoplay_manager() -> OverlayManager<RecordingHost> {
    let config = OverlayConfig {
        autoplay: true,
        ..config()
    };
    OverlayManager::with_source(RecordingHost::default(), config, Rc::new(feeds()))
}

fn reference(url: &str, title: &str) -> VideoReference {
    VideoReference::single(url, title).unwrap()
}

fn opened(outcome: OpenOutcome) -> OverlayId {
    match outcome {
        OpenOutcome::Opened(id) => id,
        OpenOutcome::Navigated(url) => panic!("unexpected navigation to {url}"),
    }
}

// =============================================================================
// show / navigation
// =============================================================================

#[tokio::test]
async fn test_unplayable_reference_navigates() {
    let manager = manager();
    let outcome = manager
        .show(&reference("https://example.com/file.txt", "t"), false)
        .await
        .unwrap();

    assert_eq!(outcome, OpenOutcome::Navigated("https://example.com/file.txt".into()));
    assert_eq!(
        manager.host().navigated.borrow().as_deref(),
        Some("https://example.com/file.txt")
    );
    assert!(manager.overlay_ids().await.is_empty());
    assert!(manager.host().mounted.borrow().is_empty());
    assert!(!manager.host().scroll_locked.get());
}

#[tokio::test]
async fn test_show_opens_active_overlay_with_history() {
    let manager = manager();
    let id = opened(
        manager
            .show(&reference("https://www.youtube.com/watch?v=abc123", "Make a Logo"), true)
            .await
            .unwrap(),
    );

    assert_eq!(manager.kind(&id).await, Some(OverlayKind::Active));
    assert_eq!(manager.active().await, Some(id.clone()));
    assert!(manager.host().scroll_locked.get());
    assert!(manager.host().is_visible(&id));

    let mounted = manager.host().mounted.borrow();
    let player = mounted.get(&id).unwrap().as_ref().unwrap();
    assert_eq!(
        player.surface.primary_src(),
        "https://www.youtube.com/embed/abc123?feature=oembed&enablejsapi=1"
    );

    let history = manager.host().history.borrow();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].hash, "#make-a-logo");
    assert_eq!(history[0].page_title, "Adobe Express | Make a Logo");
    assert_eq!(history[0].state.url, "https://www.youtube.com/watch?v=abc123");
}

#[tokio::test]
async fn test_show_without_history() {
    let manager = manager();
    manager
        .show(&reference("https://vimeo.com/123", "Tour"), false)
        .await
        .unwrap();
    assert!(manager.host().history.borrow().is_empty());
}

// =============================================================================
// Single active playback
// =============================================================================

#[tokio::test]
async fn test_activate_keeps_single_playing_overlay() {
    let manager = manager();
    let a = opened(manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap());
    let b = opened(manager.preload(&reference("https://vimeo.com/2", "B"), false).await.unwrap());

    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedInactive));
    assert_eq!(manager.kind(&b).await, Some(OverlayKind::PreloadedInactive));
    assert!(!manager.host().is_visible(&a));

    manager.activate("A").await.unwrap();
    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedActive));
    assert!(manager.host().is_playing(&a));

    manager.activate("B").await.unwrap();
    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedInactive));
    assert_eq!(manager.kind(&b).await, Some(OverlayKind::PreloadedActive));
    assert!(!manager.host().is_playing(&a));
    assert!(manager.host().is_playing(&b));
    assert!(!manager.host().is_visible(&a));
    assert!(manager.host().is_visible(&b));

    assert_eq!(manager.host().max_playing.get(), 1);
}

#[tokio::test]
async fn test_show_pauses_active_preloaded() {
    let manager = manager();
    let a = opened(manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap());
    manager.activate("A").await.unwrap();

    let modal = opened(
        manager
            .show(&reference("https://youtu.be/xyz", "Other"), false)
            .await
            .unwrap(),
    );

    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedInactive));
    assert!(!manager.host().is_playing(&a));
    assert_eq!(manager.active().await, Some(modal));
}

#[tokio::test]
async fn test_activate_closes_open_modal() {
    let manager = manager();
    manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap();
    let modal = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    let a = manager.activate("A").await.unwrap();

    assert_eq!(manager.kind(&modal).await, None);
    assert!(!manager.host().mounted.borrow().contains_key(&modal));
    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedActive));
    assert!(manager.host().scroll_locked.get());

    let events = manager.host().events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "videoclosed");
}

#[tokio::test]
async fn test_activate_unknown_title() {
    let manager = manager();
    let a = opened(manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap());
    manager.activate("A").await.unwrap();

    let err = manager.activate("Missing").await.unwrap_err();
    assert!(matches!(err, Error::UnknownOverlay(_)));
    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedInactive));
    assert_eq!(manager.active().await, None);
}

#[tokio::test]
async fn test_preload_same_title_is_noop() {
    let manager = manager();
    let first = opened(manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap());
    let second = opened(manager.preload(&reference("https://vimeo.com/9", "A"), false).await.unwrap());
    assert_eq!(first, second);
    assert_eq!(manager.overlay_ids().await.len(), 1);
    assert_eq!(manager.host().position(&format!("mount:{first}")), 0);
    assert_eq!(manager.host().log.borrow().len(), 1);
}

// =============================================================================
// Close semantics
// =============================================================================

#[tokio::test]
async fn test_close_reports_before_teardown() {
    let manager = manager();
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.close(&id).await.unwrap();

    let host = manager.host();
    assert!(host.position("dispatch:videoclosed") < host.position(&format!("unmount:{id}")));
    assert!(!host.scroll_locked.get());
    assert_eq!(manager.kind(&id).await, None);

    let events = host.events.borrow();
    let detail = events[0].detail();
    assert_eq!(detail.video, id);
    assert_eq!(detail.parameters.video_name.as_deref(), Some("Demo"));
    assert_eq!(detail.parameters.video_length, Some(30.0));
}

#[tokio::test]
async fn test_close_iframe_has_no_analytics() {
    let manager = manager();
    let id = opened(manager.show(&reference("https://vimeo.com/5", "V"), false).await.unwrap());
    manager.close(&id).await.unwrap();
    assert!(manager.host().events.borrow().is_empty());
}

#[tokio::test]
async fn test_escape_closes_active_preloaded() {
    let manager = manager();
    let a = opened(manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap());
    manager.activate("A").await.unwrap();

    assert_eq!(manager.escape().await.unwrap(), Some(a.clone()));
    assert_eq!(manager.kind(&a).await, Some(OverlayKind::PreloadedInactive));
    assert!(!manager.host().is_visible(&a));
    assert!(!manager.host().is_playing(&a));
    assert!(!manager.host().scroll_locked.get());

    assert_eq!(manager.escape().await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_preloaded() {
    let manager = manager();
    let a = opened(manager.preload(&reference("https://vimeo.com/1", "A"), false).await.unwrap());
    manager.remove(&a).await.unwrap();
    assert!(manager.overlay_ids().await.is_empty());
    assert!(matches!(manager.remove(&a).await, Err(Error::UnknownOverlay(_))));

    let modal = opened(manager.show(&reference("https://vimeo.com/2", "B"), false).await.unwrap());
    assert!(matches!(
        manager.remove(&modal).await,
        Err(Error::InvalidStateTransition { .. })
    ));
}

// =============================================================================
// Media lifecycle
// =============================================================================

#[tokio::test]
async fn test_data_available_seeks_attaches_and_reports() {
    let manager = manager();
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4#t=42", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();
    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();

    let host = manager.host();
    assert_eq!(host.seeks.borrow()[0], (id.clone(), 42));
    assert_eq!(
        host.log.borrow().iter().filter(|e| e.starts_with("attach:")).count(),
        1
    );
    let events = host.events.borrow();
    assert_eq!(events[0].name(), "videoloaded");
    assert_eq!(events[0].detail().parameters.video_id.as_deref(), Some("d-1"));
    assert!(!host.is_playing(&id));
}

#[tokio::test]
async fn test_ended_reveals_promotion() {
    let manager = manager();
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.handle_media_event(&id, MediaEvent::Ended).await.unwrap();

    let promotions = manager.host().promotions.borrow();
    let (html, revealed) = promotions.get(&id).unwrap();
    assert!(html.contains("Start now"));
    assert!(*revealed);
    assert!(!manager.host().is_playing(&id));
}

#[tokio::test]
async fn test_promotion_attached_once_then_revealed() {
    let manager = manager();
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();
    assert_eq!(manager.host().promotions.borrow().get(&id).map(|p| p.1), Some(false));

    manager.handle_media_event(&id, MediaEvent::Ended).await.unwrap();
    manager.handle_media_event(&id, MediaEvent::Ended).await.unwrap();

    let host = manager.host();
    assert_eq!(
        host.log.borrow().iter().filter(|e| e.starts_with("attach:")).count(),
        1
    );
    assert_eq!(host.promotions.borrow().get(&id).map(|p| p.1), Some(true));
}

#[tokio::test]
async fn test_failed_promotion_attach_still_reports() {
    let manager = manager();
    manager.host().fail_attach.set(true);
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();
    {
        let events = manager.host().events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "videoloaded");
    }
    assert!(manager.host().promotions.borrow().is_empty());

    manager.handle_media_event(&id, MediaEvent::Ended).await.unwrap();
    assert!(manager.host().promotions.borrow().is_empty());
    assert!(!manager.host().is_playing(&id));

    // nothing was recorded as attached, so a later end retries
    manager.host().fail_attach.set(false);
    manager.handle_media_event(&id, MediaEvent::Ended).await.unwrap();
    assert_eq!(manager.host().promotions.borrow().get(&id).map(|p| p.1), Some(true));
}

#[tokio::test]
async fn test_autoplay_starts_shown_media_on_data() {
    let manager = autoplay_manager();
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );
    assert!(!manager.host().is_playing(&id));

    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();

    assert!(manager.host().is_playing(&id));
    assert_eq!(manager.host().position("dispatch:videoloaded"), 2);
}

#[tokio::test]
async fn test_autoplay_skips_preloaded_media() {
    let manager = autoplay_manager();
    let id = opened(
        manager
            .preload(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();

    assert!(!manager.host().is_playing(&id));
    assert_eq!(manager.host().max_playing.get(), 0);
}

#[tokio::test]
async fn test_iframe_media_events_are_ignored() {
    let manager = manager();
    let id = opened(manager.show(&reference("https://vimeo.com/5", "V"), false).await.unwrap());
    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();
    assert!(manager.host().events.borrow().is_empty());

    let unknown = OverlayId::from_title("nope");
    assert!(manager.handle_media_event(&unknown, MediaEvent::Ended).await.is_err());
}

// =============================================================================
// Feed degradation
// =============================================================================

#[tokio::test]
async fn test_missing_feeds_degrade_silently() {
    let (manager, source) = manager_with(StaticFeedSource::new());
    let id = opened(
        manager
            .show(&reference("https://www.example.com/express/media_demo.mp4", "Demo"), false)
            .await
            .unwrap(),
    );

    manager.handle_media_event(&id, MediaEvent::DataAvailable).await.unwrap();
    manager.handle_media_event(&id, MediaEvent::Ended).await.unwrap();
    manager.close(&id).await.unwrap();

    assert!(manager.host().events.borrow().is_empty());
    assert!(manager.host().promotions.borrow().is_empty());
    // one failed fetch per feed, never retried
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_locale_scoped_promotions() {
    let source = StaticFeedSource::new().with("/fr/express/video-promotions.json", PROMOTIONS);
    let source: Rc<dyn FeedSource> = Rc::new(source);
    let manager = OverlayManager::with_source(
        RecordingHost::default(),
        OverlayConfig::for_locale("/fr"),
        source,
    );
    assert_eq!(manager.promotions().get().await.len(), 1);
    assert!(manager.analytics().get().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_analytics_getters_share_fetch() {
    let (manager, source) =
        manager_with(StaticFeedSource::new().with("/express/video-analytics.json", ANALYTICS));
    let (a, b) = tokio::join!(manager.analytics().get(), manager.analytics().get());
    assert_eq!(a, b);
    assert_eq!(a.len(), 1);
    assert_eq!(source.fetch_count(), 1);
}
