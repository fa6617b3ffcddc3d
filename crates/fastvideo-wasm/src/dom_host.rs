//! DOM implementation of [`OverlayHost`]
//!
//! Each overlay is a `div` appended to `<main>`, holding a
//! `div.video-overlay-video` container with the player surface and its
//! `div.close` control. A shown overlay carries `video-overlay`, a preloaded
//! one `video-overlay-preloaded`, and activation toggles `video-overlay` on
//! it. Listener closures live as long as the overlay element: they are
//! dropped together on unmount.

use fastvideo_core::{
    DocumentEvent, Error, HistoryEntry, MediaCommand, MediaEvent, MediaSnapshot, OverlayHost,
    OverlayId, OverlayManager, PlayerSurface, Result, Surface,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    CustomEvent, CustomEventInit, Document, Element, Event, EventTarget, HtmlIFrameElement,
    HtmlMediaElement, KeyboardEvent,
};

const SHOWN: &str = "video-overlay";
const PRELOADED: &str = "video-overlay-preloaded";
const SCROLL_LOCK: &str = "no-scroll";
const PROMOTION_REVEALED: &str = "appear";

type Listener = Closure<dyn FnMut(Event)>;

/// What a DOM listener asks the manager to do
#[derive(Debug, Clone, Copy)]
enum Action {
    Close,
    Media(MediaEvent),
}

struct MountedOverlay {
    root: Element,
    container: Element,
    media: Option<HtmlMediaElement>,
    iframe: Option<HtmlIFrameElement>,
    promotion: Option<Element>,
    _listeners: Vec<Listener>,
}

/// Browser host for the overlay manager
#[derive(Default)]
pub struct DomHost {
    manager: RefCell<Weak<OverlayManager<DomHost>>>,
    overlays: RefCell<HashMap<OverlayId, MountedOverlay>>,
    escape_listener: RefCell<Option<Closure<dyn FnMut(KeyboardEvent)>>>,
}

impl DomHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the host's listeners at `manager` and install the document Escape listener
    pub fn bind(manager: &Rc<OverlayManager<DomHost>>) -> Result<()> {
        let host = manager.host();
        *host.manager.borrow_mut() = Rc::downgrade(manager);

        let weak = Rc::downgrade(manager);
        let listener = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key() != "Escape" {
                return;
            }
            let Some(manager) = weak.upgrade() else {
                return;
            };
            spawn_local(async move {
                if let Err(e) = manager.escape().await {
                    report(&e);
                }
            });
        });
        document()?
            .add_event_listener_with_callback("keyup", listener.as_ref().unchecked_ref())
            .map_err(js_error)?;
        *host.escape_listener.borrow_mut() = Some(listener);
        Ok(())
    }

    fn listener(&self, id: &OverlayId, action: Action) -> Listener {
        let manager = self.manager.borrow().clone();
        let id = id.clone();
        Closure::new(move |_event: Event| {
            let Some(manager) = manager.upgrade() else {
                return;
            };
            let id = id.clone();
            spawn_local(async move {
                let result = match action {
                    Action::Close => manager.close(&id).await,
                    Action::Media(event) => manager.handle_media_event(&id, event).await,
                };
                if let Err(e) = result {
                    report(&e);
                }
            });
        })
    }
}

impl OverlayHost for DomHost {
    fn navigate(&self, url: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(url) {
                warn_js("navigate", &e);
            }
        }
    }

    fn set_scroll_lock(&self, locked: bool) {
        let Some(body) = document().ok().and_then(|d| d.body()) else {
            return;
        };
        if let Err(e) = body.class_list().toggle_with_force(SCROLL_LOCK, locked) {
            warn_js("scroll lock", &e);
        }
    }

    fn mount(&self, id: &OverlayId, player: Option<&PlayerSurface>, visible: bool) -> Result<()> {
        let document = document()?;
        let parent = mount_point(&document)?;

        let root = create(&document, "div")?;
        root.set_id(id.as_str());
        root.set_class_name(if visible { SHOWN } else { PRELOADED });
        let container = create(&document, "div")?;
        container.set_class_name("video-overlay-video");
        root.append_child(&container).map_err(js_error)?;

        let (media, iframe) = match player {
            Some(player) => render_surface(&document, &container, player)?,
            None => (None, None),
        };

        let mut listeners = Vec::new();
        if player.is_some_and(|p| p.close_control) {
            let button = create(&document, "div")?;
            button.set_class_name("close");
            button.set_attribute("role", "button").map_err(js_error)?;
            button.set_attribute("aria-label", "Close").map_err(js_error)?;
            container.append_child(&button).map_err(js_error)?;
            let on_close = self.listener(id, Action::Close);
            listen(&button, "click", &on_close)?;
            listeners.push(on_close);
        }

        let on_outside = self.listener(id, Action::Close);
        listen(&root, "click", &on_outside)?;
        listeners.push(on_outside);

        let stop_inside: Listener = Closure::new(|event: Event| event.stop_propagation());
        listen(&container, "click", &stop_inside)?;
        listeners.push(stop_inside);

        if let Some(media) = &media {
            for (name, event) in [("loadeddata", MediaEvent::DataAvailable), ("ended", MediaEvent::Ended)] {
                let listener = self.listener(id, Action::Media(event));
                listen(media, name, &listener)?;
                listeners.push(listener);
            }
        }

        parent.append_child(&root).map_err(js_error)?;
        self.overlays.borrow_mut().insert(
            id.clone(),
            MountedOverlay {
                root,
                container,
                media,
                iframe,
                promotion: None,
                _listeners: listeners,
            },
        );
        Ok(())
    }

    fn unmount(&self, id: &OverlayId) {
        let removed = self.overlays.borrow_mut().remove(id);
        if let Some(overlay) = removed {
            overlay.root.remove();
        }
    }

    fn set_visible(&self, id: &OverlayId, visible: bool) {
        if let Some(overlay) = self.overlays.borrow().get(id) {
            if let Err(e) = overlay.root.class_list().toggle_with_force(SHOWN, visible) {
                warn_js("visibility", &e);
            }
        }
    }

    fn send_command(&self, id: &OverlayId, command: MediaCommand) {
        let overlays = self.overlays.borrow();
        let Some(overlay) = overlays.get(id) else {
            return;
        };

        if let Some(iframe) = &overlay.iframe {
            if let Some(window) = iframe.content_window() {
                let message = JsValue::from_str(&command.iframe_message());
                if let Err(e) = window.post_message(&message, "*") {
                    warn_js("postMessage", &e);
                }
            }
            return;
        }

        let Some(media) = &overlay.media else {
            return;
        };
        match command {
            MediaCommand::Play => match media.play() {
                Ok(promise) => spawn_local(async move {
                    // autoplay policies reject play() without a user gesture
                    if let Err(e) = JsFuture::from(promise).await {
                        web_sys::console::debug_2(&"[fastvideo] play rejected".into(), &e);
                    }
                }),
                Err(e) => warn_js("play", &e),
            },
            MediaCommand::Pause => {
                if let Err(e) = media.pause() {
                    warn_js("pause", &e);
                }
            }
        }
    }

    fn seek(&self, id: &OverlayId, seconds: u32) {
        if let Some(media) = self.overlays.borrow().get(id).and_then(|o| o.media.as_ref()) {
            media.set_current_time(f64::from(seconds));
        }
    }

    fn media_snapshot(&self, id: &OverlayId) -> Option<MediaSnapshot> {
        let overlays = self.overlays.borrow();
        let media = overlays.get(id)?.media.as_ref()?;
        let duration = media.duration();
        Some(MediaSnapshot {
            current_src: media.current_src(),
            duration: duration.is_finite().then_some(duration),
        })
    }

    fn attach_promotion(&self, id: &OverlayId, html: &str) -> Result<()> {
        let document = document()?;
        let mut overlays = self.overlays.borrow_mut();
        let overlay = overlays
            .get_mut(id)
            .ok_or_else(|| Error::UnknownOverlay(id.to_string()))?;

        let block = create(&document, "div")?;
        block.set_class_name("promotion block");
        block.set_attribute("data-block-name", "promotion").map_err(js_error)?;
        block.set_inner_html(html);
        overlay.container.append_child(&block).map_err(js_error)?;
        overlay.promotion = Some(block);
        Ok(())
    }

    fn reveal_promotion(&self, id: &OverlayId) {
        let overlays = self.overlays.borrow();
        let Some(overlay) = overlays.get(id) else {
            return;
        };
        if let Some(media) = &overlay.media {
            media.set_hidden(true);
        }
        if let Some(promotion) = &overlay.promotion {
            if let Err(e) = promotion.class_list().add_1(PROMOTION_REVEALED) {
                warn_js("reveal promotion", &e);
            }
        }
    }

    fn push_history(&self, entry: &HistoryEntry) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let state = match serde_wasm_bindgen::to_value(&entry.state) {
            Ok(state) => state,
            Err(e) => return warn_js("history state", &e.into()),
        };
        let pushed = window
            .history()
            .and_then(|history| history.push_state_with_url(&state, "", Some(entry.hash.as_str())));
        if let Err(e) = pushed {
            warn_js("pushState", &e);
        }
        if let Some(document) = window.document() {
            document.set_title(&entry.page_title);
        }
    }

    fn dispatch(&self, event: &DocumentEvent) {
        if let Err(e) = self.dispatch_custom_event(event) {
            report(&e);
        }
    }

    fn page_path(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default()
    }
}

impl DomHost {
    /// `CustomEvent` whose detail is `{ video: <media element>, parameters }`
    fn dispatch_custom_event(&self, event: &DocumentEvent) -> Result<()> {
        let detail = event.detail();
        let video: JsValue = self
            .overlays
            .borrow()
            .get(&detail.video)
            .map(|o| match &o.media {
                Some(media) => media.clone().into(),
                None => o.root.clone().into(),
            })
            .unwrap_or_else(|| JsValue::from_str(detail.video.as_str()));
        let parameters =
            serde_wasm_bindgen::to_value(&detail.parameters).map_err(|e| js_error(e.into()))?;

        let payload = js_sys::Object::new();
        js_sys::Reflect::set(&payload, &"video".into(), &video).map_err(js_error)?;
        js_sys::Reflect::set(&payload, &"parameters".into(), &parameters).map_err(js_error)?;

        let init = CustomEventInit::new();
        init.set_detail(&payload);
        let custom = CustomEvent::new_with_event_init_dict(event.name(), &init).map_err(js_error)?;
        document()?.dispatch_event(&custom).map_err(js_error)?;
        Ok(())
    }
}

fn render_surface(
    document: &Document,
    container: &Element,
    player: &PlayerSurface,
) -> Result<(Option<HtmlMediaElement>, Option<HtmlIFrameElement>)> {
    container.class_list().add_1(&player.class_name).map_err(js_error)?;

    match &player.surface {
        Surface::Native {
            sources,
            controls,
            plays_inline,
            ..
        } => {
            let video = create(document, "video")?;
            if *controls {
                video.set_attribute("controls", "").map_err(js_error)?;
            }
            if *plays_inline {
                video.set_attribute("playsinline", "").map_err(js_error)?;
            }
            video.set_attribute("preload", "metadata").map_err(js_error)?;
            for source in sources {
                let element = create(document, "source")?;
                element.set_attribute("src", &source.src).map_err(js_error)?;
                element.set_attribute("type", &source.mime).map_err(js_error)?;
                video.append_child(&element).map_err(js_error)?;
            }
            container.append_child(&video).map_err(js_error)?;
            let media = video
                .dyn_into::<HtmlMediaElement>()
                .map_err(|_| Error::host("video element is not a media element"))?;
            Ok((Some(media), None))
        }
        Surface::Iframe { title, src, attributes } => {
            let iframe = create(document, "iframe")?;
            iframe.set_attribute("title", title).map_err(js_error)?;
            iframe.set_attribute("src", src).map_err(js_error)?;
            for (name, value) in attributes {
                iframe.set_attribute(name, value).map_err(js_error)?;
            }
            container.append_child(&iframe).map_err(js_error)?;
            let iframe = iframe
                .dyn_into::<HtmlIFrameElement>()
                .map_err(|_| Error::host("iframe element is not an HTMLIFrameElement"))?;
            Ok((None, Some(iframe)))
        }
    }
}

fn document() -> Result<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| Error::host("no document"))
}

/// The page's `<main>`, or `<body>` when the page has none
fn mount_point(document: &Document) -> Result<Element> {
    if let Some(main) = document.query_selector("main").map_err(js_error)? {
        return Ok(main);
    }
    web_sys::console::warn_1(&"[fastvideo] no <main> element, mounting on <body>".into());
    document
        .body()
        .map(Element::from)
        .ok_or_else(|| Error::host("document has no main or body"))
}

fn create(document: &Document, tag: &str) -> Result<Element> {
    document.create_element(tag).map_err(js_error)
}

fn listen(target: &EventTarget, event: &str, listener: &Listener) -> Result<()> {
    target
        .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
        .map_err(js_error)
}

pub(crate) fn js_error(e: JsValue) -> Error {
    Error::host(format!("{e:?}"))
}

fn warn_js(context: &str, e: &JsValue) {
    web_sys::console::warn_2(&format!("[fastvideo] {context} failed").into(), e);
}

pub(crate) fn report(e: &Error) {
    web_sys::console::warn_1(&format!("[fastvideo] {} ({})", e, e.error_code()).into());
}
