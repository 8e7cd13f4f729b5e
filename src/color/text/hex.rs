use std::sync::Arc;

use super::{ColorLink, FormatProjection, ProjectionKind};
use crate::color::format::to_hex;
use crate::color::model::Hsva;
use crate::color::parse::parse_hex;
use crate::store::{Readable, SettableStore, Unsubscribe, WritableStore};

struct HexInner {
    link: Arc<ColorLink>,
    text: WritableStore<String>,
    is_valid: WritableStore<bool>,
}

impl FormatProjection for HexInner {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Hex
    }

    fn update_color(&self, hsva: &Hsva, _precision: u32) {
        self.text.set(to_hex(hsva));
        self.is_valid.set(true);
    }
}

/// Hex text field. Keeps exactly what the user typed.
#[derive(Clone)]
pub struct HexState {
    inner: Arc<HexInner>,
}

impl HexState {
    pub(crate) fn new(link: Arc<ColorLink>) -> Self {
        let inner = Arc::new(HexInner {
            link: Arc::clone(&link),
            text: WritableStore::new(String::new()),
            is_valid: WritableStore::new(true),
        });
        link.register(inner.clone());
        Self { inner }
    }

    pub fn text(&self) -> String {
        self.inner.text.get()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_valid.get()
    }

    pub fn subscribe_valid<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.inner.is_valid.subscribe(handler)
    }

    /// User typed `input`. Returns whether it was a complete hex color.
    ///
    /// Forms without an alpha pair keep the current alpha; grays keep the
    /// current hue.
    pub fn set_input(&self, input: &str) -> bool {
        self.inner.text.set(input.to_string());

        let (rgba, has_alpha) = match parse_hex(input) {
            Ok(parsed) => parsed,
            Err(_) => {
                self.inner.is_valid.set(false);
                return false;
            }
        };
        self.inner.is_valid.set(true);

        let current = self.inner.link.current();
        let mut hsva = rgba.to_hsva();
        if !has_alpha {
            hsva.a = current.a;
        }
        if rgba.is_gray() {
            hsva.h = current.h;
        }
        self.inner.link.commit(hsva, ProjectionKind::Hex);
        true
    }
}

impl Readable<String> for HexState {
    fn subscribe<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.inner.text.subscribe(handler)
    }
}

impl std::fmt::Debug for HexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HexState")
            .field("text", &self.inner.text.get())
            .field("is_valid", &self.inner.is_valid.get())
            .finish()
    }
}
