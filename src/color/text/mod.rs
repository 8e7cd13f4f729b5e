//! Text views - editable per-format projections of the canonical color.
//!
//! Each view keeps its own clamped channel stores. A user edit in one view
//! is pushed to every other view and written to the canonical hue, sv and
//! alpha stores while a text-update guard is held, so the canonical
//! recompute does not push back into the view that produced it.

mod active;
mod alpha;
mod channel;
mod hex;
mod hsl;
mod hsv;
mod rgb;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::format::ColorFormat;
use super::model::{Hsva, Sv};
use crate::store::{lock, SettableStore, WritableStore};

pub use active::ActiveTextState;
pub use alpha::AlphaState;
pub use channel::{parse_input, NumericChannel};
pub use hex::HexState;
pub use hsl::{HslChannel, HslState};
pub use hsv::{HsvChannel, HsvState};
pub use rgb::{RgbChannel, RgbState};

/// Identifies one text view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    Alpha,
    Hex,
    Hsl,
    Hsv,
    Rgb,
}

/// Counts open text-update guards.
#[derive(Debug, Clone, Default)]
pub(crate) struct TextUpdateTracker {
    depth: Arc<AtomicUsize>,
}

impl TextUpdateTracker {
    pub(crate) fn begin(&self) -> TextUpdateGuard {
        self.depth.fetch_add(1, Ordering::SeqCst);
        TextUpdateGuard {
            depth: Arc::clone(&self.depth),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

pub(crate) struct TextUpdateGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for TextUpdateGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(crate) trait FormatProjection: Send + Sync {
    fn kind(&self) -> ProjectionKind;

    /// Show `hsva` without touching the canonical stores.
    fn update_color(&self, hsva: &Hsva, precision: u32);
}

/// Shared handle from the text views to the canonical color stores.
pub(crate) struct ColorLink {
    hue: WritableStore<f64>,
    sv: WritableStore<Sv>,
    alpha: WritableStore<f64>,
    precision: WritableStore<u32>,
    tracker: TextUpdateTracker,
    projections: Mutex<Vec<Weak<dyn FormatProjection>>>,
}

impl ColorLink {
    pub(crate) fn new(
        hue: WritableStore<f64>,
        sv: WritableStore<Sv>,
        alpha: WritableStore<f64>,
        precision: WritableStore<u32>,
        tracker: TextUpdateTracker,
    ) -> Self {
        Self {
            hue,
            sv,
            alpha,
            precision,
            tracker,
            projections: Mutex::new(Vec::new()),
        }
    }

    fn register(&self, projection: Arc<dyn FormatProjection>) {
        lock(&self.projections).push(Arc::downgrade(&projection));
    }

    pub(crate) fn current(&self) -> Hsva {
        let sv = self.sv.get();
        Hsva {
            h: self.hue.get(),
            s: sv.s,
            v: sv.v,
            a: self.alpha.get(),
        }
    }

    pub(crate) fn update_projections(&self, hsva: &Hsva, skip: Option<ProjectionKind>) {
        let projections: Vec<Arc<dyn FormatProjection>> = lock(&self.projections)
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        let precision = self.precision.get();
        for projection in projections {
            if Some(projection.kind()) != skip {
                projection.update_color(hsva, precision);
            }
        }
    }

    /// Apply a user edit made in `origin`.
    pub(crate) fn commit(&self, hsva: Hsva, origin: ProjectionKind) {
        self.update_projections(&hsva, Some(origin));

        let _guard = self.tracker.begin();
        self.hue.set(hsva.h);
        self.sv.set(hsva.sv());
        self.alpha.set(hsva.a);
    }
}

/// Every text view plus the active format selection.
#[derive(Clone)]
pub struct TextState {
    link: Arc<ColorLink>,
    active: ActiveTextState,
    alpha: AlphaState,
    hex: HexState,
    hsl: HslState,
    hsv: HsvState,
    rgb: RgbState,
}

impl TextState {
    pub(crate) fn new(link: Arc<ColorLink>, mode: ColorFormat) -> Self {
        Self {
            active: ActiveTextState::new(mode),
            alpha: AlphaState::new(Arc::clone(&link)),
            hex: HexState::new(Arc::clone(&link)),
            hsl: HslState::new(Arc::clone(&link)),
            hsv: HsvState::new(Arc::clone(&link)),
            rgb: RgbState::new(Arc::clone(&link)),
            link,
        }
    }

    /// Show a canonical color in every view.
    pub fn update_color(&self, hsva: &Hsva) {
        self.link.update_projections(hsva, None);
    }

    /// Show a color in every view except `skip`.
    pub fn update_color_internal(&self, hsva: &Hsva, skip: ProjectionKind) {
        self.link.update_projections(hsva, Some(skip));
    }

    pub fn active(&self) -> &ActiveTextState {
        &self.active
    }

    pub fn alpha(&self) -> &AlphaState {
        &self.alpha
    }

    pub fn hex(&self) -> &HexState {
        &self.hex
    }

    pub fn hsl(&self) -> &HslState {
        &self.hsl
    }

    pub fn hsv(&self) -> &HsvState {
        &self.hsv
    }

    pub fn rgb(&self) -> &RgbState {
        &self.rgb
    }
}

impl std::fmt::Debug for TextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextState")
            .field("active", &self.active.mode())
            .field("hex", &self.hex.text())
            .field("rgb", &self.rgb.to_rgba())
            .finish()
    }
}
