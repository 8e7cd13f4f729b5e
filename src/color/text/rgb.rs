use std::sync::Arc;

use super::{parse_input, ColorLink, FormatProjection, NumericChannel, ProjectionKind};
use crate::color::format::round;
use crate::color::model::{Hsva, Rgba};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RgbChannel {
    R,
    G,
    B,
}

struct RgbInner {
    link: Arc<ColorLink>,
    r: NumericChannel,
    g: NumericChannel,
    b: NumericChannel,
}

impl RgbInner {
    fn channel(&self, channel: RgbChannel) -> &NumericChannel {
        match channel {
            RgbChannel::R => &self.r,
            RgbChannel::G => &self.g,
            RgbChannel::B => &self.b,
        }
    }
}

impl FormatProjection for RgbInner {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Rgb
    }

    fn update_color(&self, hsva: &Hsva, _precision: u32) {
        let rgb = hsva.to_rgba();
        self.r.show(round(rgb.r, 0));
        self.g.show(round(rgb.g, 0));
        self.b.show(round(rgb.b, 0));
    }
}

/// Red, green and blue fields, each `0..=255`.
#[derive(Clone)]
pub struct RgbState {
    inner: Arc<RgbInner>,
}

impl RgbState {
    pub(crate) fn new(link: Arc<ColorLink>) -> Self {
        let inner = Arc::new(RgbInner {
            link: Arc::clone(&link),
            r: NumericChannel::new(0.0, 255.0, 0.0),
            g: NumericChannel::new(0.0, 255.0, 0.0),
            b: NumericChannel::new(0.0, 255.0, 0.0),
        });
        link.register(inner.clone());
        Self { inner }
    }

    pub fn channel(&self, channel: RgbChannel) -> &NumericChannel {
        self.inner.channel(channel)
    }

    /// Current field values with the canonical alpha.
    pub fn to_rgba(&self) -> Rgba {
        Rgba {
            r: self.inner.r.value(),
            g: self.inner.g.value(),
            b: self.inner.b.value(),
            a: self.inner.link.current().a,
        }
    }

    /// User edit of one field.
    ///
    /// When all three fields end up equal the canonical hue is kept, since
    /// a gray carries no hue of its own.
    pub fn set(&self, channel: RgbChannel, value: Option<f64>) {
        self.inner.channel(channel).commit(value);

        let rgba = self.to_rgba();
        let mut hsva = rgba.to_hsva();
        if rgba.is_gray() {
            hsva.h = self.inner.link.current().h;
        }
        self.inner.link.commit(hsva, ProjectionKind::Rgb);
    }

    /// User edit from typed text.
    pub fn set_input(&self, channel: RgbChannel, input: &str) -> Result<(), StoreError> {
        let value = parse_input(input)?;
        self.set(channel, value);
        Ok(())
    }
}

impl std::fmt::Debug for RgbState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbState")
            .field("r", &self.inner.r.get())
            .field("g", &self.inner.g.get())
            .field("b", &self.inner.b.get())
            .finish()
    }
}
