use std::sync::Arc;

use super::{parse_input, ColorLink, FormatProjection, NumericChannel, ProjectionKind};
use crate::color::format::{round, round_hue};
use crate::color::model::Hsva;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HsvChannel {
    H,
    S,
    V,
}

struct HsvInner {
    link: Arc<ColorLink>,
    h: NumericChannel,
    s: NumericChannel,
    v: NumericChannel,
}

impl HsvInner {
    fn channel(&self, channel: HsvChannel) -> &NumericChannel {
        match channel {
            HsvChannel::H => &self.h,
            HsvChannel::S => &self.s,
            HsvChannel::V => &self.v,
        }
    }
}

impl FormatProjection for HsvInner {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Hsv
    }

    fn update_color(&self, hsva: &Hsva, precision: u32) {
        self.h.show(round_hue(hsva.h, precision));
        self.s.show(round(hsva.s, precision));
        self.v.show(round(hsva.v, precision));
    }
}

/// Hue `0..=360`, saturation and value `0..=100`.
#[derive(Clone)]
pub struct HsvState {
    inner: Arc<HsvInner>,
}

impl HsvState {
    pub(crate) fn new(link: Arc<ColorLink>) -> Self {
        let inner = Arc::new(HsvInner {
            link: Arc::clone(&link),
            h: NumericChannel::new(0.0, 360.0, 0.0),
            s: NumericChannel::new(0.0, 100.0, 0.0),
            v: NumericChannel::new(0.0, 100.0, 0.0),
        });
        link.register(inner.clone());
        Self { inner }
    }

    pub fn channel(&self, channel: HsvChannel) -> &NumericChannel {
        self.inner.channel(channel)
    }

    pub fn to_hsva(&self) -> Hsva {
        Hsva::new(
            self.inner.h.value(),
            self.inner.s.value(),
            self.inner.v.value(),
            self.inner.link.current().a,
        )
    }

    pub fn set(&self, channel: HsvChannel, value: Option<f64>) {
        self.inner.channel(channel).commit(value);
        let hsva = self.to_hsva();
        self.inner.link.commit(hsva, ProjectionKind::Hsv);
    }

    pub fn set_input(&self, channel: HsvChannel, input: &str) -> Result<(), StoreError> {
        let value = parse_input(input)?;
        self.set(channel, value);
        Ok(())
    }
}

impl std::fmt::Debug for HsvState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HsvState")
            .field("h", &self.inner.h.get())
            .field("s", &self.inner.s.get())
            .field("v", &self.inner.v.get())
            .finish()
    }
}
