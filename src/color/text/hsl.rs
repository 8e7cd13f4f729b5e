use std::sync::Arc;

use super::{parse_input, ColorLink, FormatProjection, NumericChannel, ProjectionKind};
use crate::color::format::{round, round_hue};
use crate::color::model::{Hsla, Hsva};
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HslChannel {
    H,
    S,
    L,
}

struct HslInner {
    link: Arc<ColorLink>,
    h: NumericChannel,
    s: NumericChannel,
    l: NumericChannel,
}

impl HslInner {
    fn channel(&self, channel: HslChannel) -> &NumericChannel {
        match channel {
            HslChannel::H => &self.h,
            HslChannel::S => &self.s,
            HslChannel::L => &self.l,
        }
    }
}

impl FormatProjection for HslInner {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Hsl
    }

    fn update_color(&self, hsva: &Hsva, precision: u32) {
        let hsl = hsva.to_hsla();
        self.h.show(round_hue(hsl.h, precision));
        self.s.show(round(hsl.s, precision));
        self.l.show(round(hsl.l, precision));
    }
}

/// Hue `0..=360`, saturation and lightness `0..=100`.
#[derive(Clone)]
pub struct HslState {
    inner: Arc<HslInner>,
}

impl HslState {
    pub(crate) fn new(link: Arc<ColorLink>) -> Self {
        let inner = Arc::new(HslInner {
            link: Arc::clone(&link),
            h: NumericChannel::new(0.0, 360.0, 0.0),
            s: NumericChannel::new(0.0, 100.0, 0.0),
            l: NumericChannel::new(0.0, 100.0, 0.0),
        });
        link.register(inner.clone());
        Self { inner }
    }

    pub fn channel(&self, channel: HslChannel) -> &NumericChannel {
        self.inner.channel(channel)
    }

    pub fn to_hsla(&self) -> Hsla {
        Hsla {
            h: self.inner.h.value(),
            s: self.inner.s.value(),
            l: self.inner.l.value(),
            a: self.inner.link.current().a,
        }
    }

    pub fn set(&self, channel: HslChannel, value: Option<f64>) {
        self.inner.channel(channel).commit(value);
        let hsla = self.to_hsla();
        let hsva = Hsla::new(hsla.h, hsla.s, hsla.l, hsla.a).to_hsva();
        self.inner.link.commit(hsva, ProjectionKind::Hsl);
    }

    pub fn set_input(&self, channel: HslChannel, input: &str) -> Result<(), StoreError> {
        let value = parse_input(input)?;
        self.set(channel, value);
        Ok(())
    }
}

impl std::fmt::Debug for HslState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HslState")
            .field("h", &self.inner.h.get())
            .field("s", &self.inner.s.get())
            .field("l", &self.inner.l.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::text::testing::harness;
    use crate::store::SettableStore;

    #[test]
    fn zero_lightness_keeps_hue() {
        let h = harness(Hsva::new(90.0, 100.0, 100.0, 1.0));
        let hsl = h.text.hsl();
        assert_eq!(hsl.channel(HslChannel::L).get(), Some(50.0));

        hsl.set(HslChannel::L, Some(0.0));
        assert_eq!(h.hue.get(), 90.0);
        assert_eq!(h.sv.get().v, 0.0);
        assert_eq!(h.text.hex().text(), "#000000");
    }

    #[test]
    fn null_becomes_zero() {
        let h = harness(Hsva::red());
        h.text.hsl().set_input(HslChannel::S, " ").unwrap();
        assert_eq!(h.text.hsl().channel(HslChannel::S).get(), Some(0.0));
        assert_eq!(h.sv.get().s, 0.0);
        assert_eq!(h.hue.get(), 0.0);
    }
}
