use std::sync::Arc;

use super::{parse_input, ColorLink, FormatProjection, NumericChannel, ProjectionKind};
use crate::color::format::round;
use crate::color::model::Hsva;
use crate::error::StoreError;

/// Decimal places shown in the alpha field.
const ALPHA_DISPLAY_PRECISION: u32 = 2;

struct AlphaInner {
    link: Arc<ColorLink>,
    a: NumericChannel,
}

impl FormatProjection for AlphaInner {
    fn kind(&self) -> ProjectionKind {
        ProjectionKind::Alpha
    }

    fn update_color(&self, hsva: &Hsva, _precision: u32) {
        self.a.show(round(hsva.a, ALPHA_DISPLAY_PRECISION));
    }
}

/// Alpha field, `0..=1`. Empty input means opaque.
#[derive(Clone)]
pub struct AlphaState {
    inner: Arc<AlphaInner>,
}

impl AlphaState {
    pub(crate) fn new(link: Arc<ColorLink>) -> Self {
        let inner = Arc::new(AlphaInner {
            link: Arc::clone(&link),
            a: NumericChannel::new(0.0, 1.0, 1.0),
        });
        link.register(inner.clone());
        Self { inner }
    }

    pub fn channel(&self) -> &NumericChannel {
        &self.inner.a
    }

    pub fn value(&self) -> f64 {
        self.inner.a.value()
    }

    pub fn set(&self, value: Option<f64>) {
        let a = self.inner.a.commit(value);
        let hsva = Hsva {
            a,
            ..self.inner.link.current()
        };
        self.inner.link.commit(hsva, ProjectionKind::Alpha);
    }

    pub fn set_input(&self, input: &str) -> Result<(), StoreError> {
        let value = parse_input(input)?;
        self.set(value);
        Ok(())
    }
}

impl std::fmt::Debug for AlphaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaState")
            .field("a", &self.inner.a.get())
            .finish()
    }
}
