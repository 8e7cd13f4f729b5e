use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;

use super::format::{convert, css_hsl, round_hue, ColorFormat, ColorOptions, ColorValue, FormatType};
use super::internal::InternalState;
use super::model::{normalize_alpha, normalize_hue, Hsva, Sv};
use super::parse::parse_value;
use super::text::{ColorLink, TextState, TextUpdateTracker};
use crate::error::StoreError;
use crate::scheduler::{Debouncer, Scheduler};
use crate::store::{lock, Readable, SettableStore, Unsubscribe, WritableStore};

/// Largest per-channel difference treated as "the same color".
const EQUIVALENT_EPSILON: f64 = 1e-6;

/// Counters for the canonical recompute path.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ColorStateStats {
    pub recomputes: u64,
    pub text_fan_outs: u64,
}

/// Explicit output format overrides. Unset fields are detected from the
/// initial color.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorStateOptions {
    pub format: Option<ColorFormat>,
    pub format_type: Option<FormatType>,
}

impl ColorStateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: ColorFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_format_type(mut self, format_type: FormatType) -> Self {
        self.format_type = Some(format_type);
        self
    }

    /// Read `{format, formatType}` from host options.
    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        fn name(value: &Value) -> String {
            value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string())
        }

        let field = |key: &str| value.get(key).filter(|v| !v.is_null());
        let mut options = Self::new();
        if let Some(format) = field("format") {
            options.format = Some(name(format).parse()?);
        }
        if let Some(format_type) = field("formatType") {
            options.format_type = Some(name(format_type).parse()?);
        }
        Ok(options)
    }
}

/// Overrides for [`ColorState::get_color`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetColorOptions {
    pub format: Option<ColorFormat>,
    pub format_type: Option<FormatType>,
    pub precision: Option<u32>,
}

/// Canonical writes collected in one coalescing window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingColorUpdate {
    pub h: Option<f64>,
    pub sv: Option<Sv>,
    pub a: Option<f64>,
    /// `true` only if every write in the window came from a text view.
    pub text_update: Option<bool>,
}

impl PendingColorUpdate {
    fn merge_text(self, text_update: bool) -> Option<bool> {
        Some(self.text_update.map_or(text_update, |prev| prev && text_update))
    }

    pub fn with_hue(self, h: f64, text_update: bool) -> Self {
        Self {
            h: Some(h),
            text_update: self.merge_text(text_update),
            ..self
        }
    }

    pub fn with_sv(self, sv: Sv, text_update: bool) -> Self {
        Self {
            sv: Some(sv),
            text_update: self.merge_text(text_update),
            ..self
        }
    }

    pub fn with_alpha(self, a: f64, text_update: bool) -> Self {
        Self {
            a: Some(a),
            text_update: self.merge_text(text_update),
            ..self
        }
    }

    /// Reformat only; always refreshes the text views.
    pub fn refresh(self) -> Self {
        Self {
            text_update: self.merge_text(false),
            ..self
        }
    }
}

struct ColorSettings {
    format: ColorFormat,
    format_type: FormatType,
}

struct ColorInner {
    hue: WritableStore<f64>,
    sv: WritableStore<Sv>,
    alpha: WritableStore<f64>,
    precision: WritableStore<u32>,
    current_color: WritableStore<ColorValue>,
    is_dark: WritableStore<bool>,
    hsl_hue: WritableStore<String>,
    hsl: WritableStore<String>,
    hsla: WritableStore<String>,
    settings: Mutex<ColorSettings>,
    pending: Debouncer<PendingColorUpdate>,
    tracker: TextUpdateTracker,
    text: TextState,
    recomputes: AtomicU64,
    text_fan_outs: AtomicU64,
    unsubscribes: Mutex<Vec<Unsubscribe>>,
    destroyed: AtomicBool,
}

impl ColorInner {
    fn current(&self) -> Hsva {
        let sv = self.sv.get();
        Hsva {
            h: self.hue.get(),
            s: sv.s,
            v: sv.v,
            a: self.alpha.get(),
        }
    }

    fn options(&self) -> ColorOptions {
        let settings = lock(&self.settings);
        ColorOptions {
            format: settings.format,
            format_type: settings.format_type,
            precision: self.precision.get(),
        }
    }

    fn queue<F>(&self, merge: F)
    where
        F: FnOnce(PendingColorUpdate) -> PendingColorUpdate,
    {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        self.pending.push(merge);
    }

    fn recompute(&self, update: PendingColorUpdate) {
        let current = self.current();
        let sv = update.sv.unwrap_or_else(|| current.sv());
        let hsva = Hsva::new(
            update.h.unwrap_or(current.h),
            sv.s,
            sv.v,
            update.a.unwrap_or(current.a),
        );
        let options = self.options();

        self.is_dark.set(hsva.is_dark());
        self.hsl_hue
            .set(format!("hsl({}, 100%, 50%)", round_hue(hsva.h, options.precision)));
        self.hsl.set(css_hsl(&hsva, options.precision, false));
        self.hsla.set(css_hsl(&hsva, options.precision, true));
        self.current_color.set(convert(&hsva, &options));
        self.recomputes.fetch_add(1, Ordering::SeqCst);

        if !update.text_update.unwrap_or(false) {
            self.text.update_color(&hsva);
            self.text_fan_outs.fetch_add(1, Ordering::SeqCst);
        }
        tracing::trace!(?hsva, text_update = ?update.text_update, "color recomputed");
    }

    fn watch<T, F>(self: &Arc<Self>, store: &WritableStore<T>, on_change: F) -> Unsubscribe
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn(&ColorInner, &T) + Send + Sync + 'static,
    {
        let weak: Weak<Self> = Arc::downgrade(self);
        let primed = AtomicBool::new(false);
        store.subscribe(move |value: &T| {
            // Skip the push-on-subscribe call.
            if !primed.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                on_change(&inner, value);
            }
        })
    }
}

/// Canonical color model.
///
/// Hue, sv and alpha are the only source of truth. Writes to them are
/// coalesced on the [`Scheduler`] with a zero delay; when the window
/// closes the derived stores are recomputed once and, unless every write
/// came from a text view, the text views are refreshed.
///
/// ```
/// use tabletop_stores::{ColorState, ColorStateOptions, GetColorOptions, InternalState, Scheduler};
/// use tabletop_stores::{ColorFormat, FormatType};
/// use serde_json::json;
///
/// let scheduler = Scheduler::new();
/// let state = ColorState::new(
///     &scheduler,
///     Some(&json!("#ff0000")),
///     ColorStateOptions::new(),
///     &InternalState::default(),
/// );
///
/// let hsl = state.get_color(GetColorOptions {
///     format: Some(ColorFormat::Hsl),
///     format_type: Some(FormatType::String),
///     precision: None,
/// });
/// assert_eq!(hsl.to_string(), "hsl(0, 100%, 50%)");
/// ```
#[derive(Clone)]
pub struct ColorState {
    inner: Arc<ColorInner>,
}

impl ColorState {
    /// Build from an optional initial color.
    ///
    /// An unparsable color logs a warning and falls back to red in HSL.
    pub fn new(
        scheduler: &Scheduler,
        initial: Option<&Value>,
        options: ColorStateOptions,
        internal: &InternalState,
    ) -> Self {
        let parsed = initial.and_then(|value| match parse_value(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(color = %value, error = %err, "invalid initial color; using default");
                None
            }
        });
        let (hsva, format, format_type) = match parsed {
            Some(parsed) => (parsed.hsva, parsed.format, parsed.format_type),
            None => (Hsva::red(), ColorFormat::Hsl, FormatType::String),
        };
        let format = options.format.unwrap_or(format);
        let format_type = options.format_type.unwrap_or(format_type);

        let hue = WritableStore::normalized(hsva.h, normalize_hue);
        let sv = WritableStore::normalized(hsva.sv(), Sv::clamped);
        let alpha = WritableStore::normalized(hsva.a, normalize_alpha);
        let precision = internal.precision_store();
        let tracker = TextUpdateTracker::default();
        let link = Arc::new(ColorLink::new(
            hue.clone(),
            sv.clone(),
            alpha.clone(),
            precision.clone(),
            tracker.clone(),
        ));
        let text = TextState::new(link, format);

        let inner = Arc::new_cyclic(|weak: &Weak<ColorInner>| {
            let weak = weak.clone();
            ColorInner {
                current_color: WritableStore::new(ColorValue::Text(String::new())),
                is_dark: WritableStore::new(false),
                hsl_hue: WritableStore::new(String::new()),
                hsl: WritableStore::new(String::new()),
                hsla: WritableStore::new(String::new()),
                settings: Mutex::new(ColorSettings {
                    format,
                    format_type,
                }),
                pending: Debouncer::new(scheduler.clone(), 0, move |update| {
                    if let Some(inner) = weak.upgrade() {
                        inner.recompute(update);
                    }
                }),
                hue,
                sv,
                alpha,
                precision,
                tracker,
                text,
                recomputes: AtomicU64::new(0),
                text_fan_outs: AtomicU64::new(0),
                unsubscribes: Mutex::new(Vec::new()),
                destroyed: AtomicBool::new(false),
            }
        });

        inner.recompute(PendingColorUpdate::default().refresh());

        let watchers = vec![
            inner.watch(&inner.hue, |inner, h| {
                let text = inner.tracker.is_active();
                let h = *h;
                inner.queue(|p| p.with_hue(h, text));
            }),
            inner.watch(&inner.sv, |inner, sv| {
                let text = inner.tracker.is_active();
                let sv = *sv;
                inner.queue(|p| p.with_sv(sv, text));
            }),
            inner.watch(&inner.alpha, |inner, a| {
                let text = inner.tracker.is_active();
                let a = *a;
                inner.queue(|p| p.with_alpha(a, text));
            }),
            inner.watch(&inner.precision, |inner, _| inner.queue(PendingColorUpdate::refresh)),
        ];
        *lock(&inner.unsubscribes) = watchers;

        tracing::debug!(%format, %format_type, "color state created");
        Self { inner }
    }

    /// Convert the canonical color, overriding any of the configured
    /// format, format type and precision.
    pub fn get_color(&self, options: GetColorOptions) -> ColorValue {
        let defaults = self.inner.options();
        let options = ColorOptions {
            format: options.format.unwrap_or(defaults.format),
            format_type: options.format_type.unwrap_or(defaults.format_type),
            precision: options.precision.unwrap_or(defaults.precision),
        };
        convert(&self.inner.current(), &options)
    }

    /// Change the output format. `current_color` updates immediately.
    pub fn set_format(&self, format: Option<ColorFormat>, format_type: Option<FormatType>) {
        {
            let mut settings = lock(&self.inner.settings);
            if let Some(format) = format {
                settings.format = format;
            }
            if let Some(format_type) = format_type {
                settings.format_type = format_type;
            }
        }
        let value = convert(&self.inner.current(), &self.inner.options());
        self.inner.current_color.set(value);
    }

    /// Apply a color coming from outside the picker.
    ///
    /// Invalid colors are logged and ignored. Grays given as hex or RGB keep
    /// the current hue. Returns whether anything changed.
    pub fn update_external(&self, color: &Value) -> bool {
        let parsed = match parse_value(color) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(color = %color, error = %err, "ignoring invalid external color");
                return false;
            }
        };

        let current = self.inner.current();
        let mut next = parsed.hsva;
        let hue_lost = matches!(parsed.format, ColorFormat::Hex | ColorFormat::Rgb);
        if hue_lost && next.is_achromatic() {
            next.h = current.h;
        }
        if equivalent(&current, &next) {
            return false;
        }

        self.inner.hue.set(next.h);
        self.inner.sv.set(next.sv());
        self.inner.alpha.set(next.a);
        true
    }

    /// Canonical color as of the last write.
    pub fn hsva(&self) -> Hsva {
        self.inner.current()
    }

    pub fn format(&self) -> ColorFormat {
        lock(&self.inner.settings).format
    }

    pub fn format_type(&self) -> FormatType {
        lock(&self.inner.settings).format_type
    }

    /// Canonical hue. Writes wrap into `0..360`.
    pub fn hue(&self) -> &WritableStore<f64> {
        &self.inner.hue
    }

    /// Canonical saturation and value. Writes are clamped to `0..=100`.
    pub fn sv(&self) -> &WritableStore<Sv> {
        &self.inner.sv
    }

    /// Canonical alpha. Writes are clamped to `0..=1`.
    pub fn alpha(&self) -> &WritableStore<f64> {
        &self.inner.alpha
    }

    /// Canonical color in the configured format, as of the last recompute.
    pub fn current_color(&self) -> ColorValue {
        self.inner.current_color.get()
    }

    pub fn subscribe_current_color<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&ColorValue) + Send + Sync + 'static,
    {
        self.inner.current_color.subscribe(handler)
    }

    pub fn is_dark(&self) -> bool {
        self.inner.is_dark.get()
    }

    /// `hsl(h, 100%, 50%)` for the current hue.
    pub fn hsl_hue(&self) -> String {
        self.inner.hsl_hue.get()
    }

    pub fn hsl(&self) -> String {
        self.inner.hsl.get()
    }

    pub fn hsla(&self) -> String {
        self.inner.hsla.get()
    }

    pub fn text(&self) -> &TextState {
        &self.inner.text
    }

    /// Whether canonical writes are waiting to be recomputed.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.is_pending()
    }

    pub fn stats(&self) -> ColorStateStats {
        ColorStateStats {
            recomputes: self.inner.recomputes.load(Ordering::SeqCst),
            text_fan_outs: self.inner.text_fan_outs.load(Ordering::SeqCst),
        }
    }

    /// Detach from every internal store and drop any pending recompute.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.pending.cancel();
        let unsubscribes = std::mem::take(&mut *lock(&self.inner.unsubscribes));
        for unsubscribe in unsubscribes {
            unsubscribe.unsubscribe();
        }
        tracing::debug!("color state destroyed");
    }
}

fn equivalent(a: &Hsva, b: &Hsva) -> bool {
    (a.h - b.h).abs() < EQUIVALENT_EPSILON
        && (a.s - b.s).abs() < EQUIVALENT_EPSILON
        && (a.v - b.v).abs() < EQUIVALENT_EPSILON
        && (a.a - b.a).abs() < EQUIVALENT_EPSILON
}

impl std::fmt::Debug for ColorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorState")
            .field("hsva", &self.inner.current())
            .field("format", &self.format())
            .field("format_type", &self.format_type())
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(scheduler: &Scheduler, initial: Value) -> ColorState {
        ColorState::new(
            scheduler,
            Some(&initial),
            ColorStateOptions::new(),
            &InternalState::default(),
        )
    }

    #[test]
    fn pending_text_flag_is_anded() {
        let pending = PendingColorUpdate::default()
            .with_hue(10.0, true)
            .with_alpha(0.5, true);
        assert_eq!(pending.text_update, Some(true));
        assert_eq!(pending.with_sv(Sv::new(1.0, 2.0), false).text_update, Some(false));
        assert_eq!(PendingColorUpdate::default().refresh().text_update, Some(false));
    }

    #[test]
    fn detects_initial_format() {
        let scheduler = Scheduler::new();
        let rgb = state(&scheduler, json!({"r": 0, "g": 0, "b": 255}));
        assert_eq!(rgb.format(), ColorFormat::Rgb);
        assert_eq!(rgb.format_type(), FormatType::Object);
        assert_eq!(rgb.current_color().to_json(), json!({"r": 0.0, "g": 0.0, "b": 255.0}));
        assert!(rgb.is_dark());
    }

    #[test]
    fn invalid_initial_color_falls_back_to_red() {
        let scheduler = Scheduler::new();
        let state = state(&scheduler, json!("not a color"));
        assert_eq!(state.hsva(), Hsva::red());
        assert_eq!(state.format(), ColorFormat::Hsl);
        assert_eq!(state.current_color().to_string(), "hsl(0, 100%, 50%)");
    }

    #[test]
    fn options_override_detection() {
        let options = ColorStateOptions::from_json(&json!({"format": "hex"})).unwrap();
        let state = ColorState::new(
            &Scheduler::new(),
            Some(&json!("rgb(0, 255, 0)")),
            options,
            &InternalState::default(),
        );
        assert_eq!(state.current_color().to_string(), "#00ff00");

        assert_eq!(
            ColorStateOptions::from_json(&json!({"format": "cmyk"})),
            Err(StoreError::UnsupportedFormat("cmyk".into()))
        );
        assert!(ColorStateOptions::from_json(&json!({"formatType": "array"})).is_err());
    }

    #[test]
    fn writes_wait_for_the_scheduler() {
        let scheduler = Scheduler::new();
        let state = state(&scheduler, json!("#ff0000"));
        state.hue().set(120.0);

        assert!(state.is_pending());
        assert_eq!(state.hsl_hue(), "hsl(0, 100%, 50%)");

        scheduler.flush();
        assert!(!state.is_pending());
        assert_eq!(state.hsl_hue(), "hsl(120, 100%, 50%)");
        assert_eq!(state.current_color().to_string(), "#00ff00");
    }

    #[test]
    fn set_format_updates_immediately() {
        let scheduler = Scheduler::new();
        let state = state(&scheduler, json!("#ff0000"));
        state.set_format(Some(ColorFormat::Rgb), None);
        assert_eq!(state.current_color().to_string(), "rgb(255, 0, 0)");
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn destroy_detaches_watchers() {
        let scheduler = Scheduler::new();
        let state = state(&scheduler, json!("#ff0000"));
        state.destroy();
        state.hue().set(200.0);

        assert!(!state.is_pending());
        assert_eq!(state.hue().subscriber_count(), 0);
        assert_eq!(state.stats().recomputes, 1);
    }
}
