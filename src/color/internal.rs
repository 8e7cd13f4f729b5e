use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{lock, Readable, SettableStore, Unsubscribe, WritableStore};

/// Largest accepted rounding precision.
pub const MAX_PRECISION: u32 = 10;

/// Picker arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerLayout {
    #[default]
    Default,
    Chrome,
}

/// Options supplied by the host for one color picker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PickerOptions {
    pub has_alpha: bool,
    pub has_button_bar: bool,
    pub has_eye_dropper: bool,
    pub has_text_input: bool,
    pub is_popup: bool,
    pub layout: PickerLayout,
    /// Decimal places in formatted output.
    pub precision: u32,
    /// Picker width in pixels.
    pub width: u32,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            has_alpha: true,
            has_button_bar: true,
            has_eye_dropper: false,
            has_text_input: true,
            is_popup: true,
            layout: PickerLayout::Default,
            precision: 0,
            width: 200,
        }
    }
}

impl PickerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alpha(mut self, enabled: bool) -> Self {
        self.has_alpha = enabled;
        self
    }

    pub fn with_button_bar(mut self, enabled: bool) -> Self {
        self.has_button_bar = enabled;
        self
    }

    pub fn with_eye_dropper(mut self, enabled: bool) -> Self {
        self.has_eye_dropper = enabled;
        self
    }

    pub fn with_text_input(mut self, enabled: bool) -> Self {
        self.has_text_input = enabled;
        self
    }

    pub fn with_popup(mut self, enabled: bool) -> Self {
        self.is_popup = enabled;
        self
    }

    pub fn with_layout(mut self, layout: PickerLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        let options = Self::deserialize(value).map_err(|e| StoreError::InvalidOption {
            option: "options",
            reason: e.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.precision > MAX_PRECISION {
            return Err(StoreError::InvalidOption {
                option: "precision",
                reason: format!(
                    "expected an integer between 0 and {}, got {}",
                    MAX_PRECISION, self.precision
                ),
            });
        }
        if self.width == 0 {
            return Err(StoreError::InvalidOption {
                option: "width",
                reason: "expected a positive integer".into(),
            });
        }
        Ok(())
    }

    /// Which picker parts to render.
    pub fn components(&self) -> PickerComponents {
        PickerComponents {
            layout: self.layout,
            alpha: self.has_alpha,
            // Save/cancel only make sense for a picker that closes.
            button_bar: self.has_button_bar && self.is_popup,
            eye_dropper: self.has_eye_dropper,
            text_input: self.has_text_input,
        }
    }
}

/// Derived picker parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerComponents {
    pub layout: PickerLayout,
    pub alpha: bool,
    pub button_bar: bool,
    pub eye_dropper: bool,
    pub text_input: bool,
}

struct InternalInner {
    options: Mutex<PickerOptions>,
    precision: WritableStore<u32>,
    components: WritableStore<PickerComponents>,
    is_open: WritableStore<bool>,
}

/// Validated picker options plus the small reactive state derived from them.
#[derive(Clone)]
pub struct InternalState {
    inner: Arc<InternalInner>,
}

impl InternalState {
    pub fn new(options: PickerOptions) -> Result<Self, StoreError> {
        options.validate()?;
        Ok(Self::with_valid(options))
    }

    fn with_valid(options: PickerOptions) -> Self {
        Self {
            inner: Arc::new(InternalInner {
                precision: WritableStore::new(options.precision),
                components: WritableStore::new(options.components()),
                // Inline pickers are always open.
                is_open: WritableStore::new(!options.is_popup),
                options: Mutex::new(options),
            }),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, StoreError> {
        Self::new(PickerOptions::from_json(value)?)
    }

    /// Replace every option. Derived stores only notify when they change.
    pub fn update_options(&self, options: PickerOptions) -> Result<(), StoreError> {
        options.validate()?;
        let (precision, components, is_popup) =
            (options.precision, options.components(), options.is_popup);
        *lock(&self.inner.options) = options;

        self.inner.precision.set(precision);
        self.inner.components.set(components);
        if !is_popup {
            self.inner.is_open.set(true);
        }
        Ok(())
    }

    pub fn options(&self) -> PickerOptions {
        lock(&self.inner.options).clone()
    }

    pub fn precision(&self) -> u32 {
        self.inner.precision.get()
    }

    /// Store tracking the output precision.
    pub fn precision_store(&self) -> WritableStore<u32> {
        self.inner.precision.clone()
    }

    pub fn components(&self) -> PickerComponents {
        self.inner.components.get()
    }

    pub fn subscribe_components<F>(&self, handler: F) -> Unsubscribe
    where
        F: Fn(&PickerComponents) + Send + Sync + 'static,
    {
        self.inner.components.subscribe(handler)
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open.get()
    }

    /// Open or close a popup picker. Inline pickers stay open.
    pub fn set_open(&self, open: bool) {
        if !open && !lock(&self.inner.options).is_popup {
            return;
        }
        self.inner.is_open.set(open);
    }

    pub fn is_open_store(&self) -> WritableStore<bool> {
        self.inner.is_open.clone()
    }
}

impl Default for InternalState {
    fn default() -> Self {
        Self::with_valid(PickerOptions::default())
    }
}

impl std::fmt::Debug for InternalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalState")
            .field("options", &*lock(&self.inner.options))
            .field("is_open", &self.inner.is_open.get())
            .finish()
    }
}
