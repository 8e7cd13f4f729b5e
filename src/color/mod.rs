//! Color - a canonical HSVA model with editable per-format text views.
//!
//! [`ColorState`] owns the hue, sv and alpha stores and derives everything
//! else from them. [`TextState`] holds the hex, HSL, HSV, RGB and alpha
//! views the user types into.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use tabletop_stores::{ColorState, ColorStateOptions, InternalState, RgbChannel, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! let state = ColorState::new(
//!     &scheduler,
//!     Some(&json!("rgb(128, 128, 128)")),
//!     ColorStateOptions::new(),
//!     &InternalState::default(),
//! );
//!
//! state.text().rgb().set(RgbChannel::R, Some(255.0));
//! scheduler.flush();
//! assert_eq!(state.current_color().to_string(), "rgb(255, 128, 128)");
//! ```

mod format;
mod internal;
mod model;
mod parse;
mod state;
mod text;

pub use format::{
    convert, css_hsl, round, round_hue, to_hex, ColorFormat, ColorOptions, ColorValue,
    FormatType, ALPHA_PRECISION,
};
pub use internal::{InternalState, PickerComponents, PickerLayout, PickerOptions, MAX_PRECISION};
pub use model::{normalize_alpha, normalize_hue, Hsla, Hsva, Rgba, Sv, DARK_LUMINANCE};
pub use parse::{parse_hex, parse_str, parse_value, ColorParseError, ParsedColor};
pub use state::{ColorState, ColorStateOptions, ColorStateStats, GetColorOptions, PendingColorUpdate};
pub use text::{
    parse_input, ActiveTextState, AlphaState, HexState, HslChannel, HslState, HsvChannel,
    HsvState, NumericChannel, ProjectionKind, RgbChannel, RgbState, TextState,
};
