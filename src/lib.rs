//! Reactive stores for tabletop plugin UIs.
//!
//! - [`ArrayObjectStore`] and [`CrudArrayObjectStore`]: ordered collections
//!   of [`ObjectEntryStore`] entries that bubble entry changes up after a
//!   debounce and optionally report every change to a persistence service.
//! - [`ColorState`] and [`TextState`]: a canonical HSVA color with editable
//!   hex, HSL, HSV, RGB and alpha views kept in sync without feedback loops.
//!
//! Deferred work runs on an explicit [`Scheduler`] that the host drives.

mod collection;
mod color;
mod entry;
mod error;
mod scheduler;
mod store;

pub use collection::{
    ArrayObjectStore, ArrayStoreOptions, CrudAction, CrudArrayObjectStore, CrudDispatch,
    CrudIntent, CrudStoreOptions, DataReducer, FilterId, PendingEntries, SubscriberUpdate,
    DEFAULT_CHILD_DEBOUNCE, MAX_CHILD_DEBOUNCE,
};
pub use color::{
    convert, css_hsl, normalize_alpha, normalize_hue, parse_hex, parse_input, parse_str,
    parse_value, round, round_hue, to_hex, ActiveTextState, AlphaState, ColorFormat, ColorOptions,
    ColorParseError, ColorState, ColorStateOptions, ColorStateStats, ColorValue, FormatType,
    GetColorOptions, HexState, HslChannel, HslState, Hsla, HsvChannel, HsvState, Hsva,
    InternalState, NumericChannel, ParsedColor, PendingColorUpdate, PickerComponents,
    PickerLayout, PickerOptions, ProjectionKind, RgbChannel, RgbState, Rgba, Sv, TextState,
    ALPHA_PRECISION, DARK_LUMINANCE, MAX_PRECISION,
};
pub use entry::{
    ensure_id, entry_id, generate_id, is_uuid_v4, EntryData, EntryStore, ObjectEntryStore, ID_KEY,
};
pub use error::StoreError;
pub use scheduler::{DebounceState, Debouncer, Scheduler, TaskId};
pub use store::{Readable, SettableStore, Subscribers, Unsubscribe, WritableStore};

#[cfg(feature = "derive")]
pub use tabletop_stores_macros::EntryStore;
