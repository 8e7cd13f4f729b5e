//! Integration tests for the color model and its text views.

mod roundtrip;
mod state;
mod text;

use serde_json::{json, Value};
use tabletop_stores::{
    ColorState, ColorStateOptions, ColorStateStats, InternalState, Scheduler,
};

fn color_state(scheduler: &Scheduler, initial: Value) -> ColorState {
    ColorState::new(
        scheduler,
        Some(&initial),
        ColorStateOptions::new(),
        &InternalState::default(),
    )
}

fn delta(before: ColorStateStats, after: ColorStateStats) -> (u64, u64) {
    (
        after.recomputes - before.recomputes,
        after.text_fan_outs - before.text_fan_outs,
    )
}

#[test]
fn initial_color_is_projected_synchronously() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff000080"));

    assert_eq!(state.current_color().to_string(), "#ff000080");
    assert_eq!(state.hsl(), "hsl(0, 100%, 50%)");
    assert_eq!(state.hsla(), "hsla(0, 100%, 50%, 0.502)");
    assert_eq!(state.hsl_hue(), "hsl(0, 100%, 50%)");
    assert_eq!(state.text().hex().text(), "#ff000080");
    assert_eq!(state.text().alpha().value(), 0.5);
    assert!(!state.is_pending());
    assert_eq!(
        state.stats(),
        ColorStateStats {
            recomputes: 1,
            text_fan_outs: 1,
        }
    );
}
