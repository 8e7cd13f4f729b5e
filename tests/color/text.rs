use serde_json::json;
use tabletop_stores::{
    ColorFormat, HslChannel, Readable, RgbChannel, Scheduler, SettableStore, StoreError,
};

use super::{color_state, delta};

#[test]
fn hex_edit_is_not_rewritten_by_its_own_change() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));
    let before = state.stats();

    assert!(state.text().hex().set_input("#0F0"));

    // Sibling views follow immediately.
    let rgb = state.text().rgb().to_rgba();
    assert_eq!((rgb.r, rgb.g, rgb.b), (0.0, 255.0, 0.0));
    assert_eq!(state.text().hsl().channel(HslChannel::H).get(), Some(120.0));

    scheduler.flush();

    assert_eq!(state.text().hex().text(), "#0F0");
    assert_eq!(delta(before, state.stats()), (1, 0));
    assert_eq!(state.current_color().to_string(), "#00ff00");
}

#[test]
fn incomplete_hex_leaves_the_color_alone() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));

    assert!(!state.text().hex().set_input("#0f"));
    assert!(!state.text().hex().is_valid());
    assert!(!state.is_pending());

    // The next external change resets the field.
    state.update_external(&json!("#0000ff"));
    scheduler.flush();
    assert_eq!(state.text().hex().text(), "#0000ff");
    assert!(state.text().hex().is_valid());
}

#[test]
fn rgb_gray_edit_keeps_the_hue() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("rgb(128, 128, 128)"));
    state.hue().set(200.0);
    scheduler.flush();

    state.text().rgb().set(RgbChannel::B, Some(128.0));
    scheduler.flush();
    assert_eq!(state.hue().get(), 200.0);

    state.text().rgb().set(RgbChannel::B, Some(200.0));
    scheduler.flush();
    assert_eq!(state.hue().get(), 240.0);
    assert_eq!(state.current_color().to_string(), "rgb(128, 128, 200)");
}

#[test]
fn several_text_edits_in_one_window_skip_the_fan_out() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#000000"));
    let before = state.stats();

    state.text().rgb().set(RgbChannel::R, Some(255.0));
    state.text().alpha().set(Some(0.25));
    scheduler.flush();

    assert_eq!(delta(before, state.stats()), (1, 0));
    assert_eq!(state.current_color().to_string(), "#ff000040");
    assert_eq!(state.text().hex().text(), "#ff000040");
}

#[test]
fn mixed_window_refreshes_every_view() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#000000"));
    let before = state.stats();

    state.text().rgb().set(RgbChannel::R, Some(255.0));
    state.alpha().set(0.5);
    scheduler.flush();

    assert_eq!(delta(before, state.stats()), (1, 1));
    assert_eq!(state.text().alpha().value(), 0.5);
}

#[test]
fn repeated_value_still_reaches_channel_subscribers() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("rgb(10, 20, 30)"));
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _unsub = state
        .text()
        .rgb()
        .channel(RgbChannel::R)
        .subscribe(move |value| sink.lock().unwrap().push(*value));

    // Out-of-range input is clamped; repeating it still notifies.
    state.text().rgb().set(RgbChannel::R, Some(-5.0));
    state.text().rgb().set(RgbChannel::R, Some(-5.0));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(10.0), None, Some(0.0), None, Some(0.0)]
    );
}

#[test]
fn typed_input_is_parsed() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsl(0, 100%, 50%)"));

    state
        .text()
        .hsl()
        .set_input(HslChannel::H, " 120 ")
        .unwrap();
    scheduler.flush();
    assert_eq!(state.current_color().to_string(), "hsl(120, 100%, 50%)");

    assert_eq!(
        state.text().hsl().set_input(HslChannel::S, "lots"),
        Err(StoreError::NotNumeric("lots".into()))
    );

    // Blank falls back to the channel default.
    state.text().alpha().set_input("").unwrap();
    scheduler.flush();
    assert_eq!(state.alpha().get(), 1.0);
}

#[test]
fn active_format_follows_the_color_and_cycles() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsv(0, 100%, 100%)"));
    let active = state.text().active();

    assert_eq!(active.mode(), ColorFormat::Hsv);
    let next = active.next();
    assert_ne!(next, ColorFormat::Hsv);
    assert_eq!(active.previous(), ColorFormat::Hsv);

    active.set_mode(ColorFormat::Hex);
    assert_eq!(active.mode(), ColorFormat::Hex);
}
