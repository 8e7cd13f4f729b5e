use serde_json::json;
use tabletop_stores::{
    ColorFormat, ColorState, ColorStateOptions, ColorValue, FormatType, GetColorOptions,
    HslChannel, Hsva, InternalState, PickerOptions, Readable, Scheduler, SettableStore, Sv,
};

use super::{color_state, delta};

#[test]
fn hex_input_reads_back_as_hsl() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));

    assert_eq!(state.format(), ColorFormat::Hex);
    let hsl = state.get_color(GetColorOptions {
        format: Some(ColorFormat::Hsl),
        format_type: Some(FormatType::String),
        precision: None,
    });
    assert_eq!(hsl.to_string(), "hsl(0, 100%, 50%)");
}

#[test]
fn canonical_writes_coalesce_into_one_recompute() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));
    let before = state.stats();

    state.hue().set(120.0);
    state.sv().set(Sv::new(50.0, 50.0));
    state.alpha().set(0.5);

    assert!(state.is_pending());
    assert_eq!(state.current_color().to_string(), "#ff0000");
    assert_eq!(delta(before, state.stats()), (0, 0));

    scheduler.flush();

    assert_eq!(delta(before, state.stats()), (1, 1));
    assert_eq!(state.current_color().to_string(), "#40804080");
    assert_eq!(state.text().hex().text(), "#40804080");
    assert_eq!(state.hsl_hue(), "hsl(120, 100%, 50%)");
}

#[test]
fn current_color_subscribers_see_each_recompute_once() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsl(0, 100%, 50%)"));
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _unsub = state.subscribe_current_color(move |color| {
        sink.lock().unwrap().push(color.to_string());
    });

    state.hue().set(30.0);
    state.hue().set(60.0);
    scheduler.flush();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["hsl(0, 100%, 50%)".to_string(), "hsl(60, 100%, 50%)".to_string()]
    );
}

#[test]
fn external_hsl_grays_keep_their_hue() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsl(200, 50%, 50%)"));

    assert!(state.update_external(&json!("hsl(0, 0%, 50%)")));
    scheduler.flush();
    assert_eq!(state.hsva().h, 0.0);

    assert!(state.update_external(&json!("hsl(0, 0%, 60%)")));
    scheduler.flush();
    assert_eq!(state.hsva().h, 0.0);
    assert_eq!(state.current_color().to_string(), "hsl(0, 0%, 60%)");
}

#[test]
fn external_hex_and_rgb_grays_keep_the_current_hue() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsl(200, 50%, 50%)"));

    assert!(state.update_external(&json!("#808080")));
    scheduler.flush();
    let hsva = state.hsva();
    assert_eq!(hsva.h, 200.0);
    assert_eq!(hsva.s, 0.0);

    assert!(state.update_external(&json!({"r": 10, "g": 10, "b": 10})));
    scheduler.flush();
    assert_eq!(state.hsva().h, 200.0);
    // Output format follows the configured one, not the input's.
    assert_eq!(state.current_color().to_string(), "hsl(200, 0%, 4%)");
}

#[test]
fn external_colors_that_change_nothing_are_skipped() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));

    assert!(!state.update_external(&json!("rgb(255, 0, 0)")));
    assert!(!state.update_external(&json!("hsl(360, 100%, 50%)")));
    assert!(!state.is_pending());
}

#[test]
fn invalid_external_colors_are_ignored() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#00ff00"));

    assert!(!state.update_external(&json!("not a color")));
    assert!(!state.update_external(&json!(42)));
    assert!(!state.update_external(&json!({"x": 1})));
    assert!(!state.is_pending());
    assert_eq!(state.current_color().to_string(), "#00ff00");
}

#[test]
fn invalid_initial_color_falls_back_to_red_hsl() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("bogus"));

    assert_eq!(state.format(), ColorFormat::Hsl);
    assert_eq!(state.format_type(), FormatType::String);
    assert_eq!(state.current_color().to_string(), "hsl(0, 100%, 50%)");

    let none = ColorState::new(
        &scheduler,
        None,
        ColorStateOptions::new(),
        &InternalState::default(),
    );
    assert_eq!(none.current_color().to_string(), "hsl(0, 100%, 50%)");
}

#[test]
fn explicit_format_overrides_detection() {
    let scheduler = Scheduler::new();
    let state = ColorState::new(
        &scheduler,
        Some(&json!({"r": 0, "g": 0, "b": 255})),
        ColorStateOptions::new().with_format(ColorFormat::Hsv),
        &InternalState::default(),
    );

    // Object type still comes from the input.
    assert_eq!(state.format_type(), FormatType::Object);
    match state.current_color() {
        ColorValue::Hsv(hsv) => assert_eq!((hsv.h, hsv.s, hsv.v), (240.0, 100.0, 100.0)),
        other => panic!("expected an hsv object, got {:?}", other),
    }
}

#[test]
fn set_format_applies_immediately() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));

    state.set_format(Some(ColorFormat::Rgb), Some(FormatType::Object));
    match state.current_color() {
        ColorValue::Rgb(rgb) => assert_eq!((rgb.r, rgb.g, rgb.b), (255.0, 0.0, 0.0)),
        other => panic!("expected an rgb object, got {:?}", other),
    }

    state.set_format(None, Some(FormatType::String));
    assert_eq!(state.current_color().to_string(), "rgb(255, 0, 0)");
    assert!(!state.is_pending());
}

#[test]
fn precision_changes_reformat_output() {
    let scheduler = Scheduler::new();
    let internal = InternalState::default();
    let state = ColorState::new(
        &scheduler,
        Some(&json!("hsv(200.123, 50%, 50%)")),
        ColorStateOptions::new(),
        &internal,
    );
    assert_eq!(state.current_color().to_string(), "hsv(200, 50%, 50%)");
    let before = state.stats();

    internal
        .update_options(PickerOptions::new().with_precision(2))
        .unwrap();
    scheduler.flush();

    assert_eq!(state.current_color().to_string(), "hsv(200.12, 50%, 50%)");
    assert_eq!(delta(before, state.stats()), (1, 1));
    assert_eq!(
        state.text().hsv().channel(tabletop_stores::HsvChannel::H).get(),
        Some(200.12)
    );
}

#[test]
fn is_dark_tracks_luminance() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#000000"));
    assert!(state.is_dark());

    state.update_external(&json!("#ffffff"));
    scheduler.flush();
    assert!(!state.is_dark());

    state.update_external(&json!("#707070"));
    scheduler.flush();
    assert!(state.is_dark());
}

#[test]
fn destroy_detaches_from_canonical_stores() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("#ff0000"));

    state.hue().set(90.0);
    state.destroy();
    scheduler.flush();

    assert_eq!(state.current_color().to_string(), "#ff0000");
    assert_eq!(state.stats().recomputes, 1);
    assert_eq!(state.hue().subscriber_count(), 0);

    state.hue().set(180.0);
    scheduler.flush();
    assert_eq!(state.stats().recomputes, 1);
}

#[test]
fn canonical_stores_are_readable() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsla(10, 100%, 50%, 0.3)"));
    let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
    let sink = seen.clone();
    let _unsub = state.alpha().subscribe(move |a| *sink.lock().unwrap() = Some(*a));

    assert_eq!(*seen.lock().unwrap(), Some(0.3));
    assert_eq!(state.hue().get(), 10.0);
}

#[test]
fn out_of_range_canonical_writes_are_pulled_into_range() {
    let scheduler = Scheduler::new();
    let state = color_state(&scheduler, json!("hsl(0, 100%, 50%)"));

    state.hue().set(400.0);
    scheduler.flush();
    assert_eq!(state.hue().get(), 40.0);
    assert_eq!(state.hsl_hue(), "hsl(40, 100%, 50%)");
    assert_eq!(state.current_color().to_string(), "hsl(40, 100%, 50%)");
    assert_eq!(state.text().hsl().channel(HslChannel::H).get(), Some(40.0));

    state.sv().set(Sv { s: 150.0, v: 50.0 });
    scheduler.flush();
    assert_eq!(state.sv().get(), Sv::new(100.0, 50.0));
    assert_eq!(state.hsva(), Hsva::new(40.0, 100.0, 50.0, 1.0));
    assert_eq!(state.current_color().to_string(), "hsl(40, 100%, 25%)");
    assert_eq!(state.text().hex().text(), "#805500");

    // NaN alpha is opaque, which is the current value.
    state.alpha().set(f64::NAN);
    assert!(!state.is_pending());
    state.alpha().set(-3.0);
    scheduler.flush();
    assert_eq!(state.alpha().get(), 0.0);
    assert_eq!(state.hsla(), "hsla(40, 100%, 25%, 0)");

    state.hue().set(f64::NAN);
    scheduler.flush();
    assert_eq!(state.hue().get(), 0.0);
}
