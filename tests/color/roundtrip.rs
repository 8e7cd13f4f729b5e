use proptest::prelude::*;
use tabletop_stores::{convert, parse_value, ColorFormat, ColorOptions, FormatType, Hsva};

const PRECISION: u32 = 4;

fn channel() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(100.0), 0.0f64..=100.0]
}

fn hsva() -> impl Strategy<Value = Hsva> {
    (0.0f64..360.0, channel(), channel(), 0.0f64..=1.0)
        .prop_map(|(h, s, v, a)| Hsva::new(h, s, v, a))
}

fn format() -> impl Strategy<Value = ColorFormat> {
    prop_oneof![
        Just(ColorFormat::Hex),
        Just(ColorFormat::Hsl),
        Just(ColorFormat::Hsv),
        Just(ColorFormat::Rgb),
    ]
}

fn format_type() -> impl Strategy<Value = FormatType> {
    prop_oneof![Just(FormatType::String), Just(FormatType::Object)]
}

/// Distance on the hue circle, so 359.99 and 0 are neighbours.
fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

fn reparse(color: &Hsva, format: ColorFormat, format_type: FormatType) -> Hsva {
    let options = ColorOptions {
        format,
        format_type,
        precision: PRECISION,
    };
    let value = convert(color, &options).to_json();
    parse_value(&value)
        .unwrap_or_else(|err| panic!("{} did not parse back: {}", value, err))
        .hsva
}

proptest! {
    #[test]
    fn converted_colors_parse_back(color in hsva(), format in format(), format_type in format_type()) {
        let back = reparse(&color, format, format_type);

        match format {
            ColorFormat::Hsv | ColorFormat::Hsl => {
                // Hue survives even for grays and black.
                prop_assert!(hue_distance(back.h, color.h) < 1e-3, "hue {} -> {}", color.h, back.h);
                prop_assert!(back.h < 360.0);
                prop_assert!((back.v - color.v).abs() < 1e-3, "value {} -> {}", color.v, back.v);
                if color.v >= 1.0 {
                    prop_assert!((back.s - color.s).abs() < 0.05, "saturation {} -> {}", color.s, back.s);
                }
                prop_assert!((back.a - color.a).abs() <= 5e-4 + 1e-9);
            }
            ColorFormat::Rgb => {
                let (x, y) = (color.to_rgba(), back.to_rgba());
                prop_assert!((x.r - y.r).abs() < 1e-3);
                prop_assert!((x.g - y.g).abs() < 1e-3);
                prop_assert!((x.b - y.b).abs() < 1e-3);
                prop_assert!((back.a - color.a).abs() <= 5e-4 + 1e-9);
            }
            ColorFormat::Hex => {
                let (x, y) = (color.to_rgba(), back.to_rgba());
                prop_assert!((x.r - y.r).abs() <= 0.5 + 1e-6);
                prop_assert!((x.g - y.g).abs() <= 0.5 + 1e-6);
                prop_assert!((x.b - y.b).abs() <= 0.5 + 1e-6);
                prop_assert!((back.a - color.a).abs() <= 0.5 / 255.0 + 1e-6);
            }
        }
    }

    #[test]
    fn hsv_round_trip_is_stable(color in hsva(), format_type in format_type()) {
        let once = reparse(&color, ColorFormat::Hsv, format_type);
        let twice = reparse(&once, ColorFormat::Hsv, format_type);
        prop_assert_eq!(once, twice);
    }
}
