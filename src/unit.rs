//! Length and angle unit conversions.
//!
//! PPTX geometry is expressed in English Metric Units (EMU); text sizes in
//! hundredths of a point; rotation in 60 000ths of a degree. The scene-graph
//! model carries both the native values and derived centimeters so renderers
//! never repeat the arithmetic.

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_CM: i64 = 360_000;
pub const EMUS_PER_PT: i64 = 12_700;
pub const ROT_UNITS_PER_DEGREE: i64 = 60_000;
/// CSS reference pixel density over PostScript points (96 dpi / 72 pt).
pub const PIXELS_PER_POINT: f64 = 96.0 / 72.0;

/// Convert EMU to centimeters, rounded to two decimals.
///
/// This rounding is part of the output contract: derived `*Cm` fields are
/// compared verbatim by consumers and across re-extractions.
///
/// # Examples
///
/// ```
/// use slidescene::unit::emu_to_cm;
///
/// assert_eq!(emu_to_cm(914_400), 2.54);
/// assert_eq!(emu_to_cm(360_000), 1.0);
/// ```
#[inline]
pub fn emu_to_cm(emu: i64) -> f64 {
    (emu as f64 / EMUS_PER_CM as f64 * 100.0).round() / 100.0
}

#[inline]
pub fn cm_to_emu(cm: f64) -> i64 {
    (cm * EMUS_PER_CM as f64).round() as i64
}

/// Convert a `sz` attribute value (hundredths of a point) to points.
#[inline]
pub fn centipoints_to_points(sz: i64) -> f64 {
    sz as f64 / 100.0
}

#[inline]
pub fn points_to_centipoints(pt: f64) -> i64 {
    (pt * 100.0).round() as i64
}

/// Convert a `rot` attribute value (60 000ths of a degree) to degrees.
#[inline]
pub fn rotation_to_degrees(raw: i64) -> f64 {
    raw as f64 / ROT_UNITS_PER_DEGREE as f64
}

/// Font-size scaling used by pixel renderers: `pt * 96/72 * scale`.
///
/// Extraction never calls this; it lives here so visual-fidelity tests pin
/// the exact factor renderers are expected to apply.
#[inline]
pub fn points_to_pixels(pt: f64, scale: f64) -> f64 {
    pt * PIXELS_PER_POINT * scale
}

#[inline]
pub fn emu_to_points(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_PT as f64
}

/// Parse a native-unit attribute value, failing closed.
///
/// Geometry attributes are untrusted: a missing or non-numeric value yields
/// `None` and the caller degrades the field to null. Never panics.
#[inline]
pub fn parse_emu(raw: &[u8]) -> Option<i64> {
    atoi_simd::parse::<i64>(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_emu_to_cm_known_values() {
        assert_eq!(emu_to_cm(914_400), 2.54);
        assert_eq!(emu_to_cm(457_200), 1.27);
        assert_eq!(emu_to_cm(1_828_800), 5.08);
        assert_eq!(emu_to_cm(0), 0.0);
        // 12192000 x 6858000 is the default 16:9 canvas
        assert_eq!(emu_to_cm(12_192_000), 33.87);
        assert_eq!(emu_to_cm(6_858_000), 19.05);
    }

    #[test]
    fn test_emu_to_cm_negative() {
        assert_eq!(emu_to_cm(-360_000), -1.0);
        assert_eq!(emu_to_cm(-914_400), -2.54);
    }

    #[test]
    fn test_cm_to_emu_inverse() {
        assert_eq!(cm_to_emu(2.54), 914_400);
        assert_eq!(cm_to_emu(1.0), 360_000);
        assert_eq!(cm_to_emu(0.0), 0);
    }

    #[test]
    fn test_emu_to_points() {
        assert_eq!(emu_to_points(12_700), 1.0);
        assert_eq!(emu_to_points(25_400), 2.0);
    }

    #[test]
    fn test_centipoints_to_points() {
        assert_eq!(centipoints_to_points(2400), 24.0);
        assert_eq!(centipoints_to_points(1050), 10.5);
        assert_eq!(points_to_centipoints(24.0), 2400);
    }

    #[test]
    fn test_rotation_to_degrees() {
        assert_eq!(rotation_to_degrees(0), 0.0);
        assert_eq!(rotation_to_degrees(5_400_000), 90.0);
        assert_eq!(rotation_to_degrees(-2_700_000), -45.0);
    }

    #[test]
    fn test_points_to_pixels_factor() {
        assert_eq!(points_to_pixels(72.0, 1.0), 96.0);
        assert_eq!(points_to_pixels(24.0, 0.5), 16.0);
    }

    #[test]
    fn test_parse_emu() {
        assert_eq!(parse_emu(b"914400"), Some(914_400));
        assert_eq!(parse_emu(b"-12700"), Some(-12_700));
        assert_eq!(parse_emu(b""), None);
        assert_eq!(parse_emu(b"12.5"), None);
        assert_eq!(parse_emu(b"abc"), None);
    }

    proptest! {
        #[test]
        fn prop_emu_to_cm_matches_round2(v in -1_000_000_000i64..1_000_000_000i64) {
            let expected = (v as f64 / 360_000.0 * 100.0).round() / 100.0;
            prop_assert_eq!(emu_to_cm(v), expected);
        }

        #[test]
        fn prop_parse_emu_roundtrip(v in proptest::num::i64::ANY) {
            let text = v.to_string();
            prop_assert_eq!(parse_emu(text.as_bytes()), Some(v));
        }
    }
}
