//! IEEE-11073 32-bit FLOAT-Type codec.
//!
//! A FLOAT is a 32-bit word: the top 8 bits are a signed base-10 exponent and
//! the low 24 bits a signed mantissa, `value = mantissa * 10^exponent`. The
//! word is sent little-endian.
//!
//! Temperatures are encoded with a fixed exponent of -2 (hundredths of a
//! degree). The mantissa is truncated toward zero, ignoring f32
//! representation error, and saturates at the
//! 24-bit limits, so values beyond roughly ±83886 °C lose precision instead
//! of failing.
//!
//! Non-finite input maps to the reserved special values: NaN to `NaN`
//! (`0x007FFFFF`), +∞ to `+INFINITY` (`0x007FFFFE`) and -∞ to `-INFINITY`
//! (`0x00800002`).

/// Largest 24-bit mantissa
pub const MANTISSA_MAX: i32 = 0x007F_FFFF;
/// Smallest 24-bit mantissa
pub const MANTISSA_MIN: i32 = -0x0080_0000;

/// Exponent used for every non-zero temperature
pub const TEMPERATURE_EXPONENT: i8 = -2;

pub const NAN_WORD: u32 = 0x007F_FFFF;
pub const NRES_WORD: u32 = 0x0080_0000;
pub const POSITIVE_INFINITY_WORD: u32 = 0x007F_FFFE;
pub const NEGATIVE_INFINITY_WORD: u32 = 0x0080_0002;
pub const RESERVED_WORD: u32 = 0x0080_0001;

const MANTISSA_MASK: u32 = 0x00FF_FFFF;

/// Gap between `|t|` and the next representable f32 above it.
fn ulp(t: f32) -> f32 {
    let magnitude = t.abs();
    f32::from_bits(magnitude.to_bits() + 1) - magnitude
}

/// Reserved FLOAT values, all carried with exponent 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Special {
    NaN,
    /// Not at this resolution
    NRes,
    PositiveInfinity,
    NegativeInfinity,
    Reserved,
}

/// Decoded FLOAT: exponent and sign-extended mantissa.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Float11073 {
    exponent: i8,
    mantissa: i32,
}

impl Float11073 {
    pub const ZERO: Self = Self {
        exponent: 0,
        mantissa: 0,
    };

    /// Build from parts, saturating the mantissa into 24 bits.
    pub fn new(exponent: i8, mantissa: i32) -> Self {
        Self {
            exponent,
            mantissa: mantissa.clamp(MANTISSA_MIN, MANTISSA_MAX),
        }
    }

    /// Encode a Celsius temperature.
    ///
    /// Exact zero (either sign) is `0 * 10^0`. Everything else is
    /// `trunc(t * 100) * 10^-2`, where `t * 100` lying within the input's own
    /// representation error of a whole number counts as that whole number.
    /// A stored `0.53` is really `0.52999997`, and still encodes as 53.
    pub fn from_celsius(t: f32) -> Self {
        if t == 0.0 {
            return Self::ZERO;
        }
        if t.is_nan() {
            return Self::from_word(NAN_WORD);
        }
        if t.is_infinite() {
            return if t > 0.0 {
                Self::from_word(POSITIVE_INFINITY_WORD)
            } else {
                Self::from_word(NEGATIVE_INFINITY_WORD)
            };
        }

        let scaled = f64::from(t) * 100.0;
        let nearest = scaled.round();
        let hundredths = if (scaled - nearest).abs() <= 100.0 * f64::from(ulp(t)) {
            nearest
        } else {
            scaled.trunc()
        };
        // `as` saturates at the i32 bounds
        Self::new(TEMPERATURE_EXPONENT, hundredths as i32)
    }

    /// Split a 32-bit word, sign-extending both fields.
    pub const fn from_word(word: u32) -> Self {
        Self {
            exponent: (word >> 24) as u8 as i8,
            mantissa: ((word << 8) as i32) >> 8,
        }
    }

    pub const fn to_word(self) -> u32 {
        ((self.exponent as u8 as u32) << 24) | (self.mantissa as u32 & MANTISSA_MASK)
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::from_word(u32::from_le_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.to_word().to_le_bytes()
    }

    pub fn exponent(&self) -> i8 {
        self.exponent
    }

    pub fn mantissa(&self) -> i32 {
        self.mantissa
    }

    /// Classify reserved values. Only exponent 0 carries them.
    pub fn special(&self) -> Option<Special> {
        if self.exponent != 0 {
            return None;
        }
        match self.to_word() {
            NAN_WORD => Some(Special::NaN),
            NRES_WORD => Some(Special::NRes),
            POSITIVE_INFINITY_WORD => Some(Special::PositiveInfinity),
            NEGATIVE_INFINITY_WORD => Some(Special::NegativeInfinity),
            RESERVED_WORD => Some(Special::Reserved),
            _ => None,
        }
    }

    /// Numeric value, `mantissa * 10^exponent`.
    ///
    /// NaN, NRes and the reserved value decode to `f64::NAN`.
    pub fn to_f64(&self) -> f64 {
        match self.special() {
            Some(Special::PositiveInfinity) => f64::INFINITY,
            Some(Special::NegativeInfinity) => f64::NEG_INFINITY,
            Some(_) => f64::NAN,
            None => self.mantissa as f64 * 10f64.powi(self.exponent as i32),
        }
    }
}

/// Encode a Celsius temperature into its 4-byte little-endian FLOAT.
pub fn encode(celsius: f32) -> [u8; 4] {
    Float11073::from_celsius(celsius).to_bytes()
}

/// Decode a 4-byte little-endian FLOAT.
pub fn decode(bytes: [u8; 4]) -> f64 {
    Float11073::from_bytes(bytes).to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_exact() {
        assert_eq!(encode(0.0), [0x00, 0x00, 0x00, 0x00]);
        assert_eq!(encode(-0.0), [0x00, 0x00, 0x00, 0x00]);
        assert_eq!(decode([0; 4]), 0.0);
    }

    #[test]
    fn test_encode_36_5() {
        let float = Float11073::from_celsius(36.5);
        assert_eq!(float.mantissa(), 3650);
        assert_eq!(float.exponent(), -2);
        assert_eq!(float.to_word(), 0xFE00_0E42);
        assert_eq!(encode(36.5), [0x42, 0x0E, 0x00, 0xFE]);
    }

    #[test]
    fn test_encode_21_37() {
        let float = Float11073::from_celsius(21.37);
        assert_eq!(float.mantissa(), 2137);
        assert_eq!(float.exponent(), -2);
        assert_eq!(encode(21.37), [0x59, 0x08, 0x00, 0xFE]);
    }

    #[test]
    fn test_encode_negative() {
        let float = Float11073::from_celsius(-12.25);
        assert_eq!(float.mantissa(), -1225);
        assert_eq!(float.to_word(), 0xFEFF_FB37);
        assert_eq!(encode(-12.25), [0x37, 0xFB, 0xFF, 0xFE]);
    }

    #[test]
    fn test_truncates_toward_zero() {
        assert_eq!(Float11073::from_celsius(1.239).mantissa(), 123);
        assert_eq!(Float11073::from_celsius(-1.239).mantissa(), -123);
    }

    #[test]
    fn test_tiny_value_is_not_the_zero_encoding() {
        // Only an exact zero uses exponent 0
        let float = Float11073::from_celsius(0.001);
        assert_eq!(float.mantissa(), 0);
        assert_eq!(float.exponent(), -2);
        assert_eq!(float.to_word(), 0xFE00_0000);
    }

    #[test]
    fn test_saturates_high() {
        for t in [83_886.5f32, 100_000.0, 1.0e9, f32::MAX] {
            let float = Float11073::from_celsius(t);
            assert_eq!(float.mantissa(), MANTISSA_MAX, "t = {}", t);
            assert_eq!(float.exponent(), -2);
        }
        assert_eq!(encode(100_000.0), [0xFF, 0xFF, 0x7F, 0xFE]);
    }

    #[test]
    fn test_saturates_low() {
        for t in [-83_887.0f32, -100_000.0, -1.0e9, f32::MIN] {
            let float = Float11073::from_celsius(t);
            assert_eq!(float.mantissa(), MANTISSA_MIN, "t = {}", t);
            assert_eq!(float.exponent(), -2);
        }
        assert_eq!(encode(-100_000.0), [0x00, 0x00, 0x80, 0xFE]);
    }

    #[test]
    fn test_non_finite_policy() {
        assert_eq!(Float11073::from_celsius(f32::NAN).to_word(), NAN_WORD);
        assert_eq!(
            Float11073::from_celsius(f32::INFINITY).to_word(),
            POSITIVE_INFINITY_WORD
        );
        assert_eq!(
            Float11073::from_celsius(f32::NEG_INFINITY).to_word(),
            NEGATIVE_INFINITY_WORD
        );
        assert_eq!(encode(f32::NAN), [0xFF, 0xFF, 0x7F, 0x00]);

        assert!(decode(encode(f32::NAN)).is_nan());
        assert_eq!(decode(encode(f32::INFINITY)), f64::INFINITY);
        assert_eq!(decode(encode(f32::NEG_INFINITY)), f64::NEG_INFINITY);
    }

    #[test]
    fn test_special_only_with_zero_exponent() {
        assert_eq!(Float11073::from_word(NRES_WORD).special(), Some(Special::NRes));
        assert_eq!(
            Float11073::from_word(RESERVED_WORD).special(),
            Some(Special::Reserved)
        );
        // A saturated temperature shares the mantissa bits of NaN but not the exponent
        assert_eq!(Float11073::from_celsius(1.0e6).special(), None);
    }

    #[test]
    fn test_from_word_sign_extends() {
        let float = Float11073::from_word(0xFEFF_FB37);
        assert_eq!(float.exponent(), -2);
        assert_eq!(float.mantissa(), -1225);

        let float = Float11073::from_word(0x0280_0000);
        assert_eq!(float.exponent(), 2);
        assert_eq!(float.mantissa(), MANTISSA_MIN);
    }

    /// Nearest f32 to `hundredths / 100`.
    fn celsius(hundredths: i32) -> f32 {
        (f64::from(hundredths) / 100.0) as f32
    }

    #[test]
    fn test_two_decimal_inputs_keep_their_hundredths() {
        assert_eq!(Float11073::from_celsius(0.53).mantissa(), 53);
        assert_eq!(Float11073::from_celsius(1.06).mantissa(), 106);
        assert_eq!(Float11073::from_celsius(-0.53).mantissa(), -53);

        for hundredths in -4_000..=12_500 {
            let float = Float11073::from_celsius(celsius(hundredths));
            assert_eq!(float.mantissa(), hundredths, "hundredths = {}", hundredths);
        }
    }

    #[test]
    fn test_decode_reconstructs_hundredths() {
        for hundredths in (MANTISSA_MIN + 1..=MANTISSA_MAX).step_by(997) {
            let t = celsius(hundredths);
            assert_eq!(
                Float11073::from_bytes(encode(t)).mantissa(),
                hundredths,
                "t = {}",
                t
            );
            let decoded = decode(encode(t));
            assert!(
                (decoded - f64::from(hundredths) / 100.0).abs() < 1e-9,
                "t = {}, decoded = {}",
                t,
                decoded
            );
        }
        assert_eq!(Float11073::from_celsius(celsius(MANTISSA_MAX)).mantissa(), MANTISSA_MAX);
        assert_eq!(Float11073::from_celsius(-83_886.07).mantissa(), -8_388_607);
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let room_range = -4_000..=12_500;
        let full_range = (MANTISSA_MIN + 1..=MANTISSA_MAX).step_by(991);
        for t in room_range
            .map(celsius)
            .chain(full_range.map(celsius))
            .chain([1.239f32, -0.07, 1.0e7])
        {
            let once = encode(t);
            let twice = encode(decode(once) as f32);
            assert_eq!(once, twice, "t = {}", t);
        }
    }
}
