//! Number formatting conventions for user-facing amounts.

use std::fmt;

/// Separators used when rendering numbers for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    /// BCP-47 tag, e.g. `"en-US"`.
    pub tag: &'static str,
    pub decimal_separator: char,
    pub group_separator: char,
}

impl Locale {
    pub const EN_US: Self = Self {
        tag: "en-US",
        decimal_separator: '.',
        group_separator: ',',
    };

    pub const JA_JP: Self = Self {
        tag: "ja-JP",
        decimal_separator: '.',
        group_separator: ',',
    };

    pub const DE_DE: Self = Self {
        tag: "de-DE",
        decimal_separator: ',',
        group_separator: '.',
    };

    pub const FR_FR: Self = Self {
        tag: "fr-FR",
        decimal_separator: ',',
        group_separator: '\u{202f}',
    };

    /// Look up a supported locale by tag, ignoring case and `_`/`-`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let wanted = tag.replace('_', "-");
        [Self::EN_US, Self::JA_JP, Self::DE_DE, Self::FR_FR]
            .into_iter()
            .find(|locale| locale.tag.eq_ignore_ascii_case(&wanted))
    }

    /// Render `units / 10^decimals` with digit grouping and exactly
    /// `display_decimals` fractional digits, rounding half away from zero.
    pub fn format_fixed(&self, units: u64, decimals: u32, display_decimals: u32) -> String {
        let units = u128::from(units);
        let (scaled, places) = if display_decimals >= decimals {
            (units * 10u128.pow(display_decimals - decimals), display_decimals)
        } else {
            let step = 10u128.pow(decimals - display_decimals);
            ((units + step / 2) / step, display_decimals)
        };

        let divisor = 10u128.pow(places);
        let int_digits = (scaled / divisor).to_string();
        let mut out = String::with_capacity(int_digits.len() * 4 / 3 + places as usize + 1);
        for (i, digit) in int_digits.chars().enumerate() {
            if i > 0 && (int_digits.len() - i) % 3 == 0 {
                out.push(self.group_separator);
            }
            out.push(digit);
        }
        if places > 0 {
            out.push(self.decimal_separator);
            out.push_str(&format!("{:0width$}", scaled % divisor, width = places as usize));
        }
        out
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::EN_US
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag)
    }
}
