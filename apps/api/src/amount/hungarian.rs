//! Hungarian numerals in the style used on contracts and cheques:
//! `egyszáz`, `egyezer`, groups hyphenated above two thousand.

/// Largest amount that can be spelled.
pub const MAX_SPELLABLE: u64 = 999_999_999_999;

const ONES: [&str; 10] = [
    "", "egy", "kettő", "három", "négy", "öt", "hat", "hét", "nyolc", "kilenc",
];

const TENS_ALONE: [&str; 10] = [
    "", "tíz", "húsz", "harminc", "negyven", "ötven", "hatvan", "hetven", "nyolcvan", "kilencven",
];

const TENS_PREFIX: [&str; 10] = [
    "", "tizen", "huszon", "harminc", "negyven", "ötven", "hatvan", "hetven", "nyolcvan",
    "kilencven",
];

const SCALES: [(u64, &str); 3] = [(1_000_000_000, "milliárd"), (1_000_000, "millió"), (1_000, "ezer")];

/// `kettő` shortens to `két` in front of `száz`, `ezer`, `millió` and `milliárd`.
fn digit(d: u64, before_multiplier: bool) -> &'static str {
    if d == 2 && before_multiplier {
        "két"
    } else {
        ONES[d as usize]
    }
}

fn below_thousand(n: u64, before_multiplier: bool) -> String {
    let hundreds = n / 100;
    let tens = (n % 100) / 10;
    let ones = n % 10;

    let mut words = String::new();
    if hundreds > 0 {
        words.push_str(digit(hundreds, true));
        words.push_str("száz");
    }
    if ones == 0 {
        words.push_str(TENS_ALONE[tens as usize]);
    } else {
        words.push_str(TENS_PREFIX[tens as usize]);
        words.push_str(digit(ones, before_multiplier));
    }
    words
}

/// Spells `n` in lowercase Hungarian words, or `None` above [`MAX_SPELLABLE`].
pub fn spell(n: u64) -> Option<String> {
    if n > MAX_SPELLABLE {
        return None;
    }
    if n == 0 {
        return Some("nulla".to_string());
    }

    let mut groups = Vec::new();
    for (scale, name) in SCALES {
        let group = (n / scale) % 1000;
        if group > 0 {
            groups.push(format!("{}{name}", below_thousand(group, true)));
        }
    }
    let rest = n % 1000;
    if rest > 0 {
        groups.push(below_thousand(rest, false));
    }

    let separator = if n > 2000 { "-" } else { "" };
    Some(groups.join(separator))
}

/// Uppercases the first character.
pub fn capitalize(words: &str) -> String {
    let mut chars = words.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(n: u64) -> String {
        spell(n).unwrap()
    }

    #[test]
    fn test_single_digits() {
        assert_eq!(s(0), "nulla");
        assert_eq!(s(1), "egy");
        assert_eq!(s(2), "kettő");
        assert_eq!(s(9), "kilenc");
    }

    #[test]
    fn test_tens_take_prefix_forms() {
        assert_eq!(s(10), "tíz");
        assert_eq!(s(12), "tizenkettő");
        assert_eq!(s(20), "húsz");
        assert_eq!(s(21), "huszonegy");
        assert_eq!(s(45), "negyvenöt");
        assert_eq!(s(90), "kilencven");
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(s(100), "egyszáz");
        assert_eq!(s(123), "egyszázhuszonhárom");
        assert_eq!(s(200), "kétszáz");
        assert_eq!(s(999), "kilencszázkilencvenkilenc");
    }

    #[test]
    fn test_thousands_hyphenate_only_above_two_thousand() {
        assert_eq!(s(1000), "egyezer");
        assert_eq!(s(1999), "egyezerkilencszázkilencvenkilenc");
        assert_eq!(s(2000), "kétezer");
        assert_eq!(s(2001), "kétezer-egy");
        assert_eq!(s(32_000), "harminckétezer");
    }

    #[test]
    fn test_car_prices() {
        assert_eq!(s(1_250_000), "egymillió-kétszázötvenezer");
        assert_eq!(s(2_000_002), "kétmillió-kettő");
        assert_eq!(s(3_490_000), "hárommillió-négyszázkilencvenezer");
    }

    #[test]
    fn test_billions_and_limit() {
        assert_eq!(s(2_000_000_000), "kétmilliárd");
        assert!(spell(MAX_SPELLABLE).is_some());
        assert!(spell(MAX_SPELLABLE + 1).is_none());
    }

    #[test]
    fn test_capitalize_handles_accented_first_letter() {
        assert_eq!(capitalize("egyszázhuszonhárom"), "Egyszázhuszonhárom");
        assert_eq!(capitalize("ötezer"), "Ötezer");
        assert_eq!(capitalize(""), "");
    }
}
