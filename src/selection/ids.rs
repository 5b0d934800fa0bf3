/// Raw `ids` option value, as handed over by whatever collected the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdsArg {
    /// A single, possibly comma-bearing, token.
    Joined(String),
    /// Repeated tokens.
    List(Vec<String>),
}

impl Default for IdsArg {
    fn default() -> Self {
        IdsArg::List(Vec::new())
    }
}

/// Split an `ids` option into opaque id strings.
///
/// A lone list element that still contains commas is split again: option
/// collectors sometimes hand `--ids=1,2,3` over as a single token.
pub fn parse_media_ids(raw: &IdsArg) -> Vec<String> {
    let ids: Vec<String> = match raw {
        IdsArg::Joined(joined) => split_commas(joined),
        IdsArg::List(list) => list.clone(),
    };

    match ids.as_slice() {
        [single] if single.contains(',') => split_commas(single),
        _ => ids,
    }
}

fn split_commas(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Parse the starting id the way a loose integer cast does: leading
/// whitespace, an optional sign, then as many digits as there are. Anything
/// after the digits is ignored, so `"100abc"` reads as `100`.
///
/// `0`, including input with no leading digits at all, means "not given".
/// Negative values are kept; the repository clamps them.
pub fn parse_starting_id(raw: Option<&str>) -> Option<i64> {
    raw.map(leading_integer).filter(|id| *id != 0)
}

fn leading_integer(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });
    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joined_and_single_element_lists_parse_alike() {
        let expected = strings(&["1", "2", "3"]);
        assert_eq!(parse_media_ids(&IdsArg::Joined("1,2,3".into())), expected);
        assert_eq!(
            parse_media_ids(&IdsArg::List(strings(&["1,2,3"]))),
            expected
        );
        assert_eq!(
            parse_media_ids(&IdsArg::List(strings(&["1", "2", "3"]))),
            expected
        );
    }

    #[test]
    fn multi_element_lists_are_not_resplit() {
        assert_eq!(
            parse_media_ids(&IdsArg::List(strings(&["1,2", "3"]))),
            strings(&["1,2", "3"])
        );
    }

    #[test]
    fn elements_stay_opaque() {
        assert_eq!(
            parse_media_ids(&IdsArg::Joined("5,,abc".into())),
            strings(&["5", "", "abc"])
        );
        assert_eq!(parse_media_ids(&IdsArg::Joined(String::new())), strings(&[""]));
        assert!(parse_media_ids(&IdsArg::default()).is_empty());
    }

    #[test]
    fn starting_id_zero_and_garbage_mean_absent() {
        assert_eq!(parse_starting_id(None), None);
        assert_eq!(parse_starting_id(Some("")), None);
        assert_eq!(parse_starting_id(Some("0")), None);
        assert_eq!(parse_starting_id(Some("-0")), None);
        assert_eq!(parse_starting_id(Some("abc")), None);
        assert_eq!(parse_starting_id(Some("-")), None);
    }

    #[test]
    fn starting_id_reads_the_leading_integer() {
        assert_eq!(parse_starting_id(Some(" 100 ")), Some(100));
        assert_eq!(parse_starting_id(Some("100abc")), Some(100));
        assert_eq!(parse_starting_id(Some("+7")), Some(7));
        assert_eq!(parse_starting_id(Some("-4")), Some(-4));
        assert_eq!(parse_starting_id(Some("99999999999999999999")), Some(i64::MAX));
    }
}
