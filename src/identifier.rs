//! ISSN and DOI normalization.
//!
//! Every reference table spells journal identifiers differently
//! (`1234-5678`, `12345678`, `" 1234-5678 "`, comma-separated lists). All
//! joins go through [`normalize_identifier`], so a mistake here shows up as
//! silent "not classified" results rather than errors.

/// Resolver prefix for bare DOIs.
pub const DOI_RESOLVER: &str = "http://dx.doi.org/";

/// Remove hyphens and surrounding whitespace from an identifier.
///
/// ```
/// use lattes_score::identifier::normalize_identifier;
///
/// assert_eq!(normalize_identifier(" 1234-5678 "), "12345678");
/// assert_eq!(normalize_identifier("none"), "none");
/// ```
pub fn normalize_identifier(raw: &str) -> String {
    raw.replace('-', "").trim().to_string()
}

/// Format an identifier as `XXXX-XXXX` when it normalizes to 8 characters.
///
/// Anything else is returned in normalized form.
pub fn format_identifier(raw: &str) -> String {
    let normalized = normalize_identifier(raw);
    if normalized.chars().count() == 8 {
        let head: String = normalized.chars().take(4).collect();
        let tail: String = normalized.chars().skip(4).collect();
        format!("{}-{}", head, tail)
    } else {
        normalized
    }
}

/// Format a DOI as a resolver URL.
///
/// Inputs that already are `http://` or `https://` URLs are only trimmed.
pub fn format_external_id(raw: &str) -> String {
    let trimmed = raw.trim();
    // The parser also accepts `http:host/path`; require the slashes.
    let is_web_url = url::Url::parse(trimmed)
        .map(|u| {
            matches!(u.scheme(), "http" | "https")
                && trimmed
                    .get(u.scheme().len()..)
                    .is_some_and(|rest| rest.starts_with("://"))
        })
        .unwrap_or(false);
    if is_web_url {
        trimmed.to_string()
    } else {
        format!("{}{}", DOI_RESOLVER, trimmed)
    }
}

/// Split a comma-separated identifier cell into normalized identifiers.
pub fn split_identifier_list(raw: &str) -> Vec<String> {
    raw.split(',').map(normalize_identifier).collect()
}

/// Fixed-point formatting with a decimal comma (`1.5` → `"1,50"`).
pub fn format_decimal(value: f64, places: usize) -> String {
    format!("{:.*}", places, value).replace('.', ",")
}

/// Parse a number that may use either a decimal point or a decimal comma.
///
/// `NaN` and infinities are not numbers here.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_hyphens_and_whitespace() {
        assert_eq!(normalize_identifier("1234-5678"), "12345678");
        assert_eq!(normalize_identifier("  0034-7612\t"), "00347612");
        assert_eq!(normalize_identifier("1234-567X"), "1234567X");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["1234-5678", " 12-34-56-78 ", "none", "", "abc-"] {
            let once = normalize_identifier(raw);
            assert_eq!(normalize_identifier(&once), once);
        }
    }

    #[test]
    fn test_hyphenated_and_plain_share_a_key() {
        assert_eq!(
            normalize_identifier("1234-5678"),
            normalize_identifier("12345678")
        );
    }

    #[test]
    fn test_format_identifier_inserts_hyphen() {
        assert_eq!(format_identifier("12345678"), "1234-5678");
        assert_eq!(format_identifier("1234-5678"), "1234-5678");
    }

    #[test]
    fn test_format_identifier_leaves_malformed_input() {
        assert_eq!(format_identifier("1234567"), "1234567");
        assert_eq!(format_identifier("123456789"), "123456789");
        assert_eq!(format_identifier("none"), "none");
    }

    #[test]
    fn test_format_identifier_round_trips() {
        for id in ["12345678", "0034761X", "abcdefgh"] {
            assert_eq!(normalize_identifier(&format_identifier(id)), id);
        }
    }

    #[test]
    fn test_format_external_id_prefixes_bare_doi() {
        assert_eq!(
            format_external_id(" 10.1016/j.conbuildmat.2020.1 "),
            "http://dx.doi.org/10.1016/j.conbuildmat.2020.1"
        );
    }

    #[test]
    fn test_format_external_id_keeps_urls() {
        assert_eq!(
            format_external_id("https://doi.org/10.1000/xyz"),
            "https://doi.org/10.1000/xyz"
        );
        assert_eq!(
            format_external_id("HTTP://dx.doi.org/10.1000/xyz "),
            "HTTP://dx.doi.org/10.1000/xyz"
        );
    }

    #[test]
    fn test_format_external_id_other_scheme_is_prefixed() {
        assert_eq!(
            format_external_id("doi:10.1000/xyz"),
            "http://dx.doi.org/doi:10.1000/xyz"
        );
    }

    #[test]
    fn test_format_external_id_needs_scheme_slashes() {
        assert_eq!(format_external_id("http:10.1000/x"), "http://dx.doi.org/http:10.1000/x");
        assert_eq!(format_external_id("https:10.1000/x"), "http://dx.doi.org/https:10.1000/x");
    }

    #[test]
    fn test_split_identifier_list() {
        assert_eq!(
            split_identifier_list("15230864, 1523-0872"),
            vec!["15230864".to_string(), "15230872".to_string()]
        );
        assert_eq!(split_identifier_list("00347612"), vec!["00347612"]);
    }

    #[test]
    fn test_format_decimal_uses_comma() {
        assert_eq!(format_decimal(1.5, 2), "1,50");
        assert_eq!(format_decimal(0.3333, 3), "0,333");
        assert_eq!(format_decimal(100.0, 3), "100,000");
    }

    #[test]
    fn test_parse_decimal_accepts_both_separators() {
        assert_eq!(parse_decimal("2.5"), Some(2.5));
        assert_eq!(parse_decimal("2,5"), Some(2.5));
        assert_eq!(parse_decimal("n/a"), None);
        assert_eq!(parse_decimal(" "), None);
    }

    #[test]
    fn test_parse_decimal_rejects_non_finite() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity", "Infinity"] {
            assert_eq!(parse_decimal(raw), None, "{}", raw);
        }
    }
}
