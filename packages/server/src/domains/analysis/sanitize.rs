//! Repair of near-conformant model output.
//!
//! Models asked for bare JSON still wrap it in markdown fences often
//! enough that every response goes through [`sanitize_response`] before
//! parsing. Fences handled, in order:
//!
//! - a leading fence with a language tag: `` ```json ``
//! - a leading fence without a tag: `` ``` ``, checked again after the
//!   tagged fence is gone
//! - a trailing fence: `` ``` ``

use thiserror::Error;

use super::models::InsightReport;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Model output that could not be turned into an [`InsightReport`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model returned an empty response")]
    Empty,

    #[error("model returned malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strip surrounding whitespace, a leading `` ```json `` fence, then a
/// leading bare fence, then one trailing fence.
pub fn sanitize_response(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    }

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Sanitize and decode a model response.
///
/// `complaints` and `hooks` must both be arrays of objects with at least an
/// `insight`; anything else is a [`ParseError`].
pub fn parse_report(raw: &str) -> Result<InsightReport, ParseError> {
    let text = sanitize_response(raw);
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"complaints": [], "hooks": []}"#;

    #[test]
    fn test_plain_json_untouched() {
        assert_eq!(sanitize_response(BODY), BODY);
        assert_eq!(sanitize_response(&format!("  \n{}\n ", BODY)), BODY);
    }

    #[test]
    fn test_json_fence() {
        let raw = format!("```json\n{}\n```", BODY);
        assert_eq!(sanitize_response(&raw), BODY);
    }

    #[test]
    fn test_bare_fence() {
        let raw = format!("```\n{}\n```", BODY);
        assert_eq!(sanitize_response(&raw), BODY);
    }

    #[test]
    fn test_trailing_fence_only() {
        let raw = format!("{}\n```", BODY);
        assert_eq!(sanitize_response(&raw), BODY);
    }

    #[test]
    fn test_leading_fence_without_trailing() {
        let raw = format!("```json{}", BODY);
        assert_eq!(sanitize_response(&raw), BODY);
    }

    #[test]
    fn test_tagged_then_bare_leading_fence() {
        let raw = format!("```json```{}```", BODY);
        assert_eq!(sanitize_response(&raw), BODY);
        assert!(parse_report(&raw).is_ok());

        assert_eq!(sanitize_response("``````"), "");
    }

    #[test]
    fn test_bare_fence_after_newline_is_kept() {
        let raw = format!("```json\n```\n{}", BODY);
        assert_eq!(sanitize_response(&raw), format!("```\n{}", BODY));
    }

    #[test]
    fn test_parse_fenced_report() {
        let raw = r#"```json
{
  "complaints": [{"insight": "Battery dies fast", "frequency": "high", "suggested_copy": "All-day battery"}],
  "hooks": [{"insight": "Looks premium", "frequency": "medium", "suggested_copy": "Feel the difference"}]
}
```"#;
        let report = parse_report(raw).unwrap();

        assert_eq!(report.complaints.len(), 1);
        assert_eq!(report.complaints[0].insight, "Battery dies fast");
        assert_eq!(report.hooks[0].frequency, "medium");
        assert!(report.error.is_none());
    }

    #[test]
    fn test_parse_tolerates_missing_optional_item_fields() {
        let raw = r#"{"complaints": [{"insight": "Too loud"}], "hooks": [], "extra": 1}"#;
        let report = parse_report(raw).unwrap();

        assert_eq!(report.complaints[0].frequency, "");
        assert_eq!(report.complaints[0].suggested_copy, "");
    }

    #[test]
    fn test_parse_treats_null_item_fields_as_empty() {
        let raw = r#"{"complaints": [{"insight": "Strap broke", "frequency": null, "suggested_copy": null}], "hooks": []}"#;
        let report = parse_report(raw).unwrap();

        assert_eq!(report.complaints[0].insight, "Strap broke");
        assert_eq!(report.complaints[0].frequency, "");
        assert_eq!(report.complaints[0].suggested_copy, "");
        assert!(report.error.is_none());
    }

    #[test]
    fn test_parse_passes_through_unvalidated_lengths_and_frequency() {
        let raw = r#"{"complaints": [
            {"insight": "a", "frequency": "very often", "suggested_copy": ""},
            {"insight": "b", "frequency": "high", "suggested_copy": ""},
            {"insight": "c", "frequency": "low", "suggested_copy": ""},
            {"insight": "d", "frequency": "low", "suggested_copy": ""}
        ], "hooks": []}"#;
        let report = parse_report(raw).unwrap();

        assert_eq!(report.complaints.len(), 4);
        assert_eq!(report.complaints[0].frequency, "very often");
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(matches!(parse_report(r#"{"complaints": []}"#), Err(ParseError::Json(_))));
        assert!(matches!(parse_report(r#"["complaints"]"#), Err(ParseError::Json(_))));
        assert!(matches!(
            parse_report(r#"{"complaints": "none", "hooks": []}"#),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_and_empty() {
        assert!(matches!(parse_report("Sure! Here are the insights"), Err(ParseError::Json(_))));
        assert!(matches!(parse_report("```json\n```"), Err(ParseError::Empty)));
        assert!(matches!(parse_report("   "), Err(ParseError::Empty)));
    }
}
