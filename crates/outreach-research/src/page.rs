//! Homepage text heuristics.
//!
//! Everything here is deliberately shallow: one page, regex-level HTML
//! handling, keyword-to-signal maps. The goal is predictable prompt inputs
//! with low latency, not a crawler.

use std::sync::OnceLock;

use regex::Regex;

const VISIBLE_TEXT_CAP: usize = 10_000;

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn inert_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<noscript[^>]*>.*?</noscript>",
        )
        .unwrap()
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#x?[0-9a-fA-F]+|[a-zA-Z]+);").unwrap())
}

/// Decode the HTML entities that actually show up in page titles and copy.
///
/// Unknown entities are left untouched rather than dropped.
fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let body = &caps[1];
            let decoded = match body {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => {
                    let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok()
                    } else if let Some(dec) = body.strip_prefix('#') {
                        dec.parse::<u32>().ok()
                    } else {
                        None
                    };
                    code.and_then(char::from_u32)
                }
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn truncate_chars(text: &str, cap: usize) -> String {
    text.chars().take(cap).collect()
}

/// Extract a cleaned `<title>` string when present.
pub fn extract_title(html: &str) -> String {
    match title_re().captures(html) {
        Some(caps) => whitespace_re()
            .replace_all(&decode_entities(&caps[1]), " ")
            .trim()
            .to_string(),
        None => String::new(),
    }
}

/// Remove scripts/styles/tags and collapse whitespace into plain text.
pub fn visible_text(html: &str) -> String {
    let no_inert = inert_block_re().replace_all(html, " ");
    let no_tags = tag_re().replace_all(&no_inert, " ");
    let collapsed = whitespace_re()
        .replace_all(&decode_entities(&no_tags), " ")
        .trim()
        .to_string();
    truncate_chars(&collapsed, VISIBLE_TEXT_CAP)
}

/// Infer company name from title when possible, else from the domain root.
pub fn infer_company_name(domain: &str, title: &str) -> String {
    if !title.is_empty() {
        let guess = title
            .split('|')
            .next()
            .unwrap_or("")
            .split('-')
            .next()
            .unwrap_or("")
            .trim();
        if guess.chars().count() > 2 {
            return guess.to_string();
        }
    }
    let root = domain.split('.').next().unwrap_or(domain);
    let mut chars = root.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => root.to_string(),
    }
}

/// Build a short summary snippet from visible page content.
pub fn build_summary(company_name: &str, visible: &str) -> String {
    let signal = truncate_chars(visible, 350);
    if signal.is_empty() {
        format!("Limited public data found for {company_name}.")
    } else {
        format!("{company_name} appears focused on: {signal}")
    }
}

/// Map simple keyword signals to possible outbound pain points.
pub fn pain_point_signals(visible: &str) -> Vec<String> {
    let combined = visible.to_lowercase();
    let options = [
        ("manual", "Likely manual workflows can be automated."),
        ("scale", "Growth may strain existing prospecting process."),
        ("data", "Data fragmentation may reduce targeting quality."),
        (
            "customer",
            "Maintaining message relevance across segments may be hard.",
        ),
    ];

    let mapped: Vec<String> = options
        .iter()
        .filter(|(keyword, _)| combined.contains(keyword))
        .take(3)
        .map(|(_, signal)| signal.to_string())
        .collect();

    if mapped.is_empty() {
        vec!["Could benefit from more personalized outbound at scale.".to_string()]
    } else {
        mapped
    }
}

/// Map site keywords to concise value propositions.
pub fn value_prop_signals(visible: &str) -> Vec<String> {
    let combined = visible.to_lowercase();
    let mut value_props = Vec::new();
    if combined.contains("ai") || combined.contains("automation") {
        value_props
            .push("Automate repetitive outbound tasks while keeping personalization.".to_string());
    }
    if combined.contains("sales") || combined.contains("revenue") {
        value_props.push("Lift conversion with account-specific outreach.".to_string());
    }
    value_props.truncate(3);

    if value_props.is_empty() {
        vec!["Generate tailored outbound copy from lightweight research.".to_string()]
    } else {
        value_props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_extracted_and_cleaned() {
        let html = "<html><head><title>\n  Acme &amp; Co | Home\n</title></head></html>";
        assert_eq!(extract_title(html), "Acme & Co | Home");
    }

    #[test]
    fn missing_title_yields_empty_string() {
        assert_eq!(extract_title("<html><body>hi</body></html>"), "");
    }

    #[test]
    fn visible_text_drops_scripts_and_tags() {
        let html = r#"<body><script>var x = "{hidden}";</script><p>Real   copy</p><style>p{}</style></body>"#;
        assert_eq!(visible_text(html), "Real copy");
    }

    #[test]
    fn visible_text_decodes_entities() {
        assert_eq!(visible_text("<p>a &lt; b &#38; c</p>"), "a < b & c");
    }

    #[test]
    fn company_name_prefers_title_segment() {
        assert_eq!(
            infer_company_name("stripe.com", "Stripe | Financial Infrastructure"),
            "Stripe"
        );
    }

    #[test]
    fn company_name_falls_back_to_domain_root() {
        assert_eq!(infer_company_name("stripe.com", ""), "Stripe");
        assert_eq!(infer_company_name("acme.io", "ab"), "Acme");
    }

    #[test]
    fn summary_mentions_missing_data_when_page_is_empty() {
        assert_eq!(
            build_summary("Acme", ""),
            "Limited public data found for Acme."
        );
    }

    #[test]
    fn pain_points_map_keywords_with_fallback() {
        let mapped = pain_point_signals("We do manual data entry at scale for customers");
        assert_eq!(mapped.len(), 3);

        let fallback = pain_point_signals("nothing relevant here");
        assert_eq!(
            fallback,
            vec!["Could benefit from more personalized outbound at scale.".to_string()]
        );
    }

    #[test]
    fn value_props_map_keywords_with_fallback() {
        let mapped = value_prop_signals("AI automation for sales teams");
        assert_eq!(mapped.len(), 2);

        let fallback = value_prop_signals("pottery classes");
        assert_eq!(fallback.len(), 1);
    }
}
