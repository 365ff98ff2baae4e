// src/ingest/rss.rs
//! Pattern-based RSS item extraction.
//!
//! Feeds are scanned with regexes built from an [`ExtractionSchema`] rather
//! than parsed as XML, so slightly broken feeds (stray entities, unclosed
//! HTML inside descriptions) still yield their well-formed items.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::normalize_text;
use crate::ingest::types::{Article, SourceSpec};
use crate::sentiment::SentimentAnalyzer;

/// Tag names the parser looks for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractionSchema {
    pub item: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self {
            item: "item".into(),
            title: "title".into(),
            description: "description".into(),
            link: "link".into(),
            pub_date: "pubDate".into(),
        }
    }
}

/// Regexes compiled from an [`ExtractionSchema`].
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    item: Regex,
    title: Regex,
    description: Regex,
    link: Regex,
    pub_date: Regex,
}

impl CompiledSchema {
    pub fn compile(schema: &ExtractionSchema) -> Result<Self> {
        Ok(Self {
            item: block_regex(&schema.item)?,
            title: field_regex(&schema.title)?,
            description: field_regex(&schema.description)?,
            link: field_regex(&schema.link)?,
            pub_date: field_regex(&schema.pub_date)?,
        })
    }
}

fn block_regex(tag: &str) -> Result<Regex> {
    let t = regex::escape(tag);
    Regex::new(&format!(r"(?is)<{t}\b[^>]*>(.*?)</{t}\s*>"))
        .with_context(|| format!("compiling item pattern for <{tag}>"))
}

// Captures the element text, without an optional CDATA wrapper.
fn field_regex(tag: &str) -> Result<Regex> {
    let t = regex::escape(tag);
    Regex::new(&format!(
        r"(?is)<{t}\b[^>]*>\s*(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?\s*</{t}\s*>"
    ))
    .with_context(|| format!("compiling field pattern for <{tag}>"))
}

fn capture<'a>(re: &Regex, hay: &'a str) -> Option<&'a str> {
    re.captures(hay).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// RFC 2822 (the RSS norm) first, RFC 3339 as used by Atom-ish feeds second.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Turns raw feed text into [`Article`]s.
#[derive(Debug, Clone)]
pub struct FeedParser {
    schema: CompiledSchema,
    staleness: Duration,
    analyzer: SentimentAnalyzer,
}

impl FeedParser {
    pub fn new(schema: &ExtractionSchema, staleness_days: i64) -> Result<Self> {
        Ok(Self {
            schema: CompiledSchema::compile(schema)?,
            staleness: Duration::days(staleness_days.max(0)),
            analyzer: SentimentAnalyzer::new(),
        })
    }

    /// Parse up to `limit` fresh items of one feed.
    ///
    /// Items missing a title, description or link are skipped. A missing or
    /// unparsable date counts as `now`. Items older than the staleness
    /// window are skipped. A payload that is not a feed at all is an error
    /// for the whole feed.
    pub fn parse(
        &self,
        xml: &str,
        source: &SourceSpec,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Article>> {
        let t0 = std::time::Instant::now();

        // A per-source schema override is compiled on demand.
        let overridden;
        let schema = match &source.schema {
            Some(s) => {
                overridden = CompiledSchema::compile(s)?;
                &overridden
            }
            None => &self.schema,
        };

        if !looks_like_feed(xml) {
            bail!("payload from {} is not an RSS document", source.name);
        }

        let cutoff = now - self.staleness;
        let slug = source.slug();
        let mut out = Vec::new();
        let mut skipped = 0usize;

        for block in schema.item.captures_iter(xml) {
            if out.len() >= limit {
                break;
            }
            let body = block.get(1).map(|m| m.as_str()).unwrap_or_default();

            let (Some(title_raw), Some(desc_raw), Some(link_raw)) = (
                capture(&schema.title, body),
                capture(&schema.description, body),
                capture(&schema.link, body),
            ) else {
                skipped += 1;
                continue;
            };

            let title = normalize_text(title_raw);
            let url = crate::ingest::decode_entities(link_raw.trim());
            if title.is_empty() || url.is_empty() {
                skipped += 1;
                continue;
            }

            let published_at = capture(&schema.pub_date, body)
                .and_then(parse_pub_date)
                .unwrap_or(now);
            if published_at < cutoff {
                skipped += 1;
                continue;
            }

            let summary = normalize_text(desc_raw);
            let mut tags = self.analyzer.tags(&title, &summary);
            tags.extend(source.extra_tags.iter().map(|t| t.to_lowercase()));

            out.push(Article {
                id: format!("{}-{}-{}", slug, out.len(), now.timestamp_millis()),
                sentiment: self.analyzer.classify(&title, &summary),
                content: summary.clone(),
                title,
                summary,
                url,
                source: source.name.clone(),
                published_at,
                tags,
                author: None,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_parse_ms").record(ms);
        counter!("news_articles_parsed_total").increment(out.len() as u64);
        tracing::debug!(
            target: "ingest",
            source = %source.name,
            kept = out.len(),
            skipped,
            "feed parsed"
        );
        Ok(out)
    }
}

fn looks_like_feed(xml: &str) -> bool {
    let head = xml.chars().take(4096).collect::<String>().to_ascii_lowercase();
    head.contains("<rss") || head.contains("<channel") || head.contains("<rdf:rdf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap()
    }

    fn parser() -> FeedParser {
        FeedParser::new(&ExtractionSchema::default(), 7).unwrap()
    }

    fn feed(items: &str) -> String {
        format!("<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>T</title>{items}</channel></rss>")
    }

    #[test]
    fn item_without_link_is_skipped() {
        let xml = feed(
            "<item><title>No link here</title><description>d</description></item>\
             <item><title>Has link</title><description>d</description><link>https://x.test/1</link></item>",
        );
        let out = parser()
            .parse(&xml, &SourceSpec::new("Reuters", "u"), 10, now())
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Has link");
    }

    #[test]
    fn item_without_title_or_description_is_skipped() {
        let xml = feed(
            "<item><description>d</description><link>https://x.test/1</link></item>\
             <item><title>No description</title><link>https://x.test/2</link></item>\
             <item><title><![CDATA[ <b></b> ]]></title><description>d</description><link>https://x.test/3</link></item>\
             <item><title>Complete</title><description>d</description><link>https://x.test/4</link></item>",
        );
        let out = parser()
            .parse(&xml, &SourceSpec::new("Reuters", "u"), 10, now())
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Complete");
        assert_eq!(out[0].url, "https://x.test/4");
    }

    #[test]
    fn cdata_and_attributes_are_handled() {
        let xml = feed(
            "<item><title><![CDATA[Apple <b>rallies</b>]]></title>\
             <description type=\"html\"><![CDATA[<p>Strong quarter &amp; more</p>]]></description>\
             <link>https://x.test/a?x=1&amp;y=2</link>\
             <pubDate>Tue, 14 Oct 2025 09:30:00 GMT</pubDate></item>",
        );
        let out = parser()
            .parse(&xml, &SourceSpec::new("CNBC", "u"), 10, now())
            .unwrap();
        assert_eq!(out.len(), 1);
        let a = &out[0];
        assert_eq!(a.title, "Apple rallies");
        assert_eq!(a.summary, "Strong quarter & more");
        assert_eq!(a.content, a.summary);
        assert_eq!(a.url, "https://x.test/a?x=1&y=2");
        assert_eq!(a.published_at, Utc.with_ymd_and_hms(2025, 10, 14, 9, 30, 0).unwrap());
        assert!(a.tags.contains("apple"));
        assert!(a.id.starts_with("cnbc-0-"));
    }

    #[test]
    fn stale_items_are_dropped_and_bad_dates_default_to_now() {
        let xml = feed(
            "<item><title>Old</title><description>d</description><link>l1</link>\
             <pubDate>Mon, 01 Sep 2025 10:00:00 GMT</pubDate></item>\
             <item><title>Undated</title><description>d</description><link>l2</link>\
             <pubDate>sometime last week</pubDate></item>",
        );
        let out = parser()
            .parse(&xml, &SourceSpec::new("Reuters", "u"), 10, now())
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Undated");
        assert_eq!(out[0].published_at, now());
    }

    #[test]
    fn limit_caps_output() {
        let items: String = (0..5)
            .map(|i| format!("<item><title>t{i}</title><description>d</description><link>l{i}</link></item>"))
            .collect();
        let out = parser()
            .parse(&feed(&items), &SourceSpec::new("R", "u"), 3, now())
            .unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn non_feed_payload_fails_whole_feed() {
        let html = "<html><body><item><title>x</title></item></body></html>";
        assert!(parser()
            .parse(html, &SourceSpec::new("R", "u"), 10, now())
            .is_err());
    }

    #[test]
    fn extra_tags_and_schema_override_apply() {
        let mut src = SourceSpec::new("Desk", "u");
        src.extra_tags = vec!["Markets".into()];
        src.schema = Some(ExtractionSchema {
            item: "entry".into(),
            description: "summary".into(),
            ..ExtractionSchema::default()
        });
        let xml = "<rss><channel><entry><title>Headline</title><summary>s</summary>\
                   <link>https://x.test/e</link></entry></channel></rss>";
        let out = parser().parse(xml, &src, 10, now()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].tags.contains("markets"));
    }

    #[test]
    fn pub_date_formats() {
        assert!(parse_pub_date("Wed, 15 Oct 2025 08:00:00 +0000").is_some());
        assert!(parse_pub_date("2025-10-15T08:00:00Z").is_some());
        assert!(parse_pub_date("yesterday").is_none());
    }
}
