//! Anomaly-score extraction from the scanner's report document.
//!
//! The report is an HTML-like document: level-3 headings open per-probe
//! sections, level-4 headings under them name detectors, and annotated
//! paragraphs carry the score values. Extraction is a two-pass walk:
//! tokenize the document into an ordered node list, then join each detector
//! heading to the nearest following score annotation under the current probe
//! context.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::model::DetectorKey;

/// Marker in a level-3 heading that opens a probe context.
const PROBE_MARKER: &str = "probe:";
/// Label preceding the score value in an annotation paragraph.
const SCORE_LABEL: &str = "Z-score:";

/// Lookup from `(probe, detector_name)` to the annotated score string.
pub type ScoreMap = BTreeMap<DetectorKey, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Heading3,
    Heading4,
    Paragraph,
}

/// One structural element of the report document, in document order.
#[derive(Debug, Clone)]
struct DocNode {
    kind: NodeKind,
    /// Whitespace-separated class list, paragraphs only.
    class: String,
    /// Text content with inner markup stripped.
    text: String,
}

impl DocNode {
    fn has_classes(&self, wanted: &[&str]) -> bool {
        wanted
            .iter()
            .all(|w| self.class.split_whitespace().any(|c| c == *w))
    }
}

fn element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?is)<h3\b[^>]*>(?P<h3>.*?)</h3>|<h4\b[^>]*>(?P<h4>.*?)</h4>|<p\b(?P<pattrs>[^>]*)>(?P<p>.*?)</p>"#,
        )
        .expect("element pattern is valid")
    })
}

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"class\s*=\s*"(?P<class>[^"]*)""#).expect("class pattern is valid")
    })
}

fn inner_markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"))
}

fn text_content(raw: &str) -> String {
    inner_markup_pattern().replace_all(raw, "").trim().to_string()
}

/// Pass 1: flatten the document into its h3/h4/p elements, in order.
fn tokenize(document: &str) -> Vec<DocNode> {
    let mut nodes = Vec::new();
    for caps in element_pattern().captures_iter(document) {
        if let Some(m) = caps.name("h3") {
            nodes.push(DocNode {
                kind: NodeKind::Heading3,
                class: String::new(),
                text: text_content(m.as_str()),
            });
        } else if let Some(m) = caps.name("h4") {
            nodes.push(DocNode {
                kind: NodeKind::Heading4,
                class: String::new(),
                text: text_content(m.as_str()),
            });
        } else if let Some(m) = caps.name("p") {
            let attrs = caps.name("pattrs").map_or("", |a| a.as_str());
            let class = class_pattern()
                .captures(attrs)
                .and_then(|c| c.name("class"))
                .map_or(String::new(), |c| c.as_str().to_string());
            nodes.push(DocNode {
                kind: NodeKind::Paragraph,
                class,
                text: text_content(m.as_str()),
            });
        }
    }
    nodes
}

/// Pass 2: join detector headings to their nearest following score
/// annotation under the enclosing probe context.
fn join_scores(nodes: &[DocNode]) -> ScoreMap {
    let mut scores = ScoreMap::new();
    let mut current_probe: Option<String> = None;

    for (idx, node) in nodes.iter().enumerate() {
        match node.kind {
            NodeKind::Heading3 => {
                // A probe-marker heading opens a new context; any other h3
                // closes the current one.
                current_probe = node
                    .text
                    .split_once(PROBE_MARKER)
                    .and_then(|(_, rest)| rest.split_whitespace().next())
                    .map(str::to_string);
            }
            NodeKind::Heading4 => {
                let Some(probe) = current_probe.as_deref() else {
                    continue;
                };
                // Only the heading's first token names the detector.
                let Some(detector) = node.text.split_whitespace().next() else {
                    continue;
                };
                if let Some(value) = find_score(&nodes[idx + 1..]) {
                    scores.insert((probe.to_string(), detector.to_string()), value);
                }
            }
            NodeKind::Paragraph => {}
        }
    }
    scores
}

/// Nearest following z-score annotation paragraph, value text extracted
/// after its label with enclosing parentheses stripped.
fn find_score(following: &[DocNode]) -> Option<String> {
    let annotation = following.iter().find(|n| {
        n.kind == NodeKind::Paragraph && n.has_classes(&["detector", "zscore"])
    })?;
    let (_, value) = annotation.text.rsplit_once(SCORE_LABEL)?;
    Some(value.trim().replace(['(', ')'], ""))
}

/// Extract all `(probe, detector) -> score` pairs from a report document.
pub fn extract_scores(document: &str) -> ScoreMap {
    join_scores(&tokenize(document))
}

/// Extract scores from the report document at `path`.
///
/// An absent document yields an empty map, not an error.
pub fn extract_scores_from_file(path: &Path) -> Result<ScoreMap> {
    if !path.exists() {
        return Ok(ScoreMap::new());
    }
    let document = std::fs::read_to_string(path)?;
    Ok(extract_scores(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_annotation_join() {
        let doc = r#"
            <h3>probe: P</h3>
            <h4>D some text</h4>
            <p class="detector zscore">absolute Z-score: (1.23)</p>
        "#;
        let scores = extract_scores(doc);
        assert_eq!(scores.len(), 1);
        assert_eq!(
            scores.get(&("P".to_string(), "D".to_string())),
            Some(&"1.23".to_string())
        );
    }

    #[test]
    fn test_probe_context_switches_at_next_heading() {
        let doc = r#"
            <h3>probe: first.probe details</h3>
            <h4>DetectorA</h4>
            <p class="detector zscore">Z-score: (0.5)</p>
            <h3>probe: second.probe</h3>
            <h4>DetectorB extra words</h4>
            <p class="detector zscore">Z-score: (-2.0)</p>
        "#;
        let scores = extract_scores(doc);
        assert_eq!(
            scores.get(&("first.probe".to_string(), "DetectorA".to_string())),
            Some(&"0.5".to_string())
        );
        assert_eq!(
            scores.get(&("second.probe".to_string(), "DetectorB".to_string())),
            Some(&"-2.0".to_string())
        );
    }

    #[test]
    fn test_detector_heading_outside_probe_context_ignored() {
        let doc = r#"
            <h4>Orphan</h4>
            <p class="detector zscore">Z-score: (3.0)</p>
            <h3>summary</h3>
            <h4>StillOrphan</h4>
            <p class="detector zscore">Z-score: (4.0)</p>
        "#;
        assert!(extract_scores(doc).is_empty());
    }

    #[test]
    fn test_missing_annotation_yields_no_entry() {
        let doc = r#"
            <h3>probe: P</h3>
            <h4>D</h4>
            <p class="detector">not a score paragraph</p>
        "#;
        assert!(extract_scores(doc).is_empty());
    }

    #[test]
    fn test_annotation_without_label_yields_no_entry() {
        let doc = r#"
            <h3>probe: P</h3>
            <h4>D</h4>
            <p class="detector zscore">no label here</p>
        "#;
        assert!(extract_scores(doc).is_empty());
    }

    #[test]
    fn test_inner_markup_stripped_from_text() {
        let doc = r#"
            <h3><b>probe:</b> P</h3>
            <h4><span>D</span> detail</h4>
            <p class="detector zscore"><i>Z-score:</i> (0.01)</p>
        "#;
        let scores = extract_scores(doc);
        assert_eq!(
            scores.get(&("P".to_string(), "D".to_string())),
            Some(&"0.01".to_string())
        );
    }

    #[test]
    fn test_annotation_found_past_unrelated_paragraphs() {
        let doc = r#"
            <h3>probe: P</h3>
            <h4>D</h4>
            <p>prose about the detector</p>
            <p class="detector zscore">Z-score: (2.5)</p>
        "#;
        let scores = extract_scores(doc);
        assert_eq!(
            scores.get(&("P".to_string(), "D".to_string())),
            Some(&"2.5".to_string())
        );
    }

    #[test]
    fn test_missing_file_yields_empty_map() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scores = extract_scores_from_file(&dir.path().join("absent.report.html"))
            .expect("missing file is not an error");
        assert!(scores.is_empty());
    }
}
