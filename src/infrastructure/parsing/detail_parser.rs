//! Detail page parsers
//!
//! Enrichment reads three pages per incident: the general page (class
//! label), the parties page (ordered role/name pairs) and the information
//! page (subjects plus the origin block). Scalar origin fields are located
//! by exact label text against sibling nodes, never by position - layout
//! position is not a stable contract on this portal, label text is.

use scraper::{ElementRef, Html, Selector};

use crate::domain::error::{CrawlError, CrawlResult};
use crate::infrastructure::text::{clean_field, strip_whitespace};

/// Subjects and origin block extracted from the information page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoFields {
    pub subjects: Vec<String>,
    pub origin_court: String,
    pub origin_place: String,
    pub origin_numbers: Vec<String>,
}

pub struct DetailParser {
    class_label_selector: Selector,
    party_role_selector: Selector,
    subject_selector: Selector,
    any_selector: Selector,
}

impl DetailParser {
    pub fn new() -> CrawlResult<Self> {
        Ok(Self {
            class_label_selector: compile(".processo-classe")?,
            party_role_selector: compile("div.detalhe-parte")?,
            subject_selector: compile(r#"ul[style="list-style:none;"] li"#)?,
            any_selector: compile("*")?,
        })
    }

    /// General page: the full class label. An absent label is an empty
    /// string, matching dockets that carry no class heading.
    pub fn parse_general(&self, body: &str, incident_id: i64) -> CrawlResult<String> {
        let document = parse_document(body, incident_id, "general page")?;
        Ok(document
            .select(&self.class_label_selector)
            .next()
            .map(|el| clean_field(&text_of(&el)))
            .unwrap_or_default())
    }

    /// Parties page: (role, name) pairs in source order. A role node
    /// without a following name node means the page structure changed,
    /// which is fatal for the incident.
    pub fn parse_parties(&self, body: &str, incident_id: i64) -> CrawlResult<Vec<(String, String)>> {
        let document = parse_document(body, incident_id, "parties page")?;
        let mut parties = Vec::new();

        for role_el in document.select(&self.party_role_selector) {
            let name_el = next_sibling_element(&role_el).ok_or_else(|| CrawlError::Parse {
                incident_id,
                what: "parties page",
                reason: "party role without a name node".to_string(),
            })?;
            parties.push((clean_field(&text_of(&role_el)), clean_field(&text_of(&name_el))));
        }

        Ok(parties)
    }

    /// Information page: subject list and the label-keyed origin block.
    /// Absent labels leave empty values; only an unreadable document is an
    /// error.
    pub fn parse_info(&self, body: &str, incident_id: i64) -> CrawlResult<InfoFields> {
        let document = parse_document(body, incident_id, "information page")?;
        let mut fields = InfoFields::default();

        for item in document.select(&self.subject_selector) {
            let raw = clean_field(&text_of(&item));
            if raw.is_empty() {
                continue;
            }
            // Repeated-delimiter runs collapse before splitting.
            let joined = raw
                .replace("||", "|")
                .split('|')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            fields.subjects.push(joined);
        }

        for element in document.select(&self.any_selector) {
            let label = clean_field(&own_text(&element));
            if label.is_empty() || !label.ends_with(':') {
                continue;
            }
            match label.as_str() {
                "Órgão de Origem:" => {
                    fields.origin_court = sibling_text(&element);
                }
                "Origem:" => {
                    fields.origin_place = sibling_text(&element);
                }
                "Número de Origem:" => {
                    let numbers = strip_whitespace(&sibling_text(&element));
                    fields.origin_numbers = numbers
                        .split(',')
                        .filter(|n| !n.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {}
            }
        }

        Ok(fields)
    }
}

fn parse_document(body: &str, incident_id: i64, what: &'static str) -> CrawlResult<Html> {
    if body.trim().is_empty() {
        return Err(CrawlError::Parse {
            incident_id,
            what,
            reason: "empty document".to_string(),
        });
    }
    Ok(Html::parse_document(body))
}

fn compile(selector: &str) -> CrawlResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| CrawlError::Configuration(format!("invalid selector {selector:?}: {e}")))
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>()
}

/// Text directly inside the element, ignoring child elements.
fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
        .collect::<String>()
}

fn next_sibling_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

fn sibling_text(element: &ElementRef) -> String {
    next_sibling_element(element)
        .map(|el| clean_field(&text_of(&el)))
        .unwrap_or_default()
}
