//! Listing page parser
//!
//! A listing page for one id-space value is a table whose rows carry:
//! class + number link, unified number, filing date, channel label and
//! visibility label. Rows that do not look like result rows (headers,
//! spacers, rows without an incident link) are treated as absent, not as
//! errors; an unrecognized channel or visibility label on a real row is
//! fatal for the whole source id.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::domain::docket::{ChannelKind, DocketRecord, VisibilityKind};
use crate::domain::error::{CrawlError, CrawlResult};
use crate::infrastructure::text::clean_field;

pub struct ListingParser {
    row_selector: Selector,
    cell_selector: Selector,
    link_selector: Selector,
}

impl ListingParser {
    pub fn new() -> CrawlResult<Self> {
        Ok(Self {
            row_selector: compile("table tr")?,
            cell_selector: compile("td")?,
            link_selector: compile("a")?,
        })
    }

    /// Parse one listing page into docket records.
    ///
    /// A blank body is [`CrawlError::InvalidSource`]; a well-formed page
    /// with zero result rows is `Ok(empty)` - the id space is sparse and
    /// empty pages are the common case. Rows whose class does not match
    /// `class_filter` are skipped without side effects.
    pub fn parse(
        &self,
        body: &str,
        source_id: i64,
        discovered_at: NaiveDate,
        class_filter: Option<&str>,
    ) -> CrawlResult<Vec<DocketRecord>> {
        if body.trim().is_empty() {
            return Err(CrawlError::InvalidSource { source_id });
        }

        let document = Html::parse_document(body);
        let mut records = Vec::new();

        for row in document.select(&self.row_selector) {
            let cells: Vec<ElementRef> = row.select(&self.cell_selector).collect();
            if cells.len() < 5 {
                continue;
            }
            let Some(link) = cells[0].select(&self.link_selector).next() else {
                continue;
            };

            let link_text = clean_field(&text_of(&link));
            let Some(class_code) = link_text.split_whitespace().next() else {
                continue;
            };
            if let Some(filter) = class_filter {
                if class_code != filter {
                    debug!(source_id, class_code, "skipping row outside class filter");
                    continue;
                }
            }

            let incident_id = link
                .value()
                .attr("href")
                .and_then(|href| href.split('=').next_back())
                .and_then(|raw| raw.parse::<i64>().ok())
                .ok_or_else(|| CrawlError::Parse {
                    incident_id: 0,
                    what: "listing row incident link",
                    reason: format!("source id {source_id}: unusable incident href"),
                })?;

            let unique_number = clean_field(&text_of(&cells[1]))
                .replace('.', "")
                .replace('-', "");

            let raw_date = clean_field(&text_of(&cells[2]));
            let filed_date = NaiveDate::parse_from_str(&raw_date, "%d/%m/%Y").map_err(|e| {
                CrawlError::Parse {
                    incident_id,
                    what: "listing row filing date",
                    reason: format!("{raw_date:?}: {e}"),
                }
            })?;

            let channel = ChannelKind::from_label(&clean_field(&text_of(&cells[3])))?;
            let visibility = VisibilityKind::from_label(&clean_field(&text_of(&cells[4])))?;

            records.push(DocketRecord {
                incident_id,
                source_id,
                class_code: class_code.to_string(),
                unique_number,
                channel,
                visibility,
                filed_date,
                discovered_at,
            });
        }

        Ok(records)
    }
}

fn compile(selector: &str) -> CrawlResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| CrawlError::Configuration(format!("invalid selector {selector:?}: {e}")))
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>()
}
