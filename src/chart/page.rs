//! Extraction of the number one entry from a chart page.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use super::types::ChartEntry;
use crate::date;
use crate::error::FetchError;
use crate::text::to_sentence_case;

const WEEK_SELECTOR: &str = ".article-date";
const ROW_SELECTOR: &str = ".chart-positions tr";
const TITLE_SELECTOR: &str = ".title-artist .title a";
const ARTIST_SELECTOR: &str = ".title-artist .artist a";
const COVER_SELECTOR: &str = ".cover img[src]";

fn selector(css: &'static str) -> Option<Selector> {
  Selector::parse(css).ok()
}

/// First descendant of `root` matching `css`, if any.
fn select_first<'a>(root: ElementRef<'a>, css: &'static str) -> Option<ElementRef<'a>> {
  let selector = selector(css)?;
  let first = root.select(&selector).next();
  first
}

fn required_text(
  root: ElementRef<'_>,
  date: NaiveDate,
  css: &'static str,
  element: &'static str,
) -> Result<String, FetchError> {
  select_first(root, css)
    .map(|el| el.text().collect::<String>().trim().to_string())
    .filter(|text| !text.is_empty())
    .ok_or(FetchError::MissingElement { date, element })
}

/// The top-ranked row: the first chart row that carries a title block.
fn top_row(doc: &Html) -> Option<ElementRef<'_>> {
  let rows = selector(ROW_SELECTOR)?;
  let title_artist = selector(".title-artist")?;
  let row = doc
    .select(&rows)
    .find(|row| row.select(&title_artist).next().is_some());
  row
}

/// Parse the chart page fetched for `date`.
///
/// Track and artist go through [`to_sentence_case`], so an oddly spaced
/// name comes back empty rather than failing the page.
pub fn parse_chart_page(date: NaiveDate, html: &str) -> Result<ChartEntry, FetchError> {
  let doc = Html::parse_document(html);

  let week = required_text(doc.root_element(), date, WEEK_SELECTOR, "chart week")?;
  let chart_week =
    date::parse_week_range(&week).map_err(|source| FetchError::Parse { date, source })?;

  let row = top_row(&doc).ok_or(FetchError::MissingElement {
    date,
    element: "chart entry",
  })?;
  let track = required_text(row, date, TITLE_SELECTOR, "track title")?;
  let artist = required_text(row, date, ARTIST_SELECTOR, "artist name")?;

  let cover_url = select_first(row, COVER_SELECTOR)
    .and_then(|img| img.value().attr("src"))
    .map(str::trim)
    .filter(|src| !src.is_empty())
    .map(String::from);

  Ok(ChartEntry::new(
    date,
    chart_week,
    to_sentence_case(&track),
    to_sentence_case(&artist),
    cover_url,
  ))
}
