//! Parser for the archive's semi-structured HTML: the table of contents and
//! the per-sampling datatable files.
//!
//! The upstream markup is machine-generated but not well-formed XML, so the
//! reader runs in a lenient mode (unchecked end tags, unmatched ends
//! allowed) and only reacts to the handful of elements the format contract
//! guarantees: `li`/`a` in the TOC, `table`/`tr`/`td`/`a` in datatables.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};

use crate::domain::{Chapter, Sampling, spectrum_identifier};
use crate::error::Splib07Error;
use crate::index::{SamplingIndex, SpectrumEntry};

/// Rows skipped at the top of every chapter table: banner plus 3 header rows.
const HEADER_ROWS: usize = 4;

/// Fixed leading cells of a datatable row (title through first range plot).
const LEADING_CELLS: usize = 7;

/// Fixed trailing cells of a datatable row (wavelength and bandpass plots).
const TRAILING_CELLS: usize = 2;

/// Extract the per-sampling datatable locations from the table-of-contents
/// markup.
///
/// Every list-item link whose file stem is `datatable_<samplingID>` is
/// resolved against the closed [`Sampling`] set; an unrecognized identifier
/// is an error, never silently skipped. Duplicate samplings overwrite (last
/// write wins). Completeness over all samplings is the caller's concern.
pub fn read_toc(text: &str) -> Result<BTreeMap<Sampling, Utf8PathBuf>, Splib07Error> {
    let mut reader = lenient_reader(text);
    let mut datatables = BTreeMap::new();
    let mut in_item = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) if is_element(&tag, b"li") => in_item = true,
            Ok(Event::End(tag)) if tag.local_name().as_ref().eq_ignore_ascii_case(b"li") => {
                in_item = false;
            }
            Ok(Event::Start(tag) | Event::Empty(tag)) if in_item && is_element(&tag, b"a") => {
                if let Some(href) = href_attribute(&tag) {
                    let sampling = Sampling::from_label(toc_link_stem(&href))?;
                    datatables.insert(sampling, Utf8PathBuf::from(href));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(Splib07Error::Markup(format!("table of contents: {err}"))),
        }
    }

    Ok(datatables)
}

/// Parse one sampling's datatable document into its per-chapter index.
///
/// The document must contain exactly one banner table followed by one table
/// per chapter, in chapter ordinal order; any other table count means the
/// archive format drifted and parsing stops immediately.
pub fn read_datatable(text: &str, source: &str) -> Result<SamplingIndex, Splib07Error> {
    let tables = collect_tables(text, source)?;

    let expected = Chapter::ALL.len() + 1;
    if tables.len() != expected {
        return Err(Splib07Error::StructuralMismatch {
            context: format!("table count in {source}"),
            expected,
            found: tables.len(),
        });
    }

    let mut index = SamplingIndex::default();

    // First table is the header banner; the rest line up with the chapters.
    for (chapter, table) in Chapter::ALL.into_iter().zip(&tables[1..]) {
        for row in table.iter().skip(HEADER_ROWS) {
            index.insert(chapter, decode_row(row)?);
        }
    }

    Ok(index)
}

/// One `td` cell: its flattened text and the first hyperlink target, if any.
#[derive(Debug, Default, Clone)]
struct Cell {
    text: String,
    href: Option<String>,
}

type Row = Vec<Cell>;
type Table = Vec<Row>;

fn collect_tables(text: &str, source: &str) -> Result<Vec<Table>, Splib07Error> {
    let mut reader = lenient_reader(text);

    let mut tables: Vec<Table> = Vec::new();
    let mut in_table = false;
    let mut in_cell = false;
    let mut cell = Cell::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) if is_element(&tag, b"table") => {
                close_cell(&mut tables, &mut cell, &mut in_cell);
                tables.push(Vec::new());
                in_table = true;
            }
            Ok(Event::End(tag)) if tag.local_name().as_ref().eq_ignore_ascii_case(b"table") => {
                close_cell(&mut tables, &mut cell, &mut in_cell);
                in_table = false;
            }
            Ok(Event::Start(tag)) if in_table && is_element(&tag, b"tr") => {
                close_cell(&mut tables, &mut cell, &mut in_cell);
                if let Some(table) = tables.last_mut() {
                    table.push(Vec::new());
                }
            }
            Ok(Event::End(tag)) if tag.local_name().as_ref().eq_ignore_ascii_case(b"tr") => {
                close_cell(&mut tables, &mut cell, &mut in_cell);
            }
            Ok(Event::Start(tag)) if in_table && is_element(&tag, b"td") => {
                close_cell(&mut tables, &mut cell, &mut in_cell);
                in_cell = true;
                cell = Cell::default();
            }
            Ok(Event::End(tag)) if in_cell && tag.local_name().as_ref().eq_ignore_ascii_case(b"td") => {
                close_cell(&mut tables, &mut cell, &mut in_cell);
            }
            Ok(Event::Start(tag) | Event::Empty(tag)) if in_cell && is_element(&tag, b"a") => {
                if cell.href.is_none() {
                    cell.href = href_attribute(&tag);
                }
            }
            Ok(Event::Text(content)) if in_cell => {
                let text = match content.unescape_with(resolve_cell_entity) {
                    Ok(text) => text,
                    Err(_) => String::from_utf8_lossy(content.as_ref()),
                };
                append_cell_text(&mut cell, text.trim());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(Splib07Error::Markup(format!("{source}: {err}"))),
        }
    }

    Ok(tables)
}

/// The archive's old-style HTML omits some `</td>` closers; an open cell is
/// also terminated by the next cell, row or table boundary.
fn close_cell(tables: &mut [Table], cell: &mut Cell, in_cell: &mut bool) {
    if !*in_cell {
        return;
    }
    *in_cell = false;
    if let Some(row) = tables.last_mut().and_then(|table| table.last_mut()) {
        row.push(std::mem::take(cell));
    }
}

fn append_cell_text(cell: &mut Cell, text: &str) {
    if text.is_empty() {
        return;
    }
    if !cell.text.is_empty() {
        cell.text.push(' ');
    }
    cell.text.push_str(text);
}

/// Entity resolver for cell text: the XML-predefined entities decode to
/// their character, `&nbsp;` (the archive's empty-cell filler) to a plain
/// space. Character references are handled by the unescaper itself.
fn resolve_cell_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some(" "),
        _ => resolve_predefined_entity(entity),
    }
}

/// Destructure one data row into a typed entry.
///
/// Layout: 7 fixed leading cells, a variable-length run of extra range-plot
/// cells, then 2 fixed trailing cells. The extra count is discovered from
/// the total arity; it is archive-format-coupled, not a constant.
fn decode_row(row: &Row) -> Result<SpectrumEntry, Splib07Error> {
    if row.len() < LEADING_CELLS + TRAILING_CELLS {
        return Err(Splib07Error::StructuralMismatch {
            context: format!("datatable row cells {:?}", raw_cells(row)),
            expected: LEADING_CELLS + TRAILING_CELLS,
            found: row.len(),
        });
    }

    let name = spectrum_identifier(&row[0].text);
    let trailing_start = row.len() - TRAILING_CELLS;

    Ok(SpectrumEntry {
        description: required(&row[1], "description", &name, row)?,
        spectrum_asciidata: optional(&row[2]),
        error_asciidata: optional(&row[3]),
        wavelengths_asciidata: required(&row[4], "wavelengths", &name, row)?,
        bandpass_asciidata: required(&row[5], "bandpass", &name, row)?,
        range_plot: optional(&row[6]),
        extra_range_plots: row[LEADING_CELLS..trailing_start]
            .iter()
            .map(optional)
            .collect(),
        wavelength_plot: required(&row[trailing_start], "wavelength plot", &name, row)?,
        bandpass_plot: required(&row[trailing_start + 1], "bandpass plot", &name, row)?,
        name,
    })
}

fn required(
    cell: &Cell,
    field: &'static str,
    row_name: &str,
    row: &Row,
) -> Result<Utf8PathBuf, Splib07Error> {
    match &cell.href {
        Some(href) => Ok(link_path(href)),
        None => Err(Splib07Error::MissingRequiredField {
            row: row_name.to_string(),
            cell: field,
            raw_cells: raw_cells(row),
        }),
    }
}

fn optional(cell: &Cell) -> Option<Utf8PathBuf> {
    cell.href.as_deref().map(link_path)
}

/// Link targets are written relative to the `indexes` directory; strip the
/// parent references so the stored path is relative to the archive root.
fn link_path(href: &str) -> Utf8PathBuf {
    let mut rest = href;
    while let Some(stripped) = rest.strip_prefix("../") {
        rest = stripped;
    }
    Utf8PathBuf::from(rest)
}

/// File stem of a TOC link with the `datatable_` prefix removed.
fn toc_link_stem(href: &str) -> &str {
    let file = href.rsplit('/').next().unwrap_or(href);
    let stem = Utf8Path::new(file).file_stem().unwrap_or(file);
    stem.strip_prefix("datatable_").unwrap_or(stem)
}

fn lenient_reader(text: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(text);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.trim_text(true);
    reader
}

fn is_element(tag: &BytesStart<'_>, name: &[u8]) -> bool {
    tag.local_name().as_ref().eq_ignore_ascii_case(name)
}

fn href_attribute(tag: &BytesStart<'_>) -> Option<String> {
    tag.attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(b"href"))
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn raw_cells(row: &Row) -> Vec<String> {
    row.iter().map(|cell| cell.text.clone()).collect()
}
