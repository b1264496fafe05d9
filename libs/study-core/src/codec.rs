//! XML persistence for study lists.
//!
//! # Format
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <studylist version="1" name="Animals" hintReadings="true" hintExamples="false" showReversed="true">
//!   <item shown="3" correct="2">
//!     <phrase>猫</phrase>
//!     <readings>ねこ</readings>
//!     <meanings>cat</meanings>
//!     <example>
//!       <source>猫がいる</source>
//!       <destination>There is a cat</destination>
//!     </example>
//!   </item>
//! </studylist>
//! ```
//!
//! Absent optional elements mean "no value"; an empty element is an empty string.

use crate::error::{Result, StudyError};
use crate::item::Item;
use crate::list::{ListEvent, StudyList};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Version written to and accepted from the root element.
pub const FORMAT_VERSION: u32 = 1;

const ROOT: &str = "studylist";
const ITEM: &str = "item";
const PHRASE: &str = "phrase";
const READINGS: &str = "readings";
const MEANINGS: &str = "meanings";
const EXAMPLE: &str = "example";
const SOURCE: &str = "source";
const DESTINATION: &str = "destination";

/// Write a list to `path`, replacing any previous file only once the whole
/// document is written. Clears the modified flag on success.
pub fn save(path: impl AsRef<Path>, list: &mut StudyList) -> Result<()> {
    let path = path.as_ref();
    let xml = to_xml(list)?;

    let tmp_path = tmp_path(path);
    if let Err(err) = fs::write(&tmp_path, xml).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        tracing::warn!(path = %path.display(), error = %err, "failed to save study list");
        return Err(err.into());
    }

    list.mark_clean(ListEvent::Saved);
    tracing::info!(path = %path.display(), items = list.len(), "saved study list");
    Ok(())
}

/// Read a list from `path`. The returned list is unmodified.
pub fn load(path: impl AsRef<Path>) -> Result<StudyList> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let list = from_xml(&content)?;
    tracing::info!(path = %path.display(), items = list.len(), "loaded study list");
    Ok(list)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Check every item has the fields required for persistence.
pub fn validate(list: &StudyList) -> Result<()> {
    for (index, item) in list.items().iter().enumerate() {
        item.validate()
            .map_err(|field| StudyError::Validation { index, field })?;
    }
    Ok(())
}

/// Serialize a list in registry order.
pub fn to_xml(list: &StudyList) -> Result<String> {
    validate(list)?;

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let version = FORMAT_VERSION.to_string();
    let mut root = BytesStart::new(ROOT);
    root.push_attribute(("version", version.as_str()));
    root.push_attribute(("name", list.name()));
    root.push_attribute(("hintReadings", bool_str(list.hint_readings())));
    root.push_attribute(("hintExamples", bool_str(list.hint_example())));
    root.push_attribute(("showReversed", bool_str(list.show_reversed_cards())));
    writer.write_event(Event::Start(root))?;

    for item in list.items() {
        write_item(&mut writer, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;
    String::from_utf8(writer.into_inner()).map_err(|e| StudyError::format(e.to_string()))
}

fn write_item(writer: &mut Writer<Vec<u8>>, item: &Item) -> Result<()> {
    let shown = item.shown_count().to_string();
    let correct = item.correct_count().to_string();
    let mut start = BytesStart::new(ITEM);
    start.push_attribute(("shown", shown.as_str()));
    start.push_attribute(("correct", correct.as_str()));
    writer.write_event(Event::Start(start))?;

    write_text(writer, PHRASE, &item.phrase)?;
    if let Some(readings) = &item.readings {
        write_text(writer, READINGS, readings)?;
    }
    write_text(writer, MEANINGS, &item.meanings)?;

    if item.example_source.is_some() || item.example_dest.is_some() {
        writer.write_event(Event::Start(BytesStart::new(EXAMPLE)))?;
        if let Some(source) = &item.example_source {
            write_text(writer, SOURCE, source)?;
        }
        if let Some(dest) = &item.example_dest {
            write_text(writer, DESTINATION, dest)?;
        }
        writer.write_event(Event::End(BytesEnd::new(EXAMPLE)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ITEM)))?;
    Ok(())
}

fn write_text(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Parse and validate a document. Either the whole list is produced or an
/// error is returned.
pub fn from_xml(content: &str) -> Result<StudyList> {
    let mut reader = Reader::from_str(content);

    let mut list = loop {
        match next_event(&mut reader)? {
            Event::Start(e) => break read_root(&mut reader, &e, false)?,
            Event::Empty(e) => break read_root(&mut reader, &e, true)?,
            Event::Eof => return Err(StudyError::format("document has no root element")),
            event => skip_misc(&event)?,
        }
    };

    loop {
        match next_event(&mut reader)? {
            Event::Eof => break,
            event => skip_misc(&event)?,
        }
    }

    list.mark_clean(ListEvent::Loaded);
    Ok(list)
}

/// Accept prolog, comments and whitespace; reject anything else.
fn skip_misc(event: &Event<'_>) -> Result<()> {
    match event {
        Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => Ok(()),
        Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => Ok(()),
        Event::Start(e) | Event::Empty(e) => Err(StudyError::format(format!(
            "unexpected element <{}>",
            String::from_utf8_lossy(e.name().as_ref())
        ))),
        _ => Err(StudyError::format("unexpected content")),
    }
}

fn read_root(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>, empty: bool) -> Result<StudyList> {
    if start.name().as_ref() != ROOT.as_bytes() {
        return Err(StudyError::format(format!(
            "expected <{ROOT}> root element, found <{}>",
            String::from_utf8_lossy(start.name().as_ref())
        )));
    }

    let mut version = None;
    let mut name = None;
    let mut hint_readings = false;
    let mut hint_examples = false;
    let mut show_reversed = false;

    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let value = attr.unescape_value().map_err(malformed)?;
        match attr.key.as_ref() {
            b"version" => version = Some(parse_number(&attr, &value)?),
            b"name" => name = Some(value.into_owned()),
            b"hintReadings" => hint_readings = parse_bool(&attr, &value)?,
            b"hintExamples" => hint_examples = parse_bool(&attr, &value)?,
            b"showReversed" => show_reversed = parse_bool(&attr, &value)?,
            _ => return Err(unknown_attribute(&attr, ROOT)),
        }
    }

    match version {
        Some(FORMAT_VERSION) => {}
        Some(other) => {
            tracing::warn!(version = other, "rejected study list with unsupported version");
            return Err(StudyError::format(format!(
                "unsupported format version {other}"
            )));
        }
        None => return Err(StudyError::format("missing format version")),
    }
    let name = name.ok_or_else(|| StudyError::format("missing list name"))?;

    let mut list = StudyList::new(name);
    list.set_hint_readings(hint_readings);
    list.set_hint_example(hint_examples);
    list.set_show_reversed_cards(show_reversed);

    if empty {
        return Ok(list);
    }

    loop {
        match next_event(reader)? {
            Event::Start(e) if e.name().as_ref() == ITEM.as_bytes() => {
                let item = read_item(reader, &e, false, list.len())?;
                list.push_item(item)?;
            }
            Event::Empty(e) if e.name().as_ref() == ITEM.as_bytes() => {
                let item = read_item(reader, &e, true, list.len())?;
                list.push_item(item)?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof(ROOT)),
            event => skip_misc(&event)?,
        }
    }

    Ok(list)
}

fn read_item(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    empty: bool,
    index: usize,
) -> Result<Item> {
    let mut shown = None;
    let mut correct = None;
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let value = attr.unescape_value().map_err(malformed)?;
        match attr.key.as_ref() {
            b"shown" => shown = Some(parse_number(&attr, &value)?),
            b"correct" => correct = Some(parse_number(&attr, &value)?),
            _ => return Err(unknown_attribute(&attr, ITEM)),
        }
    }
    let shown = shown.ok_or_else(|| missing(index, "shown attribute"))?;
    let correct = correct.ok_or_else(|| missing(index, "correct attribute"))?;
    if correct > shown {
        return Err(StudyError::format(format!(
            "item {index}: correct count {correct} exceeds shown count {shown}"
        )));
    }

    let mut phrase = None;
    let mut readings = None;
    let mut meanings = None;
    let mut example = None;

    while !empty {
        let (name, text) = match next_event(reader)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                if name == EXAMPLE.as_bytes() {
                    set_once(&mut example, read_example(reader, index)?, index, EXAMPLE)?;
                    continue;
                }
                let text = read_text(reader, &name)?;
                (name, text)
            }
            Event::Empty(e) => {
                let name = e.name().as_ref().to_vec();
                if name == EXAMPLE.as_bytes() {
                    set_once(&mut example, (None, None), index, EXAMPLE)?;
                    continue;
                }
                (name, String::new())
            }
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof(ITEM)),
            event => {
                skip_misc(&event)?;
                continue;
            }
        };
        match name.as_slice() {
            b"phrase" => set_once(&mut phrase, text, index, PHRASE)?,
            b"readings" => set_once(&mut readings, text, index, READINGS)?,
            b"meanings" => set_once(&mut meanings, text, index, MEANINGS)?,
            other => {
                return Err(StudyError::format(format!(
                    "item {index}: unexpected element <{}>",
                    String::from_utf8_lossy(other)
                )))
            }
        }
    }

    let phrase = phrase.ok_or_else(|| missing(index, "phrase"))?;
    let meanings = meanings.ok_or_else(|| missing(index, "meanings"))?;
    let (example_source, example_dest) = example.unwrap_or((None, None));

    let mut item = Item::new(phrase, meanings).with_counts(shown, correct);
    item.readings = readings;
    item.example_source = example_source;
    item.example_dest = example_dest;
    Ok(item)
}

fn read_example(
    reader: &mut Reader<&[u8]>,
    index: usize,
) -> Result<(Option<String>, Option<String>)> {
    let mut source = None;
    let mut dest = None;
    loop {
        let (name, text) = match next_event(reader)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let text = read_text(reader, &name)?;
                (name, text)
            }
            Event::Empty(e) => (e.name().as_ref().to_vec(), String::new()),
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof(EXAMPLE)),
            event => {
                skip_misc(&event)?;
                continue;
            }
        };
        match name.as_slice() {
            b"source" => set_once(&mut source, text, index, SOURCE)?,
            b"destination" => set_once(&mut dest, text, index, DESTINATION)?,
            other => {
                return Err(StudyError::format(format!(
                    "item {index}: unexpected element <{}> in example",
                    String::from_utf8_lossy(other)
                )))
            }
        }
    }
    Ok((source, dest))
}

/// Collect the text of a leaf element verbatim, up to its end tag.
fn read_text(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<String> {
    let mut text = String::new();
    loop {
        match next_event(reader)? {
            Event::Text(e) => text.push_str(&e.unescape().map_err(malformed)?),
            Event::CData(e) => text.push_str(
                std::str::from_utf8(&e).map_err(|e| StudyError::format(e.to_string()))?,
            ),
            Event::Comment(_) => {}
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(unexpected_eof(&String::from_utf8_lossy(name))),
            _ => {
                return Err(StudyError::format(format!(
                    "<{}> must contain only text",
                    String::from_utf8_lossy(name)
                )))
            }
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, index: usize, element: &str) -> Result<()> {
    if slot.is_some() {
        return Err(StudyError::format(format!(
            "item {index}: duplicate <{element}> element"
        )));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_number(attr: &Attribute<'_>, value: &Cow<'_, str>) -> Result<u32> {
    value.trim().parse().map_err(|_| {
        StudyError::format(format!(
            "attribute {} is not an unsigned integer: {value:?}",
            String::from_utf8_lossy(attr.key.as_ref())
        ))
    })
}

fn parse_bool(attr: &Attribute<'_>, value: &Cow<'_, str>) -> Result<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(StudyError::format(format!(
            "attribute {} is not a boolean: {value:?}",
            String::from_utf8_lossy(attr.key.as_ref())
        ))),
    }
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    reader.read_event().map_err(malformed)
}

fn malformed(err: impl std::fmt::Display) -> StudyError {
    StudyError::format(format!("malformed document: {err}"))
}

fn unknown_attribute(attr: &Attribute<'_>, element: &str) -> StudyError {
    StudyError::format(format!(
        "unknown attribute {} on <{element}>",
        String::from_utf8_lossy(attr.key.as_ref())
    ))
}

fn missing(index: usize, what: &str) -> StudyError {
    StudyError::format(format!("item {index} is missing its {what}"))
}

fn unexpected_eof(element: &str) -> StudyError {
    StudyError::format(format!("document ends inside <{element}>"))
}
