use crate::error::BannerSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";       // Package relationship
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content

/// Represents an Excel XLSX spreadsheet file
pub(crate) struct XlsxSpreadsheet {
    /// File name of the spreadsheet
    pub(crate) name: String,
    /// ZIP archive containing the XLSX file contents
    zip: ZipArchive<UnifiedReader>,
    /// List of worksheets with (name, zip_path) pairs
    sheets: Vec<(String, String)>,
    /// Shared string table, loaded on first sheet read
    shared_strings: Option<Vec<String>>,
}

impl XlsxSpreadsheet {
    /// Opens an XLSX spreadsheet file and parses its workbook structure
    pub(crate) fn open(file_name: &str) -> Result<XlsxSpreadsheet, BannerSheetError> {
        let reader = UnifiedReader::new(file_name)?;
        Self::from_reader(file_name, reader)
    }

    pub(crate) fn from_reader(file_name: &str, mut reader: UnifiedReader) -> Result<XlsxSpreadsheet, BannerSheetError> {
        // Encrypted workbooks are wrapped in a CFB container instead of a zip
        if reader.is_compound_file()? {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?;
        }

        let mut zip = ZipArchive::new(reader)?;
        let sheets = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }
        Ok(XlsxSpreadsheet {
            name: file_name.to_owned(),
            zip,
            sheets,
            shared_strings: None,
        })
    }

    /// Loads shared strings from the XLSX file
    ///
    /// Shared strings are stored in a separate XML file and referenced by index
    /// to reduce file size when the same string appears multiple times.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, BannerSheetError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };

        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
                shared_strings.push(string);
            }
        });
        Ok(shared_strings)
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Parses the worksheet XML and collects every cell with a value.
    fn read_grid(&mut self, sheet_name: &str) -> Result<Grid, BannerSheetError> {
        if self.shared_strings.is_none() {
            self.shared_strings = Some(self.load_shared_strings()?);
        }
        let shared_strings = self.shared_strings.as_deref().unwrap_or_default();
        let zip_path = self.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| SpreadsheetError::SheetNotFoundError(sheet_name.to_owned()))?;

        let mut grid = Grid::new(&self.name, sheet_name);
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut is_shared = false;
        let mut value = String::new();
        let mut reader = self.zip.xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                // Rows may skip numbers; the r attribute is 1-based
                if let Some(number) = event.get_attribute_value("r")? {
                    row_count = number.parse::<usize>().map(|it| it.saturating_sub(1)).unwrap_or(row_count);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                is_shared = false;
                value.clear();
                kind = match event.get_attribute_value("t")?.as_deref() {
                    Some("s") => {
                        is_shared = true;
                        CellType::Text
                    }
                    Some("inlineStr") | Some("str") | Some("d") => CellType::Text,
                    Some("b") => CellType::Boolean,
                    Some("e") => CellType::Error,
                    _ => CellType::Number,
                };
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if !value.is_empty() {
                    if is_shared {
                        let index = value.trim().parse::<usize>()?;
                        value = shared_strings.get(index).cloned().unwrap_or_default();
                    }
                    grid.push(Cell::new(row, col, kind, value.to_owned()));
                }
                value.clear();
            }
        });
        Ok(grid)
    }
}

/// Loads worksheet names and their XML part paths from the workbook.
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<(String, String)>, BannerSheetError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            // The relationship id is namespaced, usually as r:id
            let name = event.get_attribute_value("name")?;
            let id = event.get_local_attribute_value("id")?;
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
    });
    Ok(sheets)
}

/// Loads worksheet relationships, mapping relationship IDs to part paths.
fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, BannerSheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only process worksheet relationships
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path inside the zip archive
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        stripped.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Phonetic annotations (`rPh`) are skipped; rich text runs are concatenated.
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, UnifiedReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, BannerSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_reference(&event)?,
    });
    Ok(text)
}
