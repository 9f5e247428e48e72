//! PPTX reader recovering the visible text structure of a package.

use crate::deck::{DeckSlide, DeckText, SlideLayout};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Reader for PPTX (Office Open XML) files.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a PPTX package from a reader.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<DeckText> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::Zip(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;

        let mut deck = DeckText::default();
        for (idx, slide_path) in slide_order.iter().enumerate() {
            let content = self.read_file_from_archive(&mut archive, slide_path)?;
            deck.slides.push(parse_slide_xml(&content, idx + 1)?);
        }

        log::debug!("Read {} slides", deck.slides.len());
        Ok(deck)
    }

    /// Read a PPTX package from bytes.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<DeckText> {
        self.read(std::io::Cursor::new(bytes))
    }

    /// Get the ordered list of slide paths.
    ///
    /// The order comes from the `sldIdLst` in presentation.xml; packages
    /// without one fall back to ordering slide relationships by number.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = self.read_file_from_archive(archive, "ppt/_rels/presentation.xml.rels")?;
        let slide_rels = parse_slide_relationships(&rels_content)?;

        let presentation = self.read_file_from_archive(archive, "ppt/presentation.xml")?;
        let listed = parse_slide_id_list(&presentation)?;

        if !listed.is_empty() {
            return listed
                .iter()
                .map(|rel_id| {
                    slide_rels
                        .get(rel_id)
                        .cloned()
                        .ok_or_else(|| Error::Corrupted(format!("Slide relationship '{}' not found", rel_id)))
                })
                .collect();
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .into_values()
            .map(|path| {
                let number = extract_slide_number(&path);
                (path, number)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::Zip(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::Zip(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Map slide relationship ids to package paths.
fn parse_slide_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut slides = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let rel_type = attribute(e, b"Type").unwrap_or_default();
                let target = attribute(e, b"Target").unwrap_or_default();
                let id = attribute(e, b"Id").unwrap_or_default();

                if rel_type.ends_with("/slide") {
                    let full_path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    slides.insert(id, full_path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids of the slides listed in presentation.xml, in order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                if let Some(id) = attribute(e, b"r:id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing presentation: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Role a placeholder plays on the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaceholderRole {
    CenteredTitle,
    Title,
    Subtitle,
    Body,
}

impl PlaceholderRole {
    /// Classify a `p:ph` type attribute; a placeholder without one is a body.
    fn from_type(ph_type: Option<&str>) -> Option<Self> {
        match ph_type {
            Some("ctrTitle") => Some(Self::CenteredTitle),
            Some("title") => Some(Self::Title),
            Some("subTitle") => Some(Self::Subtitle),
            Some("body") | Some("obj") | None => Some(Self::Body),
            _ => None,
        }
    }
}

/// Text collected from one shape.
#[derive(Debug, Default)]
struct ShapeInfo {
    role: Option<PlaceholderRole>,
    paragraphs: Vec<String>,
}

/// Extract the placeholder text of one slide.
fn parse_slide_xml(xml_content: &str, number: usize) -> Result<DeckSlide> {
    let mut shapes: Vec<ShapeInfo> = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    // Text runs keep their exact whitespace.
    reader.trim_text(false);

    let mut current_shape: Option<ShapeInfo> = None;
    let mut current_paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current_shape = Some(ShapeInfo::default()),
                b"ph" => mark_placeholder(&mut current_shape, e),
                b"p" if current_shape.is_some() => current_paragraph = Some(String::new()),
                b"t" => in_text = current_paragraph.is_some(),
                b"br" => {
                    if let Some(ref mut paragraph) = current_paragraph {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => mark_placeholder(&mut current_shape, e),
                b"br" => {
                    if let Some(ref mut paragraph) = current_paragraph {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_text {
                    if let Some(ref mut paragraph) = current_paragraph {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("Bad text in slide {}: {}", number, e)))?;
                        paragraph.push_str(&text);
                    }
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    if let Some(shape) = current_shape.take() {
                        shapes.push(shape);
                    }
                    current_paragraph = None;
                    in_text = false;
                }
                b"p" => {
                    if let (Some(shape), Some(paragraph)) =
                        (current_shape.as_mut(), current_paragraph.take())
                    {
                        shape.paragraphs.push(paragraph);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing slide {}: {}", number, e)));
            }
            _ => {}
        }
    }

    let mut layout = SlideLayout::TitleAndContent;
    let mut title = String::new();
    let mut paragraphs = Vec::new();

    for shape in shapes {
        match shape.role {
            Some(PlaceholderRole::CenteredTitle) => {
                layout = SlideLayout::Title;
                title = shape.paragraphs.join("\n");
            }
            Some(PlaceholderRole::Title) => title = shape.paragraphs.join("\n"),
            Some(PlaceholderRole::Subtitle) => {
                layout = SlideLayout::Title;
                paragraphs.extend(shape.paragraphs);
            }
            Some(PlaceholderRole::Body) => paragraphs.extend(shape.paragraphs),
            None => {}
        }
    }

    Ok(DeckSlide {
        number,
        layout,
        title,
        paragraphs,
    })
}

fn mark_placeholder(shape: &mut Option<ShapeInfo>, e: &BytesStart) {
    if let Some(ref mut shape) = shape {
        shape.role = PlaceholderRole::from_type(attribute(e, b"type").as_deref());
    }
}

/// Read an attribute value by its qualified name.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a path like "ppt/slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("ppt/slides/slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_parse_slide_relationships() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
            <Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
            <Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="/ppt/slides/slide1.xml"/>
        </Relationships>"#;
        let rels = parse_slide_relationships(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels["rId7"], "ppt/slides/slide2.xml");
        assert_eq!(rels["rId6"], "ppt/slides/slide1.xml");
    }

    #[test]
    fn test_parse_slide_id_list() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst>
            <p:sldId id="257" r:id="rId9"/><p:sldId id="256" r:id="rId3"/>
        </p:sldIdLst></p:presentation>"#;
        assert_eq!(parse_slide_id_list(xml).unwrap(), vec!["rId9", "rId3"]);
    }

    #[test]
    fn test_parse_content_slide() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
              <p:txBody><a:p><a:r><a:t>Heading &amp; more</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:nvSpPr><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>
              <p:txBody><a:p><a:r><a:t>  first </a:t></a:r></a:p>
              <a:p><a:r><a:t>line</a:t></a:r><a:br/><a:r><a:t>break</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:txBody><a:p><a:r><a:t>free text box</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        let slide = parse_slide_xml(xml, 2).unwrap();
        assert_eq!(slide.number, 2);
        assert_eq!(slide.layout, SlideLayout::TitleAndContent);
        assert_eq!(slide.title, "Heading & more");
        assert_eq!(slide.paragraphs, vec!["  first ", "line\nbreak"]);
    }

    #[test]
    fn test_parse_title_slide() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:sp><p:nvSpPr><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr>
              <p:txBody><a:p><a:r><a:t>Deck</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:nvSpPr><p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr></p:nvSpPr>
              <p:txBody><a:p><a:endParaRPr/></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        let slide = parse_slide_xml(xml, 1).unwrap();
        assert_eq!(slide.layout, SlideLayout::Title);
        assert_eq!(slide.title, "Deck");
        assert_eq!(slide.subtitle(), "");
    }
}
