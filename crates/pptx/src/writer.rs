//! PPTX renderer: outline in, presentation package out.

use crate::document::RenderedDocument;
use crate::error::{Error, Result};
use crate::template::*;
use quick_xml::escape::escape;
use slidegen_core::{Outline, Slide};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Slide width in EMUs (10 inches, 4:3).
const SLIDE_WIDTH: i64 = 9_144_000;
/// Slide height in EMUs (7.5 inches).
const SLIDE_HEIGHT: i64 = 6_858_000;

/// Relationship id of the first slide in `presentation.xml.rels`.
const FIRST_SLIDE_REL: usize = PRESENTATION_FIXED_RELS.len() + 1;

/// First slide id; PowerPoint requires ids of 256 and above.
const FIRST_SLIDE_ID: usize = 256;

/// Renderer for PPTX (Office Open XML) presentations.
///
/// The layout policy is fixed: the first slide uses the Title Slide layout
/// with its bullets joined, one per line, into the subtitle; every later
/// slide uses Title and Content with one top-level paragraph per bullet.
#[derive(Debug, Clone)]
pub struct PptxRenderer {
    /// Name recorded as the package author.
    author: String,
}

impl Default for PptxRenderer {
    fn default() -> Self {
        Self {
            author: "slidegen".to_string(),
        }
    }
}

impl PptxRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the author recorded in the document properties.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Render an outline into an in-memory package.
    pub fn render(&self, outline: &Outline) -> Result<RenderedDocument> {
        outline.validate()?;

        let bytes = self.write_package(outline, Cursor::new(Vec::new()))?.into_inner();
        log::debug!(
            "Rendered {} slides into {} bytes",
            outline.slides.len(),
            bytes.len()
        );

        Ok(RenderedDocument::new(bytes, outline.slides.len()))
    }

    /// Render an outline and write the package to `path`.
    pub fn render_to_path(&self, outline: &Outline, path: &Path) -> Result<RenderedDocument> {
        let document = self.render(outline)?;
        document.write_to(path)?;
        Ok(document)
    }

    /// Write every package part into a ZIP archive.
    fn write_package<W: Write + Seek>(&self, outline: &Outline, sink: W) -> Result<W> {
        let mut zip = ZipWriter::new(sink);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let slide_count = outline.slides.len();

        add_part(&mut zip, options, "[Content_Types].xml", &content_types_xml(slide_count))?;
        add_part(&mut zip, options, "_rels/.rels", &root_rels_xml())?;
        add_part(&mut zip, options, "docProps/core.xml", &self.core_props_xml(outline))?;
        add_part(&mut zip, options, "docProps/app.xml", &app_props_xml(slide_count))?;

        add_part(&mut zip, options, "ppt/presentation.xml", &presentation_xml(slide_count))?;
        add_part(
            &mut zip,
            options,
            "ppt/_rels/presentation.xml.rels",
            &presentation_rels_xml(slide_count),
        )?;
        add_part(&mut zip, options, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML)?;
        add_part(
            &mut zip,
            options,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            SLIDE_MASTER_RELS_XML,
        )?;
        add_part(&mut zip, options, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_TITLE_XML)?;
        add_part(
            &mut zip,
            options,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            SLIDE_LAYOUT_RELS_XML,
        )?;
        add_part(&mut zip, options, "ppt/slideLayouts/slideLayout2.xml", SLIDE_LAYOUT_CONTENT_XML)?;
        add_part(
            &mut zip,
            options,
            "ppt/slideLayouts/_rels/slideLayout2.xml.rels",
            SLIDE_LAYOUT_RELS_XML,
        )?;
        add_part(&mut zip, options, "ppt/theme/theme1.xml", THEME_XML)?;
        add_part(&mut zip, options, "ppt/presProps.xml", PRES_PROPS_XML)?;
        add_part(&mut zip, options, "ppt/viewProps.xml", VIEW_PROPS_XML)?;
        add_part(&mut zip, options, "ppt/tableStyles.xml", TABLE_STYLES_XML)?;

        for (index, slide) in outline.slides.iter().enumerate() {
            let number = index + 1;
            let (xml, layout) = if index == 0 {
                (title_slide_xml(slide), 1)
            } else {
                (content_slide_xml(slide), 2)
            };
            add_part(&mut zip, options, &format!("ppt/slides/slide{}.xml", number), &xml)?;
            add_part(
                &mut zip,
                options,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                &slide_rels_xml(layout),
            )?;
        }

        zip.finish()
            .map_err(|e| Error::Zip(format!("Failed to finish archive: {}", e)))
    }

    /// Generate docProps/core.xml, titled after the first slide.
    fn core_props_xml(&self, outline: &Outline) -> String {
        let title = outline
            .title_slide()
            .map(|s| s.title.as_str())
            .unwrap_or_default();
        let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECLARATION);
        xml.push_str(concat!(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
        ));
        xml.push_str(&format!("<dc:title>{}</dc:title>", xml_text(title)));
        xml.push_str(&format!("<dc:creator>{}</dc:creator>", xml_text(&self.author)));
        xml.push_str(&format!(
            "<cp:lastModifiedBy>{}</cp:lastModifiedBy>",
            xml_text(&self.author)
        ));
        xml.push_str("<cp:revision>1</cp:revision>");
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>"#
        ));
        xml.push_str(&format!(
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#
        ));
        xml.push_str("</cp:coreProperties>");
        xml
    }
}

/// Start a ZIP entry and write its content.
fn add_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    name: &str,
    content: &str,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| Error::Zip(format!("Failed to start '{}': {}", name, e)))?;
    zip.write_all(content.as_bytes())?;
    Ok(())
}

fn content_types_xml(slide_count: usize) -> String {
    let mut xml = String::with_capacity(2048 + slide_count * 128);
    xml.push_str(XML_DECLARATION);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (part, content_type) in FIXED_OVERRIDES {
        xml.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            part, content_type
        ));
    }
    for number in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="{}"/>"#,
            number, CT_SLIDE
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    relationships_xml(&[
        (REL_OFFICE_DOCUMENT, "ppt/presentation.xml".to_string()),
        (REL_CORE_PROPS, "docProps/core.xml".to_string()),
        (REL_EXTENDED_PROPS, "docProps/app.xml".to_string()),
    ])
}

fn app_props_xml(slide_count: usize) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECLARATION);
    xml.push_str(concat!(
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
        r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
    ));
    xml.push_str("<Application>slidegen</Application>");
    xml.push_str("<PresentationFormat>On-screen Show (4:3)</PresentationFormat>");
    xml.push_str(&format!("<Slides>{}</Slides>", slide_count));
    xml.push_str("</Properties>");
    xml
}

fn presentation_xml(slide_count: usize) -> String {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_DECLARATION);
    xml.push_str(&format!(
        r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
        NS_A, NS_R, NS_P
    ));
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

    xml.push_str("<p:sldIdLst>");
    for index in 0..slide_count {
        xml.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            FIRST_SLIDE_ID + index,
            FIRST_SLIDE_REL + index
        ));
    }
    xml.push_str("</p:sldIdLst>");

    xml.push_str(&format!(
        r#"<p:sldSz cx="{}" cy="{}" type="screen4x3"/>"#,
        SLIDE_WIDTH, SLIDE_HEIGHT
    ));
    xml.push_str(&format!(
        r#"<p:notesSz cx="{}" cy="{}"/>"#,
        SLIDE_HEIGHT, SLIDE_WIDTH
    ));
    xml.push_str("</p:presentation>");
    xml
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels: Vec<(&str, String)> = PRESENTATION_FIXED_RELS
        .iter()
        .map(|(rel_type, target)| (*rel_type, target.to_string()))
        .collect();
    for number in 1..=slide_count {
        rels.push((REL_SLIDE, format!("slides/slide{}.xml", number)));
    }
    relationships_xml(&rels)
}

fn slide_rels_xml(layout: usize) -> String {
    relationships_xml(&[(
        REL_SLIDE_LAYOUT,
        format!("../slideLayouts/slideLayout{}.xml", layout),
    )])
}

/// Build a relationships part with ids `rId1..` in the given order.
fn relationships_xml(rels: &[(&str, String)]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECLARATION);
    xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, NS_RELS));
    for (i, (rel_type, target)) in rels.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}" Target="{}"/>"#,
            i + 1,
            rel_type,
            escape(target.as_str())
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Title Slide: heading in `ctrTitle`, bullets one per line in `subTitle`.
fn title_slide_xml(slide: &Slide) -> String {
    let subtitle = slide.content.join("\n");
    let lines: Vec<&str> = subtitle.split('\n').collect();

    let mut xml = slide_open();
    write_placeholder(&mut xml, 2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, &[slide.title.as_str()]);
    write_placeholder(
        &mut xml,
        3,
        "Subtitle 2",
        r#"<p:ph type="subTitle" idx="1"/>"#,
        &lines,
    );
    slide_close(&mut xml);
    xml
}

/// Title and Content: heading in `title`, one level-0 paragraph per bullet.
fn content_slide_xml(slide: &Slide) -> String {
    let bullets: Vec<&str> = slide.content.iter().map(String::as_str).collect();

    let mut xml = slide_open();
    write_placeholder(&mut xml, 2, "Title 1", r#"<p:ph type="title"/>"#, &[slide.title.as_str()]);
    write_placeholder(
        &mut xml,
        3,
        "Content Placeholder 2",
        r#"<p:ph idx="1"/>"#,
        &bullets,
    );
    slide_close(&mut xml);
    xml
}

fn slide_open() -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECLARATION);
    xml.push_str(&format!(
        r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
        NS_A, NS_R, NS_P
    ));
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(SP_TREE_HEADER);
    xml
}

fn slide_close(xml: &mut String) {
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
}

/// Write a placeholder shape holding one paragraph per entry.
///
/// Position and size are inherited from the layout.
fn write_placeholder(xml: &mut String, id: u32, name: &str, ph: &str, paragraphs: &[&str]) {
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(&format!(r#"<p:cNvPr id="{}" name="{}"/>"#, id, name));
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str(&format!("<p:nvPr>{}</p:nvPr>", ph));
    xml.push_str("</p:nvSpPr><p:spPr/>");
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    if paragraphs.is_empty() {
        write_paragraph(xml, "");
    }
    for paragraph in paragraphs {
        write_paragraph(xml, paragraph);
    }
    xml.push_str("</p:txBody></p:sp>");
}

/// Write one paragraph. Embedded newlines become soft line breaks so the
/// paragraph count always matches the entries given.
fn write_paragraph(xml: &mut String, text: &str) {
    xml.push_str("<a:p>");
    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str(r#"<a:br><a:rPr lang="en-US" dirty="0"/></a:br>"#);
        }
        if !segment.is_empty() {
            xml.push_str(r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>"#);
            xml.push_str(&xml_text(segment));
            xml.push_str("</a:t></a:r>");
        }
    }
    xml.push_str(r#"<a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
}

/// Escape text for element content, dropping characters XML 1.0 forbids.
///
/// Carriage returns are written as `&#xD;` so parsers keep them.
fn xml_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || !c.is_control())
        .collect();
    escape(cleaned.as_str()).replace('\r', "&#xD;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_text_escapes() {
        assert_eq!(xml_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(xml_text("bell\u{7}"), "bell");
        assert_eq!(xml_text("Line\r"), "Line&#xD;");
    }

    #[test]
    fn test_author_recorded_in_core_props() {
        use std::io::Read;

        let outline = Outline {
            slides: vec![Slide::new("Deck", ["Overview"])],
        };
        let document = PptxRenderer::new()
            .with_author("Deck Bot")
            .render(&outline)
            .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(document.bytes())).unwrap();
        let mut core = String::new();
        archive
            .by_name("docProps/core.xml")
            .unwrap()
            .read_to_string(&mut core)
            .unwrap();
        assert!(core.contains("<dc:creator>Deck Bot</dc:creator>"));
        assert!(core.contains("<dc:title>Deck</dc:title>"));
    }

    #[test]
    fn test_paragraph_with_break() {
        let mut xml = String::new();
        write_paragraph(&mut xml, "one\ntwo");
        assert_eq!(xml.matches("<a:p>").count(), 1);
        assert_eq!(xml.matches("<a:br>").count(), 1);
        assert!(xml.contains("<a:t>one</a:t>"));
        assert!(xml.contains("<a:t>two</a:t>"));
    }

    #[test]
    fn test_empty_paragraph_has_no_run() {
        let mut xml = String::new();
        write_paragraph(&mut xml, "");
        assert!(!xml.contains("<a:r>"));
        assert!(xml.contains("<a:endParaRPr"));
    }

    #[test]
    fn test_content_slide_paragraphs() {
        let slide = Slide::new("Heading", ["a", "b", "c"]);
        let xml = content_slide_xml(&slide);
        assert!(xml.contains(r#"<p:ph type="title"/>"#));
        assert!(xml.contains(r#"<p:ph idx="1"/>"#));
        // One title paragraph plus three body paragraphs
        assert_eq!(xml.matches("<a:p>").count(), 4);
        assert!(!xml.contains("lvl="));
    }

    #[test]
    fn test_title_slide_joins_lines() {
        let slide = Slide::new("Deck", ["first", "second"]);
        let xml = title_slide_xml(&slide);
        assert!(xml.contains(r#"<p:ph type="ctrTitle"/>"#));
        assert!(xml.contains(r#"<p:ph type="subTitle" idx="1"/>"#));
        assert_eq!(xml.matches("<a:p>").count(), 3);
    }

    #[test]
    fn test_presentation_rel_ids_line_up() {
        let xml = presentation_xml(2);
        let rels = presentation_rels_xml(2);
        assert!(xml.contains(&format!(r#"r:id="rId{}""#, FIRST_SLIDE_REL)));
        assert!(rels.contains(&format!(
            r#"Id="rId{}" Type="{}" Target="slides/slide1.xml""#,
            FIRST_SLIDE_REL, REL_SLIDE
        )));
        assert!(rels.contains(&format!(
            r#"Id="rId{}" Type="{}" Target="slides/slide2.xml""#,
            FIRST_SLIDE_REL + 1,
            REL_SLIDE
        )));
    }

    #[test]
    fn test_content_types_lists_slides() {
        let xml = content_types_xml(3);
        assert!(xml.contains("/ppt/slides/slide3.xml"));
        assert!(!xml.contains("/ppt/slides/slide4.xml"));
    }
}
