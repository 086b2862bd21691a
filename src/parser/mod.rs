// Artifact parsing behind a trait so the reader does not depend on the EPUB crate

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use epub::doc::EpubDoc;
use scraper::{Html, Selector};
use thiserror::Error;

use crate::domain::models::{Chapter, Document};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid document {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

pub trait DocumentParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Document, ParseError>;
}

/// EPUB container parser. Chapters follow the spine order.
#[derive(Debug, Default, Clone, Copy)]
pub struct EpubParser;

impl DocumentParser for EpubParser {
    fn parse(&self, path: &Path) -> Result<Document, ParseError> {
        if !path.is_file() {
            return Err(ParseError::FileNotFound(path.to_path_buf()));
        }
        tracing::info!(path = %path.display(), "Loading EPUB");
        let mut doc = EpubDoc::new(path).map_err(|e| ParseError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let cover = doc.get_cover();
        let mut chapters = Vec::new();
        loop {
            if let Some((content, _mime)) = doc.get_current_str() {
                let index = chapters.len();
                chapters.push(Chapter {
                    index,
                    title: chapter_title(&content).unwrap_or_else(|| format!("Chapter {}", index + 1)),
                    content,
                });
            }
            if !doc.go_next() {
                break;
            }
        }

        if chapters.is_empty() {
            return Err(ParseError::Invalid {
                path: path.to_path_buf(),
                reason: "no readable chapters".into(),
            });
        }
        tracing::debug!(chapters = chapters.len(), has_cover = cover.is_some(), "Parsed EPUB");
        Ok(Document {
            title: metadata(&doc, "title"),
            author: metadata(&doc, "creator"),
            chapters,
            cover,
        })
    }
}

/// Text of the first non-empty `<title>`, `<h1>` or `<h2>` element of a chapter.
fn chapter_title(xhtml: &str) -> Option<String> {
    let html = Html::parse_document(xhtml);
    ["title", "h1", "h2"].iter().find_map(|tag| {
        let selector = Selector::parse(tag).ok()?;
        html.select(&selector).find_map(|element| {
            let text = element.text().collect::<String>();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(text)
        })
    })
}

fn metadata(doc: &EpubDoc<BufReader<File>>, property: &str) -> Option<String> {
    doc.mdata(property)
        .map(|value| value.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const PACKAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">gutenberg-84</dc:identifier>
    <dc:title>Frankenstein</dc:title>
    <dc:creator>Mary Wollstonecraft Shelley</dc:creator>
    <dc:language>en</dc:language>
    <meta name="cover" content="cover-img"/>
  </metadata>
  <manifest>
    <item id="cover-img" href="cover.jpg" media-type="image/jpeg" properties="cover-image"/>
    <item id="letter1" href="letter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="letter1"/>
    <itemref idref="ch1"/>
  </spine>
</package>"#;

    const LETTER_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Letter 1</title></head>
<body><p>To Mrs. Saville, England.</p></body></html>"#;

    const CHAPTER_1: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title></title></head>
<body><h2>Chapter 1</h2><p>I am by birth a Genevese.</p></body></html>"#;

    const COVER: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];

    fn write_epub(path: &Path) {
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let entries: [(&str, &[u8]); 6] = [
            ("mimetype", b"application/epub+zip"),
            ("META-INF/container.xml", CONTAINER.as_bytes()),
            ("OEBPS/content.opf", PACKAGE.as_bytes()),
            ("OEBPS/letter1.xhtml", LETTER_1.as_bytes()),
            ("OEBPS/ch1.xhtml", CHAPTER_1.as_bytes()),
            ("OEBPS/cover.jpg", COVER),
        ];
        for (name, data) in entries {
            zip.start_file(name, stored).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn epub_spine_metadata_and_cover_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Frankenstein_84.epub");
        write_epub(&path);

        let doc = EpubParser.parse(&path).unwrap();
        assert_eq!(doc.title.as_deref(), Some("Frankenstein"));
        assert_eq!(doc.author.as_deref(), Some("Mary Wollstonecraft Shelley"));
        let titles: Vec<&str> = doc.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Letter 1", "Chapter 1"]);
        assert_eq!(doc.chapters[1].index, 1);
        assert!(doc.chapters[1].content.contains("Genevese"));
        assert_eq!(doc.cover, Some((COVER.to_vec(), "image/jpeg".to_string())));
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = EpubParser
            .parse(Path::new("/definitely/not/here.epub"))
            .unwrap_err();
        assert!(matches!(err, ParseError::FileNotFound(_)));
    }

    #[test]
    fn garbage_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        let err = EpubParser.parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Invalid { .. }));
    }

    #[test]
    fn chapter_title_prefers_title_then_headings() {
        let xhtml = r#"<html><head><title>Letter 1</title></head><body><h1>Ignored</h1></body></html>"#;
        assert_eq!(chapter_title(xhtml).as_deref(), Some("Letter 1"));

        let xhtml = r#"<html><head><title> </title></head><body><h2 class="c">Chapter <em>IV</em></h2></body></html>"#;
        assert_eq!(chapter_title(xhtml).as_deref(), Some("Chapter IV"));

        assert_eq!(chapter_title("<p>plain</p>"), None);
    }

    #[test]
    fn chapter_title_decodes_entities_and_ignores_tag_case() {
        let xhtml = "<html><head><title>Pride &amp; Prejudice</title></head></html>";
        assert_eq!(chapter_title(xhtml).as_deref(), Some("Pride & Prejudice"));

        let xhtml = "<HTML><BODY><H1>Letter&nbsp;IV &#8212; Walton</H1></BODY></HTML>";
        assert_eq!(chapter_title(xhtml).as_deref(), Some("Letter IV \u{2014} Walton"));
    }
}
