//! Lattes curriculum parsing and article extraction.
//!
//! Parsing is split in two steps. [`parse_curriculum`] walks the XML once and
//! keeps the raw attributes of every published article; [`extract_articles`]
//! applies defaults, identifier normalization and the year filter.

use crate::error::{Result, ScoreError};
use crate::identifier::{format_external_id, normalize_identifier};
use crate::types::{Article, YearRange};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

pub const DEFAULT_OWNER_NAME: &str = "Name not found";
pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_JOURNAL_TITLE: &str = "Untitled journal";
/// Placeholder for a missing ISSN or DOI.
pub const MISSING_IDENTIFIER: &str = "none";

const GENERAL_DATA: &[u8] = b"DADOS-GERAIS";
const ARTICLE: &[u8] = b"ARTIGO-PUBLICADO";
const ARTICLE_BASICS: &[u8] = b"DADOS-BASICOS-DO-ARTIGO";
const ARTICLE_DETAILS: &[u8] = b"DETALHAMENTO-DO-ARTIGO";
const AUTHOR: &[u8] = b"AUTORES";

/// The parts of a curriculum document the pipeline reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurriculumDocument {
    /// `DADOS-GERAIS/@NOME-COMPLETO` of the first general-data element.
    pub owner_name: Option<String>,
    /// Every `ARTIGO-PUBLICADO` element in document order.
    pub articles: Vec<ArticleElement>,
}

/// Raw attributes of one `ARTIGO-PUBLICADO` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleElement {
    pub title: Option<String>,
    pub year: Option<String>,
    pub doi: Option<String>,
    pub issn: Option<String>,
    pub journal_title: Option<String>,
    pub authors: Vec<String>,
}

/// Parse a curriculum XML document.
///
/// The encoding named in the XML declaration is honored, so ISO-8859-1
/// exports decode correctly.
pub fn parse_curriculum(xml: &[u8]) -> Result<CurriculumDocument> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut document = CurriculumDocument::default();
    let mut current: Option<ArticleElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == ARTICLE {
                    current = Some(ArticleElement::default());
                } else {
                    read_element(&e, reader.decoder(), &mut document, current.as_mut())?;
                }
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == ARTICLE {
                    document.articles.push(ArticleElement::default());
                } else {
                    read_element(&e, reader.decoder(), &mut document, current.as_mut())?;
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == ARTICLE {
                    if let Some(article) = current.take() {
                        document.articles.push(article);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ScoreError::Parse(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    debug!(articles = document.articles.len(), "Parsed curriculum document");
    Ok(document)
}

fn read_element(
    element: &BytesStart<'_>,
    decoder: Decoder,
    document: &mut CurriculumDocument,
    current: Option<&mut ArticleElement>,
) -> Result<()> {
    let name = element.name();
    match (name.as_ref(), current) {
        (GENERAL_DATA, _) if document.owner_name.is_none() => {
            document.owner_name = attribute(element, decoder, b"NOME-COMPLETO")?;
        }
        (ARTICLE_BASICS, Some(article)) => {
            article.title = attribute(element, decoder, b"TITULO-DO-ARTIGO")?;
            article.year = attribute(element, decoder, b"ANO-DO-ARTIGO")?;
            article.doi = attribute(element, decoder, b"DOI")?;
        }
        (ARTICLE_DETAILS, Some(article)) => {
            article.issn = attribute(element, decoder, b"ISSN")?;
            article.journal_title = attribute(element, decoder, b"TITULO-DO-PERIODICO-OU-REVISTA")?;
        }
        (AUTHOR, Some(article)) => {
            if let Some(author) = attribute(element, decoder, b"NOME-COMPLETO-DO-AUTOR")? {
                article.authors.push(author);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Read and unescape a single attribute value.
fn attribute(element: &BytesStart<'_>, decoder: Decoder, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| ScoreError::Parse(format!("Invalid attribute: {}", e)))?;
        if attr.key.as_ref() == key {
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|e| ScoreError::Parse(format!("Invalid attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Owner display name, with the default applied.
pub fn owner_name(document: &CurriculumDocument) -> String {
    document
        .owner_name
        .clone()
        .unwrap_or_else(|| DEFAULT_OWNER_NAME.to_string())
}

/// Turn parsed elements into [`Article`] records.
///
/// Articles outside `year_range` are dropped; the rest are sorted by year,
/// keeping document order within a year.
pub fn extract_articles(document: &CurriculumDocument, year_range: Option<YearRange>) -> Vec<Article> {
    let mut articles: Vec<Article> = document
        .articles
        .iter()
        .map(element_to_article)
        .filter(|article| year_range.map_or(true, |range| range.contains(article.year)))
        .collect();
    articles.sort_by_key(|article| article.year);
    articles
}

fn element_to_article(element: &ArticleElement) -> Article {
    let year = element
        .year
        .as_deref()
        .and_then(|y| y.trim().parse().ok())
        .unwrap_or(0);

    let journal_identifier = element
        .issn
        .as_deref()
        .map(normalize_identifier)
        .filter(|issn| !issn.is_empty())
        .unwrap_or_else(|| MISSING_IDENTIFIER.to_string());

    let external_identifier = element
        .doi
        .as_deref()
        .filter(|doi| !doi.trim().is_empty())
        .map(format_external_id)
        .unwrap_or_else(|| MISSING_IDENTIFIER.to_string());

    Article {
        title: element
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        authors: element.authors.clone(),
        year,
        journal_identifier,
        journal_title: element
            .journal_title
            .clone()
            .unwrap_or_else(|| DEFAULT_JOURNAL_TITLE.to_string()),
        external_identifier,
    }
}
