//! Raw PubMed records as delivered by efetch, before normalization.
//!
//! Every field is optional: PubMed records are heterogeneous and any
//! element may be missing. [`parse_pubmed_xml`] only extracts what the
//! normalizer needs and never invents values.

use quick_xml::events::Event;
use quick_xml::Reader;

use pubrag_core::{Error, Result};

/// One `<PubmedArticle>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPubmedArticle {
    /// `MedlineCitation/PMID`.
    pub pmid: Option<String>,
    /// `MedlineCitation/Article`.
    pub article: Option<RawArticle>,
    /// `MedlineCitation/MeshHeadingList/MeshHeading`, in document order.
    pub mesh_headings: Vec<RawMeshHeading>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    pub title: Option<String>,
    /// `Abstract/AbstractText` segments; structured abstracts have several.
    pub abstract_segments: Vec<String>,
    pub authors: Vec<RawAuthor>,
    pub journal: Option<RawJournal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAuthor {
    pub fore_name: Option<String>,
    pub last_name: Option<String>,
    pub collective_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawJournal {
    pub title: Option<String>,
    /// `JournalIssue/PubDate`.
    pub pub_date: Option<RawPubDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPubDate {
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    /// Free-text date such as `"2023 Jan-Feb"`, used when `Year` is absent.
    pub medline_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMeshHeading {
    pub descriptor_name: Option<String>,
}

/// Leaf elements whose text is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Pmid,
    Title,
    AbstractText,
    ForeName,
    LastName,
    CollectiveName,
    JournalTitle,
    Year,
    Month,
    Day,
    MedlineDate,
    Descriptor,
}

impl Field {
    /// Map the element at the end of `path` to a captured field.
    fn at(path: &[String]) -> Option<Self> {
        let field = if ends_with(path, &["MedlineCitation", "PMID"]) {
            Self::Pmid
        } else if ends_with(path, &["Article", "ArticleTitle"]) {
            Self::Title
        } else if ends_with(path, &["Abstract", "AbstractText"]) {
            Self::AbstractText
        } else if ends_with(path, &["Author", "ForeName"]) {
            Self::ForeName
        } else if ends_with(path, &["Author", "LastName"]) {
            Self::LastName
        } else if ends_with(path, &["Author", "CollectiveName"]) {
            Self::CollectiveName
        } else if ends_with(path, &["Journal", "Title"]) {
            Self::JournalTitle
        } else if ends_with(path, &["PubDate", "Year"]) {
            Self::Year
        } else if ends_with(path, &["PubDate", "Month"]) {
            Self::Month
        } else if ends_with(path, &["PubDate", "Day"]) {
            Self::Day
        } else if ends_with(path, &["PubDate", "MedlineDate"]) {
            Self::MedlineDate
        } else if ends_with(path, &["MeshHeading", "DescriptorName"]) {
            Self::Descriptor
        } else {
            return None;
        };
        Some(field)
    }
}

fn ends_with(path: &[String], suffix: &[&str]) -> bool {
    path.len() >= suffix.len()
        && path[path.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(a, b)| a == b)
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Incremental builder driven by XML events.
#[derive(Default)]
struct ArticleSetBuilder {
    path: Vec<String>,
    articles: Vec<RawPubmedArticle>,
    current: Option<RawPubmedArticle>,
    author: Option<RawAuthor>,
    mesh: Option<RawMeshHeading>,
    /// Field being captured and the path depth of its element.
    capture: Option<(Field, usize)>,
    text: String,
}

impl ArticleSetBuilder {
    fn article(&mut self) -> Option<&mut RawArticle> {
        self.current.as_mut().and_then(|c| c.article.as_mut())
    }

    fn journal(&mut self) -> Option<&mut RawJournal> {
        self.article().and_then(|a| a.journal.as_mut())
    }

    fn pub_date(&mut self) -> Option<&mut RawPubDate> {
        self.journal().and_then(|j| j.pub_date.as_mut())
    }

    fn start(&mut self, name: String) {
        self.path.push(name);
        let path = &self.path;

        if ends_with(path, &["PubmedArticle"]) {
            self.current = Some(RawPubmedArticle::default());
        } else if ends_with(path, &["MedlineCitation", "Article"]) {
            if let Some(c) = self.current.as_mut() {
                c.article.get_or_insert_with(RawArticle::default);
            }
        } else if ends_with(path, &["Article", "Journal"]) {
            if let Some(a) = self.article() {
                a.journal.get_or_insert_with(RawJournal::default);
            }
        } else if ends_with(path, &["JournalIssue", "PubDate"]) {
            if let Some(j) = self.journal() {
                j.pub_date.get_or_insert_with(RawPubDate::default);
            }
        } else if ends_with(path, &["AuthorList", "Author"]) {
            self.author = Some(RawAuthor::default());
        } else if ends_with(path, &["MeshHeadingList", "MeshHeading"]) {
            self.mesh = Some(RawMeshHeading::default());
        }

        if self.capture.is_none() {
            if let Some(field) = Field::at(&self.path) {
                self.capture = Some((field, self.path.len()));
                self.text.clear();
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.capture.is_some() {
            self.text.push_str(text);
        }
    }

    fn end(&mut self) {
        if let Some((field, depth)) = self.capture {
            if depth == self.path.len() {
                self.capture = None;
                let text = std::mem::take(&mut self.text);
                self.assign(field, &text);
            }
        }

        let path = &self.path;
        if ends_with(path, &["AuthorList", "Author"]) {
            if let Some(author) = self.author.take() {
                if let Some(a) = self.article() {
                    a.authors.push(author);
                }
            }
        } else if ends_with(path, &["MeshHeadingList", "MeshHeading"]) {
            if let Some(mesh) = self.mesh.take() {
                if let Some(c) = self.current.as_mut() {
                    c.mesh_headings.push(mesh);
                }
            }
        } else if ends_with(path, &["PubmedArticle"]) {
            if let Some(article) = self.current.take() {
                self.articles.push(article);
            }
        }

        self.path.pop();
    }

    fn assign(&mut self, field: Field, text: &str) {
        let value = non_empty(text);
        match field {
            Field::Pmid => {
                if let Some(c) = self.current.as_mut() {
                    c.pmid = value;
                }
            }
            Field::Title => {
                if let Some(a) = self.article() {
                    a.title = value;
                }
            }
            Field::AbstractText => {
                if let (Some(segment), Some(a)) = (value, self.article()) {
                    a.abstract_segments.push(segment);
                }
            }
            Field::ForeName => {
                if let Some(author) = self.author.as_mut() {
                    author.fore_name = value;
                }
            }
            Field::LastName => {
                if let Some(author) = self.author.as_mut() {
                    author.last_name = value;
                }
            }
            Field::CollectiveName => {
                if let Some(author) = self.author.as_mut() {
                    author.collective_name = value;
                }
            }
            Field::JournalTitle => {
                if let Some(j) = self.journal() {
                    j.title = value;
                }
            }
            Field::Year => {
                if let Some(d) = self.pub_date() {
                    d.year = value;
                }
            }
            Field::Month => {
                if let Some(d) = self.pub_date() {
                    d.month = value;
                }
            }
            Field::Day => {
                if let Some(d) = self.pub_date() {
                    d.day = value;
                }
            }
            Field::MedlineDate => {
                if let Some(d) = self.pub_date() {
                    d.medline_date = value;
                }
            }
            Field::Descriptor => {
                if let Some(mesh) = self.mesh.as_mut() {
                    mesh.descriptor_name = value;
                }
            }
        }
    }
}

/// Parse an efetch `PubmedArticleSet` document.
///
/// Inline markup inside captured elements (`<i>`, `<sup>`, ...) contributes
/// its text; all captured text is whitespace-collapsed.
///
/// # Errors
///
/// Returns [`Error::Fetch`] if the document is not well-formed XML.
pub fn parse_pubmed_xml(xml: &str) -> Result<Vec<RawPubmedArticle>> {
    let mut reader = Reader::from_str(xml);
    let mut builder = ArticleSetBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                builder.start(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => builder.end(),
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| {
                    Error::Fetch(format!(
                        "invalid text at position {}: {}",
                        reader.buffer_position(),
                        err
                    ))
                })?;
                builder.text(&text);
            }
            Ok(Event::CData(e)) => {
                builder.text(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Fetch(format!(
                    "malformed XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if !builder.path.is_empty() {
        return Err(Error::Fetch(format!(
            "unexpected end of XML inside <{}>",
            builder.path.join("/")
        )));
    }

    Ok(builder.articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2024//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">37000001</PMID>
      <Article PubModel="Print">
        <Journal>
          <JournalIssue CitedMedium="Internet">
            <Volume>46</Volume>
            <PubDate><Year>2023</Year><Month>Mar</Month><Day>5</Day></PubDate>
          </JournalIssue>
          <Title>Diabetes care</Title>
        </Journal>
        <ArticleTitle>Effect of <i>semaglutide</i> on
            glycemic control.</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">Background text.</AbstractText>
          <AbstractText Label="RESULTS">HbA1c fell by 1.2 &amp; weight by 5%.</AbstractText>
        </Abstract>
        <AuthorList CompleteYN="Y">
          <Author ValidYN="Y"><LastName>Doe</LastName><ForeName>Jane</ForeName><Initials>J</Initials></Author>
          <Author ValidYN="Y"><LastName>Roe</LastName></Author>
          <Author ValidYN="Y"><CollectiveName>SURPASS Investigators</CollectiveName></Author>
        </AuthorList>
      </Article>
      <MeshHeadingList>
        <MeshHeading><DescriptorName UI="D003924">Diabetes Mellitus, Type 2</DescriptorName></MeshHeading>
        <MeshHeading><DescriptorName UI="D006801">Humans</DescriptorName><QualifierName UI="Q1">drug therapy</QualifierName></MeshHeading>
      </MeshHeadingList>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="CommentIn"><PMID Version="1">99999999</PMID></CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn test_parse_full_article() {
        let articles = parse_pubmed_xml(FULL).unwrap();
        assert_eq!(articles.len(), 1);

        let raw = &articles[0];
        assert_eq!(raw.pmid.as_deref(), Some("37000001"));

        let article = raw.article.as_ref().unwrap();
        assert_eq!(
            article.title.as_deref(),
            Some("Effect of semaglutide on glycemic control.")
        );
        assert_eq!(
            article.abstract_segments,
            vec!["Background text.", "HbA1c fell by 1.2 & weight by 5%."]
        );
        assert_eq!(article.authors.len(), 3);
        assert_eq!(article.authors[0].fore_name.as_deref(), Some("Jane"));
        assert_eq!(article.authors[0].last_name.as_deref(), Some("Doe"));
        assert_eq!(article.authors[1].fore_name, None);
        assert_eq!(
            article.authors[2].collective_name.as_deref(),
            Some("SURPASS Investigators")
        );

        let journal = article.journal.as_ref().unwrap();
        assert_eq!(journal.title.as_deref(), Some("Diabetes care"));
        let date = journal.pub_date.as_ref().unwrap();
        assert_eq!(date.year.as_deref(), Some("2023"));
        assert_eq!(date.month.as_deref(), Some("Mar"));
        assert_eq!(date.day.as_deref(), Some("5"));

        let descriptors: Vec<_> = raw
            .mesh_headings
            .iter()
            .filter_map(|m| m.descriptor_name.as_deref())
            .collect();
        assert_eq!(descriptors, vec!["Diabetes Mellitus, Type 2", "Humans"]);
    }

    #[test]
    fn test_comment_pmid_does_not_override() {
        let articles = parse_pubmed_xml(FULL).unwrap();
        assert_eq!(articles[0].pmid.as_deref(), Some("37000001"));
    }

    #[test]
    fn test_parse_missing_everything() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation>\
                   <PMID>1</PMID></MedlineCitation></PubmedArticle></PubmedArticleSet>";
        let articles = parse_pubmed_xml(xml).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].pmid.as_deref(), Some("1"));
        assert!(articles[0].article.is_none());
        assert!(articles[0].mesh_headings.is_empty());
    }

    #[test]
    fn test_parse_medline_date() {
        let xml = "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>2</PMID>\
                   <Article><Journal><JournalIssue><PubDate><MedlineDate>2023 Jan-Feb</MedlineDate>\
                   </PubDate></JournalIssue></Journal></Article>\
                   </MedlineCitation></PubmedArticle></PubmedArticleSet>";
        let articles = parse_pubmed_xml(xml).unwrap();
        let date = articles[0]
            .article
            .as_ref()
            .and_then(|a| a.journal.as_ref())
            .and_then(|j| j.pub_date.as_ref())
            .unwrap();
        assert_eq!(date.year, None);
        assert_eq!(date.medline_date.as_deref(), Some("2023 Jan-Feb"));
    }

    #[test]
    fn test_parse_multiple_articles() {
        let xml = "<PubmedArticleSet>\
                   <PubmedArticle><MedlineCitation><PMID>1</PMID></MedlineCitation></PubmedArticle>\
                   <PubmedArticle><MedlineCitation><PMID>2</PMID></MedlineCitation></PubmedArticle>\
                   </PubmedArticleSet>";
        let ids: Vec<_> = parse_pubmed_xml(xml)
            .unwrap()
            .into_iter()
            .filter_map(|a| a.pmid)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_set() {
        assert!(parse_pubmed_xml("<PubmedArticleSet></PubmedArticleSet>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_xml_is_fetch_error() {
        let err = parse_pubmed_xml("<PubmedArticleSet><PubmedArticle></Oops>").unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[test]
    fn test_truncated_xml_is_fetch_error() {
        let err = parse_pubmed_xml("<PubmedArticleSet><PubmedArticle>").unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace("   "), "");
    }
}
