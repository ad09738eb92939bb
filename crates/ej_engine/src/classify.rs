use scraper::{ElementRef, Html, Selector};

use crate::{ClassificationResult, RawPage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("page has no element matching `{selector}`")]
    MissingElement { selector: String },
    #[error("element `{selector}` has no `{attribute}` attribute")]
    MissingAttribute { selector: String, attribute: String },
}

/// CSS selectors locating the elements of a job page that drive classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    pub apply_link: String,
    pub title: String,
    pub advertiser: String,
    /// Searched inside the advertiser element.
    pub advertiser_link: String,
    /// Substring of the apply destination that marks an outbound redirect.
    pub external_marker: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            apply_link: r#"a[data-automation="job-detail-apply"]"#.to_string(),
            title: r#"h1[data-automation="job-detail-title"]"#.to_string(),
            advertiser: r#"span[data-automation="advertiser-name"]"#.to_string(),
            advertiser_link: "a".to_string(),
            external_marker: "linkout".to_string(),
        }
    }
}

pub trait Classifier: Send + Sync {
    fn classify(&self, page: &RawPage) -> Result<ClassificationResult, ParseError>;
}

struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    fn parse(source: &str) -> Result<Self, ParseError> {
        let selector = Selector::parse(source).map_err(|err| ParseError::InvalidSelector {
            selector: source.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    fn first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope.select(&self.selector).next()
    }

    fn require_in<'a>(&self, scope: ElementRef<'a>) -> Result<ElementRef<'a>, ParseError> {
        self.first_in(scope).ok_or_else(|| ParseError::MissingElement {
            selector: self.source.clone(),
        })
    }
}

/// Classifies job pages by inspecting the apply anchor's destination.
pub struct JobPageClassifier {
    apply_link: CompiledSelector,
    title: CompiledSelector,
    advertiser: CompiledSelector,
    advertiser_link: CompiledSelector,
    external_marker: String,
}

impl JobPageClassifier {
    pub fn new(selectors: &PageSelectors) -> Result<Self, ParseError> {
        Ok(Self {
            apply_link: CompiledSelector::parse(&selectors.apply_link)?,
            title: CompiledSelector::parse(&selectors.title)?,
            advertiser: CompiledSelector::parse(&selectors.advertiser)?,
            advertiser_link: CompiledSelector::parse(&selectors.advertiser_link)?,
            external_marker: selectors.external_marker.clone(),
        })
    }

    fn apply_destination<'a>(&self, root: ElementRef<'a>) -> Result<&'a str, ParseError> {
        let anchor = self.apply_link.require_in(root)?;
        anchor
            .value()
            .attr("href")
            .ok_or_else(|| ParseError::MissingAttribute {
                selector: self.apply_link.source.clone(),
                attribute: "href".to_string(),
            })
    }
}

impl Classifier for JobPageClassifier {
    fn classify(&self, page: &RawPage) -> Result<ClassificationResult, ParseError> {
        let doc = Html::parse_document(&page.html);
        let root = doc.root_element();

        let destination = self.apply_destination(root)?;
        if !destination.contains(&self.external_marker) {
            return Ok(ClassificationResult::Internal);
        }

        let title = element_text(self.title.require_in(root)?);
        let advertiser = self.advertiser.require_in(root)?;
        let company = element_text(self.advertiser_link.require_in(advertiser)?);

        Ok(ClassificationResult::External { title, company })
    }
}

/// Visible text of an element with surrounding whitespace and embedded
/// newlines removed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .trim()
        .replace(['\n', '\r'], "")
}
