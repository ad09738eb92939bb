use ej_engine::{
    ClassificationResult, Classifier, JobPageClassifier, PageSelectors, ParseError, RawPage,
};
use pretty_assertions::assert_eq;

fn page(job_id: &str, html: String) -> RawPage {
    RawPage {
        job_id: job_id.to_string(),
        final_url: format!("https://jobs.example/job/{job_id}"),
        status: 200,
        content_type: Some("text/html".to_string()),
        html,
    }
}

fn job_page(apply_href: &str, title: &str, company: &str) -> String {
    format!(
        r#"<html><body>
        <h1 data-automation="job-detail-title">{title}</h1>
        <span data-automation="advertiser-name"><a href="/companies/1">{company}</a></span>
        <a data-automation="job-detail-apply" href="{apply_href}">Apply</a>
        </body></html>"#
    )
}

fn classifier() -> JobPageClassifier {
    JobPageClassifier::new(&PageSelectors::default()).expect("default selectors parse")
}

#[test]
fn linkout_apply_anchor_is_external_with_trimmed_fields() {
    let html = job_page(
        "/job/A1/apply?linkout=true",
        "\n   Senior Engineer  \n",
        "  Acme\n Co ",
    );
    let result = classifier().classify(&page("A1", html)).unwrap();
    assert_eq!(
        result,
        ClassificationResult::External {
            title: "Senior Engineer".to_string(),
            company: "Acme Co".to_string(),
        }
    );
}

#[test]
fn on_platform_apply_flow_is_internal() {
    let html = job_page("/job/A2/apply", "Barista", "Cafe");
    let result = classifier().classify(&page("A2", html)).unwrap();
    assert_eq!(result, ClassificationResult::Internal);
    assert!(!result.is_external());
}

#[test]
fn internal_pages_do_not_need_title_or_company() {
    let html = r#"<a data-automation="job-detail-apply" href="/job/A2/apply">Apply</a>"#;
    let result = classifier().classify(&page("A2", html.to_string())).unwrap();
    assert_eq!(result, ClassificationResult::Internal);
}

#[test]
fn classification_is_idempotent() {
    let classifier = classifier();
    let raw = page("A1", job_page("/linkout/abc", "Senior Engineer", "Acme Co"));
    let first = classifier.classify(&raw).unwrap();
    let second = classifier.classify(&raw).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_apply_anchor_is_a_parse_error() {
    let err = classifier()
        .classify(&page("X", "<html><body><p>gone</p></body></html>".to_string()))
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::MissingElement {
            selector: PageSelectors::default().apply_link,
        }
    );
}

#[test]
fn apply_anchor_without_href_is_a_parse_error() {
    let html = r#"<a data-automation="job-detail-apply">Apply</a>"#;
    let err = classifier()
        .classify(&page("X", html.to_string()))
        .unwrap_err();
    assert!(
        matches!(err, ParseError::MissingAttribute { ref attribute, .. } if attribute == "href")
    );
}

#[test]
fn external_page_without_advertiser_link_is_a_parse_error() {
    let html = r#"<html><body>
        <h1 data-automation="job-detail-title">Engineer</h1>
        <span data-automation="advertiser-name">Private Advertiser</span>
        <a data-automation="job-detail-apply" href="/linkout">Apply</a>
        </body></html>"#;
    let err = classifier()
        .classify(&page("X", html.to_string()))
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::MissingElement {
            selector: "a".to_string()
        }
    );
}

#[test]
fn custom_marker_changes_the_decision() {
    let selectors = PageSelectors {
        external_marker: "redirect".to_string(),
        ..PageSelectors::default()
    };
    let classifier = JobPageClassifier::new(&selectors).unwrap();
    let html = job_page("/job/A1/apply?linkout=true", "T", "C");
    assert_eq!(
        classifier.classify(&page("A1", html)).unwrap(),
        ClassificationResult::Internal
    );
}
