//! Field extraction from parsed detail pages.
//!
//! Each field is described by an ordered list of [`Rule`]s. The first rule
//! producing non-empty text wins; if none does the field is `None`. All text is
//! whitespace-collapsed before it leaves this module.

use scraper::{ElementRef, Html, Selector};
use crate::record::{FresherRecord, ItRecord};

pub type Rule = fn(&Html) -> Option<String>;

pub const QUALIFICATION_RULES: &[Rule] = &[qualification_in_list_item, qualification_after_label];
pub const JOB_TITLE_RULES: &[Rule] = &[job_title_heading, first_heading];

pub fn first_match(document: &Html, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|rule| rule(document))
}

pub fn extract_qualification(document: &Html) -> Option<String> {
    first_match(document, QUALIFICATION_RULES)
}

pub fn extract_job_title(document: &Html) -> Option<String> {
    first_match(document, JOB_TITLE_RULES)
}

pub fn extract_fresher(document: &Html, url: &str) -> FresherRecord {
    FresherRecord {
        url: url.to_string(),
        company: fresher_company(document),
        posting_time: first_text(document, "span.posting-time"),
        location: first_text(document, "div.srp-loc")
            .map(|l| l.replace("Location:", ""))
            .and_then(|l| non_empty(&l)),
        experience: first_text(document, "div.srp-exp"),
        salary: first_text(document, "div.srp-sal"),
        job_description: first_text(document, "div#JobDescription"),
        industry: first_text(document, "span.jd-cont-bx"),
        qualification: extract_qualification(document),
        employment_type: labelled_next_span(document, "Employment Type", &["span.jd-cont-bx"]),
    }
}

pub fn extract_it(document: &Html, url: &str) -> ItRecord {
    ItRecord {
        url: url.to_string(),
        job_title: extract_job_title(document),
        company: first_text(document, "h2"),
        posting_date: first_text(document, "span.posted-days"),
        location: icon_list_item(document, "i.location"),
        experience: icon_list_item(document, "i.experience"),
        salary: icon_list_item(document, "i.salary"),
        industry: labelled_list_item(document, "Industry", &["span.basic-info-dtl"]),
        qualification: extract_qualification(document),
        employment_type: first_text(document, "span.mt-4"),
        skills: skill_tags(document),
        description: first_spaced_text(document, "div.jd-desc"),
    }
}

/// Collapses runs of whitespace to one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() { None } else { Some(collapsed) }
}

/// Text nodes concatenated as-is.
pub fn element_text(element: ElementRef) -> Option<String> {
    non_empty(&element.text().collect::<String>())
}

/// Text nodes joined with a space, so adjacent inline elements stay separated.
pub fn element_text_spaced(element: ElementRef) -> Option<String> {
    non_empty(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_element<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    let found = document.select(&selector).next();
    found
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    first_element(document, css).and_then(element_text)
}

fn first_spaced_text(document: &Html, css: &str) -> Option<String> {
    first_element(document, css).and_then(element_text_spaced)
}

/// First element matching any of `css`, searched inside `scope`.
fn first_within<'a>(scope: ElementRef<'a>, css: &[&str]) -> Option<ElementRef<'a>> {
    css.iter().find_map(|c| {
        let selector = Selector::parse(c).ok()?;
        let found = scope.select(&selector).next();
        found
    })
}

/// First element after `anchor` in document order matching any of `css`.
fn next_in_document<'a>(document: &'a Html, anchor: ElementRef<'a>, css: &[&str]) -> Option<ElementRef<'a>> {
    let selectors: Vec<Selector> = css.iter().filter_map(|c| Selector::parse(c).ok()).collect();
    for selector in &selectors {
        let mut passed = false;
        for node in document.root_element().descendants() {
            if node.id() == anchor.id() {
                passed = true;
                continue;
            }
            if !passed {
                continue;
            }
            if let Some(el) = ElementRef::wrap(node) {
                if selector.matches(&el) {
                    return Some(el);
                }
            }
        }
    }
    None
}

fn labels_containing<'a>(scope: ElementRef<'a>, needle: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("label").ok()?;
    let found = scope
        .select(&selector)
        .find(|label| label.text().collect::<String>().contains(needle));
    found
}

/// `li.clearfix` whose label mentions `needle`, then the first matching span inside it.
fn labelled_list_item(document: &Html, needle: &str, spans: &[&str]) -> Option<String> {
    let selector = Selector::parse("li.clearfix").ok()?;
    let item = document
        .select(&selector)
        .find(|li| labels_containing(*li, needle).is_some())?;
    first_within(item, spans).and_then(element_text)
}

/// Any label mentioning `needle`, then the next matching span after it.
fn labelled_next_span(document: &Html, needle: &str, spans: &[&str]) -> Option<String> {
    let label = labels_containing(document.root_element(), needle)?;
    next_in_document(document, label, spans).and_then(element_text)
}

/// Text of the `li` enclosing an icon element such as `<i class="salary">`.
fn icon_list_item(document: &Html, icon_css: &str) -> Option<String> {
    let icon = first_element(document, icon_css)?;
    icon.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "li")
        .and_then(element_text_spaced)
}

fn fresher_company(document: &Html) -> Option<String> {
    let heading = first_element(document, "h2")?;
    match first_within(heading, &["span"]) {
        Some(span) => element_text(span),
        None => element_text(heading),
    }
}

fn skill_tags(document: &Html) -> Option<String> {
    let selector = Selector::parse("span.jd-skill-tag a").ok()?;
    let skills: Vec<String> = document
        .select(&selector)
        .filter_map(|a| a.value().attr("title"))
        .filter_map(|t| non_empty(&t.replace(" Jobs", "")))
        .collect();
    if skills.is_empty() { None } else { Some(skills.join(", ")) }
}

const QUALIFICATION_SPANS: &[&str] = &["span.jd-cont-bx", "span.basic-info-dtl"];

fn qualification_in_list_item(document: &Html) -> Option<String> {
    labelled_list_item(document, "Qualification", QUALIFICATION_SPANS)
}

fn qualification_after_label(document: &Html) -> Option<String> {
    labelled_next_span(document, "Qualification", QUALIFICATION_SPANS)
}

fn job_title_heading(document: &Html) -> Option<String> {
    first_text(document, "h1.jd-job-title")
}

fn first_heading(document: &Html) -> Option<String> {
    first_text(document, "h1")
}
