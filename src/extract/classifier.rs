//! Ordered classifier rules for résumé text spans.
//!
//! Each rule inspects one span in its context and either declines or
//! returns a [`Classification`]. Rules run in a fixed order and the first
//! one scoring at or above the threshold decides the span. A rule that
//! matches below the threshold does not stop the scan; if nothing else
//! reaches the threshold, the best of those weak matches is reported as
//! ambiguous.

use std::collections::BTreeMap;

use regex::{Match, Regex};

use crate::model::Role;

/// A line of source text with the style features the rules look at.
#[derive(Debug, Clone)]
pub(crate) struct Span {
    /// Position in document order
    pub order: usize,
    pub text: String,
    /// Largest font size on the line, in points
    pub font_size: Option<f32>,
    pub bold: bool,
    pub bullet: bool,
}

impl Span {
    fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    fn has_digits(&self) -> bool {
        self.text.chars().any(|c| c.is_ascii_digit())
    }

    fn is_uppercase(&self) -> bool {
        let letters: Vec<char> = self.text.chars().filter(|c| c.is_alphabetic()).collect();
        !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
    }
}

/// Résumé section a heading opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Heading {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
    /// A section the schema has no field for (languages, awards...)
    Other,
}

/// What a span was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpanKind {
    SectionHeading(Heading),
    Email,
    Phone,
    SkillsLine,
    DateLine,
    Name,
    Title,
    SummaryText,
    ExperienceHeader,
    ExperienceDetail,
    ExperienceBullet,
    EducationLine,
    SkillItem,
}

impl SpanKind {
    /// Role the span would feed, given the section it appears in.
    pub(crate) fn role(&self, section: Option<Heading>) -> Option<Role> {
        match self {
            SpanKind::SectionHeading(_) => None,
            SpanKind::Email => Some(Role::ContactEmail),
            SpanKind::Phone => Some(Role::ContactPhone),
            SpanKind::SkillsLine | SpanKind::SkillItem => Some(Role::Skills),
            SpanKind::DateLine => match section {
                Some(Heading::Education) => Some(Role::EducationDates),
                _ => Some(Role::ExperienceDates),
            },
            SpanKind::Name => Some(Role::ContactName),
            SpanKind::Title => Some(Role::ContactTitle),
            SpanKind::SummaryText => Some(Role::Summary),
            SpanKind::ExperienceHeader => Some(Role::ExperienceOrganization),
            SpanKind::ExperienceDetail => Some(Role::ExperienceRole),
            SpanKind::ExperienceBullet => Some(Role::ExperienceBullets),
            SpanKind::EducationLine => Some(Role::EducationInstitution),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Classification {
    pub kind: SpanKind,
    pub confidence: f32,
    /// Name of the rule that produced it
    pub rule: &'static str,
}

/// Result of running the rule list over one span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Outcome {
    Matched(Classification),
    Ambiguous(Classification),
    Unclassified,
}

/// What a rule sees.
pub(crate) struct Context<'a> {
    pub span: &'a Span,
    pub next: Option<&'a Span>,
    /// Current section; `None` is the header zone before the first heading
    pub section: Option<Heading>,
    /// Most common font size in the document
    pub body_size: f32,
}

impl Context<'_> {
    fn in_header_zone(&self) -> bool {
        matches!(self.section, None | Some(Heading::Contact))
    }

    fn is_large(&self) -> bool {
        self.span
            .font_size
            .map_or(false, |s| s >= self.body_size + 4.0)
    }
}

type Rule = fn(&Classifier, &Context<'_>) -> Option<Classification>;

/// Rules in evaluation order.
const RULES: &[(&str, Rule)] = &[
    ("section_heading", section_heading),
    ("email", email),
    ("phone", phone),
    ("skills_line", skills_line),
    ("date_line", date_line),
    ("name", name),
    ("title", title),
    ("summary_body", summary_body),
    ("experience_bullet", experience_bullet),
    ("experience_header", experience_header),
    ("experience_detail", experience_detail),
    ("experience_prose", experience_prose),
    ("education_line", education_line),
    ("skill_item", skill_item),
    ("experience_fallback", experience_fallback),
];

const SECTION_KEYWORDS: &[(Heading, &[&str])] = &[
    (
        Heading::Summary,
        &[
            "summary",
            "professional summary",
            "profile",
            "professional profile",
            "about",
            "about me",
            "objective",
            "career objective",
            "overview",
        ],
    ),
    (
        Heading::Experience,
        &[
            "experience",
            "work experience",
            "professional experience",
            "relevant experience",
            "employment",
            "employment history",
            "work history",
            "career history",
        ],
    ),
    (
        Heading::Education,
        &[
            "education",
            "academic background",
            "education and training",
            "qualifications",
        ],
    ),
    (
        Heading::Skills,
        &[
            "skills",
            "key skills",
            "technical skills",
            "core competencies",
            "competencies",
            "expertise",
            "tools",
        ],
    ),
    (
        Heading::Contact,
        &["contact", "contact details", "contact information"],
    ),
    (
        Heading::Other,
        &[
            "languages",
            "certifications",
            "certificates",
            "awards",
            "interests",
            "hobbies",
            "publications",
            "references",
            "volunteering",
        ],
    ),
];

const TITLE_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "consultant",
    "designer",
    "analyst",
    "director",
    "scientist",
    "architect",
    "specialist",
    "officer",
    "lead",
    "head of",
    "partner",
    "associate",
    "administrator",
    "coordinator",
    "intern",
];

pub(crate) const BULLET_CHARS: &[char] = &['•', '▪', '◦', '‣', '–', '-', '*', '·', '►', '➤'];

/// Separators between a role and an organization on one line.
pub(crate) const HEADER_SEPARATORS: &[&str] = &[" | ", " — ", " – ", " - ", ", ", " @ "];

/// Compiled patterns shared by the rules.
pub(crate) struct Classifier {
    email: Regex,
    phone: Regex,
    date_range: Regex,
}

impl Classifier {
    pub(crate) fn new() -> Self {
        Self {
            email: Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap(),
            phone: Regex::new(r"\+?\(?\d[\d\s().\-/]{7,}\d").unwrap(),
            date_range: Regex::new(
                r"(?i)\b(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+|\d{1,2}/)?(?:19|20)\d{2}\s*(?:-|–|—|to|until)\s*(?:(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+|\d{1,2}/)?(?:19|20)\d{2}|present|current|now|today)\b",
            )
            .unwrap(),
        }
    }

    /// Run the rules over one span.
    pub(crate) fn classify(&self, ctx: &Context<'_>, threshold: f32) -> Outcome {
        let mut weak: Option<Classification> = None;

        for (_, rule) in RULES {
            let Some(found) = rule(self, ctx) else {
                continue;
            };
            if found.confidence >= threshold {
                log::debug!(
                    "span {} '{}' -> {:?} ({:.2}, rule {})",
                    ctx.span.order,
                    ctx.span.text,
                    found.kind,
                    found.confidence,
                    found.rule
                );
                return Outcome::Matched(found);
            }
            if weak.map_or(true, |w| found.confidence > w.confidence) {
                weak = Some(found);
            }
        }

        match weak {
            Some(w) => {
                log::debug!(
                    "span {} '{}' is ambiguous: best {:?} at {:.2}",
                    ctx.span.order,
                    ctx.span.text,
                    w.kind,
                    w.confidence
                );
                Outcome::Ambiguous(w)
            }
            None => Outcome::Unclassified,
        }
    }

    pub(crate) fn find_email<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.email.find(text)
    }

    /// First phone-like run with at least nine digits that is not a date range.
    pub(crate) fn find_phone<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.phone.find_iter(text).find(|m| {
            let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
            digits >= 9 && !self.date_range.is_match(m.as_str())
        })
    }

    pub(crate) fn find_date_range<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.date_range.find(text)
    }
}

fn classified(kind: SpanKind, confidence: f32, rule: &'static str) -> Option<Classification> {
    Some(Classification {
        kind,
        confidence: confidence.clamp(0.0, 1.0),
        rule,
    })
}

/// Text left once `m` and surrounding labels or separators are removed.
pub(crate) fn remainder(text: &str, m: &Match<'_>) -> String {
    let rest = format!("{} {}", &text[..m.start()], &text[m.end()..]);
    rest.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || ",;|:•·-–—()".contains(c))
        .to_string()
}

fn is_label(text: &str) -> bool {
    matches!(
        text.to_lowercase().as_str(),
        "" | "email" | "e-mail" | "mail" | "phone" | "tel" | "mobile" | "cell" | "telephone"
    )
}

/// Section a heading line names.
pub(crate) fn heading_of(text: &str) -> Option<(Heading, bool)> {
    let normalized = text
        .trim()
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
        .replace('&', "and");
    if normalized.is_empty() || normalized.len() > 40 {
        return None;
    }

    for (heading, keywords) in SECTION_KEYWORDS {
        if keywords.contains(&normalized.as_str()) {
            return Some((*heading, true));
        }
    }
    for (heading, keywords) in SECTION_KEYWORDS {
        if keywords
            .iter()
            .any(|k| normalized.split_whitespace().any(|w| w == *k))
        {
            return Some((*heading, false));
        }
    }
    None
}

fn has_title_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    TITLE_KEYWORDS.iter().any(|k| {
        lower.match_indices(k).any(|(i, _)| {
            !lower[..i].ends_with(|c: char| c.is_alphanumeric())
                && !lower[i + k.len()..].starts_with(|c: char| c.is_alphanumeric())
        })
    })
}

fn starts_with_bullet(text: &str) -> bool {
    text.trim_start().starts_with(BULLET_CHARS)
}

fn section_heading(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let span = ctx.span;
    if span.bullet || span.word_count() > 4 {
        return None;
    }
    let (heading, exact) = heading_of(&span.text)?;
    if exact {
        return classified(SpanKind::SectionHeading(heading), 0.95, "section_heading");
    }
    let emphasized = span.bold || span.is_uppercase() || ctx.is_large();
    classified(
        SpanKind::SectionHeading(heading),
        if emphasized { 0.75 } else { 0.4 },
        "section_heading",
    )
}

fn email(c: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let m = c.find_email(&ctx.span.text)?;
    let alone = is_label(&remainder(&ctx.span.text, &m));
    classified(SpanKind::Email, if alone { 0.95 } else { 0.75 }, "email")
}

fn phone(c: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let m = c.find_phone(&ctx.span.text)?;
    let alone = is_label(&remainder(&ctx.span.text, &m));
    let confidence = match (ctx.in_header_zone(), alone) {
        (true, true) => 0.9,
        (true, false) => 0.7,
        (false, true) => 0.6,
        (false, false) => 0.3,
    };
    classified(SpanKind::Phone, confidence, "phone")
}

fn skills_line(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let (label, items) = ctx.span.text.split_once(':')?;
    let (heading, _) = heading_of(label)?;
    if heading != Heading::Skills || items.trim().is_empty() {
        return None;
    }
    classified(SpanKind::SkillsLine, 0.85, "skills_line")
}

fn date_line(c: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let m = c.find_date_range(&ctx.span.text)?;
    if !remainder(&ctx.span.text, &m).is_empty() {
        return None;
    }
    let confidence = match ctx.section {
        Some(Heading::Experience) | Some(Heading::Education) => 0.85,
        _ => 0.45,
    };
    classified(SpanKind::DateLine, confidence, "date_line")
}

fn name(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let span = ctx.span;
    let words = span.word_count();
    if !ctx.in_header_zone()
        || span.bullet
        || !(1..=4).contains(&words)
        || span.has_digits()
        || span.text.contains('@')
        || has_title_keyword(&span.text)
    {
        return None;
    }
    let capitalized = span
        .text
        .split_whitespace()
        .all(|w| w.chars().next().map_or(false, |c| c.is_uppercase()));
    if !capitalized {
        return None;
    }

    let mut confidence: f32 = 0.45;
    if ctx.is_large() {
        confidence += 0.3;
    }
    if span.bold {
        confidence += 0.1;
    }
    if (2..=3).contains(&words) {
        confidence += 0.1;
    }
    classified(SpanKind::Name, confidence, "name")
}

fn title(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let span = ctx.span;
    if !ctx.in_header_zone() || span.bullet || span.word_count() > 8 || span.text.contains('@') {
        return None;
    }
    let confidence = if has_title_keyword(&span.text) { 0.8 } else { 0.35 };
    classified(SpanKind::Title, confidence, "title")
}

fn summary_body(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    (ctx.section == Some(Heading::Summary)).then_some(())?;
    classified(SpanKind::SummaryText, 0.9, "summary_body")
}

fn experience_bullet(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    if ctx.section != Some(Heading::Experience) {
        return None;
    }
    if ctx.span.bullet || starts_with_bullet(&ctx.span.text) {
        return classified(SpanKind::ExperienceBullet, 0.9, "experience_bullet");
    }
    None
}

fn experience_header(c: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let span = ctx.span;
    if ctx.section != Some(Heading::Experience) || span.word_count() > 14 {
        return None;
    }
    let lower = span.text.to_lowercase();
    let separated = lower.contains(" at ") || HEADER_SEPARATORS.iter().any(|s| lower.contains(s));
    let dated = c.find_date_range(&span.text).is_some();
    let confidence = match (separated || dated, span.bold) {
        (true, true) => 0.9,
        (true, false) => 0.8,
        (false, true) => 0.75,
        (false, false) => return None,
    };
    classified(SpanKind::ExperienceHeader, confidence, "experience_header")
}

fn experience_detail(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let span = ctx.span;
    if ctx.section != Some(Heading::Experience)
        || span.word_count() > 8
        || span.text.trim_end().ends_with('.')
    {
        return None;
    }
    classified(SpanKind::ExperienceDetail, 0.6, "experience_detail")
}

fn experience_prose(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    (ctx.section == Some(Heading::Experience)).then_some(())?;
    classified(SpanKind::ExperienceBullet, 0.6, "experience_prose")
}

fn education_line(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    (ctx.section == Some(Heading::Education)).then_some(())?;
    classified(SpanKind::EducationLine, 0.8, "education_line")
}

fn skill_item(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    (ctx.section == Some(Heading::Skills)).then_some(())?;
    classified(SpanKind::SkillItem, 0.85, "skill_item")
}

fn experience_fallback(_: &Classifier, ctx: &Context<'_>) -> Option<Classification> {
    let span = ctx.span;
    if !matches!(ctx.section, None | Some(Heading::Other))
        || !span.bold
        || span.bullet
        || span.word_count() > 10
    {
        return None;
    }
    let next = ctx.next?;
    if !(next.bullet || starts_with_bullet(&next.text)) {
        return None;
    }
    classified(SpanKind::ExperienceHeader, 0.65, "experience_fallback")
}

/// Font size histogram used to find the body size.
#[derive(Debug, Clone, Default)]
pub(crate) struct FontStatistics {
    histogram: BTreeMap<i32, usize>,
}

impl FontStatistics {
    /// Add a font size observation, weighted by characters.
    pub(crate) fn add(&mut self, size: f32, chars: usize) {
        let key = (size * 10.0).round() as i32;
        *self.histogram.entry(key).or_insert(0) += chars;
    }

    /// Most common size; ties go to the smaller size.
    pub(crate) fn body_size(&self) -> f32 {
        self.histogram
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(key, _)| *key as f32 / 10.0)
            .unwrap_or(12.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> Span {
        Span {
            order: 0,
            text: text.to_string(),
            font_size: Some(11.0),
            bold: false,
            bullet: false,
        }
    }

    fn run(span: &Span, section: Option<Heading>) -> Outcome {
        let ctx = Context {
            span,
            next: None,
            section,
            body_size: 11.0,
        };
        Classifier::new().classify(&ctx, 0.5)
    }

    fn kind(outcome: Outcome) -> Option<SpanKind> {
        match outcome {
            Outcome::Matched(c) => Some(c.kind),
            _ => None,
        }
    }

    #[test]
    fn test_section_headings() {
        assert_eq!(
            kind(run(&span("Work Experience"), None)),
            Some(SpanKind::SectionHeading(Heading::Experience))
        );
        assert_eq!(
            kind(run(&span("EDUCATION:"), Some(Heading::Summary))),
            Some(SpanKind::SectionHeading(Heading::Education))
        );

        let mut emphasized = span("Skills & Tools");
        emphasized.bold = true;
        assert_eq!(
            kind(run(&emphasized, None)),
            Some(SpanKind::SectionHeading(Heading::Skills))
        );
        assert!(matches!(
            run(&span("Skills & Tools"), None),
            Outcome::Ambiguous(_)
        ));
    }

    #[test]
    fn test_email_and_phone() {
        assert_eq!(kind(run(&span("jane@x.com"), None)), Some(SpanKind::Email));
        assert_eq!(
            kind(run(&span("Phone: +1 (555) 123-4567"), None)),
            Some(SpanKind::Phone)
        );
    }

    #[test]
    fn test_date_range_is_not_a_phone() {
        let c = Classifier::new();
        assert!(c.find_phone("2015 - 2019").is_none());
        assert!(c.find_phone("Jan 2015 – Present").is_none());
        assert!(c.find_date_range("Jan 2015 – Present").is_some());
        assert!(c.find_date_range("2019 to 2021").is_some());
    }

    #[test]
    fn test_name_scoring() {
        let mut large = span("Jane Doe");
        large.font_size = Some(28.0);
        large.bold = true;
        match run(&large, None) {
            Outcome::Matched(c) => {
                assert_eq!(c.kind, SpanKind::Name);
                assert!((c.confidence - 0.95).abs() < 1e-4);
            }
            other => panic!("unexpected {:?}", other),
        }

        // A single plain word is a weak name candidate
        assert!(matches!(
            run(&span("Jane"), None),
            Outcome::Ambiguous(Classification {
                kind: SpanKind::Name,
                ..
            })
        ));
    }

    #[test]
    fn test_title_keyword() {
        assert_eq!(
            kind(run(&span("Senior Software Engineer"), None)),
            Some(SpanKind::Title)
        );
    }

    #[test]
    fn test_experience_rules() {
        let section = Some(Heading::Experience);
        assert_eq!(
            kind(run(&span("Engineer at Acme, 2019 - 2023"), section)),
            Some(SpanKind::ExperienceHeader)
        );
        let mut bullet = span("Shipped the billing service");
        bullet.bullet = true;
        assert_eq!(kind(run(&bullet, section)), Some(SpanKind::ExperienceBullet));
        assert_eq!(
            kind(run(&span("2019 - 2023"), section)),
            Some(SpanKind::DateLine)
        );
    }

    #[test]
    fn test_fallback_needs_following_bullet() {
        let mut header = span("Acme Corp");
        header.bold = true;
        let mut next = span("Built things");
        next.bullet = true;
        let ctx = Context {
            span: &header,
            next: Some(&next),
            section: Some(Heading::Other),
            body_size: 11.0,
        };
        assert_eq!(
            kind(Classifier::new().classify(&ctx, 0.5)),
            Some(SpanKind::ExperienceHeader)
        );

        let ctx = Context { next: None, ..ctx };
        assert_eq!(Classifier::new().classify(&ctx, 0.5), Outcome::Unclassified);
    }

    #[test]
    fn test_body_size_ties() {
        let mut stats = FontStatistics::default();
        stats.add(11.0, 100);
        stats.add(14.0, 100);
        stats.add(28.0, 10);
        assert_eq!(stats.body_size(), 11.0);
        assert_eq!(FontStatistics::default().body_size(), 12.0);
    }
}
