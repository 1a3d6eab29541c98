//! Résumé content extraction.
//!
//! The extractor walks slides and shapes in document order. Shapes that
//! carry role directives feed their field directly; every other paragraph
//! line goes through the ordered rules in [`classifier`] and is folded into a
//! [`CvProfile`]. Extraction never fails: anything it cannot place is
//! recorded in the [`ExtractionReport`].

mod classifier;
mod report;

pub use report::{EntryStatus, ExtractionReport, ReportEntry};

use std::collections::{BTreeMap, HashMap};

use unicode_normalization::UnicodeNormalization;

use crate::model::{
    CvProfile, Document, EducationEntry, ExperienceEntry, FieldPath, Role, Section, Shape,
};

use classifier::{
    remainder, Classification, Classifier, Context, FontStatistics, Heading, Outcome,
    Span, SpanKind, BULLET_CHARS, HEADER_SEPARATORS,
};

/// Options for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Minimum confidence for a span to enter the profile
    pub threshold: f32,

    /// Read hidden slides too
    pub include_hidden: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence threshold, clamped to [0, 1].
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Include hidden slides.
    pub fn with_hidden_slides(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            include_hidden: false,
        }
    }
}

/// Extract a profile with default options.
pub fn extract(doc: &Document) -> (CvProfile, ExtractionReport) {
    extract_with_options(doc, &ExtractOptions::default())
}

/// Extract a profile.
pub fn extract_with_options(
    doc: &Document,
    options: &ExtractOptions,
) -> (CvProfile, ExtractionReport) {
    let mut extractor = Extractor::new(options);
    let spans = extractor.collect(doc);
    extractor.classify_all(&spans);
    extractor.finish()
}

/// A value for a single-valued field.
#[derive(Debug, Clone)]
struct Candidate {
    role: Role,
    text: String,
    confidence: f32,
    order: usize,
}

/// Content from a shape with a role directive.
#[derive(Debug, Clone)]
struct Hint {
    path: FieldPath,
    items: Vec<String>,
    order: usize,
}

#[derive(Debug, Clone, Default)]
struct Scored<T> {
    value: T,
    confidence: f32,
}

struct Extractor<'a> {
    options: &'a ExtractOptions,
    classifier: Classifier,
    report: ExtractionReport,
    hints: Vec<Hint>,
    candidates: Vec<Candidate>,
    summary: Vec<(String, f32, usize)>,
    experience: Vec<Scored<ExperienceEntry>>,
    education: Vec<Scored<EducationEntry>>,
    skills: Vec<(String, f32)>,
    section: Option<Heading>,
}

impl<'a> Extractor<'a> {
    fn new(options: &'a ExtractOptions) -> Self {
        Self {
            options,
            classifier: Classifier::new(),
            report: ExtractionReport::new(),
            hints: Vec::new(),
            candidates: Vec::new(),
            summary: Vec::new(),
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            section: None,
        }
    }

    /// Gather role hints and the unhinted lines in document order.
    fn collect(&mut self, doc: &Document) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut occurrences: HashMap<Role, usize> = HashMap::new();
        let mut order = 0;

        for slide in &doc.slides {
            if slide.hidden && !self.options.include_hidden {
                log::debug!("skipping hidden slide {}", slide.index + 1);
                continue;
            }
            for shape in &slide.shapes {
                let Some(body) = shape.text.as_ref() else {
                    continue;
                };

                if let Some(role) = hinted_role(shape) {
                    let seen = occurrences.entry(role).or_insert(0);
                    let path = match (role.section(), shape.placeholder().and_then(|p| p.group)) {
                        (Some(_), Some(group)) => FieldPath::entry(role, group as usize),
                        (Some(_), None) => FieldPath::entry(role, *seen),
                        (None, _) => FieldPath::new(role),
                    };
                    *seen += 1;

                    let items: Vec<String> = body
                        .paragraphs
                        .iter()
                        .map(|p| normalize(&p.plain_text()))
                        .filter(|t| !t.is_empty())
                        .collect();
                    if !items.is_empty() {
                        self.hints.push(Hint { path, items, order });
                        order += 1;
                    }
                    continue;
                }

                for paragraph in &body.paragraphs {
                    for line in paragraph.plain_text().split('\n') {
                        let text = normalize(line);
                        if text.is_empty() {
                            continue;
                        }
                        let bullet = paragraph.bullet || text.starts_with(BULLET_CHARS);
                        spans.push(Span {
                            order,
                            text,
                            font_size: paragraph.max_font_size(),
                            bold: paragraph.is_bold(),
                            bullet,
                        });
                        order += 1;
                    }
                }
            }
        }

        spans
    }

    fn classify_all(&mut self, spans: &[Span]) {
        let mut stats = FontStatistics::default();
        for span in spans {
            if let Some(size) = span.font_size {
                stats.add(size, span.text.chars().count());
            }
        }
        let body_size = stats.body_size();
        let threshold = self.options.threshold;

        for (i, span) in spans.iter().enumerate() {
            let pieces = if matches!(self.section, None | Some(Heading::Contact)) {
                self.split_contact_line(span)
            } else {
                vec![span.clone()]
            };

            for piece in &pieces {
                let ctx = Context {
                    span: piece,
                    next: spans.get(i + 1),
                    section: self.section,
                    body_size,
                };
                match self.classifier.classify(&ctx, threshold) {
                    Outcome::Matched(found) => self.apply(found, piece),
                    Outcome::Ambiguous(weak) => {
                        if let Some(role) = weak.kind.role(self.section) {
                            self.report.record(
                                role.as_str(),
                                weak.confidence,
                                EntryStatus::Ambiguous,
                                Some(&piece.text),
                            );
                        }
                    }
                    Outcome::Unclassified => {
                        log::debug!("span {} '{}' left unclassified", piece.order, piece.text)
                    }
                }
            }
        }
    }

    /// Split a header line such as `Jane Doe | jane@x.com | +1 555 123 4567`
    /// into its parts, but only when it holds an email or a phone number.
    fn split_contact_line(&self, span: &Span) -> Vec<Span> {
        let text = &span.text;
        let has_contact = self.classifier.find_email(text).is_some()
            || self.classifier.find_phone(text).is_some();
        if !has_contact {
            return vec![span.clone()];
        }

        let parts: Vec<String> = text
            .split(['|', '•', '·', ',', ';'])
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            return vec![span.clone()];
        }

        parts
            .into_iter()
            .map(|text| Span {
                text,
                ..span.clone()
            })
            .collect()
    }

    fn apply(&mut self, found: Classification, span: &Span) {
        let confidence = found.confidence;
        let text = span.text.as_str();

        match found.kind {
            SpanKind::SectionHeading(heading) => self.section = Some(heading),
            SpanKind::Email => {
                if let Some(m) = self.classifier.find_email(text) {
                    self.candidate(Role::ContactEmail, m.as_str(), confidence, span.order);
                }
            }
            SpanKind::Phone => {
                if let Some(m) = self.classifier.find_phone(text) {
                    self.candidate(Role::ContactPhone, m.as_str().trim(), confidence, span.order);
                }
            }
            SpanKind::Name => self.candidate(Role::ContactName, text, confidence, span.order),
            SpanKind::Title => self.candidate(Role::ContactTitle, text, confidence, span.order),
            SpanKind::SummaryText => self.summary.push((text.to_string(), confidence, span.order)),
            SpanKind::SkillsLine => {
                let items = text.split_once(':').map(|(_, items)| items).unwrap_or("");
                self.push_skills(items, confidence);
            }
            SpanKind::SkillItem => self.push_skills(text, confidence),
            SpanKind::DateLine => {
                if self.section == Some(Heading::Education) {
                    let entry = self.education_slot(|e| e.dates.is_some(), confidence);
                    entry.dates = Some(text.to_string());
                } else {
                    let entry = self.experience_slot(|e| e.dates.is_some(), confidence);
                    entry.dates = Some(text.to_string());
                }
            }
            SpanKind::ExperienceHeader => {
                // The fallback rule opens an implicit experience section
                self.section = Some(Heading::Experience);
                self.apply_experience_header(text, confidence);
            }
            SpanKind::ExperienceDetail => {
                let entry = self.experience_slot(
                    |e| !e.bullets.is_empty() || (e.role.is_some() && e.organization.is_some()),
                    confidence,
                );
                if entry.role.is_none() {
                    entry.role = Some(text.to_string());
                } else {
                    entry.organization = Some(text.to_string());
                }
            }
            SpanKind::ExperienceBullet => {
                let entry = self.experience_slot(|_| false, confidence);
                let bullet = text.trim_start_matches(BULLET_CHARS).trim();
                if !bullet.is_empty() {
                    entry.bullets.push(bullet.to_string());
                }
            }
            SpanKind::EducationLine => self.apply_education_line(text, confidence),
        }
    }

    fn candidate(&mut self, role: Role, text: &str, confidence: f32, order: usize) {
        self.candidates.push(Candidate {
            role,
            text: text.to_string(),
            confidence,
            order,
        });
    }

    fn push_skills(&mut self, text: &str, confidence: f32) {
        for item in text.split([',', ';', '•', '|', '·']) {
            let item = item.trim().trim_start_matches(BULLET_CHARS).trim();
            if !item.is_empty() {
                self.skills.push((item.to_string(), confidence));
            }
        }
    }

    /// Current experience entry, or a new one when there is none or
    /// `full(current)` says the next value belongs to a new entry.
    fn experience_slot(
        &mut self,
        full: impl Fn(&ExperienceEntry) -> bool,
        confidence: f32,
    ) -> &mut ExperienceEntry {
        let start_new = self.experience.last().map_or(true, |e| full(&e.value));
        if start_new {
            self.experience.push(Scored {
                value: ExperienceEntry::default(),
                confidence,
            });
        }
        let last = self.experience.len() - 1;
        let scored = &mut self.experience[last];
        scored.confidence = scored.confidence.max(confidence);
        &mut scored.value
    }

    fn education_slot(
        &mut self,
        full: impl Fn(&EducationEntry) -> bool,
        confidence: f32,
    ) -> &mut EducationEntry {
        let start_new = self.education.last().map_or(true, |e| full(&e.value));
        if start_new {
            self.education.push(Scored {
                value: EducationEntry::default(),
                confidence,
            });
        }
        let last = self.education.len() - 1;
        let scored = &mut self.education[last];
        scored.confidence = scored.confidence.max(confidence);
        &mut scored.value
    }

    fn apply_experience_header(&mut self, text: &str, confidence: f32) {
        let (rest, dates) = match self.classifier.find_date_range(text) {
            Some(m) => (remainder(text, &m), Some(m.as_str().to_string())),
            None => (text.to_string(), None),
        };
        let (role, organization) = split_header(&rest);

        // "Acme Corp" followed by "Senior Engineer": the second line is the role
        if let (None, Some(org), None) = (&role, &organization, &dates) {
            if let Some(current) = self.experience.last_mut() {
                let e = &mut current.value;
                if e.role.is_none() && e.organization.is_some() && e.bullets.is_empty() {
                    e.role = Some(org.clone());
                    current.confidence = current.confidence.max(confidence);
                    return;
                }
            }
        }

        self.experience.push(Scored {
            value: ExperienceEntry {
                organization,
                role,
                dates,
                bullets: Vec::new(),
            },
            confidence,
        });
    }

    fn apply_education_line(&mut self, text: &str, confidence: f32) {
        let (rest, dates) = match self.classifier.find_date_range(text) {
            Some(m) => (remainder(text, &m), Some(m.as_str().to_string())),
            None => (text.to_string(), None),
        };

        let mut institution = None;
        let mut degree = None;
        for part in split_parts(&rest) {
            if is_institution(&part) && institution.is_none() {
                institution = Some(part);
            } else if is_degree(&part) && degree.is_none() {
                degree = Some(part);
            } else if degree.is_none() {
                degree = Some(part);
            } else if institution.is_none() {
                institution = Some(part);
            }
        }

        let clashes = |e: &EducationEntry| {
            (institution.is_some() && e.institution.is_some())
                || (degree.is_some() && e.degree.is_some())
                || (dates.is_some() && e.dates.is_some())
        };
        let entry = self.education_slot(clashes, confidence);
        if institution.is_some() {
            entry.institution = institution;
        }
        if degree.is_some() {
            entry.degree = degree;
        }
        if dates.is_some() {
            entry.dates = dates;
        }
    }

    /// Resolve candidates and assemble the profile.
    fn finish(mut self) -> (CvProfile, ExtractionReport) {
        let mut profile = CvProfile::new();
        let hints = std::mem::take(&mut self.hints);

        // Hinted values compete as confidence-1.0 candidates.
        for hint in hints.iter().filter(|h| h.path.role.section().is_none()) {
            match hint.path.role {
                Role::Summary => self.summary.push((hint.items.join("\n"), 1.0, hint.order)),
                Role::Skills => {}
                role => self.candidates.push(Candidate {
                    role,
                    text: hint.items.join(" "),
                    confidence: 1.0,
                    order: hint.order,
                }),
            }
        }

        let mut confidences: HashMap<Role, f32> = HashMap::new();
        for role in [
            Role::ContactName,
            Role::ContactTitle,
            Role::ContactEmail,
            Role::ContactPhone,
        ] {
            if let Some(winner) = self.resolve_single(role) {
                confidences.insert(role, winner.confidence);
                let slot = match role {
                    Role::ContactName => &mut profile.contact.name,
                    Role::ContactTitle => &mut profile.contact.title,
                    Role::ContactEmail => &mut profile.contact.email,
                    _ => &mut profile.contact.phone,
                };
                *slot = Some(winner.text);
            }
        }

        if let Some((text, confidence)) = self.resolve_summary() {
            confidences.insert(Role::Summary, confidence);
            profile.summary = Some(text);
        }

        // Hinted entries are ordered by group number; classified entries follow.
        let mut hinted_experience: BTreeMap<usize, Scored<ExperienceEntry>> = BTreeMap::new();
        let mut hinted_education: BTreeMap<usize, Scored<EducationEntry>> = BTreeMap::new();
        let mut hinted_skills = Vec::new();
        for hint in &hints {
            let Some(index) = hint.path.index else {
                if hint.path.role == Role::Skills {
                    hinted_skills.extend(hint.items.iter().cloned());
                }
                continue;
            };
            match hint.path.role.section() {
                Some(Section::Experience) => {
                    let scored = hinted_experience.entry(index).or_default();
                    scored.confidence = 1.0;
                    let e = &mut scored.value;
                    let joined = Some(hint.items.join(" "));
                    match hint.path.role {
                        Role::ExperienceOrganization => e.organization = joined,
                        Role::ExperienceRole => e.role = joined,
                        Role::ExperienceDates => e.dates = joined,
                        _ => e.bullets.extend(hint.items.iter().cloned()),
                    }
                }
                Some(Section::Education) => {
                    let scored = hinted_education.entry(index).or_default();
                    scored.confidence = 1.0;
                    let e = &mut scored.value;
                    let joined = Some(hint.items.join(" "));
                    match hint.path.role {
                        Role::EducationInstitution => e.institution = joined,
                        Role::EducationDegree => e.degree = joined,
                        _ => e.dates = joined,
                    }
                }
                None => {}
            }
        }
        let mut experience: Vec<Scored<ExperienceEntry>> =
            hinted_experience.into_values().collect();
        let mut education: Vec<Scored<EducationEntry>> = hinted_education.into_values().collect();
        experience.extend(std::mem::take(&mut self.experience));
        education.extend(std::mem::take(&mut self.education));
        experience.retain(|e| !e.value.is_empty());
        education.retain(|e| !e.value.is_empty());

        let skills_confidence = if hinted_skills.is_empty() {
            let mut seen = std::collections::HashSet::new();
            let mut best: f32 = 0.0;
            for (skill, confidence) in std::mem::take(&mut self.skills) {
                if seen.insert(skill.to_lowercase()) {
                    best = best.max(confidence);
                    profile.skills.push(skill);
                }
            }
            best
        } else {
            for (skill, confidence) in std::mem::take(&mut self.skills) {
                self.report
                    .record(Role::Skills.as_str(), confidence, EntryStatus::Superseded, Some(&skill));
            }
            profile.skills = hinted_skills;
            1.0
        };

        let experience_confidences: Vec<f32> = experience.iter().map(|e| e.confidence).collect();
        let education_confidences: Vec<f32> = education.iter().map(|e| e.confidence).collect();
        profile.experience = experience.into_iter().map(|e| e.value).collect();
        profile.education = education.into_iter().map(|e| e.value).collect();

        for path in profile.present_fields() {
            let confidence = match (path.role.section(), path.index) {
                (Some(Section::Experience), Some(i)) => experience_confidences[i],
                (Some(Section::Education), Some(i)) => education_confidences[i],
                _ if path.role == Role::Skills => skills_confidence,
                _ => confidences.get(&path.role).copied().unwrap_or(1.0),
            };
            let excerpt = profile
                .field_items(&path)
                .map(|items| items.join("; "))
                .unwrap_or_default();
            self.report.record(
                path.to_string(),
                confidence,
                EntryStatus::Extracted,
                Some(&excerpt),
            );
        }

        for (field, absent) in [
            ("contact.name", profile.contact.name.is_none()),
            ("contact.title", profile.contact.title.is_none()),
            ("contact.email", profile.contact.email.is_none()),
            ("contact.phone", profile.contact.phone.is_none()),
            ("summary", profile.summary.is_none()),
            ("experience", profile.experience.is_empty()),
            ("education", profile.education.is_empty()),
            ("skills", profile.skills.is_empty()),
        ] {
            if absent {
                self.report.record(field, 0.0, EntryStatus::Absent, None);
            }
        }

        (profile, self.report)
    }

    /// Highest confidence wins; ties go to the earliest span.
    fn resolve_single(&mut self, role: Role) -> Option<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .candidates
            .iter()
            .filter(|c| c.role == role)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.order.cmp(&b.order))
        });

        let mut iter = candidates.into_iter();
        let winner = iter.next()?;
        for loser in iter {
            log::debug!(
                "{}: '{}' ({:.2}) superseded by '{}' ({:.2})",
                role,
                loser.text,
                loser.confidence,
                winner.text,
                winner.confidence
            );
            self.report.record(
                role.as_str(),
                loser.confidence,
                EntryStatus::Superseded,
                Some(&loser.text),
            );
        }
        Some(winner)
    }

    /// A hinted summary replaces classified summary lines; otherwise the
    /// lines are joined in document order.
    fn resolve_summary(&mut self) -> Option<(String, f32)> {
        let summary = std::mem::take(&mut self.summary);
        if summary.is_empty() {
            return None;
        }

        if let Some(pos) = summary.iter().position(|(_, c, _)| *c >= 1.0) {
            for (i, (text, confidence, _)) in summary.iter().enumerate() {
                if i != pos {
                    self.report.record(
                        Role::Summary.as_str(),
                        *confidence,
                        EntryStatus::Superseded,
                        Some(text),
                    );
                }
            }
            let (text, confidence, _) = summary[pos].clone();
            return Some((text, confidence));
        }

        let confidence = summary
            .iter()
            .map(|(_, c, _)| *c)
            .fold(f32::MAX, f32::min);
        let text = summary
            .into_iter()
            .map(|(t, _, _)| t)
            .collect::<Vec<_>>()
            .join("\n");
        Some((text, confidence))
    }
}

/// Schema role declared on a source shape, if any.
fn hinted_role(shape: &Shape) -> Option<Role> {
    let spec = shape.placeholder()?;
    match spec.role.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            log::warn!(
                "shape {} '{}' declares unknown role '{}', classifying its text instead",
                shape.id,
                shape.name,
                spec.role
            );
            None
        }
    }
}

/// NFC-normalize and collapse whitespace.
fn normalize(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `Role at Org`, `Role | Org`, `Role, Org`; a bare line is the organization.
fn split_header(text: &str) -> (Option<String>, Option<String>) {
    let clean = |s: &str| {
        let s = s.trim().trim_matches(|c: char| ",;|-–—".contains(c)).trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    let lower = text.to_lowercase();
    if let Some(pos) = lower.find(" at ") {
        return (clean(&text[..pos]), clean(&text[pos + 4..]));
    }
    for sep in HEADER_SEPARATORS {
        if let Some((left, right)) = text.split_once(sep) {
            return (clean(left), clean(right));
        }
    }
    (None, clean(text))
}

fn split_parts(text: &str) -> Vec<String> {
    let mut parts = vec![text.to_string()];
    for sep in HEADER_SEPARATORS {
        parts = parts
            .iter()
            .flat_map(|p| p.split(sep).map(|s| s.to_string()).collect::<Vec<_>>())
            .collect();
    }
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_institution(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["university", "college", "school", "institute", "academy", "polytechnic", "universität", "école"]
        .iter()
        .any(|k| lower.contains(k))
}

fn is_degree(text: &str) -> bool {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '.')
        .filter(|w| !w.is_empty())
        .collect();
    ["bachelor", "master", "diploma", "degree", "doctor", "phd", "ph.d", "mba", "bsc", "b.sc", "msc", "m.sc", "ba", "b.a.", "ma", "m.a.", "bs", "ms", "beng", "meng"]
        .iter()
        .any(|k| words.iter().any(|w| w == k || (k.len() > 3 && w.starts_with(k))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PackageKind;
    use crate::model::{Paragraph, Run, Shape, ShapeKind, Slide, TextBody};
    use crate::model::{Frame, Insets, PlaceholderSpec};

    fn body(lines: &[(&str, Option<f32>, bool, bool)]) -> TextBody {
        TextBody {
            span: 0..0,
            body_props_xml: "<a:bodyPr/>".into(),
            list_style_xml: None,
            insets: Insets::default(),
            paragraphs: lines
                .iter()
                .map(|(text, size, bold, bullet)| {
                    let mut run = Run::new(*text);
                    run.style.size = *size;
                    run.style.bold = *bold;
                    let mut p = Paragraph::new();
                    p.add_run(run);
                    p.bullet = *bullet;
                    p
                })
                .collect(),
        }
    }

    fn shape(id: u32, descr: Option<&str>, text: TextBody) -> Shape {
        Shape {
            id,
            name: format!("Shape {}", id),
            frame: Frame::default(),
            ph_type: None,
            text: Some(text),
            kind: match descr.and_then(PlaceholderSpec::parse) {
                Some(spec) => ShapeKind::Placeholder(spec),
                None => ShapeKind::Static,
            },
        }
    }

    fn document(shapes: Vec<Shape>) -> Document {
        let mut doc = Document::new(PackageKind::Presentation, "ppt/presentation.xml");
        let mut slide = Slide::new(0, "ppt/slides/slide1.xml");
        slide.shapes = shapes;
        doc.slides.push(slide);
        doc
    }

    #[test]
    fn test_contact_block() {
        let doc = document(vec![shape(
            2,
            None,
            body(&[("Jane Doe", Some(28.0), true, false), ("jane@x.com", Some(11.0), false, false)]),
        )]);
        let (profile, report) = extract(&doc);

        assert_eq!(profile.contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.contact.email.as_deref(), Some("jane@x.com"));
        assert_eq!(report.status_of("experience"), Some(EntryStatus::Absent));
        assert_eq!(report.status_of("education"), Some(EntryStatus::Absent));
        assert_eq!(report.ambiguous_count(), 0);
    }

    #[test]
    fn test_contact_line_split() {
        let doc = document(vec![shape(
            2,
            None,
            body(&[("Jane Doe, jane@x.com", Some(11.0), false, false)]),
        )]);
        let (profile, _) = extract(&doc);
        assert_eq!(profile.contact.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.contact.email.as_deref(), Some("jane@x.com"));
    }

    #[test]
    fn test_name_tie_goes_to_earlier_span() {
        let doc = document(vec![
            shape(2, None, body(&[("Jane Doe", Some(24.0), true, false)])),
            shape(3, None, body(&[("John Roe", Some(24.0), true, false)])),
        ]);
        let (profile, report) = extract(&doc);

        assert_eq!(profile.contact.name.as_deref(), Some("Jane Doe"));
        let superseded: Vec<_> = report.with_status(EntryStatus::Superseded).collect();
        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].excerpt.as_deref(), Some("John Roe"));
    }

    #[test]
    fn test_sections() {
        let doc = document(vec![shape(
            2,
            None,
            body(&[
                ("Jane Doe", Some(28.0), true, false),
                ("Summary", Some(14.0), true, false),
                ("Engineer with ten years of platform work.", Some(11.0), false, false),
                ("Experience", Some(14.0), true, false),
                ("Staff Engineer at Acme, 2019 - Present", Some(11.0), true, false),
                ("Led the storage team", Some(11.0), false, true),
                ("Cut costs by 30%", Some(11.0), false, true),
                ("Engineer | Initech", Some(11.0), true, false),
                ("2015 - 2019", Some(11.0), false, false),
                ("Built reporting", Some(11.0), false, true),
                ("Education", Some(14.0), true, false),
                ("MSc Computer Science, University of Leeds, 2013 - 2015", Some(11.0), false, false),
                ("Skills", Some(14.0), true, false),
                ("Rust, Go; SQL", Some(11.0), false, false),
            ]),
        )]);
        let (profile, report) = extract(&doc);

        assert_eq!(
            profile.summary.as_deref(),
            Some("Engineer with ten years of platform work.")
        );
        assert_eq!(profile.experience.len(), 2);
        let first = &profile.experience[0];
        assert_eq!(first.role.as_deref(), Some("Staff Engineer"));
        assert_eq!(first.organization.as_deref(), Some("Acme"));
        assert_eq!(first.dates.as_deref(), Some("2019 - Present"));
        assert_eq!(first.bullets, vec!["Led the storage team", "Cut costs by 30%"]);
        let second = &profile.experience[1];
        assert_eq!(second.organization.as_deref(), Some("Initech"));
        assert_eq!(second.dates.as_deref(), Some("2015 - 2019"));

        assert_eq!(profile.education.len(), 1);
        let edu = &profile.education[0];
        assert_eq!(edu.degree.as_deref(), Some("MSc Computer Science"));
        assert_eq!(edu.institution.as_deref(), Some("University of Leeds"));
        assert_eq!(edu.dates.as_deref(), Some("2013 - 2015"));

        assert_eq!(profile.skills, vec!["Rust", "Go", "SQL"]);
        assert_eq!(
            report.status_of("experience[1].organization"),
            Some(EntryStatus::Extracted)
        );
    }

    #[test]
    fn test_role_hints_win() {
        let doc = document(vec![
            shape(2, None, body(&[("Jane Doe", Some(28.0), true, false)])),
            shape(
                3,
                Some("role=contact.name"),
                body(&[("Jane Q. Doe", Some(11.0), false, false)]),
            ),
            shape(
                4,
                Some("role=experience[].role; group=1"),
                body(&[("Architect", None, false, false)]),
            ),
        ]);
        let (profile, report) = extract(&doc);

        assert_eq!(profile.contact.name.as_deref(), Some("Jane Q. Doe"));
        assert_eq!(report.status_of("contact.name"), Some(EntryStatus::Extracted));
        // Group numbers order hinted entries, they are not positions
        assert_eq!(profile.experience.len(), 1);
        assert_eq!(profile.experience[0].role.as_deref(), Some("Architect"));
    }

    #[test]
    fn test_hint_groups_are_ordering_keys() {
        let doc = document(vec![
            shape(
                2,
                Some("role=experience[].organization; group=4000000000"),
                body(&[("Globex", None, false, false)]),
            ),
            shape(
                3,
                Some("role=experience[].organization; group=7"),
                body(&[("Acme", None, false, false)]),
            ),
            shape(
                4,
                Some("role=experience[].role; group=7"),
                body(&[("Engineer", None, false, false)]),
            ),
        ]);
        let (profile, _) = extract(&doc);

        assert_eq!(profile.experience.len(), 2);
        assert_eq!(profile.experience[0].organization.as_deref(), Some("Acme"));
        assert_eq!(profile.experience[0].role.as_deref(), Some("Engineer"));
        assert_eq!(profile.experience[1].organization.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_threshold_marks_ambiguous() {
        let doc = document(vec![shape(2, None, body(&[("Jane", Some(11.0), false, false)]))]);

        let (profile, report) = extract(&doc);
        assert!(profile.contact.name.is_none());
        assert_eq!(report.ambiguous_count(), 1);

        let lenient = ExtractOptions::new().with_threshold(0.4);
        let (profile, _) = extract_with_options(&doc, &lenient);
        assert_eq!(profile.contact.name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Ame\u{0301}lie \t Poulain "), "Amélie Poulain");
    }

    #[test]
    fn test_split_header() {
        assert_eq!(
            split_header("Engineer at Acme"),
            (Some("Engineer".into()), Some("Acme".into()))
        );
        assert_eq!(split_header("Acme Corp"), (None, Some("Acme Corp".into())));
    }
}
