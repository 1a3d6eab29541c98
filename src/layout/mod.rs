//! Overflow resolution.
//!
//! Every bound placeholder is measured against its capacity. Content that
//! does not fit goes through a fixed ladder of strategies, and the first one
//! that fits wins:
//!
//! 1. [`FitStrategy::Shrink`]: step the font size down to the floor.
//! 2. [`FitStrategy::Truncate`]: cut list content to `max-entries`.
//! 3. [`FitStrategy::Paginate`]: flow the rest into continuation slots.
//! 4. [`FitStrategy::Unresolved`]: keep the floor size and report it.

pub mod metrics;
mod options;

pub use metrics::Capacity;
pub use options::LayoutOptions;

use std::collections::HashSet;

use serde::Serialize;

use crate::bind::{Binding, Mapping, PlaceholderRef, TemplatePlaceholder, TemplateSpec};
use crate::model::FieldPath;

/// How a placeholder's content was made to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    Unchanged,
    Shrink,
    Truncate,
    Paginate,
    /// Nothing fit; the content is kept at the floor size and reported.
    Unresolved,
}

/// Final content and font size of one bound placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPlaceholder {
    pub slot: PlaceholderRef,
    pub field: FieldPath,
    pub strategy: FitStrategy,

    /// Font size to render at, in points
    pub font_size: f32,

    /// Font size declared by the template
    pub original_font_size: f32,

    /// Paragraphs that stay in this placeholder
    pub paragraphs: Vec<String>,

    /// Lines the kept paragraphs need at `font_size`
    pub required_lines: u32,

    /// Lines available at `font_size`
    pub capacity_lines: u32,

    /// Entries cut by truncation
    pub truncated_entries: usize,
}

impl ResolvedPlaceholder {
    /// Whether the font size differs from the template's.
    pub fn font_changed(&self) -> bool {
        (self.font_size - self.original_font_size).abs() > f32::EPSILON
    }
}

/// Overflow content placed into one continuation placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFill {
    /// Continuation placeholder shape on the cloned slide
    pub shape_id: u32,
    pub field: FieldPath,
    pub paragraphs: Vec<String>,
    pub font_size: f32,
}

/// One continuation slide to append: a clone of a template slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContinuationPage {
    /// Index of the template slide that is cloned
    pub template_slide: usize,

    /// Zero-based continuation page number
    pub page: usize,

    pub fills: Vec<PageFill>,
}

/// Summary of a placeholder's outcome, for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOutcome {
    pub field: String,
    pub slot: String,
    pub strategy: FitStrategy,
    pub font_size: f32,
    pub truncated_entries: usize,
}

/// The template with every bound placeholder's final content.
#[derive(Debug, Clone)]
pub struct ResolvedLayout {
    template: TemplateSpec,

    /// Resolved placeholders in template order
    pub placeholders: Vec<ResolvedPlaceholder>,

    /// Continuation slides to append, in page order
    pub pages: Vec<ContinuationPage>,
}

impl ResolvedLayout {
    /// The template this layout was resolved against.
    pub fn template(&self) -> &TemplateSpec {
        &self.template
    }

    /// Resolution for a slot.
    pub fn placeholder(&self, slot: PlaceholderRef) -> Option<&ResolvedPlaceholder> {
        self.placeholders.iter().find(|p| p.slot == slot)
    }

    /// Placeholders whose overflow could not be resolved.
    pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedPlaceholder> {
        self.placeholders
            .iter()
            .filter(|p| p.strategy == FitStrategy::Unresolved)
    }

    /// Per-placeholder outcomes for reporting.
    pub fn outcomes(&self) -> Vec<LayoutOutcome> {
        self.placeholders
            .iter()
            .map(|p| LayoutOutcome {
                field: p.field.to_string(),
                slot: p.slot.to_string(),
                strategy: p.strategy,
                font_size: p.font_size,
                truncated_entries: p.truncated_entries,
            })
            .collect()
    }
}

/// Resolve overflow with default options.
pub fn resolve(mapping: &Mapping, template: TemplateSpec) -> ResolvedLayout {
    resolve_with_options(mapping, template, &LayoutOptions::default())
}

/// Resolve overflow for every binding of `mapping`.
pub fn resolve_with_options(
    mapping: &Mapping,
    template: TemplateSpec,
    options: &LayoutOptions,
) -> ResolvedLayout {
    let mut engine = Engine {
        template: &template,
        options,
        available: mapping.continuations.iter().copied().collect(),
        used: HashSet::new(),
        pages: Vec::new(),
    };

    let mut placeholders = Vec::with_capacity(mapping.bindings.len());
    for binding in &mapping.bindings {
        match template.placeholder(binding.slot) {
            Some(placeholder) => placeholders.push(engine.fit(placeholder, binding)),
            None => log::warn!("binding for unknown {}, skipped", binding.slot),
        }
    }

    let mut pages = engine.pages;
    pages.sort_by_key(|p| (p.page, p.template_slide));

    ResolvedLayout {
        template,
        placeholders,
        pages,
    }
}

struct Engine<'a> {
    template: &'a TemplateSpec,
    options: &'a LayoutOptions,

    /// Continuation slots offered by the binder
    available: HashSet<PlaceholderRef>,

    /// (page, slot) pairs already filled
    used: HashSet<(usize, PlaceholderRef)>,

    pages: Vec<ContinuationPage>,
}

impl Engine<'_> {
    fn fit(&mut self, placeholder: &TemplatePlaceholder, binding: &Binding) -> ResolvedPlaceholder {
        let capacity = placeholder.capacity;
        let base = capacity.font_size;
        let floor = self.floor(placeholder);
        let content = &binding.content;

        let resolved = |strategy, size: f32, paragraphs: Vec<String>, truncated| {
            ResolvedPlaceholder {
                slot: binding.slot,
                field: binding.field,
                strategy,
                font_size: size,
                original_font_size: base,
                required_lines: capacity.required_lines(&paragraphs, size),
                capacity_lines: capacity.at(size).0,
                paragraphs,
                truncated_entries: truncated,
            }
        };

        if capacity.fits(content, base) {
            return resolved(FitStrategy::Unchanged, base, content.clone(), 0);
        }

        let first_step = base - self.options.shrink_step;
        if let Some(size) = self.largest_fitting_size(&capacity, content, first_step, floor) {
            log::debug!("{}: shrink {}pt -> {}pt", binding.field, base, size);
            return resolved(FitStrategy::Shrink, size, content.clone(), 0);
        }

        let is_list = binding.field.role.is_list() || content.len() > 1;
        let truncated = match placeholder.max_entries {
            Some(max) if is_list && content.len() > max => Some(content[..max].to_vec()),
            _ => None,
        };
        if let Some(kept) = &truncated {
            if let Some(size) = self.largest_fitting_size(&capacity, kept, base, floor) {
                let cut = content.len() - kept.len();
                log::debug!("{}: truncated {} entries at {}pt", binding.field, cut, size);
                return resolved(FitStrategy::Truncate, size, kept.clone(), cut);
            }
        }

        if let Some(kept) = self.paginate(placeholder, binding) {
            return resolved(FitStrategy::Paginate, base, kept, 0);
        }

        let (paragraphs, cut) = match truncated {
            Some(kept) => {
                let cut = content.len() - kept.len();
                (kept, cut)
            }
            None => (content.clone(), 0),
        };
        log::warn!(
            "{} overflows {} even at {}pt",
            binding.field,
            binding.slot,
            floor
        );
        resolved(FitStrategy::Unresolved, floor, paragraphs, cut)
    }

    /// Effective font floor: the larger of the global and declared minimums,
    /// never above the template's own size.
    fn floor(&self, placeholder: &TemplatePlaceholder) -> f32 {
        let declared = placeholder.min_font_size.unwrap_or(0.0);
        self.options
            .min_font_size
            .max(declared)
            .min(placeholder.capacity.font_size)
    }

    /// Step down from `start` to `floor`, returning the first size that fits.
    fn largest_fitting_size(
        &self,
        capacity: &Capacity,
        paragraphs: &[String],
        start: f32,
        floor: f32,
    ) -> Option<f32> {
        let step = self.options.shrink_step.max(0.1);
        let mut size = start.max(floor);
        loop {
            if capacity.fits(paragraphs, size) {
                return Some(size);
            }
            if size <= floor {
                return None;
            }
            size = (size - step).max(floor);
        }
    }

    /// Spread content over the placeholder and continuation slots of the same
    /// role. Returns the part that stays in the placeholder, or `None` when the
    /// content cannot be placed completely; nothing is allocated in that case.
    fn paginate(
        &mut self,
        placeholder: &TemplatePlaceholder,
        binding: &Binding,
    ) -> Option<Vec<String>> {
        let max_pages = self.options.max_continuation_pages;
        if max_pages == 0 {
            return None;
        }

        let template = self.template;
        let continuations: Vec<&TemplatePlaceholder> = template
            .continuations(placeholder.role)
            .filter(|c| self.available.contains(&c.slot))
            .collect();
        if continuations.is_empty() {
            return None;
        }

        let content = &binding.content;
        let head = placeholder
            .capacity
            .fitting_prefix(content, placeholder.capacity.font_size);
        if head == 0 {
            return None;
        }

        let mut plan: Vec<(usize, &TemplatePlaceholder, usize, usize)> = Vec::new();
        let mut new_pages: HashSet<(usize, usize)> = HashSet::new();
        let mut next = head;

        'pages: for page in 0..max_pages {
            for &slot in &continuations {
                if next == content.len() {
                    break 'pages;
                }
                if self.used.contains(&(page, slot.slot)) {
                    continue;
                }
                let key = (slot.slot.slide, page);
                if !self.has_page(key) && !new_pages.contains(&key) {
                    if self.pages.len() + new_pages.len() >= max_pages {
                        continue;
                    }
                    new_pages.insert(key);
                }

                let taken = slot
                    .capacity
                    .fitting_prefix(&content[next..], slot.capacity.font_size);
                if taken == 0 {
                    return None;
                }
                plan.push((page, slot, next, next + taken));
                next += taken;
            }
        }

        if next < content.len() {
            return None;
        }

        for (page, slot, from, to) in plan {
            self.used.insert((page, slot.slot));
            let fill = PageFill {
                shape_id: slot.slot.shape_id,
                field: binding.field,
                paragraphs: content[from..to].to_vec(),
                font_size: slot.capacity.font_size,
            };
            self.page_mut(slot.slot.slide, page).fills.push(fill);
        }

        log::debug!(
            "{}: {} of {} entries continue on later pages",
            binding.field,
            content.len() - head,
            content.len()
        );
        Some(content[..head].to_vec())
    }

    fn has_page(&self, (slide, page): (usize, usize)) -> bool {
        self.pages
            .iter()
            .any(|p| p.template_slide == slide && p.page == page)
    }

    fn page_mut(&mut self, slide: usize, page: usize) -> &mut ContinuationPage {
        let pos = match self
            .pages
            .iter()
            .position(|p| p.template_slide == slide && p.page == page)
        {
            Some(pos) => pos,
            None => {
                self.pages.push(ContinuationPage {
                    template_slide: slide,
                    page,
                    fills: Vec::new(),
                });
                self.pages.len() - 1
            }
        };
        &mut self.pages[pos]
    }
}
