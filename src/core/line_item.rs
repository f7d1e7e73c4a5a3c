//! Line items - the flat, ordered rows that make up a quote's content.
//!
//! A row is either structural (section title, subsection title, free text) or
//! billable (material, labor, work). There are no parent pointers: which
//! section a row belongs to is derived from its place in the sequence, see
//! [`crate::core::hierarchy`].
//!
//! On the wire a row is a flat JSON object whose `type` field carries the
//! legacy tags (`title`, `subtitle`, `text`, `material`, `labor`, `work`).
//! Unrecognized tags deserialize to [`LineKind::Unknown`] so legacy data stays
//! renderable.

use crate::core::money;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Tax rate applied to new billable rows (French standard VAT rate).
pub const DEFAULT_TAX_RATE_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// One row of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Insertion order; defines both display order and hierarchy
    #[serde(default, deserialize_with = "money::lenient_int::deserialize")]
    pub position: i32,
    /// What the row is, with the fields meaningful for that kind
    #[serde(flatten)]
    pub kind: LineKind,
}

/// The tagged content of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineKind {
    /// Top-level grouping ("Titre")
    #[serde(rename = "title", alias = "section")]
    Section(Heading),
    /// Second-level grouping ("Sous-titre")
    #[serde(rename = "subtitle", alias = "subsection")]
    Subsection(Heading),
    /// Free-form paragraph, never billed
    Text(TextBlock),
    /// Supplies, may list their components
    Material(CompositeLine),
    /// Hours or days of work
    Labor(BillableLine),
    /// Composite work item, may list its components
    Work(CompositeLine),
    /// Anything this version does not understand; skipped by every computation
    #[serde(other)]
    Unknown,
}

/// Section or subsection title with its derived subtotal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    #[serde(default, alias = "title", deserialize_with = "null_as_empty")]
    pub label: String,
    /// Sum of the line totals of every billable row this heading owns
    #[serde(default, alias = "subtotal", deserialize_with = "money::lenient::deserialize")]
    pub section_subtotal: Decimal,
}

/// Free text row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default, alias = "description", deserialize_with = "null_as_empty")]
    pub body: String,
}

/// The priced part shared by material, labor and work rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillableLine {
    #[serde(default, alias = "title", deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default, alias = "description", deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, deserialize_with = "money::lenient::deserialize")]
    pub quantity: Decimal,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub unit: String,
    #[serde(default, deserialize_with = "money::lenient::deserialize")]
    pub unit_price: Decimal,
    #[serde(default, alias = "vatRate", deserialize_with = "money::lenient::deserialize")]
    pub tax_rate_percent: Decimal,
    /// Derived: `round2(quantity × unit_price)`. Stored so it survives round-trips.
    #[serde(default, alias = "totalHT", deserialize_with = "money::lenient::deserialize")]
    pub line_total_excl_tax: Decimal,
}

/// A billable line that may itemize its components ("plaque BA13 x1 m²").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeLine {
    #[serde(flatten)]
    pub line: BillableLine,
    #[serde(default, alias = "details", deserialize_with = "null_as_empty")]
    pub technical_details: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl BillableLine {
    /// Creates a priced line at the default tax rate. The line total is filled
    /// in by the next recalculation.
    #[must_use]
    pub fn new(label: &str, quantity: Decimal, unit: &str, unit_price: Decimal) -> Self {
        Self {
            label: label.to_string(),
            body: String::new(),
            quantity,
            unit: unit.to_string(),
            unit_price,
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            line_total_excl_tax: Decimal::ZERO,
        }
    }

    /// Replaces the tax rate.
    #[must_use]
    pub fn with_tax_rate(mut self, tax_rate_percent: Decimal) -> Self {
        self.tax_rate_percent = tax_rate_percent;
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

impl CompositeLine {
    /// Wraps a priced line with no component details.
    #[must_use]
    pub const fn new(line: BillableLine) -> Self {
        Self {
            line,
            technical_details: Vec::new(),
        }
    }
}

impl LineKind {
    /// Wire tag of this kind, also used as the persisted `kind` column.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Section(_) => "title",
            Self::Subsection(_) => "subtitle",
            Self::Text(_) => "text",
            Self::Material(_) => "material",
            Self::Labor(_) => "labor",
            Self::Work(_) => "work",
            Self::Unknown => "unknown",
        }
    }
}

impl LineItem {
    /// Section title row.
    #[must_use]
    pub fn section(position: i32, label: &str) -> Self {
        Self::titled(position, label, LineKind::Section)
    }

    /// Subsection title row.
    #[must_use]
    pub fn subsection(position: i32, label: &str) -> Self {
        Self::titled(position, label, LineKind::Subsection)
    }

    fn titled(position: i32, label: &str, kind: fn(Heading) -> LineKind) -> Self {
        Self {
            position,
            kind: kind(Heading {
                label: label.to_string(),
                section_subtotal: Decimal::ZERO,
            }),
        }
    }

    /// Free text row.
    #[must_use]
    pub fn text(position: i32, body: &str) -> Self {
        Self {
            position,
            kind: LineKind::Text(TextBlock {
                body: body.to_string(),
            }),
        }
    }

    /// Material row.
    #[must_use]
    pub const fn material(position: i32, line: BillableLine) -> Self {
        Self {
            position,
            kind: LineKind::Material(CompositeLine::new(line)),
        }
    }

    /// Labor row.
    #[must_use]
    pub const fn labor(position: i32, line: BillableLine) -> Self {
        Self {
            position,
            kind: LineKind::Labor(line),
        }
    }

    /// Composite work row.
    #[must_use]
    pub const fn work(position: i32, line: BillableLine) -> Self {
        Self {
            position,
            kind: LineKind::Work(CompositeLine::new(line)),
        }
    }

    /// Adds a component detail. Only material and work rows carry details;
    /// on any other kind this is a no-op and returns `false`.
    pub fn push_technical_detail(&mut self, detail: &str) -> bool {
        match &mut self.kind {
            LineKind::Material(composite) | LineKind::Work(composite) => {
                composite.technical_details.push(detail.to_string());
                true
            }
            _ => false,
        }
    }

    /// Component details, empty for kinds that cannot have any.
    #[must_use]
    pub fn technical_details(&self) -> &[String] {
        match &self.kind {
            LineKind::Material(composite) | LineKind::Work(composite) => {
                &composite.technical_details
            }
            _ => &[],
        }
    }

    #[must_use]
    pub const fn is_section(&self) -> bool {
        matches!(self.kind, LineKind::Section(_))
    }

    #[must_use]
    pub const fn is_subsection(&self) -> bool {
        matches!(self.kind, LineKind::Subsection(_))
    }

    #[must_use]
    pub const fn is_billable(&self) -> bool {
        self.billable().is_some()
    }

    /// The priced part of a material, labor or work row.
    #[must_use]
    pub const fn billable(&self) -> Option<&BillableLine> {
        match &self.kind {
            LineKind::Material(composite) | LineKind::Work(composite) => Some(&composite.line),
            LineKind::Labor(line) => Some(line),
            _ => None,
        }
    }

    /// Mutable access to the priced part of a billable row.
    pub fn billable_mut(&mut self) -> Option<&mut BillableLine> {
        match &mut self.kind {
            LineKind::Material(composite) | LineKind::Work(composite) => Some(&mut composite.line),
            LineKind::Labor(line) => Some(line),
            _ => None,
        }
    }

    /// The title part of a section or subsection row.
    #[must_use]
    pub const fn heading(&self) -> Option<&Heading> {
        match &self.kind {
            LineKind::Section(heading) | LineKind::Subsection(heading) => Some(heading),
            _ => None,
        }
    }

    pub(crate) fn heading_mut(&mut self) -> Option<&mut Heading> {
        match &mut self.kind {
            LineKind::Section(heading) | LineKind::Subsection(heading) => Some(heading),
            _ => None,
        }
    }

    /// Display label: heading or billable title, or the body of a text row.
    #[must_use]
    pub fn label(&self) -> &str {
        match &self.kind {
            LineKind::Section(heading) | LineKind::Subsection(heading) => &heading.label,
            LineKind::Text(text) => &text.body,
            LineKind::Material(composite) | LineKind::Work(composite) => &composite.line.label,
            LineKind::Labor(line) => &line.label,
            LineKind::Unknown => "",
        }
    }
}
