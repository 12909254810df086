//! Page categories.
//!
//! DESIGN
//! ======
//! The set of categories is closed: every page belongs to one `Category`
//! variant and everything category-specific (the form schema, which fields a
//! page view shows, which canvas editor the category opens) is an
//! exhaustive `match`. Labels read from storage that match no variant are
//! treated as `Encyclopedia` with a warning.

#[cfg(test)]
#[path = "category_test.rs"]
mod category_test;

use canvas::doc::{Meta, SceneKind};
use serde_json::Value;
use tracing::warn;

use crate::page::normalize_page_name;

/// How a form field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Select(&'static [&'static str]),
}

/// One form field of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key in the page's meta object.
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// The value names another wiki page.
    pub links: bool,
}

const fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Text, links: false }
}

const fn area(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::TextArea, links: false }
}

const fn select(key: &'static str, label: &'static str, options: &'static [&'static str]) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Select(options), links: false }
}

const fn page_link(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Text, links: true }
}

const CHARACTER_STATUS: &[&str] = &["Alive", "Deceased", "Unknown"];
const GOVERNMENT: &[&str] = &["Tribal", "Monarchy", "Democracy", "Corporate", "Theocracy", "Other"];
const RARITY: &[&str] = &["Common", "Uncommon", "Rare", "Epic", "Legendary", "Unique"];
const LANGUAGE_STATUS: &[&str] = &["Active", "Constructed", "Dead", "Unknown"];
const ACTS: &[&str] = &["Act I", "Act II", "Act III"];

const CHARACTERS: &[FieldSpec] = &[
    text("fullName", "Full Name"),
    text("pronouns", "Pronouns"),
    text("age", "Age"),
    text("role", "Role / Occupation"),
    select("status", "Status", CHARACTER_STATUS),
    text("affiliation", "Affiliation / Faction"),
    area("personality", "Personality"),
    area("background", "Background"),
    area("physicalDescription", "Physical Description"),
    area("dialogueStyle", "Dialogue Style"),
];

const LOCATIONS: &[FieldSpec] = &[
    text("type", "Type"),
    text("region", "Region / Planet"),
    text("population", "Population"),
    text("affiliation", "Controlling Faction / Owner"),
    area("coords", "Coordinates"),
    area("notes", "Notes"),
];

const MANUSCRIPT: &[FieldSpec] = &[select("act", "Act", ACTS), text("chapter", "Chapter")];

const TIMELINE: &[FieldSpec] = &[text("date", "Date"), text("era", "Era / Calendar System"), area("tags", "Tags")];

const ARCS: &[FieldSpec] = &[page_link("character", "Character"), text("status", "Status"), area("beats", "Beats")];

const CALENDAR: &[FieldSpec] =
    &[text("system", "Calendar System"), text("epoch", "Epoch / Year Zero"), area("holidays", "Important Dates")];

const CULTURES: &[FieldSpec] = &[
    select("government", "Government", GOVERNMENT),
    text("era", "Era / Age"),
    text("language", "Primary Language"),
    text("origin", "Origin / Region"),
    text("population", "Population"),
    page_link("religion", "Religion"),
    area("customs", "Customs and Values"),
    area("notables", "Notable Figures and Institutions"),
];

const ITEMS: &[FieldSpec] = &[
    text("type", "Type"),
    select("rarity", "Rarity", RARITY),
    text("value", "Value"),
    text("origin", "Origin"),
    page_link("relatedArc", "Related Arc"),
    area("properties", "Properties / Abilities"),
];

const LANGUAGES: &[FieldSpec] = &[
    text("family", "Language Family"),
    text("script", "Script / Alphabet"),
    text("speakers", "Speakers"),
    select("status", "Status", LANGUAGE_STATUS),
    area("phonology", "Phonology / Grammar"),
    area("sample", "Sample"),
];

const MAGIC: &[FieldSpec] = &[text("source", "Source of Magic"), text("limits", "Limitations"), area("rules", "Rules")];

const PHILOSOPHIES: &[FieldSpec] = &[area("core", "Core Tenets")];

const RELIGIONS: &[FieldSpec] = &[
    text("pantheon", "Pantheon / Central Focus"),
    text("clergy", "Clergy / Orders"),
    text("scripture", "Scripture / Sacred Texts"),
    text("holidays", "Major Holidays"),
    area("tenets", "Key Tenets"),
    area("rituals", "Rituals / Practices"),
];

const RESEARCH: &[FieldSpec] = &[area("refs", "References")];

const SYSTEMS: &[FieldSpec] = &[
    text("type", "System Type"),
    area("history", "History"),
    area("impact", "Social Impact"),
    area("perception", "Perception"),
];

const SPECIES: &[FieldSpec] = &[text("classification", "Classification"), text("home", "Homeworld / Origin"), area("traits", "Traits")];

/// A page category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Category {
    #[default]
    Encyclopedia,
    Characters,
    Locations,
    Manuscript,
    Timeline,
    Relationships,
    Arcs,
    Calendar,
    Cultures,
    Items,
    Languages,
    Magic,
    Maps,
    Philosophies,
    Religions,
    Research,
    Systems,
    Species,
}

/// A filled-in field ready for a page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewField {
    pub label: &'static str,
    pub value: String,
    /// Page key the value links to.
    pub link: Option<String>,
}

impl Category {
    pub const ALL: [Category; 18] = [
        Self::Encyclopedia,
        Self::Characters,
        Self::Locations,
        Self::Manuscript,
        Self::Timeline,
        Self::Relationships,
        Self::Arcs,
        Self::Calendar,
        Self::Cultures,
        Self::Items,
        Self::Languages,
        Self::Magic,
        Self::Maps,
        Self::Philosophies,
        Self::Religions,
        Self::Research,
        Self::Systems,
        Self::Species,
    ];

    /// Label stored in `meta.category`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encyclopedia => "Encyclopedia",
            Self::Characters => "Characters",
            Self::Locations => "Locations",
            Self::Manuscript => "Manuscript",
            Self::Timeline => "Timeline",
            Self::Relationships => "Relationships",
            Self::Arcs => "Arcs",
            Self::Calendar => "Calendar",
            Self::Cultures => "Cultures",
            Self::Items => "Items",
            Self::Languages => "Languages",
            Self::Magic => "Magic",
            Self::Maps => "Maps",
            Self::Philosophies => "Philosophies",
            Self::Religions => "Religions",
            Self::Research => "Research",
            Self::Systems => "Systems",
            Self::Species => "Species",
        }
    }

    /// Case-insensitive label lookup.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|c| c.label().eq_ignore_ascii_case(raw))
    }

    /// Category of a stored page. Missing labels are `Encyclopedia`; unknown
    /// ones are too, with a warning.
    #[must_use]
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Encyclopedia,
            Some(label) => Self::parse(label).unwrap_or_else(|| {
                warn!(category = label, "unknown page category, treating as Encyclopedia");
                Self::Encyclopedia
            }),
        }
    }

    /// Category of pages that hold a scene document of `kind`.
    #[must_use]
    pub fn for_scene(kind: SceneKind) -> Self {
        match kind {
            SceneKind::Map => Self::Maps,
            SceneKind::Relationships => Self::Relationships,
            SceneKind::System => Self::Systems,
        }
    }

    /// Canvas editor this category opens, if any.
    #[must_use]
    pub fn editor(self) -> Option<SceneKind> {
        match self {
            Self::Maps => Some(SceneKind::Map),
            Self::Relationships => Some(SceneKind::Relationships),
            Self::Systems => Some(SceneKind::System),
            Self::Encyclopedia
            | Self::Characters
            | Self::Locations
            | Self::Manuscript
            | Self::Timeline
            | Self::Arcs
            | Self::Calendar
            | Self::Cultures
            | Self::Items
            | Self::Languages
            | Self::Magic
            | Self::Philosophies
            | Self::Religions
            | Self::Research
            | Self::Species => None,
        }
    }

    /// Form fields specific to this category.
    #[must_use]
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Self::Characters => CHARACTERS,
            Self::Locations => LOCATIONS,
            Self::Manuscript => MANUSCRIPT,
            Self::Timeline => TIMELINE,
            Self::Arcs => ARCS,
            Self::Calendar => CALENDAR,
            Self::Cultures => CULTURES,
            Self::Items => ITEMS,
            Self::Languages => LANGUAGES,
            Self::Magic => MAGIC,
            Self::Philosophies => PHILOSOPHIES,
            Self::Religions => RELIGIONS,
            Self::Research => RESEARCH,
            Self::Systems => SYSTEMS,
            Self::Species => SPECIES,
            Self::Encyclopedia | Self::Relationships | Self::Maps => &[],
        }
    }

    /// Non-empty schema fields of `meta`, in schema order.
    #[must_use]
    pub fn view_fields(self, meta: &Meta) -> Vec<ViewField> {
        self.schema()
            .iter()
            .filter_map(|spec| {
                let value = match meta.get(spec.key)? {
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                if value.is_empty() {
                    return None;
                }
                let link = spec.links.then(|| normalize_page_name(&value));
                Some(ViewField { label: spec.label, value, link })
            })
            .collect()
    }

    /// Whether `value` is allowed for the select field `key`. Free-text
    /// fields accept anything.
    #[must_use]
    pub fn accepts(self, key: &str, value: &str) -> bool {
        match self.schema().iter().find(|f| f.key == key).map(|f| f.kind) {
            Some(FieldKind::Select(options)) => value.is_empty() || options.contains(&value),
            Some(FieldKind::Text | FieldKind::TextArea) => true,
            None => false,
        }
    }
}
