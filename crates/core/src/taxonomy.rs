//! Category label tables, one per mirror type.
//!
//! Both tables share the `{major}_{minor}` shape; the mirror's type picks
//! which one applies.

use serde::Serialize;

use crate::api::MirrorType;
use crate::search::CategoryId;

/// A top-level category and its subcategories, in display order.
#[derive(Debug)]
pub struct CategoryGroup {
    pub major: u8,
    pub name: &'static str,
    pub subcategories: &'static [Subcategory],
}

#[derive(Debug)]
pub struct Subcategory {
    pub minor: u8,
    pub name: &'static str,
}

/// Resolved labels for a category id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryLabel {
    pub major: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<&'static str>,
}

/// A selectable entry for a category dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub label: String,
}

/// Lookup capability shared by every taxonomy.
pub trait Taxonomy: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &'static str;

    fn groups(&self) -> &'static [CategoryGroup];

    /// Labels for an id, or `None` when the id is not part of this taxonomy.
    fn resolve(&self, id: CategoryId) -> Option<CategoryLabel> {
        let group = self.groups().iter().find(|g| g.major == id.major)?;
        if id.is_major() {
            return Some(CategoryLabel {
                major: group.name,
                minor: None,
            });
        }
        let sub = group.subcategories.iter().find(|s| s.minor == id.minor)?;
        Some(CategoryLabel {
            major: group.name,
            minor: Some(sub.name),
        })
    }

    fn contains(&self, id: CategoryId) -> bool {
        self.resolve(id).is_some()
    }

    /// Every id in display order, labelled "Major - Minor" for subcategories.
    fn options(&self) -> Vec<CategoryOption> {
        let mut options = Vec::new();
        for group in self.groups() {
            options.push(CategoryOption {
                id: CategoryId::new(group.major, 0),
                label: group.name.to_string(),
            });
            for sub in group.subcategories {
                options.push(CategoryOption {
                    id: CategoryId::new(group.major, sub.minor),
                    label: format!("{} - {}", group.name, sub.name),
                });
            }
        }
        options
    }
}

const fn sub(minor: u8, name: &'static str) -> Subcategory {
    Subcategory { minor, name }
}

static GENERAL_GROUPS: &[CategoryGroup] = &[
    CategoryGroup {
        major: 0,
        name: "All Categories",
        subcategories: &[],
    },
    CategoryGroup {
        major: 1,
        name: "Anime",
        subcategories: &[
            sub(1, "AMV"),
            sub(2, "English"),
            sub(3, "Non-English"),
            sub(4, "Raw"),
        ],
    },
    CategoryGroup {
        major: 2,
        name: "Audio",
        subcategories: &[sub(1, "Lossless"), sub(2, "Lossy")],
    },
    CategoryGroup {
        major: 3,
        name: "Literature",
        subcategories: &[sub(1, "English"), sub(2, "Non-English"), sub(3, "Raw")],
    },
    CategoryGroup {
        major: 4,
        name: "Live Action",
        subcategories: &[
            sub(1, "English"),
            sub(2, "Idol/PV"),
            sub(3, "Non-English"),
            sub(4, "Raw"),
        ],
    },
    CategoryGroup {
        major: 5,
        name: "Pictures",
        subcategories: &[sub(1, "Graphics"), sub(2, "Photos")],
    },
    CategoryGroup {
        major: 6,
        name: "Software",
        subcategories: &[sub(1, "Apps"), sub(2, "Games")],
    },
];

static ADULT_GROUPS: &[CategoryGroup] = &[
    CategoryGroup {
        major: 0,
        name: "All Categories",
        subcategories: &[],
    },
    CategoryGroup {
        major: 1,
        name: "Art",
        subcategories: &[
            sub(1, "Anime"),
            sub(2, "Doujinshi"),
            sub(3, "Games"),
            sub(4, "Manga"),
            sub(5, "Pictures"),
        ],
    },
    CategoryGroup {
        major: 2,
        name: "Real Life",
        subcategories: &[sub(1, "Pictures"), sub(2, "Videos")],
    },
];

/// Taxonomy of general-content mirrors.
#[derive(Debug, Default)]
pub struct GeneralTaxonomy;

impl Taxonomy for GeneralTaxonomy {
    fn name(&self) -> &'static str {
        "general"
    }

    fn groups(&self) -> &'static [CategoryGroup] {
        GENERAL_GROUPS
    }
}

/// Taxonomy of adult-content mirrors.
#[derive(Debug, Default)]
pub struct AdultTaxonomy;

impl Taxonomy for AdultTaxonomy {
    fn name(&self) -> &'static str {
        "adult"
    }

    fn groups(&self) -> &'static [CategoryGroup] {
        ADULT_GROUPS
    }
}

static GENERAL: GeneralTaxonomy = GeneralTaxonomy;
static ADULT: AdultTaxonomy = AdultTaxonomy;

/// Pick the taxonomy for a mirror type.
pub fn taxonomy_for(ty: MirrorType) -> &'static dyn Taxonomy {
    match ty {
        MirrorType::Normal => &GENERAL,
        MirrorType::Adult => &ADULT,
    }
}
