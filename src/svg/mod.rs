//! In-place rewriting of the SVG dashboard templates.
//!
//! The templates carry their figures in `<tspan>` elements at fixed
//! document-order slots. Even slots from 32 up hold values, odd slots hold
//! labels and separators; everything before slot 32 is decoration. The
//! rewriter substitutes the value slots and serializes the tree back over the
//! template file, so a run with unchanged figures produces an unchanged file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use xmltree::{Element, XMLNode};

/// Slot of the account-age value.
pub const AGE_SLOT: usize = 32;
/// Slot of the owned-repository count.
pub const REPOS_SLOT: usize = 34;
/// Slot of the contributed-repository count.
pub const CONTRIBUTED_SLOT: usize = 36;
/// Slot of the stargazer total.
pub const STARS_SLOT: usize = 38;
/// Slot of the commit total.
pub const COMMITS_SLOT: usize = 40;
/// Slot of the issue total.
pub const ISSUES_SLOT: usize = 42;
/// Slot of the pull-request total.
pub const PULL_REQUESTS_SLOT: usize = 44;
/// Slot of the net lines-of-code figure.
pub const NET_LOC_SLOT: usize = 46;
/// Slot of the added lines-of-code figure.
pub const ADDED_LOC_SLOT: usize = 48;
/// Slot of the deleted lines-of-code figure.
pub const DELETED_LOC_SLOT: usize = 50;

/// Number of tspans a usable template must contain.
pub const REQUIRED_SLOTS: usize = DELETED_LOC_SLOT + 1;

/// Convenient result alias returning [`TemplateError`] failures.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Failures that can occur while rewriting a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("failed to read template `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The template is not well-formed XML.
    #[error("failed to parse template `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: xmltree::ParseError,
    },
    /// The template does not carry enough tspan slots.
    #[error("template `{path}` has {found} tspans, need {required}")]
    NotEnoughSlots {
        path: PathBuf,
        found: usize,
        required: usize,
    },
    /// The template file could not be reopened for writing.
    #[error("failed to write template `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The rewritten tree could not be serialized back.
    #[error("failed to serialize template `{path}`")]
    Serialize {
        path: PathBuf,
        #[source]
        source: xmltree::Error,
    },
}

/// Rendered figures keyed by the slots they land in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotValues {
    /// Account age, e.g. `3 years, 1 month, 12 days`.
    pub age: String,
    /// Owned repositories.
    pub repos: String,
    /// Contributed repositories.
    pub contributed: String,
    /// Stargazers.
    pub stars: String,
    /// Commits.
    pub commits: String,
    /// Issues.
    pub issues: String,
    /// Pull requests.
    pub pull_requests: String,
    /// Net lines of code.
    pub net_loc: String,
    /// Added lines of code (rendered with a `++` suffix).
    pub added_loc: String,
    /// Deleted lines of code (rendered with a `--` suffix).
    pub deleted_loc: String,
}

impl SlotValues {
    fn assignments(&self) -> [(usize, &str); 10] {
        [
            (AGE_SLOT, self.age.as_str()),
            (REPOS_SLOT, self.repos.as_str()),
            (CONTRIBUTED_SLOT, self.contributed.as_str()),
            (STARS_SLOT, self.stars.as_str()),
            (COMMITS_SLOT, self.commits.as_str()),
            (ISSUES_SLOT, self.issues.as_str()),
            (PULL_REQUESTS_SLOT, self.pull_requests.as_str()),
            (NET_LOC_SLOT, self.net_loc.as_str()),
            (ADDED_LOC_SLOT, self.added_loc.as_str()),
            (DELETED_LOC_SLOT, self.deleted_loc.as_str()),
        ]
    }
}

/// Rewrite the template at `path` in place with the given figures.
pub fn rewrite_template(path: &Path, values: &SlotValues) -> TemplateResult<()> {
    let contents = fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut root = Element::parse(contents.as_bytes()).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let found = count_tspans(&root);
    if found < REQUIRED_SLOTS {
        return Err(TemplateError::NotEnoughSlots {
            path: path.to_path_buf(),
            found,
            required: REQUIRED_SLOTS,
        });
    }

    substitute(&mut root, &mut 0, &values.assignments());

    let file = fs::File::create(path).map_err(|source| TemplateError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    root.write(file).map_err(|source| TemplateError::Serialize {
        path: path.to_path_buf(),
        source,
    })
}

fn count_tspans(element: &Element) -> usize {
    element
        .children
        .iter()
        .filter_map(|child| match child {
            XMLNode::Element(el) => Some(el),
            _ => None,
        })
        .map(|el| usize::from(el.name == "tspan") + count_tspans(el))
        .sum()
}

/// Walk the tree in document order, replacing the text of each tspan whose
/// slot appears in `assignments`. A tspan is counted before its children so
/// nesting cannot shift sibling slots.
fn substitute(element: &mut Element, next_slot: &mut usize, assignments: &[(usize, &str)]) {
    for child in &mut element.children {
        if let XMLNode::Element(el) = child {
            if el.name == "tspan" {
                if let Some((_, text)) = assignments.iter().find(|(slot, _)| *slot == *next_slot) {
                    el.children = vec![XMLNode::Text((*text).to_string())];
                }
                *next_slot += 1;
            }
            substitute(el, next_slot, assignments);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_tspans(count: usize) -> Element {
        let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg"><text>"#);
        for i in 0..count {
            svg.push_str(&format!("<tspan>slot {i}</tspan>"));
        }
        svg.push_str("</text></svg>");
        Element::parse(svg.as_bytes()).unwrap()
    }

    fn tspan_texts(element: &Element, out: &mut Vec<String>) {
        for child in &element.children {
            if let XMLNode::Element(el) = child {
                if el.name == "tspan" {
                    out.push(el.get_text().unwrap_or_default().into_owned());
                }
                tspan_texts(el, out);
            }
        }
    }

    fn sample_values() -> SlotValues {
        SlotValues {
            age: "3 years, 1 month, 12 days".into(),
            repos: "24".into(),
            contributed: "31".into(),
            stars: "1,204".into(),
            commits: "4,512".into(),
            issues: "87".into(),
            pull_requests: "162".into(),
            net_loc: "182,554".into(),
            added_loc: "240,001++".into(),
            deleted_loc: "57,447--".into(),
        }
    }

    #[test]
    fn counts_nested_tspans() {
        let root = Element::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text><tspan>a<tspan>b</tspan></tspan></text></svg>"#
                .as_bytes(),
        )
        .unwrap();
        assert_eq!(count_tspans(&root), 2);
    }

    #[test]
    fn substitutes_value_slots_and_leaves_labels() {
        let mut root = template_with_tspans(REQUIRED_SLOTS);
        substitute(&mut root, &mut 0, &sample_values().assignments());

        let mut texts = Vec::new();
        tspan_texts(&root, &mut texts);
        assert_eq!(texts[AGE_SLOT], "3 years, 1 month, 12 days");
        assert_eq!(texts[STARS_SLOT], "1,204");
        assert_eq!(texts[DELETED_LOC_SLOT], "57,447--");
        // Odd slots are labels and must be untouched.
        assert_eq!(texts[AGE_SLOT + 1], format!("slot {}", AGE_SLOT + 1));
        assert_eq!(texts[0], "slot 0");
    }

    #[test]
    fn short_template_is_rejected() {
        let dir = std::env::temp_dir().join("octo-stats-short-template");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.svg");
        std::fs::write(
            &path,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text><tspan>only</tspan></text></svg>"#,
        )
        .unwrap();

        let err = rewrite_template(&path, &sample_values()).unwrap_err();
        match err {
            TemplateError::NotEnoughSlots { found, required, .. } => {
                assert_eq!(found, 1);
                assert_eq!(required, REQUIRED_SLOTS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rewrite_survives_a_round_trip() {
        let dir = std::env::temp_dir().join("octo-stats-rewrite");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("template.svg");

        let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg"><text>"#);
        for i in 0..REQUIRED_SLOTS {
            svg.push_str(&format!("<tspan>slot {i}</tspan>"));
        }
        svg.push_str("</text></svg>");
        std::fs::write(&path, svg).unwrap();

        rewrite_template(&path, &sample_values()).unwrap();

        let rewritten = Element::parse(std::fs::read(&path).unwrap().as_slice()).unwrap();
        let mut texts = Vec::new();
        tspan_texts(&rewritten, &mut texts);
        assert_eq!(texts[COMMITS_SLOT], "4,512");
        assert_eq!(texts[NET_LOC_SLOT], "182,554");

        // A second rewrite with the same figures must be a fixpoint.
        rewrite_template(&path, &sample_values()).unwrap();
        let again = Element::parse(std::fs::read(&path).unwrap().as_slice()).unwrap();
        let mut texts_again = Vec::new();
        tspan_texts(&again, &mut texts_again);
        assert_eq!(texts, texts_again);
    }
}
