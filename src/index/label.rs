//! Typed view of the opaque `<entity_id>_<section>` index labels.

use std::fmt;
use std::str::FromStr;

use super::error::LabelError;

pub const CANDIDATE_PREFIX: &str = "candidate_";
pub const JOB_PREFIX: &str = "job_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// What kind of entity a label belongs to, derived from the id prefix.
pub enum EntityKind {
    Candidate,
    Job,
    Other,
}

impl EntityKind {
    pub fn of(entity_id: &str) -> Self {
        if entity_id.starts_with(CANDIDATE_PREFIX) {
            Self::Candidate
        } else if entity_id.starts_with(JOB_PREFIX) {
            Self::Job
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Which part of a profile a vector was computed from.
pub enum Section {
    /// Whole-profile summary vector. The only section used for matching.
    Overall,
    Resume,
    Skills,
    Experience,
    Education,
    Responsibilities,
    Benefits,
    /// The n-th project of a candidate.
    Project(usize),
    /// The n-th education entry of a candidate.
    EducationEntry(usize),
}

impl Section {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            // Older job entries were written with `main` for the overall vector.
            "overall" | "main" => Self::Overall,
            "resume" => Self::Resume,
            "skills" => Self::Skills,
            "experience" => Self::Experience,
            "education" => Self::Education,
            "responsibilities" => Self::Responsibilities,
            "benefits" => Self::Benefits,
            _ => return None,
        })
    }

    fn from_indexed(name: &str, n: usize) -> Option<Self> {
        match name {
            "project" => Some(Self::Project(n)),
            "education" => Some(Self::EducationEntry(n)),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overall => f.write_str("overall"),
            Self::Resume => f.write_str("resume"),
            Self::Skills => f.write_str("skills"),
            Self::Experience => f.write_str("experience"),
            Self::Education => f.write_str("education"),
            Self::Responsibilities => f.write_str("responsibilities"),
            Self::Benefits => f.write_str("benefits"),
            Self::Project(n) => write!(f, "project_{}", n),
            Self::EducationEntry(n) => write!(f, "education_{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A parsed index label.
///
/// # Example
/// ```
/// use funnel::index::{EntityKind, IndexLabel, Section};
///
/// let label: IndexLabel = "candidate_1a2b3c4d_project_0".parse().unwrap();
/// assert_eq!(label.entity_id, "candidate_1a2b3c4d");
/// assert_eq!(label.kind, EntityKind::Candidate);
/// assert_eq!(label.section, Section::Project(0));
/// assert_eq!(label.to_string(), "candidate_1a2b3c4d_project_0");
/// ```
pub struct IndexLabel {
    pub entity_id: String,
    pub kind: EntityKind,
    pub section: Section,
}

impl IndexLabel {
    pub fn new(entity_id: impl Into<String>, section: Section) -> Self {
        let entity_id = entity_id.into();
        let kind = EntityKind::of(&entity_id);
        Self {
            entity_id,
            kind,
            section,
        }
    }

    /// True for the whole-profile vector of a candidate.
    pub fn is_candidate_overall(&self) -> bool {
        self.kind == EntityKind::Candidate && self.section == Section::Overall
    }

    pub fn is_job(&self) -> bool {
        self.kind == EntityKind::Job
    }
}

impl fmt::Display for IndexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.entity_id, self.section)
    }
}

impl FromStr for IndexLabel {
    type Err = LabelError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let (head, tail) = label
            .rsplit_once('_')
            .ok_or_else(|| LabelError::MissingSection {
                label: label.to_string(),
            })?;

        let (entity_id, section) = match tail.parse::<usize>() {
            Ok(n) => {
                let (entity_id, name) =
                    head.rsplit_once('_')
                        .ok_or_else(|| LabelError::MissingSection {
                            label: label.to_string(),
                        })?;
                let section =
                    Section::from_indexed(name, n).ok_or_else(|| LabelError::UnknownSection {
                        label: label.to_string(),
                        section: format!("{}_{}", name, tail),
                    })?;
                (entity_id, section)
            }
            Err(_) => {
                let section = Section::from_name(tail).ok_or_else(|| LabelError::UnknownSection {
                    label: label.to_string(),
                    section: tail.to_string(),
                })?;
                (head, section)
            }
        };

        if entity_id.is_empty() {
            return Err(LabelError::EmptyEntityId {
                label: label.to_string(),
            });
        }

        Ok(Self::new(entity_id, section))
    }
}
