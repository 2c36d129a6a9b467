use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a declared dependency relates the declaring item to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// The declaring item must complete before the target.
    Blocks,
    /// The target must complete before the declaring item.
    DependsOn,
    /// Informational link; does not constrain ordering.
    RelatedTo,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Blocks => "blocks",
            RelationshipKind::DependsOn => "depends_on",
            RelationshipKind::RelatedTo => "related_to",
        }
    }

    /// Whether edges of this kind take part in ordering analysis.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, RelationshipKind::RelatedTo)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relationship kind '{0}'")]
pub struct ParseRelationshipKindError(pub String);

impl FromStr for RelationshipKind {
    type Err = ParseRelationshipKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blocks" => Ok(RelationshipKind::Blocks),
            "depends_on" | "depends-on" => Ok(RelationshipKind::DependsOn),
            "related_to" | "related-to" => Ok(RelationshipKind::RelatedTo),
            _ => Err(ParseRelationshipKindError(value.to_string())),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub target: String,
    pub kind: RelationshipKind,
}

impl DependencyDeclaration {
    pub fn new(target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            target: target.into(),
            kind,
        }
    }

    pub fn depends_on(target: impl Into<String>) -> Self {
        Self::new(target, RelationshipKind::DependsOn)
    }

    pub fn blocks(target: impl Into<String>) -> Self {
        Self::new(target, RelationshipKind::Blocks)
    }

    pub fn related_to(target: impl Into<String>) -> Self {
        Self::new(target, RelationshipKind::RelatedTo)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Todo => "todo",
            WorkItemStatus::InProgress => "in_progress",
            WorkItemStatus::Done => "done",
            WorkItemStatus::Blocked => "blocked",
        }
    }
}

/// A unit of planning: a task or backlog entry described in natural language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Qualitative complexity on a 1-10 scale.
    pub complexity: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyDeclaration>,
    #[serde(default)]
    pub status: WorkItemStatus,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, complexity: u8) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            complexity,
            dependencies: Vec::new(),
            status: WorkItemStatus::Todo,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, target: impl Into<String>) -> Self {
        self.dependencies.push(DependencyDeclaration::depends_on(target));
        self
    }

    pub fn blocks(mut self, target: impl Into<String>) -> Self {
        self.dependencies.push(DependencyDeclaration::blocks(target));
        self
    }

    pub fn related_to(mut self, target: impl Into<String>) -> Self {
        self.dependencies.push(DependencyDeclaration::related_to(target));
        self
    }

    /// Title and description joined, the text keyword matching runs against.
    pub fn combined_text(&self) -> String {
        if self.description.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.description)
        }
    }
}
