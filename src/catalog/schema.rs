use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

use crate::pass::{DeclarationKind, DeclarationSelector};
use crate::syntax::FragmentKind;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Catalog {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub idioms: Vec<IdiomDefinition>,
}

impl Catalog {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.idioms.is_empty() {
            issues.push(ValidationIssue::EmptyIdiomList);
        }

        let mut seen = HashSet::new();
        for idiom in &self.idioms {
            let id = Some(idiom.id.clone()).filter(|id| !id.trim().is_empty());
            match &id {
                None => issues.push(ValidationIssue::MissingField {
                    idiom_id: None,
                    field: "id",
                }),
                Some(name) => {
                    if !seen.insert(idiom.id.as_str()) {
                        issues.push(ValidationIssue::DuplicateId(name.clone()));
                    }
                }
            }

            match &idiom.action {
                Action::Rewrite { pattern, .. } => {
                    if pattern.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            idiom_id: id.clone(),
                            field: "action.pattern",
                        });
                    }
                    if idiom.target.is_some() {
                        issues.push(ValidationIssue::InvalidCombo {
                            idiom_id: id.clone(),
                            message: "rewrite does not take a target".to_string(),
                        });
                    }
                }
                Action::RedundantVar => {
                    if idiom.target.is_some() {
                        issues.push(ValidationIssue::InvalidCombo {
                            idiom_id: id.clone(),
                            message: "redundant-var does not take a target".to_string(),
                        });
                    }
                }
                Action::InsertDecorator { text }
                | Action::InsertSupertype { text }
                | Action::InsertMember { text } => {
                    if text.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            idiom_id: id.clone(),
                            field: "action.text",
                        });
                    }
                    match &idiom.target {
                        None => issues.push(ValidationIssue::MissingField {
                            idiom_id: id.clone(),
                            field: "target",
                        }),
                        Some(target) => {
                            let class_like =
                                matches!(target.kind, TargetKind::Class | TargetKind::Object);
                            if idiom.action.needs_class_like_target() && !class_like {
                                issues.push(ValidationIssue::InvalidCombo {
                                    idiom_id: id.clone(),
                                    message: format!(
                                        "{} requires a class or object target",
                                        idiom.action.name()
                                    ),
                                });
                            }
                            if target.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                                issues.push(ValidationIssue::MissingField {
                                    idiom_id: id.clone(),
                                    field: "target.name",
                                });
                            }
                        }
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdiomDefinition {
    pub id: String,
    pub action: Action,
    #[serde(default)]
    pub target: Option<Target>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    Rewrite {
        pattern: String,
        replacement: String,
        /// Parenthesize the replacement when the match is an operand.
        #[serde(default)]
        parenthesize: bool,
        #[serde(default)]
        context: PatternContext,
    },
    InsertDecorator {
        text: String,
    },
    InsertSupertype {
        text: String,
    },
    InsertMember {
        text: String,
    },
    RedundantVar,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Rewrite { .. } => "rewrite",
            Action::InsertDecorator { .. } => "insert-decorator",
            Action::InsertSupertype { .. } => "insert-supertype",
            Action::InsertMember { .. } => "insert-member",
            Action::RedundantVar => "redundant-var",
        }
    }

    fn needs_class_like_target(&self) -> bool {
        matches!(
            self,
            Action::InsertSupertype { .. } | Action::InsertMember { .. }
        )
    }
}

/// Where a rewrite pattern is parsed.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PatternContext {
    #[default]
    Expression,
    Statement,
    Member,
    Declaration,
}

impl From<PatternContext> for FragmentKind {
    fn from(context: PatternContext) -> Self {
        match context {
            PatternContext::Expression => FragmentKind::Expression,
            PatternContext::Statement => FragmentKind::FunctionBody,
            PatternContext::Member => FragmentKind::ClassBody,
            PatternContext::Declaration => FragmentKind::File,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: TargetKind,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&Target> for DeclarationSelector {
    fn from(target: &Target) -> Self {
        DeclarationSelector {
            kind: target.kind.into(),
            name: target.name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Class,
    Object,
    Function,
    Property,
}

impl From<TargetKind> for DeclarationKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Class => DeclarationKind::Class,
            TargetKind::Object => DeclarationKind::Object,
            TargetKind::Function => DeclarationKind::Function,
            TargetKind::Property => DeclarationKind::Property,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyIdiomList,
    DuplicateId(String),
    MissingField {
        idiom_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        idiom_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyIdiomList => write!(f, "catalog contains no idioms"),
            ValidationIssue::DuplicateId(id) => write!(f, "idiom id '{id}' is used more than once"),
            ValidationIssue::MissingField { idiom_id, field } => match idiom_id {
                Some(id) => write!(f, "idiom '{id}' missing required field '{field}'"),
                None => write!(f, "idiom missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { idiom_id, message } => match idiom_id {
                Some(id) => write!(f, "idiom '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid idiom configuration: {message}"),
            },
        }
    }
}
