use crate::error::TemplateError;
use crate::types::{ReviewTemplate, StageDefinition};
use crate::validation::{validate_template, validate_unique_template_names};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfigEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub stage: Vec<StageConfigEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfigEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub order: Option<u32>,
    pub required_approvals: Option<u32>,
    pub auto_advance: Option<bool>,
    pub deadline_hours: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    template: Vec<TemplateConfigEntry>,
}

impl From<TemplateConfigEntry> for ReviewTemplate {
    fn from(entry: TemplateConfigEntry) -> Self {
        let stages = entry
            .stage
            .into_iter()
            .enumerate()
            .map(|(index, stage)| StageDefinition {
                name: stage.name,
                description: stage.description,
                // Unordered stages follow file order.
                order: stage
                    .order
                    .unwrap_or_else(|| u32::try_from(index + 1).unwrap_or(u32::MAX)),
                required_approvals: stage.required_approvals.unwrap_or(1),
                auto_advance: stage.auto_advance.unwrap_or(true),
                deadline_hours: stage.deadline_hours,
            })
            .collect();
        Self {
            name: entry.name,
            description: entry.description,
            stages,
            category: entry.category.unwrap_or_else(|| "general".to_string()),
            is_public: entry.public,
        }
    }
}

/// Reads `[[template]]` tables from a TOML file. A missing file yields no
/// templates.
pub fn load_templates(path: &Path) -> Result<Vec<ReviewTemplate>, TemplateError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(TemplateError::InvalidInput {
                message: format!("{}: {err}", path.display()),
            })
        }
    };
    parse_templates(&content)
}

pub fn parse_templates(content: &str) -> Result<Vec<ReviewTemplate>, TemplateError> {
    let parsed: TemplateFile = toml::from_str(content).map_err(|err| TemplateError::InvalidInput {
        message: err.to_string(),
    })?;
    let templates: Vec<ReviewTemplate> = parsed.template.into_iter().map(Into::into).collect();
    for template in &templates {
        validate_template(template).map_err(|err| TemplateError::InvalidInput {
            message: format!("{}: {err}", template.name),
        })?;
    }
    validate_unique_template_names(&templates).map_err(|err| TemplateError::InvalidInput {
        message: err.to_string(),
    })?;
    Ok(templates)
}

/// Project-local templates live in `.kazi/templates.toml`.
pub fn load_workspace_templates(root: &Path) -> Result<Vec<ReviewTemplate>, TemplateError> {
    load_templates(&root.join(".kazi").join("templates.toml"))
}

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<ReviewTemplate>,
}

impl TemplateCatalog {
    pub fn empty() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    /// Adds `extra`, replacing any template with the same name.
    pub fn with_templates(mut self, extra: Vec<ReviewTemplate>) -> Result<Self, TemplateError> {
        for template in extra {
            validate_template(&template).map_err(|err| TemplateError::InvalidInput {
                message: format!("{}: {err}", template.name),
            })?;
            match self
                .templates
                .iter_mut()
                .find(|existing| existing.name.eq_ignore_ascii_case(&template.name))
            {
                Some(existing) => *existing = template,
                None => self.templates.push(template),
            }
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&ReviewTemplate, TemplateError> {
        let name = name.trim();
        self.templates
            .iter()
            .find(|template| template.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TemplateError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    pub fn list(&self) -> &[ReviewTemplate] {
        &self.templates
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn stage(
    order: u32,
    name: &str,
    description: &str,
    required_approvals: u32,
    deadline_hours: Option<u32>,
) -> StageDefinition {
    StageDefinition {
        name: name.to_string(),
        description: description.to_string(),
        order,
        required_approvals,
        auto_advance: true,
        deadline_hours,
    }
}

fn builtin_templates() -> Vec<ReviewTemplate> {
    vec![
        ReviewTemplate {
            name: "Standard Client Review".to_string(),
            description: "Internal check, client feedback, then sign-off".to_string(),
            stages: vec![
                stage(1, "Internal Review", "Team review before the client sees it", 1, Some(24)),
                stage(2, "Client Review", "Client feedback round", 1, Some(72)),
                stage(3, "Final Approval", "Sign-off on the final cut", 1, Some(24)),
            ],
            category: "client".to_string(),
            is_public: true,
        },
        ReviewTemplate {
            name: "Quick Approval".to_string(),
            description: "Single sign-off for small deliverables".to_string(),
            stages: vec![stage(1, "Approval", "One approver signs off", 1, Some(24))],
            category: "general".to_string(),
            is_public: true,
        },
        ReviewTemplate {
            name: "Agency Production".to_string(),
            description: "Creative, account and client rounds for agency work".to_string(),
            stages: vec![
                stage(1, "Creative Review", "Creative director pass", 1, Some(48)),
                stage(2, "Account Review", "Account team checks the brief", 1, Some(24)),
                stage(3, "Client Approval", "Two client stakeholders approve", 2, Some(96)),
            ],
            category: "agency".to_string(),
            is_public: true,
        },
        ReviewTemplate {
            name: "Legal & Compliance".to_string(),
            description: "Content review followed by legal clearance".to_string(),
            stages: vec![
                stage(1, "Content Review", "Editorial accuracy", 1, Some(48)),
                StageDefinition {
                    auto_advance: false,
                    ..stage(2, "Legal Review", "Two counsel sign off; released manually", 2, Some(120))
                },
                stage(3, "Final Approval", "Publishing sign-off", 1, None),
            ],
            category: "compliance".to_string(),
            is_public: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    const FILE: &str = r#"
[[template]]
name = "Music Video"
description = "Label review"
category = "music"
public = true

[[template.stage]]
name = "Artist"
required_approvals = 1

[[template.stage]]
name = "Label"
required_approvals = 2
auto_advance = false
deadline_hours = 48
"#;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = TemplateCatalog::builtin();
        assert!(catalog.list().len() >= 4);
        for template in catalog.list() {
            validate_template(template).unwrap();
        }
        validate_unique_template_names(catalog.list()).unwrap();
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(
            catalog.get("quick approval").unwrap().name,
            "Quick Approval"
        );
        assert_matches!(
            catalog.get("Nope"),
            Err(TemplateError::TemplateNotFound { name }) if name == "Nope"
        );
    }

    #[test]
    fn test_parse_fills_defaults() {
        let templates = parse_templates(FILE).unwrap();
        assert_eq!(templates.len(), 1);
        let template = &templates[0];
        assert_eq!(template.category, "music");
        assert!(template.is_public);
        assert_eq!(template.stages[0].order, 1);
        assert_eq!(template.stages[1].order, 2);
        assert!(template.stages[0].auto_advance);
        assert!(!template.stages[1].auto_advance);
        assert_eq!(template.stages[1].required_approvals, 2);
        assert_eq!(template.stages[1].deadline_hours, Some(48));
    }

    #[test]
    fn test_parse_rejects_invalid_templates() {
        let no_stages = "[[template]]\nname = \"Empty\"\n";
        assert_matches!(
            parse_templates(no_stages),
            Err(TemplateError::InvalidInput { message }) if message.contains("Empty")
        );
        assert!(parse_templates("[[template]]\nname = 3\n").is_err());
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_workspace_templates(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_workspace_templates_override_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".kazi")).unwrap();
        let mut file = std::fs::File::create(dir.path().join(".kazi/templates.toml")).unwrap();
        write!(
            file,
            "[[template]]\nname = \"quick approval\"\n\n[[template.stage]]\nname = \"Boss\"\nrequired_approvals = 3\n"
        )
        .unwrap();

        let extra = load_workspace_templates(dir.path()).unwrap();
        let catalog = TemplateCatalog::builtin().with_templates(extra).unwrap();
        let quick = catalog.get("Quick Approval").unwrap();
        assert_eq!(quick.stages.len(), 1);
        assert_eq!(quick.stages[0].required_approvals, 3);
        assert_eq!(
            catalog.list().len(),
            TemplateCatalog::builtin().list().len()
        );
    }
}
