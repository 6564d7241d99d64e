use crate::error::WorkflowError;
use crate::types::{Decision, ReviewTemplate, StageDefinition};
use std::collections::HashSet;

pub fn validate_title(title: &str) -> Result<(), WorkflowError> {
    if title.trim().is_empty() {
        return Err(WorkflowError::validation("title is required"));
    }
    Ok(())
}

pub fn validate_stage_definitions(stages: &[StageDefinition]) -> Result<(), WorkflowError> {
    if stages.is_empty() {
        return Err(WorkflowError::validation("template must define at least one stage"));
    }

    let mut previous: Option<u32> = None;
    for stage in stages {
        if stage.name.trim().is_empty() {
            return Err(WorkflowError::validation(format!(
                "stage with order {} has no name",
                stage.order
            )));
        }
        if stage.required_approvals == 0 {
            return Err(WorkflowError::validation(format!(
                "stage '{}' must require at least one approval",
                stage.name
            )));
        }
        if let Some(prev) = previous {
            if stage.order <= prev {
                return Err(WorkflowError::validation(format!(
                    "stage order must be strictly increasing: {} follows {prev}",
                    stage.order
                )));
            }
        }
        previous = Some(stage.order);
    }
    Ok(())
}

pub fn validate_template(template: &ReviewTemplate) -> Result<(), WorkflowError> {
    if template.name.trim().is_empty() {
        return Err(WorkflowError::validation("template name is required"));
    }
    validate_stage_definitions(&template.stages)
}

/// Names must be unique case-insensitively across a catalog.
pub fn validate_unique_template_names(templates: &[ReviewTemplate]) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for template in templates {
        if !seen.insert(template.name.to_lowercase()) {
            return Err(WorkflowError::validation(format!(
                "duplicate template name '{}'",
                template.name
            )));
        }
    }
    Ok(())
}

pub fn validate_reviewer(user_id: &str, user_name: &str) -> Result<(), WorkflowError> {
    if user_id.trim().is_empty() {
        return Err(WorkflowError::validation("user id is required"));
    }
    if user_name.trim().is_empty() {
        return Err(WorkflowError::validation("user name is required"));
    }
    Ok(())
}

pub fn validate_feedback(decision: Decision, feedback: Option<&str>) -> Result<(), WorkflowError> {
    let has_feedback = feedback.is_some_and(|text| !text.trim().is_empty());
    if decision.requires_feedback() && !has_feedback {
        return Err(WorkflowError::validation(
            "feedback is required when rejecting or requesting changes",
        ));
    }
    Ok(())
}
