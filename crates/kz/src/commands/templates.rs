use clap::Subcommand;
use kz_core::types::ReviewTemplate;
use kz_core::TemplateCatalog;

use crate::error::Result;

#[derive(Subcommand)]
pub enum TemplatesCommand {
    /// List available review templates
    List,
    /// Show the stages of one template
    Show { name: String },
}

pub enum TemplatesResult {
    List(Vec<ReviewTemplate>),
    Show(ReviewTemplate),
}

pub fn handle(catalog: &TemplateCatalog, cmd: TemplatesCommand) -> Result<TemplatesResult> {
    match cmd {
        TemplatesCommand::List => Ok(TemplatesResult::List(catalog.list().to_vec())),
        TemplatesCommand::Show { name } => Ok(TemplatesResult::Show(catalog.get(&name)?.clone())),
    }
}
