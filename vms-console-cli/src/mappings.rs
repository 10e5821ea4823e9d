use anyhow::{Context, Result};
use clap::Subcommand;
use std::sync::Arc;
use tracing::warn;
use vms_console::{
    ConsoleConfig, MappingRuleEditor, TransformationForm, TransformationType, VmsApi, VmsType,
};

use crate::console::{api, confirmer, parse_pair, report};

#[derive(Subcommand)]
pub enum MappingsCommand {
    /// Show the mapping rules of a VMS
    Show { vms: String },
    /// Analyze the raw field structure of a VMS and print it
    Analyze { vms: String },
    /// Analyze the unified camera schema and print its field paths
    Unified,
    /// List the source-field paths offered for a VMS
    Sources { vms: String },
    /// List the target fields: the standard set and discovered unified fields
    Targets,
    /// Add a transformation rule
    Add {
        vms: String,
        /// Source field path in the raw vendor payload
        #[arg(long)]
        source: String,
        /// Target field of the unified camera
        #[arg(long)]
        target: String,
        /// DEFAULT_CONVERSION, BOOLEAN_CONVERSION, NUMBER_CONVERSION, STRING_FORMAT or DATE_FORMAT
        #[arg(long, default_value = "DEFAULT_CONVERSION")]
        kind: TransformationType,
        /// Type parameter, e.g. format=CAM-%s; repeat for several
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Replace the transformation rule at an index
    Edit {
        vms: String,
        index: usize,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        target: Option<String>,
        /// Changing the type discards the rule's previous parameters
        #[arg(long)]
        kind: Option<TransformationType>,
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Delete the transformation rule at an index
    Delete {
        vms: String,
        index: usize,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every mapping rule of a VMS
    Reset {
        vms: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Set the source field of the channel-ID rule
    ChannelId { vms: String, source_field: String },
}

/// Selects `vms`. The field analysis is optional for rule edits, so only a failure to load
/// the rules is fatal.
async fn open(editor: &mut MappingRuleEditor, vms: &str) -> Result<()> {
    if let Err(e) = editor.select_vms_type(VmsType::from(vms)).await {
        warn!("{}", e);
        let result = editor.refresh_rules().await;
        report(result, editor.banner()).context("Failed to load mapping rules")?;
    }
    Ok(())
}

fn apply_params(form: &mut TransformationForm, params: &[String]) -> Result<()> {
    for param in params {
        let (name, value) = parse_pair(param)?;
        form.set_parameter(name, value);
    }
    Ok(())
}

pub async fn run(command: &MappingsCommand, config: &ConsoleConfig) -> Result<()> {
    let api: Arc<dyn VmsApi> = api(config)?;
    let flattener = config.flattener().context("Invalid path separator")?;
    let mut editor = MappingRuleEditor::new(api, config.locale(), flattener);

    match command {
        MappingsCommand::Show { vms } => {
            open(&mut editor, vms).await?;
            print!("{}", editor.render());
        }
        MappingsCommand::Analyze { vms } => {
            // The explicit analysis below decides the outcome.
            if let Err(e) = editor.select_vms_type(VmsType::from(vms.as_str())).await {
                warn!("{}", e);
            }
            let result = editor.analyze_field_structure().await;
            report(result, editor.banner())?;
            if let Some(analysis) = editor.field_analysis() {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&analysis.fields)
                        .context("Failed to render field structure")?
                );
            }
        }
        MappingsCommand::Unified => {
            let result = editor.analyze_unified_structure().await;
            report(result, editor.banner())?;
            for path in editor.unified_field_options()? {
                println!("{}", path);
            }
        }
        MappingsCommand::Sources { vms } => {
            let result = editor.select_vms_type(VmsType::from(vms.as_str())).await;
            report(result, editor.banner())?;
            for path in editor.source_field_options()? {
                println!("{}", path);
            }
        }
        MappingsCommand::Targets => {
            if let Err(e) = editor.analyze_unified_structure().await {
                warn!("Showing standard target fields only: {}", e);
            }
            let options = editor.target_field_options()?;
            for field in options.standard_fields() {
                println!("{}\t{}", field.value, field.label);
            }
            if !options.discovered_fields().is_empty() {
                println!();
                for path in options.discovered_fields() {
                    println!("{}", path);
                }
            }
        }
        MappingsCommand::Add {
            vms,
            source,
            target,
            kind,
            params,
        } => {
            open(&mut editor, vms).await?;
            let mut form = TransformationForm::new();
            form.set_source_field(source.as_str());
            form.set_target_field(target.as_str());
            form.set_transformation_type(*kind);
            apply_params(&mut form, params)?;

            report(editor.open_add(), None)?;
            if let Some(open_form) = editor.form_mut() {
                *open_form = form;
            }
            let result = editor.submit().await;
            report(result, editor.banner())?;
        }
        MappingsCommand::Edit {
            vms,
            index,
            source,
            target,
            kind,
            params,
        } => {
            open(&mut editor, vms).await?;
            let result = editor.open_edit(*index);
            report(result, None)?;
            if let Some(form) = editor.form_mut() {
                if let Some(source) = source {
                    form.set_source_field(source.as_str());
                }
                if let Some(target) = target {
                    form.set_target_field(target.as_str());
                }
                if let Some(kind) = kind {
                    form.set_transformation_type(*kind);
                }
                apply_params(form, params)?;
            }
            let result = editor.submit().await;
            report(result, editor.banner())?;
        }
        MappingsCommand::Delete { vms, index, yes } => {
            open(&mut editor, vms).await?;
            let result = editor.delete_transformation(*index, confirmer(*yes)).await;
            if !report(result, editor.banner())? {
                println!("Cancelled");
            }
        }
        MappingsCommand::Reset { vms, yes } => {
            open(&mut editor, vms).await?;
            let result = editor.reset_mapping_rules(confirmer(*yes)).await;
            if !report(result, editor.banner())? {
                println!("Cancelled");
            }
        }
        MappingsCommand::ChannelId { vms, source_field } => {
            open(&mut editor, vms).await?;
            let result = editor.update_channel_id_transformation(source_field).await;
            report(result, editor.banner())?;
        }
    }
    Ok(())
}
