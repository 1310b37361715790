use std::path::PathBuf;

use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::resource::catalog;
use crate::resource::{EntityDescriptor, EntityRecord, ResourceController};
use crate::types::RecordId;

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "List records of an entity")]
    List {
        #[arg(help = "Entity name, plural or endpoint")]
        entity: String,

        #[arg(long, help = "Parent record id for scoped entities")]
        scope: Option<String>,
    },

    #[command(about = "Show one record")]
    Show {
        entity: String,
        id: String,

        #[arg(long)]
        scope: Option<String>,
    },

    #[command(about = "Create a record")]
    Create {
        entity: String,

        #[arg(long = "field", short = 'f', help = "Field as name=value (repeatable)")]
        fields: Vec<String>,

        #[arg(long, help = "Attachment file")]
        file: Option<PathBuf>,

        #[arg(long, default_value = "image/png", help = "Attachment MIME type")]
        mime: String,

        #[arg(long, help = "Create as inactive")]
        inactive: bool,

        #[arg(long)]
        scope: Option<String>,
    },

    #[command(about = "Update a record")]
    Update {
        entity: String,
        id: String,

        #[arg(long = "field", short = 'f', help = "Field as name=value (repeatable)")]
        fields: Vec<String>,

        #[arg(long, help = "Replacement attachment file")]
        file: Option<PathBuf>,

        #[arg(long, default_value = "image/png")]
        mime: String,

        #[arg(long)]
        scope: Option<String>,
    },

    #[command(about = "Delete a record")]
    Delete { entity: String, id: String },

    #[command(about = "Change a record's status (on, off, toggle, or a workflow label)")]
    Status {
        entity: String,
        id: String,
        value: String,

        #[arg(long)]
        scope: Option<String>,
    },
}

pub async fn handle(cmd: ResourceCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let result = match cmd {
        ResourceCommands::List { entity, scope } => list(&entity, scope, &output_format).await,
        ResourceCommands::Show { entity, id, scope } => show(&entity, &id, scope, &output_format).await,
        ResourceCommands::Create {
            entity,
            fields,
            file,
            mime,
            inactive,
            scope,
        } => create(&entity, &fields, file, &mime, inactive, scope, &output_format).await,
        ResourceCommands::Update {
            entity,
            id,
            fields,
            file,
            mime,
            scope,
        } => update(&entity, &id, &fields, file, &mime, scope, &output_format).await,
        ResourceCommands::Delete { entity, id } => delete(&entity, &id, &output_format).await,
        ResourceCommands::Status {
            entity,
            id,
            value,
            scope,
        } => change_status(&entity, &id, &value, scope, &output_format).await,
    };

    // Console errors get the structured rendering; anything else bubbles up
    result.map_err(|e| report_console_error(&output_format, e))
}

pub fn list_entities(output_format: OutputFormat) -> anyhow::Result<()> {
    let entities = catalog::all();
    match output_format {
        OutputFormat::Json => {
            let rows: Vec<Value> = entities.iter().map(describe).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "entities": rows }))?);
        }
        OutputFormat::Text => {
            println!("{:<14} {:<22} {:<14} {:<10} {}", "NAME", "ENDPOINT", "ROUTE", "STATUS", "FIELDS");
            println!("{}", "-".repeat(90));
            for d in &entities {
                let status = match &d.status {
                    Some(spec) => format!("{:?}", spec.encoding).to_lowercase(),
                    None => "-".to_string(),
                };
                let fields: Vec<&str> = d.fields.iter().map(|f| f.name).collect();
                println!(
                    "{:<14} {:<22} {:<14} {:<10} {}",
                    d.name,
                    d.endpoint,
                    d.route.unwrap_or("-"),
                    status,
                    fields.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn describe(d: &EntityDescriptor) -> Value {
    json!({
        "name": d.name,
        "plural": d.plural,
        "endpoint": d.endpoint,
        "route": d.route,
        "fields": d.fields.iter().map(|f| f.name).collect::<Vec<_>>(),
        "status_field": d.status_field(),
        "attachment": d.attachment.as_ref().map(|a| a.upload_field),
        "scope_param": d.scope_param,
    })
}

/// Controller with the list loaded for the given scope
async fn controller(entity: &str, scope: Option<String>) -> anyhow::Result<ResourceController> {
    let descriptor = resolve_entity(entity)?;
    if scope.is_some() && descriptor.scope_param.is_none() {
        return Err(anyhow::anyhow!("{} is not scoped", descriptor.name));
    }
    let mut controller = ResourceController::new(descriptor, http_gateway()?);
    match scope {
        Some(scope) => controller.load_scope(RecordId::from(scope.as_str())).await?,
        None => controller.load().await?,
    };
    Ok(controller)
}

async fn list(entity: &str, scope: Option<String>, output_format: &OutputFormat) -> anyhow::Result<()> {
    let controller = controller(entity, scope).await?;
    let descriptor = controller.descriptor();
    let records = controller.records();

    if records.is_empty() {
        return output_empty_collection(
            output_format,
            descriptor.plural,
            &format!("No {} found", descriptor.plural),
        );
    }

    match output_format {
        OutputFormat::Json => {
            let rows: Vec<Value> = records.iter().map(|r| render(&controller, r)).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ descriptor.plural: rows }))?);
        }
        OutputFormat::Text => {
            let columns: Vec<&str> = descriptor.fields.iter().take(3).map(|f| f.name).collect();
            print!("{:<8}", "ID");
            for column in &columns {
                print!(" {:<24}", column.to_uppercase());
            }
            println!(" STATUS");
            println!("{}", "-".repeat(8 + columns.len() * 25 + 7));
            for record in records {
                let id = record.id.as_ref().map(ToString::to_string).unwrap_or_default();
                print!("{:<8}", id);
                for column in &columns {
                    print!(" {:<24}", truncate(&record.text(column), 24));
                }
                println!(" {}", status_label(descriptor, record));
            }
        }
    }
    Ok(())
}

async fn show(
    entity: &str,
    id: &str,
    scope: Option<String>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut controller = controller(entity, scope).await?;
    let record = controller.view(&RecordId::from(id))?.clone();

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&render(&controller, &record))?);
        }
        OutputFormat::Text => {
            for (name, _) in record.fields.iter() {
                println!("{:<18} {}", name, record.text(name));
            }
            if let Some(url) = controller.attachment_url(&record) {
                println!("{:<18} {}", "attachment_url", url);
            }
        }
    }
    controller.close_view();
    Ok(())
}

async fn create(
    entity: &str,
    fields: &[String],
    file: Option<PathBuf>,
    mime: &str,
    inactive: bool,
    scope: Option<String>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut controller = controller(entity, scope).await?;
    controller.open_create();
    if inactive {
        controller.set_status(false)?;
    }
    submit(&mut controller, fields, file, mime, output_format).await
}

async fn update(
    entity: &str,
    id: &str,
    fields: &[String],
    file: Option<PathBuf>,
    mime: &str,
    scope: Option<String>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut controller = controller(entity, scope).await?;
    controller.edit(&RecordId::from(id))?;
    submit(&mut controller, fields, file, mime, output_format).await
}

async fn delete(entity: &str, id: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    let descriptor = resolve_entity(entity)?;
    let mut controller = ResourceController::new(descriptor, http_gateway()?);
    controller.request_delete(RecordId::from(id));
    let deleted = controller.confirm_delete().await?;
    output_success(
        output_format,
        &format!("Deleted {} {}", controller.descriptor().name, id),
        Some(json!({ "id": deleted })),
    )
}

async fn submit(
    controller: &mut ResourceController,
    fields: &[String],
    file: Option<PathBuf>,
    mime: &str,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    for raw in fields {
        let (name, value) = parse_field(controller.descriptor(), raw)?;
        controller.set_field(&name, value)?;
    }
    if let Some(path) = file {
        controller.attach_file_from_path(path, mime).await?;
    }

    let outcome = controller.submit().await?;
    let name = controller.descriptor().name;
    let message = match &outcome.id {
        Some(id) => format!("{} {} {}d", name, id, outcome.operation),
        None => format!("{} {}d", name, outcome.operation),
    };
    if !outcome.reloaded {
        tracing::warn!("List not refreshed after {}", outcome.operation);
    }
    output_success(
        output_format,
        &message,
        Some(json!({
            "operation": outcome.operation.to_string(),
            "id": outcome.id,
            "reloaded": outcome.reloaded,
        })),
    )
}

async fn change_status(
    entity: &str,
    id: &str,
    value: &str,
    scope: Option<String>,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let mut controller = controller(entity, scope).await?;
    let id = RecordId::from(id);

    let encoding = controller.descriptor().status.as_ref().map(|s| s.encoding);
    match encoding {
        Some(_) if value.eq_ignore_ascii_case("toggle") => controller.request_status_toggle(&id)?,
        Some(encoding) => {
            let flag = parse_status_flag(value)
                .ok_or_else(|| anyhow::anyhow!("Expected on, off or toggle, got '{}'", value))?;
            controller.request_status_change(id.clone(), encoding.encode(flag));
        }
        None => {
            if controller.descriptor().name == "contact" && !catalog::CONTACT_STATUSES.contains(&value) {
                return Err(anyhow::anyhow!(
                    "Expected one of {}, got '{}'",
                    catalog::CONTACT_STATUSES.join(", "),
                    value
                ));
            }
            controller.request_status_change(id.clone(), value);
        }
    }

    let requested = controller.status_intent().map(|(_, v)| v.clone());
    controller.confirm_status_change().await?;
    output_success(
        output_format,
        &format!("{} {} status updated", controller.descriptor().name, id),
        Some(json!({ "id": id, "status": requested })),
    )
}

fn render(controller: &ResourceController, record: &EntityRecord) -> Value {
    let mut row = Value::Object(record.fields.clone());
    row["active"] = json!(record.status);
    if let Some(url) = controller.attachment_url(record) {
        row["attachment_url"] = json!(url);
    }
    row
}

fn status_label(descriptor: &EntityDescriptor, record: &EntityRecord) -> String {
    match descriptor.status_field() {
        Some(_) if record.status => "active".to_string(),
        Some(_) => "inactive".to_string(),
        None => record.text("status"),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
