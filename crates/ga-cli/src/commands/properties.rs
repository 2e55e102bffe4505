use std::io::Write;

use ga_cli_core::models::{NewProperty, Property};
use tracing::info;

use crate::context::CommandContext;
use crate::error::CliResult;
use crate::output::{render_list, render_one, OutputFormat, Record};
use crate::utils::{format_optional_timestamp, or_na};
use crate::validators;

/// Options for creating a property
#[derive(Debug, Clone)]
pub struct CreateProperty {
    pub account_id: String,
    pub name: String,
    pub timezone: String,
    pub currency: String,
    pub industry: String,
}

fn summary_record(property: &Property) -> Record {
    Record::new()
        .field("id", property.id())
        .field("name", or_na(property.display_name.as_deref()))
        .field("type", or_na(property.property_type.as_deref()))
        .field("timezone", or_na(property.time_zone.as_deref()))
        .field("currency", or_na(property.currency_code.as_deref()))
}

fn detail_record(property: &Property) -> Record {
    summary_record(property)
        .field("industry", or_na(property.industry_category.as_deref()))
        .field(
            "create_time",
            format_optional_timestamp(property.create_time.as_deref()),
        )
}

pub async fn list(
    ctx: &mut CommandContext,
    account_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let account_id = validators::account_id(account_id)?;
    info!(account_id = account_id, "Listing properties");

    let properties = ctx
        .call("list_properties", |client| async move {
            client.list_properties(account_id).await
        })
        .await?;
    info!(count = properties.len(), "Found properties");

    let records: Vec<Record> = properties.iter().map(summary_record).collect();
    let title = format!("Properties for Account {}", account_id);
    writeln!(out, "{}", render_list(&records, format, &title)?)?;
    Ok(())
}

pub async fn get(
    ctx: &mut CommandContext,
    property_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let property_id = validators::property_id(property_id)?;
    info!(property_id = property_id, "Getting property details");

    let property = ctx
        .call("get_property", |client| async move {
            client.get_property(property_id).await
        })
        .await?;

    let title = format!("Property: {}", or_na(property.display_name.as_deref()));
    writeln!(out, "{}", render_one(&detail_record(&property), format, &title)?)?;
    Ok(())
}

pub async fn create(
    ctx: &mut CommandContext,
    args: &CreateProperty,
    out: &mut impl Write,
) -> CliResult<()> {
    let account_id = validators::account_id(&args.account_id)?;
    let timezone = validators::timezone(&args.timezone)?;
    let currency = validators::currency(&args.currency)?;
    info!(account_id = account_id, name = %args.name, "Creating property");

    let body = NewProperty::new(account_id, &args.name, timezone, currency, &args.industry);
    let property = ctx
        .call("create_property", |client| {
            let body = &body;
            async move { client.create_property(body).await }
        })
        .await?;
    info!(property_id = property.id(), "Created property");

    writeln!(out, "Created property: {}", or_na(property.display_name.as_deref()))?;
    writeln!(out, "  Property ID: {}", property.id())?;
    writeln!(out, "  Timezone: {}", or_na(property.time_zone.as_deref()))?;
    writeln!(out, "  Currency: {}", or_na(property.currency_code.as_deref()))?;
    Ok(())
}

/// Delete a property. Confirmation is the caller's job.
pub async fn delete(
    ctx: &mut CommandContext,
    property_id: &str,
    out: &mut impl Write,
) -> CliResult<()> {
    let property_id = validators::property_id(property_id)?;
    info!(property_id = property_id, "Deleting property");

    ctx.call("delete_property", |client| async move {
        client.delete_property(property_id).await
    })
    .await?;
    info!(property_id = property_id, "Deleted property");

    writeln!(out, "Property {} deleted successfully", property_id)?;
    Ok(())
}
