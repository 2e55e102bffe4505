use std::io::Write;

use ga_cli_core::models::{DataStream, NewDataStream};
use tracing::info;

use crate::context::CommandContext;
use crate::error::CliResult;
use crate::output::{render_list, render_one, OutputFormat, Record};
use crate::utils::{format_optional_timestamp, or_na};
use crate::validators;

/// List row: common fields plus the identifiers of whichever platform the
/// stream belongs to.
fn summary_record(stream: &DataStream) -> Record {
    let record = Record::new()
        .field("id", stream.id())
        .field("name", or_na(stream.display_name.as_deref()))
        .field("type", or_na(stream.stream_type.as_deref()));

    if let Some(web) = &stream.web_stream_data {
        record
            .field("measurement_id", or_na(web.measurement_id.as_deref()))
            .field("url", or_na(web.default_uri.as_deref()))
    } else if let Some(android) = &stream.android_app_stream_data {
        record.field("package_name", or_na(android.package_name.as_deref()))
    } else if let Some(ios) = &stream.ios_app_stream_data {
        record.field("bundle_id", or_na(ios.bundle_id.as_deref()))
    } else {
        record
    }
}

fn detail_record(stream: &DataStream) -> Record {
    let record = Record::new()
        .field("id", stream.id())
        .field("name", or_na(stream.display_name.as_deref()))
        .field("type", or_na(stream.stream_type.as_deref()))
        .field(
            "create_time",
            format_optional_timestamp(stream.create_time.as_deref()),
        );

    match &stream.web_stream_data {
        Some(web) => record
            .field("measurement_id", or_na(web.measurement_id.as_deref()))
            .field("url", or_na(web.default_uri.as_deref()))
            .field("firebase_app_id", or_na(web.firebase_app_id.as_deref())),
        None => record,
    }
}

pub async fn list(
    ctx: &mut CommandContext,
    property_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let property_id = validators::property_id(property_id)?;
    info!(property_id = property_id, "Listing data streams");

    let streams = ctx
        .call("list_data_streams", |client| async move {
            client.list_data_streams(property_id).await
        })
        .await?;
    info!(count = streams.len(), "Found data streams");

    let records: Vec<Record> = streams.iter().map(summary_record).collect();
    let title = format!("Data Streams for Property {}", property_id);
    writeln!(out, "{}", render_list(&records, format, &title)?)?;
    Ok(())
}

pub async fn get(
    ctx: &mut CommandContext,
    property_id: &str,
    stream_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let property_id = validators::property_id(property_id)?;
    let stream_id = validators::stream_id(stream_id)?;
    info!(property_id = property_id, stream_id = stream_id, "Getting data stream");

    let stream = ctx
        .call("get_data_stream", |client| async move {
            client.get_data_stream(property_id, stream_id).await
        })
        .await?;

    let title = format!("Data Stream: {}", or_na(stream.display_name.as_deref()));
    writeln!(out, "{}", render_one(&detail_record(&stream), format, &title)?)?;

    if format == OutputFormat::Table {
        if let Some(measurement_id) = stream.measurement_id().filter(|m| !m.is_empty()) {
            writeln!(out, "\nMeasurement ID: {}", measurement_id)?;
        }
    }
    Ok(())
}

pub async fn create(
    ctx: &mut CommandContext,
    property_id: &str,
    name: &str,
    url: &str,
    out: &mut impl Write,
) -> CliResult<()> {
    let property_id = validators::property_id(property_id)?;
    let url = validators::url(url)?;
    info!(property_id = property_id, name = name, "Creating web data stream");

    let body = NewDataStream::web(name, url);
    let stream = ctx
        .call("create_data_stream", |client| {
            let body = &body;
            async move { client.create_web_data_stream(property_id, body).await }
        })
        .await?;
    info!(stream_id = stream.id(), "Created data stream");

    writeln!(out, "Created data stream: {}", or_na(stream.display_name.as_deref()))?;
    writeln!(out, "  Stream ID: {}", stream.id())?;
    if let Some(web) = &stream.web_stream_data {
        if let Some(measurement_id) = web.measurement_id.as_deref().filter(|m| !m.is_empty()) {
            writeln!(out, "  Measurement ID: {}", measurement_id)?;
        }
        if let Some(uri) = web.default_uri.as_deref().filter(|u| !u.is_empty()) {
            writeln!(out, "  URL: {}", uri)?;
        }
    }
    Ok(())
}
