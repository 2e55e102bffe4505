use std::io::Write;

use ga_cli_core::models::Account;
use tracing::info;

use crate::context::CommandContext;
use crate::error::CliResult;
use crate::output::{render_list, render_one, OutputFormat, Record};
use crate::utils::{format_optional_timestamp, or_na};
use crate::validators;

fn summary_record(account: &Account) -> Record {
    Record::new()
        .field("id", account.id())
        .field("name", or_na(account.display_name.as_deref()))
        .field("region", or_na(account.region_code.as_deref()))
        .field("create_time", format_optional_timestamp(account.create_time.as_deref()))
}

fn detail_record(account: &Account) -> Record {
    summary_record(account).field(
        "update_time",
        format_optional_timestamp(account.update_time.as_deref()),
    )
}

pub async fn list(
    ctx: &mut CommandContext,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    info!("Listing Google Analytics accounts");

    let accounts = ctx
        .call("list_accounts", |client| async move { client.list_accounts().await })
        .await?;
    info!(count = accounts.len(), "Found accounts");

    let records: Vec<Record> = accounts.iter().map(summary_record).collect();
    writeln!(out, "{}", render_list(&records, format, "Google Analytics Accounts")?)?;
    Ok(())
}

pub async fn get(
    ctx: &mut CommandContext,
    account_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let account_id = validators::account_id(account_id)?;
    info!(account_id = account_id, "Getting account details");

    let account = ctx
        .call("get_account", |client| async move { client.get_account(account_id).await })
        .await?;

    let title = format!("Account: {}", or_na(account.display_name.as_deref()));
    writeln!(out, "{}", render_one(&detail_record(&account), format, &title)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::Fixture;
    use crate::error::CliError;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_renders_table() {
        let fixture = Fixture::start().await;
        fixture.server.mock(|when, then| {
            when.method(GET).path("/accounts");
            then.status(200).json_body(json!({
                "accounts": [
                    {"name": "accounts/100", "displayName": "Demo", "regionCode": "US",
                     "createTime": "2023-01-15T10:30:00.123456Z"},
                    {"name": "accounts/200"}
                ]
            }));
        });

        let mut out = Vec::new();
        list(&mut fixture.context(), OutputFormat::Table, &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Google Analytics Accounts\n"));
        assert!(text.contains("Id   Name  Region  Create Time"));
        assert!(text.contains("100  Demo  US      2023-01-15 10:30:00"));
        assert!(text.contains("200  N/A   N/A     N/A"));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let fixture = Fixture::start().await;
        fixture.server.mock(|when, then| {
            when.method(GET).path("/accounts");
            then.status(200).json_body(json!({}));
        });

        let mut out = Vec::new();
        list(&mut fixture.context(), OutputFormat::Table, &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No results found\n");
    }

    #[tokio::test]
    async fn test_get_renders_json() {
        let fixture = Fixture::start().await;
        fixture.server.mock(|when, then| {
            when.method(GET).path("/accounts/100");
            then.status(200).json_body(json!({
                "name": "accounts/100",
                "displayName": "Demo",
                "updateTime": "2024-02-01T08:00:00Z"
            }));
        });

        let mut out = Vec::new();
        get(&mut fixture.context(), "100", OutputFormat::Json, &mut out)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "100",
                "name": "Demo",
                "region": "N/A",
                "create_time": "N/A",
                "update_time": "2024-02-01 08:00:00"
            })
        );
    }

    #[tokio::test]
    async fn test_get_rejects_non_numeric_id() {
        let fixture = Fixture::start().await;
        let mut out = Vec::new();
        let err = get(&mut fixture.context(), "abc", OutputFormat::Table, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Validation(ref m) if m == "Account ID must be numeric"));
        assert!(out.is_empty());
    }
}
