use anyhow::Context as _;
use mrpc_client::{BatchingProvider, jsonrpc::Params};

/// Sends `method` and prints the response data as JSON.
pub async fn execute(
    provider: &BatchingProvider,
    method: String,
    params: Option<&str>,
) -> anyhow::Result<()> {
    let params = params.map(parse_params).transpose()?;

    let response = provider.request(method, params).await;
    if response.is_error() {
        log::warn!("The request failed");
    }

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

fn parse_params(params: &str) -> anyhow::Result<Params> {
    let value: serde_json::Value =
        serde_json::from_str(params).context("Parameters are not valid JSON")?;

    Ok(Params::try_from(value)?)
}
