use std::path::Path;

use anyhow::Context as _;
use mrpc_client::{BatchingProvider, jsonrpc::RequestArguments};
use serde_json::{Value, json};

/// Issues every request in the file within one wait window and prints the
/// results in file order.
pub async fn execute(provider: &BatchingProvider, path: &Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let requests = parse_requests(&contents)?;

    log::debug!(
        "Sending {} requests to chain id {}",
        requests.len(),
        provider.chain_id()
    );

    let pending = requests
        .into_iter()
        .map(|request| {
            let method = request.method.clone();
            let response = provider.request_with(request);
            async move { (method, response.await) }
        })
        .collect::<Vec<_>>();

    let results = futures::future::join_all(pending)
        .await
        .into_iter()
        .map(|(method, response)| json!({ "method": method, "response": response }))
        .collect::<Vec<Value>>();

    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

fn parse_requests(contents: &str) -> anyhow::Result<Vec<RequestArguments>> {
    serde_json::from_str(contents).context("Expected an array of { \"method\", \"params\" } objects")
}

#[cfg(test)]
mod tests {
    use mrpc_client::jsonrpc::Params;

    use super::*;

    #[test]
    fn parses_requests_with_optional_params() -> anyhow::Result<()> {
        let requests = parse_requests(
            r#"[
                { "method": "eth_blockNumber" },
                { "method": "eth_getBalance", "params": ["0x0000000000000000000000000000000000000000", "latest"] }
            ]"#,
        )?;

        assert_eq!(
            requests,
            vec![
                RequestArguments {
                    method: "eth_blockNumber".to_string(),
                    params: None,
                },
                RequestArguments {
                    method: "eth_getBalance".to_string(),
                    params: Some(Params::Array(vec![
                        json!("0x0000000000000000000000000000000000000000"),
                        json!("latest"),
                    ])),
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn rejects_single_object() {
        assert!(parse_requests(r#"{ "method": "eth_blockNumber" }"#).is_err());
    }
}
