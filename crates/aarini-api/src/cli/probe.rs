//! Upstream reachability check for every configured model.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use console::style;
use serde::Serialize;

use aarini_core::llm::box_provider::BoxModelClient;
use aarini_infra::config::load_relay_config;
use aarini_infra::llm::{create_client, probe_model};
use aarini_infra::secret::resolve_api_key;
use aarini_types::llm::LlmError;

#[derive(Debug, Serialize)]
pub struct ProbeResult {
    pub model: String,
    pub ok: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

/// Operator-facing hint for a failed probe.
pub fn diagnose(err: &LlmError) -> Option<&'static str> {
    match err {
        LlmError::ModelUnavailable { .. } => Some(
            "check the model name and that the Generative Language API is enabled for this key's project",
        ),
        LlmError::RateLimited { .. } => Some("quota exhausted; try again later or use another key"),
        LlmError::Transient(_) => Some("upstream unreachable; check network access and base_url"),
        _ => None,
    }
}

pub async fn probe_all(client: &BoxModelClient, models: &[String]) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(models.len());
    for model in models {
        let started = Instant::now();
        let outcome = probe_model(client, model).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        let result = match outcome {
            Ok(_) => ProbeResult {
                model: model.clone(),
                ok: true,
                latency_ms,
                error: None,
                hint: None,
            },
            Err(e) => {
                tracing::debug!(model = %model, error = %e, "Probe failed");
                ProbeResult {
                    model: model.clone(),
                    ok: false,
                    latency_ms,
                    hint: diagnose(&e),
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
    }
    results
}

/// `aarini probe`: try each configured model once with a minimal request.
pub async fn probe(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_relay_config(config_path).await;
    let api_key = resolve_api_key()?;
    let client = create_client(&config, api_key);

    let results = probe_all(&client, &config.models).await;
    let reachable = results.iter().filter(|r| r.ok).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!();
        println!("  {}", style("── Models ──").dim());
        for result in &results {
            if result.ok {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(&result.model).bold(),
                    style(format!("{} ms", result.latency_ms)).dim()
                );
            } else {
                println!("  {} {}", style("✗").red(), style(&result.model).bold());
                if let Some(error) = &result.error {
                    println!("      {}", style(error).dim());
                }
                if let Some(hint) = result.hint {
                    println!("      {}", style(hint).yellow());
                }
            }
        }
        println!();
    }

    if reachable == 0 {
        anyhow::bail!("none of the {} configured models answered", results.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarini_types::config::RelayConfig;

    #[test]
    fn test_diagnose_unavailable_mentions_api_enablement() {
        let err = LlmError::ModelUnavailable {
            model: "gemini-x".into(),
            message: "not found".into(),
        };
        assert!(diagnose(&err).unwrap().contains("Generative Language API"));
        assert!(diagnose(&LlmError::Configuration("x".into())).is_none());
    }

    #[tokio::test]
    async fn test_probe_all_reports_each_model() {
        let config = RelayConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..RelayConfig::default()
        };
        let client = create_client(&config, "test-key".to_string().into());
        let models = vec!["a".to_string(), "b".to_string()];

        let results = probe_all(&client, &models).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.ok && r.hint.is_some()));
    }
}
