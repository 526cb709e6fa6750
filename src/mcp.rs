//! MCP (Model Context Protocol) server implementation.
//!
//! Implements the JSON-RPC 2.0 protocol over stdio, exposing curriculum
//! scoring tools for AI agent integration. Reference tables are read again
//! on every tool call, so edits to the data directory apply immediately.

use crate::config::Config;
use crate::error::ScoreError;
use crate::pipeline::analyze_input;
use crate::report::format_report;
use crate::resolve::ReferenceTables;
use crate::roster::{classify_authors, ContainmentMatcher};
use crate::scoring::weight;
use crate::types::{QualityTier, YearRange, YearlyScoreRow};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Run the MCP server over stdin/stdout.
pub async fn run_server(config: Config) -> crate::error::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| ScoreError::Config(format!("stdin error: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let error_response = json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": { "code": -32700, "message": format!("Parse error: {}", e) }
                });
                writeln!(stdout.lock(), "{}", error_response)
                    .map_err(|e| ScoreError::Config(format!("stdout error: {}", e)))?;
                continue;
            }
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let method = request["method"].as_str().unwrap_or("");

        let response = match method {
            "initialize" => handle_initialize(&id),
            "tools/list" => handle_tools_list(&id),
            "tools/call" => handle_tool_call(&config, &id, &request["params"]).await,
            "resources/list" => handle_resources_list(&id),
            "resources/read" => handle_resource_read(&config, &id, &request["params"]),
            "notifications/initialized" | "notifications/cancelled" => continue,
            _ => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("Method not found: {}", method) }
            }),
        };

        writeln!(stdout.lock(), "{}", response)
            .map_err(|e| ScoreError::Config(format!("stdout error: {}", e)))?;
        stdout
            .lock()
            .flush()
            .map_err(|e| ScoreError::Config(format!("stdout flush error: {}", e)))?;
    }

    Ok(())
}

fn handle_initialize(id: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": "lattes-score-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }
    })
}

fn handle_tools_list(id: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "tools": tool_definitions()
        }
    })
}

fn handle_resources_list(id: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "resources": [
                {
                    "uri": "lattes://weights",
                    "name": "Qualis Weights",
                    "description": "Points per article for each Qualis tier",
                    "mimeType": "text/plain"
                },
                {
                    "uri": "lattes://config",
                    "name": "Active Configuration",
                    "description": "Data directory, table files and column names in use",
                    "mimeType": "application/json"
                }
            ]
        }
    })
}

fn handle_resource_read(config: &Config, id: &Value, params: &Value) -> Value {
    let uri = params["uri"].as_str().unwrap_or("");
    let (mime_type, content) = match uri {
        "lattes://weights" => ("text/plain", weights_reference()),
        "lattes://config" => (
            "application/json",
            serde_json::to_string_pretty(config).unwrap_or_default(),
        ),
        _ => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32602, "message": format!("Unknown resource: {}", uri) }
            });
        }
    };

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "contents": [{
                "uri": uri,
                "mimeType": mime_type,
                "text": content
            }]
        }
    })
}

async fn handle_tool_call(config: &Config, id: &Value, params: &Value) -> Value {
    let tool_name = params["name"].as_str().unwrap_or("");
    let args = &params["arguments"];

    let result = match tool_name {
        "analyze_curriculum" => tool_analyze_curriculum(config, args).await,
        "lookup_journal" => tool_lookup_journal(config, args).await,
        "classify_authors" => tool_classify_authors(config, args).await,
        "format_report" => tool_format_report(args),
        _ => Err(ScoreError::Config(format!("Unknown tool: {}", tool_name))),
    };

    match result {
        Ok(content) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "content": [{ "type": "text", "text": content }]
            }
        }),
        Err(e) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "content": [{ "type": "text", "text": format!("Error: {}", e) }],
                "isError": true
            }
        }),
    }
}

// --- Tool implementations ---

fn year_arg(args: &Value, key: &str) -> Option<i32> {
    args[key].as_i64().and_then(|y| i32::try_from(y).ok())
}

async fn tool_analyze_curriculum(config: &Config, args: &Value) -> Result<String, ScoreError> {
    let path = args["path"]
        .as_str()
        .ok_or_else(|| ScoreError::Config("'path' parameter required".into()))?;
    let year_range = YearRange::from_bounds(year_arg(args, "start_year"), year_arg(args, "end_year"));

    let bytes = tokio::fs::read(path).await?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let tables = ReferenceTables::load(config).await;

    let report = tokio::task::spawn_blocking(move || analyze_input(&file_name, &bytes, &tables, year_range))
        .await
        .map_err(|e| ScoreError::Config(format!("analysis task failed: {}", e)))??;

    Ok(serde_json::to_string_pretty(&report)?)
}

async fn tool_lookup_journal(config: &Config, args: &Value) -> Result<String, ScoreError> {
    let issn = args["issn"]
        .as_str()
        .ok_or_else(|| ScoreError::Config("'issn' parameter required".into()))?;

    let tables = ReferenceTables::load(config).await;
    let journal = tables.classify_journal(issn);

    let mut out = format!(
        "ISSN {}\n  Qualis: {}\n  JCR: {} ({})\n  SJR: {} ({})\n",
        journal.identifier,
        journal.quality_tier,
        journal.jcr.score,
        journal.jcr.quartile,
        journal.sjr.score,
        journal.sjr.quartile,
    );
    for warning in &tables.warnings {
        out.push_str(&format!("  Warning: {}\n", warning));
    }
    Ok(out)
}

async fn tool_classify_authors(config: &Config, args: &Value) -> Result<String, ScoreError> {
    let authors = match &args["authors"] {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        _ => return Err(ScoreError::Config("'authors' parameter required".into())),
    };

    let tables = ReferenceTables::load(config).await;
    let counts = classify_authors(&authors, &tables.roster, &ContainmentMatcher);
    Ok(serde_json::to_string_pretty(&counts)?)
}

fn tool_format_report(args: &Value) -> Result<String, ScoreError> {
    let rows: Vec<YearlyScoreRow> = serde_json::from_value(args["yearly_scores"].clone())?;
    Ok(format_report(&rows))
}

fn weights_reference() -> String {
    let mut out = String::from(
        "Qualis Weights\n==============\n\nPoints per article, divided by the number of permanent faculty co-authors (at least 1).\n\n",
    );
    for tier in QualityTier::ALL {
        out.push_str(&format!("  {:<3} {:.2}\n", tier.as_str(), weight(tier)));
    }
    out.push_str("\nBand A: A1-A4. Band B: B1-B4. Total = A + B.\n");
    out
}

// --- Tool definitions ---

fn tool_definitions() -> Value {
    json!([
        {
            "name": "analyze_curriculum",
            "description": "Score a Lattes curriculum (.xml or .zip). Returns every article with its Qualis tier, JCR and SJR ratings and participant counts, plus weighted points per year.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Path to the curriculum .xml or .zip file" },
                    "start_year": { "type": "integer", "description": "First publication year to include" },
                    "end_year": { "type": "integer", "description": "Last publication year to include" }
                },
                "required": ["path"]
            },
            "annotations": {
                "readOnlyHint": true,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            }
        },
        {
            "name": "lookup_journal",
            "description": "Classify a journal by ISSN against the Qualis, JCR and SJR tables.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "issn": { "type": "string", "description": "ISSN, with or without hyphen (e.g., '0950-0618')" }
                },
                "required": ["issn"]
            },
            "annotations": {
                "readOnlyHint": true,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            }
        },
        {
            "name": "classify_authors",
            "description": "Count how many authors are permanent faculty, collaborating faculty or students according to the roster.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "authors": {
                        "description": "Author names as a '; '-separated string or an array",
                        "oneOf": [
                            { "type": "string" },
                            { "type": "array", "items": { "type": "string" } }
                        ]
                    }
                },
                "required": ["authors"]
            },
            "annotations": {
                "readOnlyHint": true,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            }
        },
        {
            "name": "format_report",
            "description": "Render yearly scores (the 'yearly_scores' of an analysis) as ';'-separated text with decimal commas.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "yearly_scores": { "type": "array", "items": { "type": "object" }, "description": "Yearly score rows" }
                },
                "required": ["yearly_scores"]
            },
            "annotations": {
                "readOnlyHint": true,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_list_names() {
        let response = handle_tools_list(&json!(1));
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["analyze_curriculum", "lookup_journal", "classify_authors", "format_report"]
        );
    }

    #[test]
    fn test_weights_resource() {
        let response = handle_resource_read(&Config::default(), &json!(2), &json!({"uri": "lattes://weights"}));
        let text = response["result"]["contents"][0]["text"].as_str().unwrap();
        assert!(text.contains("A1  1.00"));
        assert!(text.contains("B4  0.05"));
        assert!(text.contains("NP  0.00"));
    }

    #[test]
    fn test_unknown_resource() {
        let response = handle_resource_read(&Config::default(), &json!(3), &json!({"uri": "lattes://nope"}));
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_content() {
        let response = handle_tool_call(&Config::default(), &json!(4), &json!({"name": "nope", "arguments": {}})).await;
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_format_report_tool() {
        let params = json!({
            "name": "format_report",
            "arguments": {
                "yearly_scores": [{
                    "year": 2020,
                    "subscores": {"A1": 0.5},
                    "total_a": 0.5, "total_b": 0.0, "total": 0.5,
                    "percent_a": 100.0, "percent_b": 0.0
                }]
            }
        });
        let response = handle_tool_call(&Config::default(), &json!(5), &params).await;
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Year;A1;"));
        assert!(text.contains("2020;0,500;;"));
    }

    #[tokio::test]
    async fn test_lookup_journal_tool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("qualis.csv"), "ISSN,Estrato\n0950-0618,A1\n").unwrap();
        let config = Config::default().with_data_dir(dir.path());

        let response =
            handle_tool_call(&config, &json!(6), &json!({"name": "lookup_journal", "arguments": {"issn": "09500618"}})).await;
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("ISSN 0950-0618"));
        assert!(text.contains("Qualis: A1"));
        assert!(text.contains("JCR: --- (---)"));
    }

    #[tokio::test]
    async fn test_classify_authors_accepts_array() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("roster.csv"), "Nome Completo,Categoria\nAna Lima,DISC\n").unwrap();
        let config = Config::default().with_data_dir(dir.path());

        let params = json!({"name": "classify_authors", "arguments": {"authors": ["Lima, A.", "Nobody"]}});
        let response = handle_tool_call(&config, &json!(7), &params).await;
        let counts: Value = serde_json::from_str(response["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(counts["student"], 1);
        assert_eq!(counts["permanent"], 0);
    }
}
