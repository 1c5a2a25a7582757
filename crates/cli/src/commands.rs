//! Subcommand handlers.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use hostfacts_core::{Config, KnowledgeBase};
use hostfacts_rules::environ::{
    expand_windows_environment_variables, expand_windows_user_environment_variables,
    windows_environment_variables_map,
};
use hostfacts_rules::loader::{DefinitionLoader, LoadStatus};
use hostfacts_rules::{check_condition, interpolate_list_kb_attributes, plan_collection};
use tracing::{info, warn};

use crate::cli::Command;

/// Read a knowledge base from a JSON or YAML file, picked by extension.
pub fn load_kb(path: &Path) -> Result<KnowledgeBase> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read knowledge base {}", path.display()))?;
    let kb = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON knowledge base {}", path.display()))?,
        Some("yaml" | "yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML knowledge base {}", path.display()))?,
        _ => bail!(
            "unsupported knowledge base format {} (expected .json, .yaml or .yml)",
            path.display()
        ),
    };
    Ok(kb)
}

pub fn run(command: Command, config: &Config) -> Result<ExitCode> {
    match command {
        Command::Interpolate {
            kb,
            ignore_errors,
            patterns,
        } => {
            let kb = load_kb(&kb.kb)?;
            let ignore_errors = ignore_errors || config.interpolation.ignore_errors;
            for line in interpolate_list_kb_attributes(&patterns, &kb, ignore_errors)? {
                println!("{}", line);
            }
        }

        Command::Expand {
            kb,
            sid,
            username,
            text,
        } => {
            let kb = load_kb(&kb.kb)?;
            let text = if sid.is_some() || username.is_some() {
                let (sid, username) = (sid.as_deref(), username.as_deref());
                expand_windows_user_environment_variables(&text, &kb, sid, username)
            } else {
                text
            };
            println!("{}", expand_windows_environment_variables(&text, &kb));
        }

        Command::Environ { kb } => {
            let kb = load_kb(&kb.kb)?;
            let map = windows_environment_variables_map(&kb);
            println!("{}", serde_json::to_string_pretty(&map)?);
        }

        Command::Condition { kb, expression } => {
            let kb = load_kb(&kb.kb)?;
            let matched = check_condition(&expression, &kb)?;
            println!("{}", matched);
            if !matched {
                return Ok(ExitCode::from(1));
            }
        }

        Command::Plan {
            kb,
            definitions,
            ignore_errors,
        } => {
            let kb = load_kb(&kb.kb)?;
            let dir = definitions.unwrap_or_else(|| config.definitions.dir.clone());
            let mut loader = DefinitionLoader::new(dir);
            let results = loader
                .load_all()
                .with_context(|| format!("failed to scan {}", loader.definitions_dir().display()))?;

            let failed = results
                .iter()
                .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
                .count();
            if failed > 0 {
                warn!(failed, "some definition files were not loaded");
            }
            info!(
                artifacts = loader.artifacts().len(),
                checks = loader.checks().len(),
                "definitions ready"
            );

            let ignore_errors = ignore_errors || config.interpolation.ignore_errors;
            let checks = loader.checks().values();
            let plan = plan_collection(&kb, checks, loader.artifacts(), ignore_errors)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
