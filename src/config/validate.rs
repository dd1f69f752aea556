// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CheckRunError, Result};
use crate::types::{split_qualified_name, BLOCK_TYPE_BENCHMARK, BLOCK_TYPE_CONTROL};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CheckRunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_dashboard(cfg)?;
    validate_resource_names(cfg)?;
    validate_benchmark_children(cfg)?;
    validate_benchmark_nesting(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_parallel == 0 {
        return Err(CheckRunError::ConfigError(
            "[config].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_dashboard(cfg: &RawConfigFile) -> Result<()> {
    let name = &cfg.dashboard.name;
    if !is_valid_short_name(name) {
        return Err(CheckRunError::ConfigError(format!(
            "[dashboard].name '{name}' must be non-empty and use only letters, digits, '_' or '-'"
        )));
    }

    if cfg.dashboard.children.is_empty() {
        return Err(CheckRunError::ConfigError(
            "[dashboard].children must list at least one panel".to_string(),
        ));
    }

    for child in &cfg.dashboard.children {
        ensure_qualified(child, "[dashboard].children")?;
    }

    let mut seen = std::collections::HashSet::new();
    for child in &cfg.dashboard.children {
        if !seen.insert(child.as_str()) {
            return Err(CheckRunError::ConfigError(format!(
                "[dashboard].children lists '{child}' more than once"
            )));
        }
    }

    Ok(())
}

fn validate_resource_names(cfg: &RawConfigFile) -> Result<()> {
    let sections = [
        (BLOCK_TYPE_CONTROL, cfg.control.keys().collect::<Vec<_>>()),
        (BLOCK_TYPE_BENCHMARK, cfg.benchmark.keys().collect()),
        ("card", cfg.card.keys().collect()),
        ("chart", cfg.chart.keys().collect()),
    ];

    for (block_type, names) in sections {
        for name in names {
            if !is_valid_short_name(name) {
                return Err(CheckRunError::ConfigError(format!(
                    "[{block_type}.{name}] has an invalid name; use only letters, digits, '_' or '-'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_benchmark_children(cfg: &RawConfigFile) -> Result<()> {
    for (name, benchmark) in cfg.benchmark.iter() {
        for child in &benchmark.children {
            let context = format!("[benchmark.{name}].children");
            let (block_type, short) = ensure_qualified(child, &context)?;

            let known = match block_type {
                BLOCK_TYPE_CONTROL => cfg.control.contains_key(short),
                BLOCK_TYPE_BENCHMARK => cfg.benchmark.contains_key(short),
                other => {
                    return Err(CheckRunError::ConfigError(format!(
                        "benchmark '{name}' has child '{child}' of type '{other}'; \
                         benchmarks may only contain controls and benchmarks"
                    )));
                }
            };

            if !known {
                return Err(CheckRunError::ConfigError(format!(
                    "benchmark '{name}' has unknown child '{child}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_benchmark_nesting(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: parent benchmark -> nested benchmark.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.benchmark.keys() {
        graph.add_node(name.as_str());
    }

    for (name, benchmark) in cfg.benchmark.iter() {
        for child in &benchmark.children {
            if let Some((BLOCK_TYPE_BENCHMARK, short)) = split_qualified_name(child) {
                graph.add_edge(name.as_str(), short, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(CheckRunError::ConfigError(format!(
            "cycle detected in benchmark nesting involving benchmark '{}'",
            cycle.node_id()
        ))),
    }
}

fn ensure_qualified<'a>(name: &'a str, context: &str) -> Result<(&'a str, &'a str)> {
    match split_qualified_name(name) {
        Some((block_type, short))
            if block_type.chars().all(|c| c.is_ascii_lowercase() || c == '_')
                && is_valid_short_name(short) =>
        {
            Ok((block_type, short))
        }
        _ => Err(CheckRunError::ConfigError(format!(
            "{context}: '{name}' is not a qualified name like 'control.my_control'"
        ))),
    }
}

fn is_valid_short_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
