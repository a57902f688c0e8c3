use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

/// Produces a markdown workflow section for a plugin's entrypoint script.
///
/// Implementations never fail: anything that prevents synthesis yields an
/// empty string and the README is stored without a diagram. `script` is
/// resolved by the caller and already known to lie inside the checkout.
pub trait DiagramSynthesizer: Send + Sync {
    fn synthesize(&self, script: &Path, environments: &[String]) -> String;
}

/// Disables diagram synthesis entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagram;

impl DiagramSynthesizer for NoDiagram {
    fn synthesize(&self, _script: &Path, _environments: &[String]) -> String {
        String::new()
    }
}

/// Builds a flowchart from `[i/N] label` progress messages found in the script.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressLogDiagram;

impl DiagramSynthesizer for ProgressLogDiagram {
    fn synthesize(&self, script: &Path, environments: &[String]) -> String {
        let Some(environment) = environments.first() else {
            return String::new();
        };
        let source = match std::fs::read_to_string(script) {
            Ok(source) => source,
            Err(e) => {
                warn!(script = %script.display(), error = %e, "Cannot read entrypoint for diagram");
                return String::new();
            }
        };
        let steps = extract_steps(&source, environment);
        debug!(script = %script.display(), steps = steps.len(), "Extracted workflow steps");
        render_flowchart(&steps)
    }
}

static PYTHON_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:print|logger\.info)\(.*\[(\d+)/(\d+)\]\s*(.+?)["')]"#)
        .expect("python step pattern is valid")
});

static R_STEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"message\(.*\[(\d+)/(\d+)\]\s*(.+?)["')]"#).expect("r step pattern is valid")
});

fn step_pattern(environment: &str) -> Option<&'static Regex> {
    match environment {
        "python" => Some(&*PYTHON_STEP),
        "r" => Some(&*R_STEP),
        _ => None,
    }
}

/// Collects step labels in source order. Labels starting with `=` are banner
/// lines and are skipped.
pub fn extract_steps(source: &str, environment: &str) -> Vec<String> {
    let Some(pattern) = step_pattern(environment) else {
        return Vec::new();
    };
    source
        .lines()
        .filter_map(|line| pattern.captures(line.trim()))
        .filter_map(|caps| caps.get(3))
        .map(|label| label.as_str().trim().to_string())
        .filter(|label| !label.is_empty() && !label.starts_with('='))
        .collect()
}

pub fn render_flowchart(steps: &[String]) -> String {
    if steps.is_empty() {
        return String::new();
    }
    let mut chart = String::from("```mermaid\nflowchart TD\n    Start([Start]) --> step1\n");
    for (i, label) in steps.iter().enumerate() {
        let n = i + 1;
        chart.push_str(&format!("    step{n}[{label}]\n"));
        if n < steps.len() {
            chart.push_str(&format!("    step{n} --> step{}\n", n + 1));
        }
    }
    chart.push_str(&format!("    step{} --> End([End])\n```", steps.len()));
    format!("\n## Workflow Diagram\n\n{chart}\n")
}
