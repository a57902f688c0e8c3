use std::fmt::Display;
use std::io;
use std::path::Path;

use serde_yaml::Value;

use crate::error::{IngestError, IngestResult};
use crate::workdir::resolve_within;

pub const DEFAULT_DESCRIPTOR_FILE: &str = "plugin.yaml";

/// A plugin descriptor read leniently from `plugin.yaml`.
///
/// Every field except `plugin.id` is optional; absent values become empty
/// strings, `false`, empty lists or `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub plugin: PluginMeta,
    pub runtime: Option<RuntimeSpec>,
    pub inputs: Vec<ParameterSpec>,
    pub outputs: Vec<OutputSpec>,
    /// Parameters declared under `execution.envVariables`.
    pub env_variables: Vec<ParameterSpec>,
    pub diagram_enabled: bool,
    pub citation_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginMeta {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub icon: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeSpec {
    /// Ordered execution environments; the first one is primary.
    pub environments: Vec<String>,
    /// Script path relative to the repository root.
    pub entrypoint: String,
}

impl RuntimeSpec {
    pub fn primary_environment(&self) -> Option<&str> {
        self.environments.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
    /// Default value coerced to text: strings verbatim, numbers and booleans
    /// in their canonical form, sequences and mappings as JSON.
    pub default: Option<String>,
    pub description: String,
    pub placeholder: String,
    pub file_types: Vec<String>,
    pub multiple: bool,
    pub source_file: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    /// Only meaningful for environment variables.
    pub accept: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSpec {
    pub name: String,
    pub path: String,
    pub kind: String,
    pub description: String,
    pub format: String,
}

impl Descriptor {
    /// Reads and parses the descriptor at `repo_root/file_name`. A descriptor
    /// that resolves outside `repo_root` is rejected.
    pub async fn load(repo_root: &Path, file_name: &str) -> IngestResult<Self> {
        let path = match resolve_within(repo_root, Path::new(file_name)) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IngestError::DescriptorNotFound(file_name.to_string()));
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(IngestError::InvalidDescriptor(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let text = tokio::fs::read_to_string(&path).await?;
        let descriptor = Self::parse(&text)?;
        if descriptor.plugin.id.is_none() {
            return Err(IngestError::MissingPluginId(file_name.to_string()));
        }
        Ok(descriptor)
    }

    pub fn parse(text: &str) -> IngestResult<Self> {
        let root: Value = serde_yaml::from_str(text)
            .map_err(|e| IngestError::InvalidDescriptor(e.to_string()))?;
        match root {
            Value::Null => Ok(Self::default()),
            Value::Mapping(_) => Ok(Self::from_value(&root)),
            _ => Err(IngestError::InvalidDescriptor(
                "top level must be a mapping".into(),
            )),
        }
    }

    pub fn from_value(root: &Value) -> Self {
        let plugin = field(Some(root), "plugin");
        let execution = field(Some(root), "execution");

        Self {
            plugin: PluginMeta {
                id: text(field(plugin, "id")).filter(|id| !id.trim().is_empty()),
                name: text(field(plugin, "name")),
                description: text(field(plugin, "description")),
                version: text(field(plugin, "version")),
                author: text(field(plugin, "author")).filter(|s| !s.is_empty()),
                category: text(field(plugin, "category")).filter(|s| !s.is_empty()),
                subcategory: text(field(plugin, "subcategory")),
                icon: text(field(plugin, "icon")),
                tags: string_list(field(plugin, "tags")),
            },
            runtime: runtime(field(Some(root), "runtime")),
            inputs: items(field(Some(root), "inputs"))
                .map(ParameterSpec::from_value)
                .collect(),
            outputs: items(field(Some(root), "outputs"))
                .map(OutputSpec::from_value)
                .collect(),
            env_variables: items(field(execution, "envVariables"))
                .map(ParameterSpec::from_value)
                .collect(),
            diagram_enabled: flag(field(field(Some(root), "diagram"), "enabled")),
            citation_enabled: flag(field(field(Some(root), "citation"), "enabled")),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.plugin.id.as_deref()
    }
}

impl Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (v{})",
            self.plugin.id.as_deref().unwrap_or("<unnamed>"),
            self.plugin.version.as_deref().unwrap_or("?")
        )
    }
}

impl ParameterSpec {
    fn from_value(value: &Value) -> Self {
        let item = Some(value);
        let file_types = match field(item, "fileTypes").or_else(|| field(item, "file_types")) {
            Some(types) => string_list(Some(types)),
            None => string_list(field(item, "accept")),
        };
        Self {
            name: text(field(item, "name")).unwrap_or_default(),
            label: text(field(item, "label")).unwrap_or_default(),
            kind: text(field(item, "type")).unwrap_or_default(),
            required: flag(field(item, "required")),
            default: default_text(field(item, "default")),
            description: text(field(item, "description")).unwrap_or_default(),
            placeholder: text(field(item, "placeholder")).unwrap_or_default(),
            file_types,
            multiple: flag(field(item, "multiple")),
            source_file: text(field(item, "sourceFile")).unwrap_or_default(),
            min: number(field(item, "min")),
            max: number(field(item, "max")),
            step: number(field(item, "step")),
            accept: text(field(item, "accept")).unwrap_or_default(),
        }
    }
}

impl OutputSpec {
    fn from_value(value: &Value) -> Self {
        let item = Some(value);
        Self {
            name: text(field(item, "name")).unwrap_or_default(),
            path: text(field(item, "path")).unwrap_or_default(),
            kind: text(field(item, "type")).unwrap_or_default(),
            description: text(field(item, "description")).unwrap_or_default(),
            format: text(field(item, "format")).unwrap_or_default(),
        }
    }
}

/// `runtime.environments` / `runtime.entrypoint`, falling back to the legacy
/// `runtime.type` / `runtime.script` pair.
fn runtime(section: Option<&Value>) -> Option<RuntimeSpec> {
    let section = section.filter(|v| v.as_mapping().is_some_and(|m| !m.is_empty()))?;

    let environments = match field(Some(section), "environments") {
        Some(envs) => string_list(Some(envs)),
        None => match text(field(Some(section), "type")).as_deref() {
            Some("pythonWithR") => vec!["python".to_string(), "r".to_string()],
            Some("") | None => Vec::new(),
            Some(other) => vec![other.to_string()],
        },
    };
    let entrypoint = text(field(Some(section), "entrypoint"))
        .or_else(|| text(field(Some(section), "script")))
        .unwrap_or_default();

    Some(RuntimeSpec {
        environments,
        entrypoint,
    })
}

fn field<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    value?.get(key).filter(|v| !v.is_null())
}

fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_sequence)
        .into_iter()
        .flatten()
        .filter(|v| v.is_mapping())
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => text(Some(&tagged.value)),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts either a YAML sequence or a comma-separated string.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| text(Some(v)))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn default_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Sequence(_) | Value::Mapping(_) => {
            let value = value?;
            serde_json::to_string(value)
                .ok()
                .or_else(|| serde_yaml::to_string(value).ok().map(|s| s.trim().to_string()))
        }
        other => text(Some(other)),
    }
}
