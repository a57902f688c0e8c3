use std::io;
use std::path::Path;
use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;
use tracing::{debug, warn};

use crate::descriptor::Descriptor;
use crate::diagram::DiagramSynthesizer;
use crate::workdir::resolve_within;

pub const DEFAULT_README_FILE: &str = "README.md";

const MERMAID_FENCE: &str = "```mermaid";

static MERMAID_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<pre><code class="language-mermaid">([\s\S]*?)</code></pre>"#)
        .expect("mermaid block pattern is valid")
});

pub fn has_embedded_diagram(markdown: &str) -> bool {
    markdown.contains(MERMAID_FENCE)
}

/// Markdown to HTML with fenced code and tables. Mermaid code blocks are
/// rewritten so client-side mermaid renders them.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);

    MERMAID_BLOCK
        .replace_all(&out, r#"<pre class="mermaid">$1</pre>"#)
        .into_owned()
}

/// Reads the repository README, appends a synthesized diagram when enabled
/// and the README carries none, and renders the result to HTML.
///
/// A missing or unreadable README counts as empty, so a plugin without one
/// can still publish its diagram. Files resolving outside `repo_root` are
/// never read.
pub fn compose(
    repo_root: &Path,
    readme_file: &str,
    descriptor: &Descriptor,
    diagrams: &dyn DiagramSynthesizer,
) -> String {
    let mut markdown = read_readme(repo_root, readme_file);

    if descriptor.diagram_enabled && !has_embedded_diagram(&markdown) {
        if let Some(runtime) = descriptor
            .runtime
            .as_ref()
            .filter(|r| !r.entrypoint.is_empty())
        {
            match resolve_within(repo_root, Path::new(&runtime.entrypoint)) {
                Ok(script) => {
                    markdown.push_str(&diagrams.synthesize(&script, &runtime.environments))
                }
                Err(e) => {
                    warn!(entrypoint = %runtime.entrypoint, error = %e, "Skipping workflow diagram")
                }
            }
        }
    }

    render_markdown(&markdown)
}

fn read_readme(repo_root: &Path, readme_file: &str) -> String {
    let path = match resolve_within(repo_root, Path::new(readme_file)) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(readme = readme_file, "Repository has no README");
            return String::new();
        }
        Err(e) => {
            warn!(readme = readme_file, error = %e, "Ignoring README");
            return String::new();
        }
    };
    std::fs::read_to_string(&path).unwrap_or_else(|e| {
        warn!(readme = %path.display(), error = %e, "Failed to read README");
        String::new()
    })
}
