//! Context-sensitive completion over the manifest schema.
//!
//! The edit point decides the candidate family: root attributes on a
//! top-level line, nested attributes and array values under a governing
//! block, enumerated values on an inline `key: ` line. Every candidate
//! carries a type hint, a summary paragraph and a fenced example so the
//! editor can render full documentation.

use lsp_types::CompletionItemKind;

use crate::config::WorkspaceContext;
use crate::context::{self, EditContext};
use crate::schema::{
    SchemaRegistry, ARCHITECTURES, MINIMAL_MANIFEST, PLATFORMS, SPEC_VERSIONS,
    TARGET_COMBINATIONS, VERSION_CHANNELS,
};

/// Whether the insert text is literal or an editor snippet with
/// placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertFormat {
    PlainText,
    Snippet,
}

/// One completion proposal, transport-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    /// Short type hint rendered after the label, e.g. " string".
    pub label_detail: String,
    pub detail: String,
    /// Markdown with a fenced example.
    pub documentation: String,
    pub insert_text: String,
    pub insert_format: InsertFormat,
    pub kind: CompletionItemKind,
    pub sort_text: Option<String>,
    pub preselect: bool,
}

impl CompletionCandidate {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            label_detail: String::new(),
            detail: String::new(),
            documentation: String::new(),
            insert_format: InsertFormat::PlainText,
            kind,
            sort_text: None,
            preselect: false,
        }
    }

    pub fn hint(mut self, label_detail: impl Into<String>) -> Self {
        self.label_detail = label_detail.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn doc(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    pub fn insert(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self
    }

    pub fn snippet(mut self, text: impl Into<String>) -> Self {
        self.insert_text = text.into();
        self.insert_format = InsertFormat::Snippet;
        self
    }

    pub fn rank(mut self, rank: usize) -> Self {
        self.sort_text = Some(rank.to_string());
        self
    }

    pub fn preselect(mut self) -> Self {
        self.preselect = true;
        self
    }
}

/// Produce the candidate list for the cursor position.
pub fn complete(
    text: &str,
    line: usize,
    character: usize,
    workspace: &WorkspaceContext,
) -> Vec<CompletionCandidate> {
    match context::resolve(text, line, character) {
        EditContext::InlineValue { key } => inline_value_candidates(&key, workspace),
        EditContext::Nested { parent } => nested_candidates(parent.as_deref(), workspace),
        EditContext::Root => root_candidates(workspace),
    }
}

/// `${1|a,b,c|}` choice placeholder.
fn choice(slot: usize, values: &[&str]) -> String {
    format!("${{{slot}|{}|}}", values.join(","))
}

fn fenced(example: &str) -> String {
    format!("```\n{example}\n```")
}

/// A plain enumerated value for an inline `key: ` edit.
fn value_candidate(value: &str, example_key: &str) -> CompletionCandidate {
    CompletionCandidate::new(value, CompletionItemKind::VALUE)
        .hint(" string")
        .doc(fenced(&format!("{example_key}: {value}")))
}

fn inline_value_candidates(key: &str, workspace: &WorkspaceContext) -> Vec<CompletionCandidate> {
    match key {
        "name" => workspace
            .project_name()
            .map(|name| vec![value_candidate(name, "name")])
            .unwrap_or_default(),
        "arch" | "architecture" => ARCHITECTURES
            .iter()
            .map(|arch| value_candidate(arch, key))
            .collect(),
        "plat" | "platform" => PLATFORMS
            .iter()
            .map(|plat| value_candidate(plat, key))
            .collect(),
        _ => Vec::new(),
    }
}

fn nested_candidates(
    parent: Option<&str>,
    workspace: &WorkspaceContext,
) -> Vec<CompletionCandidate> {
    match parent {
        Some("unikraft") => component_block_candidates(),
        Some("targets") => {
            let mut items = target_attribute_candidates();
            items.extend(target_value_candidates());
            items
        }
        Some(_) => all_nested_candidates(),
        // No governing ancestor found: degrade to every plausible
        // candidate instead of returning nothing.
        None => {
            let mut items = all_nested_candidates();
            items.extend(root_candidates(workspace));
            items
        }
    }
}

fn all_nested_candidates() -> Vec<CompletionCandidate> {
    let mut items = target_attribute_candidates();
    items.extend(component_block_candidates());
    items
}

/// Attributes of a `unikraft` or `libraries.<name>` block.
fn component_block_candidates() -> Vec<CompletionCandidate> {
    let registry = SchemaRegistry::global();
    let source = registry.lookup("source").expect("schema entry");
    let version = registry.lookup("version").expect("schema entry");
    let kconfig = registry.lookup("kconfig").expect("schema entry");

    vec![
        CompletionCandidate::new("source", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(source.detail)
            .doc(source.documentation)
            .insert("source: https://github.com/SOURCE_URL\n"),
        CompletionCandidate::new("version", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(version.detail)
            .doc(version.documentation)
            .snippet(format!("version: {}", choice(1, VERSION_CHANNELS))),
        CompletionCandidate::new("kconfig", CompletionItemKind::KEYWORD)
            .hint(" object")
            .detail(kconfig.detail)
            .doc(kconfig.documentation)
            .insert("kconfig:\n  "),
        CompletionCandidate::new("kconfig", CompletionItemKind::KEYWORD)
            .hint(" array")
            .detail(kconfig.detail)
            .doc(kconfig.documentation)
            .insert("kconfig:\n  - "),
    ]
}

/// Attributes of a `targets` list element, long and short forms.
fn target_attribute_candidates() -> Vec<CompletionCandidate> {
    let registry = SchemaRegistry::global();
    let architecture = registry.lookup("architecture").expect("schema entry");
    let platform = registry.lookup("platform").expect("schema entry");
    let kconfig = registry.lookup("kconfig").expect("schema entry");

    vec![
        CompletionCandidate::new("arch", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(architecture.detail)
            .doc(architecture.documentation)
            .snippet(format!("arch: {}", choice(1, ARCHITECTURES))),
        CompletionCandidate::new("architecture", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(architecture.detail)
            .doc(architecture.documentation)
            .snippet(format!("architecture: {}", choice(1, ARCHITECTURES))),
        CompletionCandidate::new("plat", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(platform.detail)
            .doc(platform.documentation)
            .snippet(format!("plat: {}", choice(1, PLATFORMS))),
        CompletionCandidate::new("platform", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(platform.detail)
            .doc(platform.documentation)
            .snippet(format!("platform: {}", choice(1, PLATFORMS))),
        CompletionCandidate::new("kconfig", CompletionItemKind::KEYWORD)
            .hint(" object")
            .detail(kconfig.detail)
            .doc(kconfig.documentation)
            .insert("kconfig:\n  "),
    ]
}

/// The canonical platform/architecture combinations as selectable list
/// values, ranked so the common ones sort first.
fn target_value_candidates() -> Vec<CompletionCandidate> {
    TARGET_COMBINATIONS
        .iter()
        .enumerate()
        .map(|(index, combination)| {
            CompletionCandidate::new(*combination, CompletionItemKind::VALUE)
                .hint(" string")
                .doc(fenced(&format!("targets:\n  - {combination}")))
                .rank(index + 1)
                .preselect()
        })
        .collect()
}

fn root_candidates(workspace: &WorkspaceContext) -> Vec<CompletionCandidate> {
    let registry = SchemaRegistry::global();
    let spec = |label: &str| registry.lookup(label).expect("schema entry");
    let project = workspace.project_name().unwrap_or("unikernel").to_string();

    let specification = spec("specification");
    let name = spec("name");
    let unikraft = spec("unikraft");
    let targets = spec("targets");
    let cmd = spec("cmd");
    let libraries = spec("libraries");
    let volumes = spec("volumes");
    let rootfs = spec("rootfs");
    let runtime = spec("runtime");
    let template = spec("template");

    vec![
        CompletionCandidate::new("cmd", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(cmd.detail)
            .doc(cmd.documentation)
            .insert("cmd: \"-c /nginx/conf/nginx.conf\"\n"),
        CompletionCandidate::new("cmd", CompletionItemKind::KEYWORD)
            .hint(" in-line array")
            .detail(cmd.detail)
            .doc(cmd.documentation)
            .insert("cmd: [\"-c\", \"/nginx/conf/nginx.conf\"]\n"),
        CompletionCandidate::new("cmd", CompletionItemKind::KEYWORD)
            .hint(" multi-line array")
            .detail(cmd.detail)
            .doc(cmd.documentation)
            .insert("cmd:\n  - \"-c\"\n  - \"/nginx/conf/nginx.conf\"\n"),
        CompletionCandidate::new("libraries", CompletionItemKind::KEYWORD)
            .hint(" object")
            .detail(libraries.detail)
            .doc(libraries.documentation)
            .insert("libraries:\n  "),
        CompletionCandidate::new("name", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(name.detail)
            .doc(name.documentation)
            .snippet(format!("name: ${{1:{project}}}")),
        CompletionCandidate::new("spec", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(specification.detail)
            .doc(specification.documentation)
            .insert("spec: \"v0.6\"\n"),
        CompletionCandidate::new("specification", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(specification.detail)
            .doc(specification.documentation)
            .insert("specification: \"v0.6\"\n"),
        CompletionCandidate::new("targets", CompletionItemKind::KEYWORD)
            .hint(" short-hand, array")
            .detail(targets.detail)
            .doc(targets.documentation)
            .snippet(format!("targets:\n  - {}", choice(1, TARGET_COMBINATIONS))),
        CompletionCandidate::new("targets", CompletionItemKind::KEYWORD)
            .hint(" long-hand, array")
            .detail(targets.detail)
            .doc(targets.documentation)
            .snippet(format!(
                "targets:\n  - platform: {}\n    architecture: {}",
                choice(1, PLATFORMS),
                choice(2, ARCHITECTURES)
            ))
            .preselect(),
        CompletionCandidate::new("targets", CompletionItemKind::KEYWORD)
            .hint(" with all attributes, array")
            .detail(targets.detail)
            .doc(targets.documentation)
            .snippet(format!(
                "targets:\n  - name: ${{1:{project}}}\n    platform: {}\n    \
                 architecture: {}\n    kconfig:\n      ",
                choice(2, PLATFORMS),
                choice(3, ARCHITECTURES)
            )),
        CompletionCandidate::new("unikraft", CompletionItemKind::KEYWORD)
            .hint(" only with version, string")
            .detail(unikraft.detail)
            .doc(unikraft.documentation)
            .snippet(format!("unikraft: {}", choice(1, VERSION_CHANNELS))),
        CompletionCandidate::new("unikraft", CompletionItemKind::KEYWORD)
            .hint(" only with source url, string")
            .detail(unikraft.detail)
            .doc(unikraft.documentation)
            .snippet("unikraft: ${1:https://github.com/unikraft/unikraft.git}"),
        CompletionCandidate::new("unikraft", CompletionItemKind::KEYWORD)
            .hint(" with only version, object")
            .detail(unikraft.detail)
            .doc(unikraft.documentation)
            .snippet(format!("unikraft:\n  version: {}", choice(1, VERSION_CHANNELS)))
            .preselect(),
        CompletionCandidate::new("unikraft", CompletionItemKind::KEYWORD)
            .hint(" with all attributes, object")
            .detail(unikraft.detail)
            .doc(unikraft.documentation)
            .snippet(format!(
                "unikraft:\n  source: ${{1:https://github.com/unikraft/unikraft.git}}\n  \
                 version: {}\n  kconfig:\n    ",
                choice(2, VERSION_CHANNELS)
            )),
        CompletionCandidate::new("unikraft", CompletionItemKind::SNIPPET)
            .hint(" kraftfile")
            .detail("Kraftfile basic attributes.")
            .doc(fenced(MINIMAL_MANIFEST))
            .snippet(format!(
                "spec: {}\nname: ${{2:{project}}}\nunikraft:\n  version: {}\n\
                 targets:\n  - plat: {}\n    arch: {}\n",
                choice(1, SPEC_VERSIONS),
                choice(3, VERSION_CHANNELS),
                choice(4, PLATFORMS),
                choice(5, ARCHITECTURES)
            )),
        CompletionCandidate::new("volumes", CompletionItemKind::KEYWORD)
            .hint(" short-hand, array")
            .detail(volumes.detail)
            .doc(volumes.documentation)
            .insert("volumes:\n  - ./src:/dest\n"),
        CompletionCandidate::new("volumes", CompletionItemKind::KEYWORD)
            .hint(" long-hand, array")
            .detail(volumes.detail)
            .doc(volumes.documentation)
            .insert("volumes:\n  - source: ./src\n    destination: /dest\n"),
        CompletionCandidate::new("volumes", CompletionItemKind::KEYWORD)
            .hint(" with all attributes, array")
            .detail(volumes.detail)
            .doc(volumes.documentation)
            .insert(
                "volumes:\n  - source: ./src\n    destination: /dest\n    \
                 driver: 9pfs\n    readOnly: true\n",
            ),
        CompletionCandidate::new("rootfs", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(rootfs.detail)
            .doc(rootfs.documentation)
            .insert("rootfs: rel/abs/path/to\n"),
        CompletionCandidate::new("runtime", CompletionItemKind::KEYWORD)
            .hint(" string")
            .detail(runtime.detail)
            .doc(runtime.documentation)
            .insert("runtime: unikraft.org/python3:latest\n"),
        CompletionCandidate::new("template", CompletionItemKind::KEYWORD)
            .hint(" short-hand, string")
            .detail(template.detail)
            .doc(template.documentation)
            .insert("template: app/elfloader:stable\n"),
        CompletionCandidate::new("template", CompletionItemKind::KEYWORD)
            .hint(" long-hand, object")
            .detail(template.detail)
            .doc(template.documentation)
            .insert("template:\n  name: app/elfloader\n  version: stable\n"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn workspace() -> WorkspaceContext {
        WorkspaceContext::new("/home/user/apps/helloworld")
    }

    fn labels(items: &[CompletionCandidate]) -> BTreeSet<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn blank_top_level_line_offers_every_root_attribute() {
        let items = complete("spec: v0.6\n\n", 1, 0, &workspace());
        let labels = labels(&items);
        for expected in [
            "cmd",
            "libraries",
            "name",
            "spec",
            "specification",
            "targets",
            "unikraft",
            "volumes",
            "rootfs",
            "runtime",
            "template",
        ] {
            assert!(labels.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn every_candidate_carries_documentation() {
        let items = complete("", 0, 0, &workspace());
        assert!(items
            .iter()
            .all(|item| !item.documentation.is_empty() && !item.label_detail.is_empty()));
    }

    #[test]
    fn inline_arch_value_is_exactly_the_architecture_set() {
        let items = complete("arch: ", 0, 6, &workspace());
        let labels = labels(&items);
        assert_eq!(labels, BTreeSet::from(["x86_64", "arm64"]));
    }

    #[test]
    fn inline_platform_value_is_exactly_the_platform_set() {
        let items = complete("platform: ", 0, 10, &workspace());
        let labels = labels(&items);
        assert_eq!(
            labels,
            BTreeSet::from(["qemu", "xen", "firecracker", "kraftcloud"])
        );
    }

    #[test]
    fn inline_name_value_proposes_the_workspace_basename() {
        let items = complete("name: ", 0, 6, &workspace());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "helloworld");
    }

    #[test]
    fn inline_value_for_an_unknown_key_is_empty() {
        assert!(complete("rootfs: ", 0, 8, &workspace()).is_empty());
    }

    #[test]
    fn unikraft_block_offers_component_attributes_only() {
        let text = "unikraft:\n  \n";
        let items = complete(text, 1, 2, &workspace());
        let labels = labels(&items);
        assert_eq!(labels, BTreeSet::from(["source", "version", "kconfig"]));
    }

    #[test]
    fn targets_block_offers_attributes_and_ranked_combinations() {
        let text = "targets:\n  \n";
        let items = complete(text, 1, 2, &workspace());
        let labels = labels(&items);
        for expected in ["arch", "architecture", "plat", "platform", "kconfig"] {
            assert!(labels.contains(expected), "missing {expected}");
        }
        let combos: Vec<&CompletionCandidate> = items
            .iter()
            .filter(|item| item.kind == CompletionItemKind::VALUE)
            .collect();
        assert_eq!(combos.len(), TARGET_COMBINATIONS.len());
        assert_eq!(combos[0].label, "qemu/x86_64");
        assert_eq!(combos[0].sort_text.as_deref(), Some("1"));
        assert!(combos.iter().all(|item| item.preselect));
    }

    #[test]
    fn unknown_parent_degrades_to_the_candidate_union() {
        let text = "key value\n  \n";
        let items = complete(text, 1, 2, &workspace());
        let labels = labels(&items);
        assert!(labels.contains("source"));
        assert!(labels.contains("unikraft"));
        assert!(labels.contains("targets"));
    }
}
