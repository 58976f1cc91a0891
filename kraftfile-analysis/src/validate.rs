//! Schema-driven validation of a manifest document.
//!
//! A best-effort YAML parse feeds the typed [`Manifest`] view; the rules
//! below walk it and attach every violation to a textual anchor. The
//! engine never fails past its boundary: a syntax error becomes a single
//! diagnostic and the pass stops there.
//!
//! Diagnostics are emitted in a fixed attribute order (specification,
//! unikraft, targets, then the optional attributes) because consumers
//! display them in the order produced.

use serde_yaml::Value;

use crate::anchor::{self, Anchor};
use crate::manifest::{
    Cmd, Component, ComponentBlock, Manifest, Presence, ScalarField, TargetEntry, TargetsValue,
    TemplateRef, VolumeEntry, VolumesValue,
};

pub const DIAGNOSTIC_SOURCE: &str = "Unikraft Language Server";

const EMPTY_ERROR: &str = "Error: Empty value.";
const EMPTY_WARNING: &str = "Warning: Empty value.";
const TARGET_SHAPE_ERROR: &str =
    "Error: Each 'target' requires an architecture and platform combination.";
const VOLUME_SHAPE_ERROR: &str = "Error: source and destination must be separated by ':'.";
const NO_TARGET_ERROR: &str = "Error: 'targets' attribute has no target specified.\n\
The 'targets' attribute MUST have at least one target specified.";
const TARGETS_NOT_A_LIST_ERROR: &str = "Error: 'targets' attribute must be a list of targets.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub start: usize,
    pub end: usize,
    pub message: String,
    pub source: &'static str,
}

impl Diagnostic {
    fn error(anchor: Anchor, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            start: anchor.start,
            end: anchor.end,
            message: message.into(),
            source: DIAGNOSTIC_SOURCE,
        }
    }

    fn warning(anchor: Anchor, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            start: anchor.start,
            end: anchor.end,
            message: message.into(),
            source: DIAGNOSTIC_SOURCE,
        }
    }
}

fn missing_attribute(text: &str, label: &str) -> Diagnostic {
    Diagnostic::error(
        anchor::end_of_document(text),
        format!("Error: no '{label}' attribute specified."),
    )
}

/// Validate the full manifest text, returning the ordered diagnostic list.
pub fn validate(text: &str) -> Vec<Diagnostic> {
    let trimmed = text.trim();
    let value: Value = if trimmed.is_empty() {
        Value::Null
    } else {
        match serde_yaml::from_str(trimmed) {
            Ok(value) => value,
            Err(err) => {
                return vec![Diagnostic::error(
                    anchor::end_of_document(text),
                    err.to_string(),
                )]
            }
        }
    };

    let manifest = Manifest::from_value(&value);
    let mut diagnostics = Vec::new();

    check_specification(text, &manifest, &mut diagnostics);
    check_unikraft(text, &manifest, &mut diagnostics);
    check_targets(text, &manifest, &mut diagnostics);
    check_cmd(text, &manifest, &mut diagnostics);
    check_libraries(text, &manifest, &mut diagnostics);
    check_scalar(text, "name", &manifest.name, Severity::Error, &mut diagnostics);
    check_scalar(text, "rootfs", &manifest.rootfs, Severity::Warning, &mut diagnostics);
    check_scalar(text, "runtime", &manifest.runtime, Severity::Error, &mut diagnostics);
    check_template(text, &manifest, &mut diagnostics);
    check_volumes(text, &manifest, &mut diagnostics);

    diagnostics
}

fn check_specification(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    if !manifest.has_specification() {
        out.push(missing_attribute(text, "specification"));
        return;
    }
    if !manifest.specification.is_missing() && manifest.specification.is_empty_value() {
        out.push(Diagnostic::error(
            anchor::key_anchor(text, "specification", 0),
            EMPTY_ERROR,
        ));
    }
    if !manifest.spec.is_missing() && manifest.spec.is_empty_value() {
        out.push(Diagnostic::error(anchor::key_anchor(text, "spec", 0), EMPTY_ERROR));
    }
}

fn check_unikraft(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    match &manifest.unikraft {
        Presence::Missing => out.push(missing_attribute(text, "unikraft")),
        Presence::Null => out.push(Diagnostic::error(
            anchor::key_anchor(text, "unikraft", 0),
            EMPTY_ERROR,
        )),
        Presence::Value(Component::Shorthand(scalar)) => {
            if scalar.is_empty_text() {
                out.push(Diagnostic::error(
                    anchor::key_anchor(text, "unikraft", 0),
                    EMPTY_ERROR,
                ));
            }
        }
        Presence::Value(Component::Expanded(block)) => {
            let base = anchor::find_key(text, "unikraft", 0).unwrap_or(0);
            check_component_block(text, block, base, out);
        }
    }
}

/// Null sub-field checks shared by `unikraft` and `libraries.<name>`
/// blocks, anchored by key search after the parent's offset.
fn check_component_block(
    text: &str,
    block: &ComponentBlock,
    base: usize,
    out: &mut Vec<Diagnostic>,
) {
    let mut warn = |key: &str, null: bool| {
        if null {
            out.push(Diagnostic::warning(
                anchor::key_anchor(text, key, base),
                EMPTY_WARNING,
            ));
        }
    };
    warn("kconfig", block.kconfig.is_null());
    warn("source", block.source.is_null());
    warn("version", block.version.is_null());
}

fn check_targets(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let targets_anchor = anchor::key_anchor(text, "targets", 0);
    match &manifest.targets {
        Presence::Missing => out.push(missing_attribute(text, "targets")),
        Presence::Null => out.push(Diagnostic::error(targets_anchor, NO_TARGET_ERROR)),
        Presence::Value(TargetsValue::Other) => {
            out.push(Diagnostic::error(targets_anchor, TARGETS_NOT_A_LIST_ERROR))
        }
        Presence::Value(TargetsValue::List(entries)) => {
            if entries.is_empty() {
                out.push(Diagnostic::error(targets_anchor, NO_TARGET_ERROR));
                return;
            }
            let mut cursor = anchor::find_key(text, "targets", 0).unwrap_or(0);
            for entry in entries {
                let marker = anchor::list_marker_after(text, cursor).unwrap_or(cursor);
                cursor = marker;
                check_target_entry(text, entry, marker, out);
            }
        }
    }
}

fn check_target_entry(
    text: &str,
    entry: &TargetEntry,
    marker: usize,
    out: &mut Vec<Diagnostic>,
) {
    match entry {
        TargetEntry::Shorthand(value) => {
            if !value.contains('/') {
                out.push(Diagnostic::error(
                    Anchor {
                        start: marker,
                        end: marker + value.len() + 2,
                    },
                    TARGET_SHAPE_ERROR,
                ));
            }
        }
        TargetEntry::Null => out.push(Diagnostic::error(
            Anchor {
                start: marker,
                end: marker + 2,
            },
            TARGET_SHAPE_ERROR,
        )),
        TargetEntry::Expanded(block) => {
            if !block.has_architecture() || !block.has_platform() {
                out.push(Diagnostic::error(
                    Anchor {
                        start: marker,
                        end: marker + 2,
                    },
                    TARGET_SHAPE_ERROR,
                ));
                return;
            }
            if block.kconfig.is_null() {
                out.push(Diagnostic::warning(
                    anchor::key_anchor(text, "kconfig", marker),
                    EMPTY_WARNING,
                ));
            }
            // "arch:"/"plat:" include the colon so the search cannot land
            // on "architecture"/"platform".
            let fields: [(&str, usize, &ScalarField); 4] = [
                ("arch:", 4, &block.arch),
                ("architecture", 12, &block.architecture),
                ("plat:", 4, &block.plat),
                ("platform", 8, &block.platform),
            ];
            for (key, width, field) in fields {
                if !field.is_missing() && field.is_empty_value() {
                    let start = anchor::find_key(text, key, marker).unwrap_or(marker);
                    out.push(Diagnostic::error(
                        Anchor {
                            start,
                            end: start + width,
                        },
                        EMPTY_ERROR,
                    ));
                }
            }
        }
        TargetEntry::Other => {}
    }
}

fn check_cmd(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let empty = match &manifest.cmd {
        Presence::Null => true,
        Presence::Value(Cmd::Text(value)) => value.is_empty(),
        _ => false,
    };
    if empty {
        out.push(Diagnostic::warning(
            anchor::key_anchor(text, "cmd", 0),
            EMPTY_WARNING,
        ));
    }
}

fn check_libraries(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    match &manifest.libraries {
        Presence::Null => out.push(Diagnostic::warning(
            anchor::key_anchor(text, "libraries", 0),
            EMPTY_WARNING,
        )),
        Presence::Value(entries) => {
            for (name, entry) in entries {
                let lib_pos = anchor::find_key(text, name, 0).unwrap_or(0);
                match entry {
                    Presence::Null => out.push(Diagnostic::warning(
                        anchor::key_anchor(text, name, 0),
                        EMPTY_WARNING,
                    )),
                    Presence::Value(Component::Expanded(block)) => {
                        check_component_block(text, block, lib_pos, out);
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn check_scalar(
    text: &str,
    label: &str,
    field: &ScalarField,
    severity: Severity,
    out: &mut Vec<Diagnostic>,
) {
    if field.is_empty_value() {
        let anchor = anchor::key_anchor(text, label, 0);
        out.push(match severity {
            Severity::Error => Diagnostic::error(anchor, EMPTY_ERROR),
            Severity::Warning => Diagnostic::warning(anchor, EMPTY_WARNING),
        });
    }
}

fn check_template(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    let template_anchor = anchor::key_anchor(text, "template", 0);
    match &manifest.template {
        Presence::Null => out.push(Diagnostic::warning(template_anchor, EMPTY_WARNING)),
        Presence::Value(TemplateRef::Shorthand(scalar)) => {
            if scalar.is_empty_text() {
                out.push(Diagnostic::warning(template_anchor, EMPTY_WARNING));
            }
        }
        Presence::Value(TemplateRef::Expanded { name, version }) => {
            let base = anchor::find_key(text, "template", 0).unwrap_or(0);
            if name.is_null() {
                out.push(Diagnostic::warning(
                    anchor::key_anchor(text, "name", base),
                    EMPTY_WARNING,
                ));
            }
            if version.is_null() {
                out.push(Diagnostic::warning(
                    anchor::key_anchor(text, "version", base),
                    EMPTY_WARNING,
                ));
            }
        }
        _ => {}
    }
}

fn check_volumes(text: &str, manifest: &Manifest, out: &mut Vec<Diagnostic>) {
    match &manifest.volumes {
        Presence::Null => out.push(Diagnostic::warning(
            anchor::key_anchor(text, "volumes", 0),
            EMPTY_WARNING,
        )),
        Presence::Value(VolumesValue::List(entries)) => {
            let mut cursor = anchor::find_key(text, "volumes", 0).unwrap_or(0);
            for entry in entries {
                let marker = anchor::list_marker_after(text, cursor).unwrap_or(cursor);
                cursor = marker;
                check_volume_entry(text, entry, marker, out);
            }
        }
        _ => {}
    }
}

fn check_volume_entry(text: &str, entry: &VolumeEntry, marker: usize, out: &mut Vec<Diagnostic>) {
    match entry {
        VolumeEntry::Shorthand(value) => {
            if !value.contains(':') {
                out.push(Diagnostic::error(
                    Anchor {
                        start: marker,
                        end: marker + value.len() + 2,
                    },
                    VOLUME_SHAPE_ERROR,
                ));
            }
        }
        VolumeEntry::Null => out.push(Diagnostic::warning(
            Anchor {
                start: marker,
                end: marker + 2,
            },
            EMPTY_WARNING,
        )),
        VolumeEntry::Expanded(block) => {
            for (key, field) in [
                ("source", &block.source),
                ("destination", &block.destination),
                ("driver", &block.driver),
                ("readOnly", &block.read_only),
            ] {
                if field.is_null() {
                    out.push(Diagnostic::warning(
                        anchor::key_anchor(text, key, marker),
                        EMPTY_WARNING,
                    ));
                }
            }
        }
        VolumeEntry::Other => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    use crate::schema::MINIMAL_MANIFEST;

    /// A well-formed base with `extra` appended as additional root content.
    fn doc(extra: &str) -> String {
        format!("spec: \"v0.6\"\nunikraft: stable\ntargets:\n  - qemu/x86_64\n{extra}")
    }

    #[test]
    fn minimal_manifest_is_clean() {
        assert_eq!(validate(MINIMAL_MANIFEST), Vec::new());
    }

    #[test]
    fn well_formed_targets_in_both_forms_are_clean() {
        let text = doc("");
        assert_eq!(validate(&text), Vec::new());

        let text = "spec: \"v0.6\"\nunikraft: stable\ntargets:\n  - qemu/x86_64\n  - plat: xen\n    arch: arm64\n";
        assert_eq!(validate(text), Vec::new());
    }

    #[test]
    fn missing_specification_is_an_error_at_end_of_document() {
        let text = "unikraft: stable\ntargets:\n  - qemu/x86_64\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(diagnostics[0].message.contains("specification"));
        assert_eq!(diagnostics[0].start, text.len() + 1);
        assert_eq!(diagnostics[0].end, text.len() + 2);
    }

    #[test]
    fn empty_document_reports_every_mandatory_attribute() {
        let diagnostics = validate("");
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Error: no 'specification' attribute specified.",
                "Error: no 'unikraft' attribute specified.",
                "Error: no 'targets' attribute specified.",
            ]
        );
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn malformed_yaml_yields_exactly_one_error_at_end_of_document() {
        let text = "name: \"unterminated\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert!(!diagnostics[0].message.is_empty());
        // Same end-of-document anchor as a missing mandatory attribute.
        assert_eq!(diagnostics[0].start, text.len() + 1);
        assert_eq!(diagnostics[0].end, text.len() + 2);
    }

    #[test]
    fn target_without_separator_is_anchored_at_its_list_marker() {
        let text = "spec: \"v0.6\"\nunikraft: stable\ntargets:\n  - qemu\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].message, TARGET_SHAPE_ERROR);
        let marker = text.find("- qemu").unwrap();
        assert_eq!(diagnostics[0].start, marker);
        assert_eq!(diagnostics[0].end, marker + "qemu".len() + 2);

        // Idempotent on unchanged text.
        assert_eq!(validate(text), diagnostics);
    }

    #[test]
    fn second_bad_target_anchors_at_the_second_marker() {
        let text = "spec: \"v0.6\"\nunikraft: stable\ntargets:\n  - qemu/x86_64\n  - xen\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].start, text.rfind("- xen").unwrap());
    }

    #[test]
    fn target_object_missing_a_platform_is_an_error() {
        let text = "spec: \"v0.6\"\nunikraft: stable\ntargets:\n  - arch: x86_64\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, TARGET_SHAPE_ERROR);
    }

    #[test]
    fn target_object_with_empty_arch_reports_the_arch_key() {
        let text =
            "spec: \"v0.6\"\nunikraft: stable\ntargets:\n  - plat: qemu\n    arch: \"\"\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].start, text.find("arch:").unwrap());
    }

    #[test]
    fn non_list_targets_is_an_error_at_the_key() {
        let text = "spec: \"v0.6\"\nunikraft: stable\ntargets: qemu/x86_64\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, TARGETS_NOT_A_LIST_ERROR);
        assert_eq!(diagnostics[0].start, text.find("targets").unwrap());
    }

    #[test]
    fn empty_targets_list_is_an_error_at_the_key() {
        let text = "spec: \"v0.6\"\nunikraft: stable\ntargets: []\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, NO_TARGET_ERROR);
    }

    #[rstest]
    #[case("cmd:\n", "cmd", Severity::Warning)]
    #[case("name:\n", "name", Severity::Error)]
    #[case("rootfs:\n", "rootfs", Severity::Warning)]
    #[case("runtime:\n", "runtime", Severity::Error)]
    #[case("libraries:\n", "libraries", Severity::Warning)]
    #[case("template:\n", "template", Severity::Warning)]
    #[case("volumes:\n", "volumes", Severity::Warning)]
    fn null_optional_attributes_follow_the_severity_profile(
        #[case] extra: &str,
        #[case] key: &str,
        #[case] severity: Severity,
    ) {
        let text = doc(extra);
        let diagnostics = validate(&text);
        assert_eq!(diagnostics.len(), 1, "{key}: {diagnostics:?}");
        assert_eq!(diagnostics[0].severity, severity);
        assert_eq!(diagnostics[0].start, text.find(key).unwrap());
    }

    #[test]
    fn null_unikraft_sub_fields_warn_after_the_unikraft_key() {
        let text = "spec: \"v0.6\"\nunikraft:\n  version:\n  source: https://github.com/unikraft/unikraft.git\ntargets:\n  - qemu/x86_64\n";
        let diagnostics = validate(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].start, text.find("version").unwrap());
    }

    #[test]
    fn null_library_sub_fields_warn_after_the_library_key() {
        let text = doc("libraries:\n  lwip:\n    version:\n");
        let diagnostics = validate(&text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].start, text.find("version").unwrap());
    }

    #[test]
    fn volume_without_separator_is_an_error() {
        let text = doc("volumes:\n  - data\n");
        let diagnostics = validate(&text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[0].message, VOLUME_SHAPE_ERROR);
        assert_eq!(diagnostics[0].start, text.find("- data").unwrap());
    }

    #[test]
    fn null_volume_sub_field_warns_at_its_key() {
        let text = doc("volumes:\n  - source: ./src\n    destination:\n");
        let diagnostics = validate(&text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].start, text.find("destination").unwrap());
    }

    #[test]
    fn diagnostics_keep_the_fixed_attribute_order() {
        let text = "unikraft: stable\ntargets:\n  - qemu\ncmd:\nrootfs:\n";
        let diagnostics = validate(text);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages.len(), 4);
        assert!(messages[0].contains("specification"));
        assert_eq!(messages[1], TARGET_SHAPE_ERROR);
        assert_eq!(messages[2], EMPTY_WARNING); // cmd
        assert_eq!(messages[3], EMPTY_WARNING); // rootfs
        assert!(diagnostics[2].start < diagnostics[3].start);
    }

    proptest! {
        #[test]
        fn validation_is_total_and_idempotent(text in any::<String>()) {
            let first = validate(&text);
            let second = validate(&text);
            prop_assert_eq!(first, second);
        }
    }
}
