//! Typed view of a parsed manifest.
//!
//! Built from a best-effort `serde_yaml` parse. The validation rules need
//! to distinguish a key that is absent from a key that is explicitly null
//! (`key:` with nothing after it), so every field is wrapped in
//! [`Presence`] rather than `Option`. Union-shaped attributes (string or
//! object) are explicit enums.

use serde_yaml::{Mapping, Value};

/// Tri-state for a manifest field: absent, explicitly null, or a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Presence<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Presence::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Presence::Null)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Presence::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for Presence<T> {
    fn default() -> Self {
        Presence::Missing
    }
}

/// A scalar manifest value. Only text scalars are inspected by the rules;
/// anything else (numbers, booleans) passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Text(String),
    Other,
}

impl Scalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(text) => Some(text),
            Scalar::Other => None,
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Scalar::Text(text) if text.is_empty())
    }
}

pub type ScalarField = Presence<Scalar>;

impl ScalarField {
    /// True for the two "empty value" shapes: explicit null or `""`.
    pub fn is_empty_value(&self) -> bool {
        match self {
            Presence::Null => true,
            Presence::Value(scalar) => scalar.is_empty_text(),
            Presence::Missing => false,
        }
    }
}

/// The `unikraft` attribute or one `libraries` entry: a version/source
/// shorthand string or an expanded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Shorthand(Scalar),
    Expanded(ComponentBlock),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentBlock {
    pub source: ScalarField,
    pub version: ScalarField,
    pub kconfig: Presence<()>,
}

/// One element of the `targets` list. Expanded blocks keep the short and
/// long key forms separate because diagnostics anchor on the key actually
/// written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetEntry {
    Shorthand(String),
    Expanded(TargetBlock),
    Null,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetBlock {
    pub arch: ScalarField,
    pub architecture: ScalarField,
    pub plat: ScalarField,
    pub platform: ScalarField,
    pub name: ScalarField,
    pub kconfig: Presence<()>,
}

impl TargetBlock {
    pub fn has_architecture(&self) -> bool {
        !(self.arch.is_missing() && self.architecture.is_missing())
    }

    pub fn has_platform(&self) -> bool {
        !(self.plat.is_missing() && self.platform.is_missing())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetsValue {
    List(Vec<TargetEntry>),
    Other,
}

/// One element of the `volumes` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeEntry {
    Shorthand(String),
    Expanded(VolumeBlock),
    Null,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBlock {
    pub source: Presence<()>,
    pub destination: Presence<()>,
    pub driver: Presence<()>,
    pub read_only: Presence<()>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumesValue {
    List(Vec<VolumeEntry>),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Shorthand(Scalar),
    Expanded {
        name: ScalarField,
        version: ScalarField,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Text(String),
    Other,
}

/// The manifest attributes the rule engine inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub spec: ScalarField,
    pub specification: ScalarField,
    pub name: ScalarField,
    pub rootfs: ScalarField,
    pub runtime: ScalarField,
    pub cmd: Presence<Cmd>,
    pub unikraft: Presence<Component>,
    pub template: Presence<TemplateRef>,
    pub libraries: Presence<Vec<(String, Presence<Component>)>>,
    pub volumes: Presence<VolumesValue>,
    pub targets: Presence<TargetsValue>,
}

impl Manifest {
    /// Build the typed view from a parsed document. A non-mapping document
    /// yields a manifest with every field missing.
    pub fn from_value(value: &Value) -> Manifest {
        let empty = Mapping::new();
        let map = value.as_mapping().unwrap_or(&empty);

        Manifest {
            spec: scalar_field(map, "spec"),
            specification: scalar_field(map, "specification"),
            name: scalar_field(map, "name"),
            rootfs: scalar_field(map, "rootfs"),
            runtime: scalar_field(map, "runtime"),
            cmd: field(map, "cmd", cmd_value),
            unikraft: field(map, "unikraft", component_value),
            template: field(map, "template", template_value),
            libraries: field(map, "libraries", libraries_value),
            volumes: field(map, "volumes", volumes_value),
            targets: field(map, "targets", targets_value),
        }
    }

    pub fn has_specification(&self) -> bool {
        !(self.spec.is_missing() && self.specification.is_missing())
    }
}

fn field<T>(map: &Mapping, key: &str, convert: impl Fn(&Value) -> T) -> Presence<T> {
    match map.get(key) {
        None => Presence::Missing,
        Some(Value::Null) => Presence::Null,
        Some(value) => Presence::Value(convert(value)),
    }
}

fn scalar(value: &Value) -> Scalar {
    match value {
        Value::String(text) => Scalar::Text(text.clone()),
        _ => Scalar::Other,
    }
}

fn scalar_field(map: &Mapping, key: &str) -> ScalarField {
    field(map, key, scalar)
}

fn unit(_: &Value) {}

fn cmd_value(value: &Value) -> Cmd {
    match value {
        Value::String(text) => Cmd::Text(text.clone()),
        _ => Cmd::Other,
    }
}

fn component_value(value: &Value) -> Component {
    match value {
        Value::Mapping(map) => Component::Expanded(ComponentBlock {
            source: scalar_field(map, "source"),
            version: scalar_field(map, "version"),
            kconfig: field(map, "kconfig", unit),
        }),
        other => Component::Shorthand(scalar(other)),
    }
}

fn template_value(value: &Value) -> TemplateRef {
    match value {
        Value::Mapping(map) => TemplateRef::Expanded {
            name: scalar_field(map, "name"),
            version: scalar_field(map, "version"),
        },
        other => TemplateRef::Shorthand(scalar(other)),
    }
}

fn libraries_value(value: &Value) -> Vec<(String, Presence<Component>)> {
    let Value::Mapping(map) = value else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let name = key.as_str()?.to_string();
            let entry = match value {
                Value::Null => Presence::Null,
                other => Presence::Value(component_value(other)),
            };
            Some((name, entry))
        })
        .collect()
}

fn targets_value(value: &Value) -> TargetsValue {
    let Value::Sequence(items) = value else {
        return TargetsValue::Other;
    };
    TargetsValue::List(items.iter().map(target_entry).collect())
}

fn target_entry(value: &Value) -> TargetEntry {
    match value {
        Value::Null => TargetEntry::Null,
        Value::String(text) => TargetEntry::Shorthand(text.clone()),
        Value::Mapping(map) => TargetEntry::Expanded(TargetBlock {
            arch: scalar_field(map, "arch"),
            architecture: scalar_field(map, "architecture"),
            plat: scalar_field(map, "plat"),
            platform: scalar_field(map, "platform"),
            name: scalar_field(map, "name"),
            kconfig: field(map, "kconfig", unit),
        }),
        _ => TargetEntry::Other,
    }
}

fn volumes_value(value: &Value) -> VolumesValue {
    let Value::Sequence(items) = value else {
        return VolumesValue::Other;
    };
    VolumesValue::List(items.iter().map(volume_entry).collect())
}

fn volume_entry(value: &Value) -> VolumeEntry {
    match value {
        Value::Null => VolumeEntry::Null,
        Value::String(text) => VolumeEntry::Shorthand(text.clone()),
        Value::Mapping(map) => VolumeEntry::Expanded(VolumeBlock {
            source: field(map, "source", unit),
            destination: field(map, "destination", unit),
            driver: field(map, "driver", unit),
            read_only: field(map, "readOnly", unit),
        }),
        _ => VolumeEntry::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(text: &str) -> Manifest {
        let value: Value = serde_yaml::from_str(text).expect("fixture parses");
        Manifest::from_value(&value)
    }

    #[test]
    fn explicit_null_is_distinct_from_absent() {
        let m = manifest("name:\nspec: v0.6\n");
        assert!(m.name.is_null());
        assert!(m.rootfs.is_missing());
        assert_eq!(m.spec.value(), Some(&Scalar::Text("v0.6".to_string())));
    }

    #[test]
    fn unikraft_shorthand_and_expanded_forms() {
        let m = manifest("unikraft: stable\n");
        assert_eq!(
            m.unikraft.value(),
            Some(&Component::Shorthand(Scalar::Text("stable".to_string())))
        );

        let m = manifest("unikraft:\n  version: stable\n  kconfig:\n");
        let Some(Component::Expanded(block)) = m.unikraft.value() else {
            panic!("expected expanded component");
        };
        assert_eq!(block.version.value(), Some(&Scalar::Text("stable".into())));
        assert!(block.kconfig.is_null());
        assert!(block.source.is_missing());
    }

    #[test]
    fn target_entries_keep_short_and_long_key_forms_apart() {
        let m = manifest("targets:\n  - qemu/x86_64\n  - plat: qemu\n    architecture: arm64\n");
        let Some(TargetsValue::List(entries)) = m.targets.value() else {
            panic!("expected target list");
        };
        assert_eq!(entries[0], TargetEntry::Shorthand("qemu/x86_64".into()));
        let TargetEntry::Expanded(block) = &entries[1] else {
            panic!("expected expanded target");
        };
        assert!(block.plat.value().is_some());
        assert!(block.platform.is_missing());
        assert!(block.arch.is_missing());
        assert!(block.architecture.value().is_some());
        assert!(block.has_architecture() && block.has_platform());
    }

    #[test]
    fn non_mapping_document_has_every_field_missing() {
        let m = manifest("- just\n- a\n- list\n");
        assert!(!m.has_specification());
        assert!(m.targets.is_missing());
    }

    #[test]
    fn empty_string_counts_as_an_empty_value() {
        let m = manifest("name: \"\"\n");
        assert!(m.name.is_empty_value());
        assert!(!m.name.is_null());
    }
}
