//! Static registry of the attributes recognised in a Kraftfile.
//!
//! The registry is pure data: every recognised top-level and nested
//! attribute with its labels, value shape and display documentation.
//! It is built once at process start and only ever read afterwards.

use once_cell::sync::Lazy;

use crate::text::strip_trailing_colon;

/// Architectures a target can be built for.
pub const ARCHITECTURES: &[&str] = &["x86_64", "arm64"];

/// Platforms a target can be deployed to.
pub const PLATFORMS: &[&str] = &["qemu", "xen", "firecracker", "kraftcloud"];

/// Recognised manifest specification versions, newest first.
pub const SPEC_VERSIONS: &[&str] = &["v0.6", "v0.5"];

/// Version channels for the Unikraft core and third-party libraries.
pub const VERSION_CHANNELS: &[&str] = &["stable", "staging"];

/// The canonical platform/architecture combinations, most common first.
pub const TARGET_COMBINATIONS: &[&str] = &[
    "qemu/x86_64",
    "qemu/arm64",
    "firecracker/x86_64",
    "firecracker/arm64",
    "xen/x86_64",
    "xen/arm64",
];

/// The smallest well-formed manifest. Used by tests and as the body of the
/// whole-file skeleton completion.
pub const MINIMAL_MANIFEST: &str = "spec: \"v0.6\"\n\
name: helloworld\n\
unikraft: stable\n\
targets:\n  - plat: qemu\n    arch: x86_64\n";

/// Shape of the value a manifest attribute accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    StringOrArray,
    MapOrArray,
    NestedObject,
}

impl ValueShape {
    /// Short type hint rendered next to completion labels.
    pub fn type_hint(self) -> &'static str {
        match self {
            ValueShape::Scalar => "string",
            ValueShape::StringOrArray => "string or array",
            ValueShape::MapOrArray => "map or array",
            ValueShape::NestedObject => "string or object",
        }
    }
}

/// Whether an attribute lives at the manifest root or nested under a
/// root attribute (`unikraft`, `libraries.<name>`, `targets` elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Root,
    Nested,
}

/// One entry in the schema registry.
#[derive(Debug)]
pub struct AttributeSpec {
    pub primary_label: &'static str,
    pub alias_label: Option<&'static str>,
    pub value_shape: ValueShape,
    pub placement: Placement,
    pub enumerated_values: Option<&'static [&'static str]>,
    /// One-paragraph summary shown as the completion/hover detail.
    pub detail: &'static str,
    /// Long-form markdown with fenced examples.
    pub documentation: &'static str,
}

impl AttributeSpec {
    /// True when `label` equals the primary or alias label exactly.
    pub fn matches(&self, label: &str) -> bool {
        self.primary_label == label || self.alias_label == Some(label)
    }
}

const SPECIFICATION_DETAIL: &str = "All Kraftfiles MUST include a top-level specification \
attribute which is used by kraft to both validate as well as correctly parse the rest of \
the file. The latest spec number is v0.6.";

const SPECIFICATION_DOC: &str = "```\nspec: v0.6\n```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-spec-attribute";

const NAME_DETAIL: &str = "An application name CAN be specified. When no name attribute is \
specified, the directory's base name is used as the name.";

const NAME_DOC: &str = "```\nname: helloworld\n```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-name-attribute";

const UNIKRAFT_DETAIL: &str = "The unikraft attribute MUST be specified and is used to define \
the source location of the Unikraft core which contains the main build system and core \
primitives for connecting your application as well as any third-party libraries or drivers.";

const UNIKRAFT_DOC: &str = "The attribute can be specified in multiple ways, the most common \
is simply to request the latest from a \"stable\" channel of Unikraft, e.g.\n\
```\n\
# Short-hand syntax with version\n\
unikraft: stable\n\n\
# Short-hand syntax with source\n\
unikraft: https://github.com/unikraft/unikraft.git\n\n\
# Long-hand syntax\n\
unikraft:\n  version: stable\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-unikraft-attribute";

const TARGETS_DETAIL: &str = "A target is defined as a specific destination that the \
resulting unikernel is destined for and consists at minimum of a specific platform (e.g. \
qemu or firecracker) and architecture (e.g. x86_64 or arm64) tuple. A project can have \
multiple targets depending on use case but MUST have at least one.";

const TARGETS_DOC: &str = "Each target consists of at minimum an architecture and platform \
combination, therefore a project with two targets of qemu/x86_64 and xen/arm64:\n\
```\n\
# shorter syntax where only the architecture and platform are desired in the list\n\
targets:\n  - qemu/x86_64\n\n\
# Within the list of targets, the architecture and platform attributes can be specified\n\
targets:\n  - platform: xen\n    architecture: arm64\n\n\
# It is possible to define targets simply based on different runtime properties\n\
targets:\n  - name: helloworld-qemu-x86_64\n    platform: qemu\n    architecture: x86_64\n\
    kconfig:\n      CONFIG_LIBVFSCORE_AUTOMOUNT_ROOTFS: \"y\"\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-targets-attributes";

const CMD_DETAIL: &str = "A cmd attribute CAN be specified as an array or string which can \
be used for setting default arguments to be used during the instantiation of a new \
unikernel instance.";

const CMD_DOC: &str = "```\n\
cmd: \"-c /nginx/conf/nginx.conf\"\n\n\
cmd: [\"-c\", \"/nginx/conf/nginx.conf\"]\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-cmd-attribute";

const LIBRARIES_DETAIL: &str = "Additional third-party libraries CAN be specified as part \
of the build and are listed in map-format. Similar to the unikraft attribute, each library \
can specify a source, version and a set of kconfig options.";

const LIBRARIES_DOC: &str = "```\n\
libraries:\n  musl: stable\n  lwip:\n    version: stable\n    kconfig:\n      LWIP_IPV6: \"y\"\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-libraries-attribute";

const VOLUMES_DETAIL: &str = "The volumes attribute CAN be specified as a list of mappings \
between the host and the unikernel machine instance, either in short-hand \
\"source:destination\" form or as objects with source, destination, driver and readOnly \
attributes.";

const VOLUMES_DOC: &str = "```\n\
# Short-hand syntax\n\
volumes:\n  - ./src:/dest\n\n\
# Long-hand syntax\n\
volumes:\n  - source: ./src\n    destination: /dest\n    readOnly: true\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-volumes-attribute";

const ROOTFS_DETAIL: &str = "The rootfs element CAN be specified to define the root \
filesystem. In every case of being specified, the resulting artifact which is passed to \
the unikernel machine instance is a read-only CPIO archive.";

const ROOTFS_DOC: &str = "```\nrootfs: ./Dockerfile\n```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-rootfs-attribute";

const RUNTIME_DETAIL: &str = "The runtime attribute CAN be specified and is used to access \
a pre-built unikernel. The unikernel runtime can be specified either as a path to an OCI \
image, a directory representing a project (i.e. one which contains a Kraftfile) or a path \
to a unikernel binary image.";

const RUNTIME_DOC: &str = "```\nruntime: unikraft.org/python3:latest\n```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-runtime-attribute";

const TEMPLATE_DETAIL: &str = "The template attribute CAN be specified to reference an \
external repository which contains an application based on another Kraftfile.";

const TEMPLATE_DOC: &str = "```\n\
# Short-hand syntax\n\
template: app/elfloader:stable\n\n\
# Long-hand syntax\n\
template:\n  name: app/elfloader\n  version: stable\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-template-attribute";

const ARCHITECTURE_DETAIL: &str = "An architecture is specified for a target destination \
as an attribute of a targets list element (e.g. x86_64 or arm64).";

const ARCHITECTURE_DOC: &str = "```\n\
targets:\n  - platform: qemu\n    architecture: x86_64\n\n\
# The architecture and platform attributes can be abbreviated to arch and plat\n\
targets:\n  - plat: qemu\n    arch: x86_64\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-targets-attributes";

const PLATFORM_DETAIL: &str = "A platform is specified for a target destination as an \
attribute of a targets list element (e.g. qemu, xen etc).";

const PLATFORM_DOC: &str = "```\n\
targets:\n  - platform: qemu\n    architecture: x86_64\n\n\
# The architecture and platform attributes can be abbreviated to arch and plat\n\
targets:\n  - plat: qemu\n    arch: x86_64\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-targets-attributes";

const SOURCE_DETAIL: &str = "If you wish to use a copy of the Unikraft core or third party \
library code which is a remote fork or mirror, it is possible to set this as the entry for \
the attribute. When specified like so, the top of the HEAD of the default branch will be \
used.";

const SOURCE_DOC: &str = "```\n\
unikraft:\n  source: https://github.com/unikraft/unikraft.git\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-unikraft-attribute";

const VERSION_DETAIL: &str = "It specifies a specific version of Unikraft core or third \
party library, including a specific Git commit.";

const VERSION_DOC: &str = "```\n\
unikraft:\n  version: stable\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-unikraft-attribute";

const KCONFIG_DETAIL: &str = "It declares any specific options from Unikraft's \
configuration system, you must always use the long-hand syntax. All KConfig options start \
with CONFIG_ and can be set in either list format with key and value delimited with an \
equal (=) symbol or in map format.";

const KCONFIG_DOC: &str = "```\n\
# Map format\n\
kconfig:\n  CONFIG_EXAMPLE: \"y\"\n\n\
# List format\n\
kconfig:\n  - CONFIG_EXAMPLE=y\n\
```\n\
For more visit: https://unikraft.org/docs/cli/reference/kraftfile/v0.6#top-level-unikraft-attribute";

static ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec {
        primary_label: "specification",
        alias_label: Some("spec"),
        value_shape: ValueShape::Scalar,
        placement: Placement::Root,
        enumerated_values: Some(SPEC_VERSIONS),
        detail: SPECIFICATION_DETAIL,
        documentation: SPECIFICATION_DOC,
    },
    AttributeSpec {
        primary_label: "name",
        alias_label: None,
        value_shape: ValueShape::Scalar,
        placement: Placement::Root,
        enumerated_values: None,
        detail: NAME_DETAIL,
        documentation: NAME_DOC,
    },
    AttributeSpec {
        primary_label: "unikraft",
        alias_label: None,
        value_shape: ValueShape::NestedObject,
        placement: Placement::Root,
        enumerated_values: None,
        detail: UNIKRAFT_DETAIL,
        documentation: UNIKRAFT_DOC,
    },
    AttributeSpec {
        primary_label: "targets",
        alias_label: None,
        value_shape: ValueShape::StringOrArray,
        placement: Placement::Root,
        enumerated_values: Some(TARGET_COMBINATIONS),
        detail: TARGETS_DETAIL,
        documentation: TARGETS_DOC,
    },
    AttributeSpec {
        primary_label: "cmd",
        alias_label: None,
        value_shape: ValueShape::StringOrArray,
        placement: Placement::Root,
        enumerated_values: None,
        detail: CMD_DETAIL,
        documentation: CMD_DOC,
    },
    AttributeSpec {
        primary_label: "libraries",
        alias_label: None,
        value_shape: ValueShape::NestedObject,
        placement: Placement::Root,
        enumerated_values: None,
        detail: LIBRARIES_DETAIL,
        documentation: LIBRARIES_DOC,
    },
    AttributeSpec {
        primary_label: "volumes",
        alias_label: None,
        value_shape: ValueShape::StringOrArray,
        placement: Placement::Root,
        enumerated_values: None,
        detail: VOLUMES_DETAIL,
        documentation: VOLUMES_DOC,
    },
    AttributeSpec {
        primary_label: "rootfs",
        alias_label: None,
        value_shape: ValueShape::Scalar,
        placement: Placement::Root,
        enumerated_values: None,
        detail: ROOTFS_DETAIL,
        documentation: ROOTFS_DOC,
    },
    AttributeSpec {
        primary_label: "runtime",
        alias_label: None,
        value_shape: ValueShape::Scalar,
        placement: Placement::Root,
        enumerated_values: None,
        detail: RUNTIME_DETAIL,
        documentation: RUNTIME_DOC,
    },
    AttributeSpec {
        primary_label: "template",
        alias_label: None,
        value_shape: ValueShape::NestedObject,
        placement: Placement::Root,
        enumerated_values: None,
        detail: TEMPLATE_DETAIL,
        documentation: TEMPLATE_DOC,
    },
    AttributeSpec {
        primary_label: "architecture",
        alias_label: Some("arch"),
        value_shape: ValueShape::Scalar,
        placement: Placement::Nested,
        enumerated_values: Some(ARCHITECTURES),
        detail: ARCHITECTURE_DETAIL,
        documentation: ARCHITECTURE_DOC,
    },
    AttributeSpec {
        primary_label: "platform",
        alias_label: Some("plat"),
        value_shape: ValueShape::Scalar,
        placement: Placement::Nested,
        enumerated_values: Some(PLATFORMS),
        detail: PLATFORM_DETAIL,
        documentation: PLATFORM_DOC,
    },
    AttributeSpec {
        primary_label: "source",
        alias_label: None,
        value_shape: ValueShape::Scalar,
        placement: Placement::Nested,
        enumerated_values: None,
        detail: SOURCE_DETAIL,
        documentation: SOURCE_DOC,
    },
    AttributeSpec {
        primary_label: "version",
        alias_label: None,
        value_shape: ValueShape::Scalar,
        placement: Placement::Nested,
        enumerated_values: Some(VERSION_CHANNELS),
        detail: VERSION_DETAIL,
        documentation: VERSION_DOC,
    },
    AttributeSpec {
        primary_label: "kconfig",
        alias_label: None,
        value_shape: ValueShape::MapOrArray,
        placement: Placement::Nested,
        enumerated_values: None,
        detail: KCONFIG_DETAIL,
        documentation: KCONFIG_DOC,
    },
];

/// Lookup over the static attribute table. Construct once via [`SchemaRegistry::global`].
pub struct SchemaRegistry {
    attributes: &'static [AttributeSpec],
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(|| SchemaRegistry {
    attributes: ATTRIBUTES,
});

impl SchemaRegistry {
    pub fn global() -> &'static SchemaRegistry {
        &REGISTRY
    }

    /// Resolve `label` (primary or alias, with or without a trailing colon)
    /// to its spec.
    pub fn lookup(&self, label: &str) -> Option<&'static AttributeSpec> {
        let label = strip_trailing_colon(label);
        self.attributes.iter().find(|spec| spec.matches(label))
    }

    pub fn root_attributes(&self) -> impl Iterator<Item = &'static AttributeSpec> {
        self.attributes
            .iter()
            .filter(|spec| spec.placement == Placement::Root)
    }

    pub fn nested_attributes(&self) -> impl Iterator<Item = &'static AttributeSpec> {
        self.attributes
            .iter()
            .filter(|spec| spec.placement == Placement::Nested)
    }

    pub fn all_attributes(&self) -> impl Iterator<Item = &'static AttributeSpec> {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_and_primary_resolve_to_the_same_spec() {
        let registry = SchemaRegistry::global();
        let by_alias = registry.lookup("arch").expect("alias resolves");
        let by_primary = registry.lookup("architecture").expect("primary resolves");
        assert_eq!(by_alias.primary_label, by_primary.primary_label);
        assert_eq!(by_alias.primary_label, "architecture");
    }

    #[test]
    fn lookup_strips_trailing_colon() {
        let registry = SchemaRegistry::global();
        let spec = registry.lookup("unikraft:").expect("colon form resolves");
        assert_eq!(spec.primary_label, "unikraft");
    }

    #[test]
    fn unknown_label_yields_none() {
        assert!(SchemaRegistry::global().lookup("bogus").is_none());
    }

    #[test]
    fn root_and_nested_partitions_cover_the_table() {
        let registry = SchemaRegistry::global();
        assert_eq!(registry.root_attributes().count(), 10);
        assert_eq!(registry.nested_attributes().count(), 5);
        assert_eq!(
            registry.all_attributes().count(),
            registry.root_attributes().count() + registry.nested_attributes().count()
        );
    }

    #[test]
    fn enumerations_back_value_completion() {
        let registry = SchemaRegistry::global();
        let arch = registry.lookup("architecture").unwrap();
        assert_eq!(arch.enumerated_values, Some(ARCHITECTURES));
        let plat = registry.lookup("plat").unwrap();
        assert_eq!(plat.enumerated_values, Some(PLATFORMS));
    }
}
