//! Media types, well-known locations, and default option values.

pub const REF_ENGINES_MEDIA_TYPE: &str = "application/vnd.oci.ref-engines.v1+json";
pub const INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";
pub const DESCRIPTOR_MEDIA_TYPE: &str = "application/vnd.oci.descriptor.v1+json";
pub const REGEXP_REF_ENGINES_MEDIA_TYPE: &str = "application/vnd.oci.regexp-ref-engines.v1+json";

pub const WELL_KNOWN_PATH: &str = "/.well-known/oci-host-ref-engines";
pub const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

pub const CONFIG_SUBDIR: &str = "oci-discovery";
pub const CONFIG_FILE_NAME: &str = "ref-engine-discovery.json";
pub const XDG_CONFIG_DIRS: &str = "/etc/xdg";

pub const PROTOCOLS: [&str; 2] = ["https", "http"];

pub fn protocols() -> Vec<String> { PROTOCOLS.iter().map(|p| p.to_string()).collect() }
pub fn enabled() -> bool { true }
