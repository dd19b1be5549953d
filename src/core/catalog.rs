use serde::{Deserialize, Serialize};

pub const DEFAULT_PLATFORM: &str = "gcp";
pub const DEFAULT_ARCHITECTURE: &str = "amd64";
pub const DEFAULT_UPGRADE_TEST: &str = "e2e-upgrade";

/// Closed allow-lists the option parser and the command builders check against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default = "default_architectures")]
    pub architectures: Vec<String>,
    #[serde(default = "default_parameters")]
    pub parameters: Vec<String>,
    #[serde(default = "default_tests")]
    pub tests: Vec<String>,
    #[serde(default = "default_upgrade_tests")]
    pub upgrade_tests: Vec<String>,
    #[serde(default = "default_platform")]
    pub default_platform: String,
    #[serde(default = "default_architecture")]
    pub default_architecture: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_platforms() -> Vec<String> {
    owned(&[
        "aws", "gcp", "azure", "vsphere", "metal", "ovirt", "openstack", "hypershift",
    ])
}

fn default_architectures() -> Vec<String> {
    owned(&["amd64", "arm64", "multi"])
}

fn default_parameters() -> Vec<String> {
    owned(&[
        "ovn",
        "proxy",
        "compact",
        "fips",
        "mirror",
        "shared-vpc",
        "large",
        "xlarge",
        "ipv4",
        "ipv6",
        "dualstack",
        "preserve-bootstrap",
        "test",
        "rt",
        "single-node",
        "techpreview",
        "upi",
        "no-spot",
    ])
}

fn default_tests() -> Vec<String> {
    owned(&[
        "e2e",
        "e2e-serial",
        "e2e-all",
        "e2e-disruptive",
        "e2e-disruptive-all",
        "e2e-builds",
        "e2e-image-ecosystem",
        "e2e-image-registry",
        "e2e-network-stress",
    ])
}

fn default_upgrade_tests() -> Vec<String> {
    owned(&[
        "e2e-upgrade",
        "e2e-upgrade-all",
        "e2e-upgrade-partial",
        "e2e-upgrade-rollback",
    ])
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

fn default_architecture() -> String {
    DEFAULT_ARCHITECTURE.to_string()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            platforms: default_platforms(),
            architectures: default_architectures(),
            parameters: default_parameters(),
            tests: default_tests(),
            upgrade_tests: default_upgrade_tests(),
            default_platform: default_platform(),
            default_architecture: default_architecture(),
        }
    }
}

impl Catalog {
    pub fn is_platform(&self, name: &str) -> bool {
        self.platforms.iter().any(|p| p == name)
    }

    pub fn is_architecture(&self, name: &str) -> bool {
        self.architectures.iter().any(|a| a == name)
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }

    pub fn is_test(&self, name: &str) -> bool {
        self.tests.iter().any(|t| t == name)
    }
}
