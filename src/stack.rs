//! The monitored Linux VM stack.
//!
//! This module is the declarative program kumo exists to run: seven
//! resources declared in dependency order (resource group, boot-diagnostics
//! storage account, virtual network, subnet, public IP, network interface,
//! virtual machine) plus four exported identifiers. Configuration is
//! resolved up front, so a missing required secret fails before the first
//! declaration is attempted.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::{ConfigError, StackConfig};
use crate::graph::{GraphError, StackGraph};
use crate::hasher::NameHasher;
use crate::props;
use crate::resource::{ResourceKind, Value};

/// Region used when the configuration does not name one.
pub const DEFAULT_LOCATION: &str = "westeurope";

/// Virtual machine name used when the configuration does not name one.
pub const DEFAULT_VM_NAME: &str = "monitored-linux-vm";

/// Virtual machine size used when the configuration does not name one.
pub const DEFAULT_VM_SIZE: &str = "Standard_B1s";

/// Admin account name used when the configuration does not name one.
pub const DEFAULT_ADMIN_USERNAME: &str = "azureuser";

/// Configuration key of the required admin password secret.
pub const ADMIN_PASSWORD_KEY: &str = "admin_password";

const RESOURCE_GROUP_NAME: &str = "myresourcegroup";
const STORAGE_LOGICAL_NAME: &str = "bootdiagnosticsstorage";
const STORAGE_NAME_PREFIX: &str = "metricsstorage";

/// Failures raised while declaring the stack.
#[derive(Debug, Error, Diagnostic)]
pub enum StackError {
    /// A configuration lookup failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// A declaration or export was structurally invalid.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

/// Storage account name generated for `stack` when none is configured.
///
/// The suffix is a stable digest of the stack and logical names, so repeated
/// applies of the same stack reuse the same account.
#[must_use]
pub fn generated_storage_name(stack: &str) -> String {
    format!(
        "{STORAGE_NAME_PREFIX}{}",
        NameHasher::suffix(stack, STORAGE_LOGICAL_NAME)
    )
}

/// Declare the monitored VM stack into `graph` and register its exports.
///
/// Declarations are appended in dependency order; every deferred reference
/// points at a declaration made earlier in this function, so the resulting
/// graph is a DAG by construction.
///
/// # Errors
///
/// Returns [`StackError::Config`] when the required `admin_password` secret
/// is absent (before any declaration is attempted), and [`StackError::Graph`]
/// when a declaration or export is structurally invalid — for this fixed
/// program that only happens if the caller hands in a graph already
/// containing colliding names or labels.
pub fn declare_stack(config: &StackConfig, graph: &mut StackGraph) -> Result<(), StackError> {
    let admin_password = config.require_secret(ADMIN_PASSWORD_KEY)?;
    let location = config.get_or("location", DEFAULT_LOCATION);
    let vm_name = config.get_or("vm_name", DEFAULT_VM_NAME);
    let vm_size = config.get_or("vm_size", DEFAULT_VM_SIZE);
    let admin_username = config.get_or("admin_username", DEFAULT_ADMIN_USERNAME);
    let storage_account_name = config
        .get("storage_account_name")
        .map_or_else(|| generated_storage_name(config.stack()), str::to_owned);

    let resource_group = graph.declare(
        ResourceKind::ResourceGroup,
        RESOURCE_GROUP_NAME,
        props! { "location" => location },
    )?;

    let storage_account = graph.declare(
        ResourceKind::StorageAccount,
        STORAGE_LOGICAL_NAME,
        props! {
            "resource_group_name" => resource_group.output("name"),
            "account_name" => storage_account_name,
            "sku" => props! { "name" => "Standard_LRS" },
            "kind" => "StorageV2",
            "location" => resource_group.output("location"),
        },
    )?;

    let vnet = graph.declare(
        ResourceKind::VirtualNetwork,
        "vmVNet",
        props! {
            "resource_group_name" => resource_group.output("name"),
            "location" => resource_group.output("location"),
            "address_space" => props! {
                "address_prefixes" => vec![Value::from("10.0.0.0/16")],
            },
        },
    )?;

    let subnet = graph.declare(
        ResourceKind::Subnet,
        "vmSubnet",
        props! {
            "resource_group_name" => resource_group.output("name"),
            "virtual_network_name" => vnet.output("name"),
            "address_prefix" => "10.0.1.0/24",
        },
    )?;

    let public_ip = graph.declare(
        ResourceKind::PublicIp,
        "vmPublicIP",
        props! {
            "resource_group_name" => resource_group.output("name"),
            "location" => resource_group.output("location"),
            "public_ip_allocation_method" => "Dynamic",
        },
    )?;

    let network_interface = graph.declare(
        ResourceKind::NetworkInterface,
        "vmNIC",
        props! {
            "resource_group_name" => resource_group.output("name"),
            "location" => resource_group.output("location"),
            "ip_configurations" => vec![Value::from(props! {
                "name" => "ipconfig1",
                "subnet" => props! { "id" => subnet.output("id") },
                "private_ip_allocation_method" => "Dynamic",
                "public_ip_address" => props! { "id" => public_ip.output("id") },
            })],
        },
    )?;

    let vm = graph.declare(
        ResourceKind::VirtualMachine,
        vm_name,
        props! {
            "resource_group_name" => resource_group.output("name"),
            "location" => resource_group.output("location"),
            "hardware_profile" => props! { "vm_size" => vm_size },
            "storage_profile" => props! {
                "os_disk" => props! {
                    "caching" => "ReadWrite",
                    "create_option" => "FromImage",
                    "managed_disk" => props! {
                        "storage_account_type" => "Standard_LRS",
                    },
                },
                "image_reference" => props! {
                    "publisher" => "Canonical",
                    "offer" => "0001-com-ubuntu-server-jammy",
                    "sku" => "22_04-lts-gen2",
                    "version" => "latest",
                },
            },
            "os_profile" => props! {
                "computer_name" => vm_name,
                "admin_username" => admin_username,
                "admin_password" => admin_password,
                // Password authentication stays enabled for the monitoring
                // agent bootstrap.
                "linux_configuration" => props! {
                    "disable_password_authentication" => false,
                },
            },
            "network_profile" => props! {
                "network_interfaces" => vec![Value::from(props! {
                    "id" => network_interface.output("id"),
                    "primary" => true,
                })],
            },
            "diagnostics_profile" => props! {
                "boot_diagnostics" => props! {
                    "enabled" => true,
                    "storage_uri" => storage_account.output("primary_endpoints.blob"),
                },
            },
        },
    )?;

    graph.export("resourceGroupName", resource_group.output("name"))?;
    graph.export("storageAccountName", storage_account.output("name"))?;
    graph.export("vmName", vm.output("name"))?;
    graph.export("location", resource_group.output("location"))?;

    Ok(())
}
