//! Tests for the monitored VM stack program.

use kumo::config::{ConfigError, StackConfig};
use kumo::graph::StackGraph;
use kumo::resource::{ResourceKind, Value};
use kumo::stack::{self, StackError};
use rstest::rstest;

fn configured() -> StackConfig {
    StackConfig::new("dev")
        .with_value("location", "eastus")
        .with_value("vm_name", "x")
        .with_secret("admin_password", "hunter2")
}

fn declared(config: &StackConfig) -> StackGraph {
    let mut graph = StackGraph::new(config.stack());
    stack::declare_stack(config, &mut graph).expect("declare stack");
    graph
}

#[rstest]
fn produces_seven_declarations_in_dependency_order() {
    let graph = declared(&configured());

    let kinds: Vec<ResourceKind> = graph.declarations().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        [
            ResourceKind::ResourceGroup,
            ResourceKind::StorageAccount,
            ResourceKind::VirtualNetwork,
            ResourceKind::Subnet,
            ResourceKind::PublicIp,
            ResourceKind::NetworkInterface,
            ResourceKind::VirtualMachine,
        ]
    );
    graph.validate().expect("acyclic");
}

#[rstest]
fn registers_the_four_exports() {
    let graph = declared(&configured());
    let labels: Vec<&str> = graph.exports().map(|(label, _)| label).collect();
    assert_eq!(
        labels,
        ["resourceGroupName", "storageAccountName", "vmName", "location"]
    );
}

#[rstest]
fn vm_is_named_from_configuration() {
    let graph = declared(&configured());
    let vm = graph.get(&"x".into()).expect("vm declaration");
    assert_eq!(vm.kind(), ResourceKind::VirtualMachine);
}

#[rstest]
fn defaults_apply_when_configuration_is_silent() {
    let config = StackConfig::new("defaults").with_secret("admin_password", "hunter2");
    let graph = declared(&config);

    let rg = graph.get(&"myresourcegroup".into()).expect("resource group");
    assert_eq!(
        rg.properties().get("location"),
        Some(&Value::from(stack::DEFAULT_LOCATION))
    );
    let vm = graph
        .get(&stack::DEFAULT_VM_NAME.into())
        .expect("vm declaration");
    assert_eq!(
        vm.properties()
            .get("hardware_profile")
            .and_then(|profile| match profile {
                Value::Map(map) => map.get("vm_size"),
                _ => None,
            }),
        Some(&Value::from(stack::DEFAULT_VM_SIZE))
    );
}

#[rstest]
fn missing_secret_fails_before_any_declaration() {
    let config = StackConfig::new("dev").with_value("location", "eastus");
    let mut graph = StackGraph::new(config.stack());
    let err = stack::declare_stack(&config, &mut graph).expect_err("missing secret");
    assert!(matches!(
        err,
        StackError::Config(ConfigError::MissingRequiredSecret { .. })
    ));
    assert!(graph.is_empty());
}

#[rstest]
fn nic_depends_on_subnet_and_public_ip() {
    let graph = declared(&configured());
    let nic = graph.get(&"vmNIC".into()).expect("nic declaration");
    let deps: Vec<&str> = nic.dependencies().iter().map(|n| n.as_str()).collect();
    assert!(deps.contains(&"vmSubnet"));
    assert!(deps.contains(&"vmPublicIP"));
}

#[rstest]
fn vm_wires_boot_diagnostics_to_the_storage_blob_endpoint() {
    let graph = declared(&configured());
    let vm = graph.get(&"x".into()).expect("vm declaration");
    let mut found = false;
    for value in vm.properties().values() {
        value.for_each_ref(&mut |attr| {
            if attr.resource.as_str() == "bootdiagnosticsstorage" {
                assert_eq!(attr.path, "primary_endpoints.blob");
                found = true;
            }
        });
    }
    assert!(found, "vm must reference the storage blob endpoint");
}

#[rstest]
fn generated_storage_names_are_idempotent_per_stack() {
    let first = declared(&configured());
    let second = declared(&configured());
    let name_of = |graph: &StackGraph| {
        graph
            .get(&"bootdiagnosticsstorage".into())
            .and_then(|decl| decl.properties().get("account_name").cloned())
            .expect("account name")
    };
    assert_eq!(name_of(&first), name_of(&second));

    let other_stack = StackConfig::new("prod")
        .with_value("location", "eastus")
        .with_value("vm_name", "x")
        .with_secret("admin_password", "hunter2");
    assert_ne!(name_of(&first), name_of(&declared(&other_stack)));
}
