//! Tests for resource graph construction and validation.

use kumo::graph::{GraphError, StackGraph};
use kumo::props;
use kumo::resource::{AttrRef, ResourceKind, Value};
use rstest::rstest;

fn reference(resource: &str, path: &str) -> Value {
    Value::Ref(AttrRef {
        resource: resource.into(),
        path: path.into(),
    })
}

#[rstest]
fn declaration_chain_builds_an_acyclic_graph() {
    let mut graph = StackGraph::new("dev");
    let rg = graph
        .declare(
            ResourceKind::ResourceGroup,
            "rg",
            props! { "location" => "westeurope" },
        )
        .expect("declare rg");
    let vnet = graph
        .declare(
            ResourceKind::VirtualNetwork,
            "vnet",
            props! { "resource_group_name" => rg.output("name") },
        )
        .expect("declare vnet");
    graph
        .declare(
            ResourceKind::Subnet,
            "subnet",
            props! {
                "resource_group_name" => rg.output("name"),
                "virtual_network_name" => vnet.output("name"),
            },
        )
        .expect("declare subnet");

    graph.validate().expect("acyclic");
    let names: Vec<&str> = graph.declarations().map(|d| d.name().as_str()).collect();
    assert_eq!(names, ["rg", "vnet", "subnet"]);
}

enum ExpectedError {
    DuplicateName { name: String },
    UnresolvedDependency { resource: String },
}

#[rstest]
#[case::duplicate_name(
    ResourceKind::StorageAccount,
    "rg",
    props! {},
    ExpectedError::DuplicateName { name: "rg".into() }
)]
#[case::dangling_reference(
    ResourceKind::Subnet,
    "subnet",
    props! { "virtual_network_name" => reference("vnet", "name") },
    ExpectedError::UnresolvedDependency { resource: "vnet".into() }
)]
#[case::empty_attribute_path(
    ResourceKind::VirtualNetwork,
    "vnet",
    props! { "resource_group_name" => reference("rg", "") },
    ExpectedError::UnresolvedDependency { resource: "rg".into() }
)]
fn declare_error_cases(
    #[case] kind: ResourceKind,
    #[case] name: &str,
    #[case] properties: kumo::resource::Props,
    #[case] expected: ExpectedError,
) {
    let mut graph = StackGraph::new("dev");
    graph
        .declare(
            ResourceKind::ResourceGroup,
            "rg",
            props! { "location" => "westeurope" },
        )
        .expect("declare rg");

    let err = graph.declare(kind, name, properties).expect_err("error");
    match (err, expected) {
        (
            GraphError::DuplicateName { name: got, .. },
            ExpectedError::DuplicateName { name: want },
        ) => {
            assert_eq!(got.as_str(), want);
        }
        (
            GraphError::UnresolvedDependency { resource, .. },
            ExpectedError::UnresolvedDependency { resource: want },
        ) => {
            assert_eq!(resource.as_str(), want);
        }
        (other, _) => panic!("wrong error: {other:?}"),
    }
}

#[rstest]
fn duplicate_export_label_fails() {
    let mut graph = StackGraph::new("dev");
    let rg = graph
        .declare(
            ResourceKind::ResourceGroup,
            "rg",
            props! { "location" => "westeurope" },
        )
        .expect("declare");
    graph.export("location", rg.output("location")).expect("export");
    let err = graph
        .export("location", rg.output("location"))
        .expect_err("duplicate");
    assert!(matches!(
        err,
        GraphError::DuplicateExport { label } if label == "location"
    ));
}

#[rstest]
fn rejected_declaration_leaves_no_trace() {
    let mut graph = StackGraph::new("dev");
    let err = graph
        .declare(
            ResourceKind::NetworkInterface,
            "nic",
            props! { "subnet_id" => reference("subnet", "id") },
        )
        .expect_err("dangling");
    assert!(matches!(err, GraphError::UnresolvedDependency { .. }));
    assert!(graph.is_empty());
    graph.validate().expect("empty graph is valid");
}

#[rstest]
fn duplicate_name_error_display_names_both_kinds() {
    let mut graph = StackGraph::new("dev");
    graph
        .declare(ResourceKind::ResourceGroup, "shared", props! {})
        .expect("declare");
    let err = graph
        .declare(ResourceKind::VirtualMachine, "shared", props! {})
        .expect_err("duplicate");
    let text = err.to_string();
    assert!(text.contains("resource-group"));
    assert!(text.contains("virtual-machine"));
}
