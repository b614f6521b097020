//! Hierarchy and binding properties over explicitly registered declarations.

use std::collections::HashSet;
use std::sync::Arc;

use chatoverflow::prelude::*;
use chatoverflow::{
    BindingTable, BuildPhase, ConnectorTypeDeclaration, ContractDeclaration, ContractHierarchy,
    ContractKind, CoreError, Declaration, DeclarationError, HierarchyBuilder,
    ImplementationDeclaration, MetadataRegistry, plugin_factory,
};

trait Marker: Send + Sync {}

struct Noop;

impl Marker for Noop {}

impl Plugin for Noop {
    fn create(_: &PluginContext) -> Result<Self, BoxError> {
        Ok(Noop)
    }
}

fn contract(id: String, kind: ContractKind, parent: Option<String>) -> ContractDeclaration {
    let decl = ContractDeclaration::new(id, kind);
    match parent {
        Some(parent) => decl.with_parent(parent),
        None => decl,
    }
}

/// A forest of `n` contracts where node `i > 0` hangs below `(i - 1) / fan_out`,
/// with every `roots_every`-th node starting a new tree.
fn forest(n: usize, fan_out: usize, roots_every: usize) -> Vec<ContractDeclaration> {
    (0..n)
        .map(|i| {
            let parent = (i % roots_every != 0).then(|| format!("C{}", (i - 1) / fan_out));
            contract(format!("C{i}"), ContractKind::Input, parent)
        })
        .collect()
}

fn build(declarations: Vec<ContractDeclaration>) -> Result<Arc<ContractHierarchy>, CoreError> {
    let mut builder = HierarchyBuilder::new();
    for decl in declarations {
        builder.insert(decl)?;
    }
    builder.build()
}

#[test]
fn forests_have_unique_root_paths() {
    let shapes = [(1, 1, 1), (10, 1, 4), (40, 2, 7), (100, 3, 100), (64, 5, 9)];
    for (n, fan_out, roots_every) in shapes {
        let declarations = forest(n, fan_out, roots_every);
        let hierarchy = build(declarations.clone()).unwrap();
        assert_eq!(hierarchy.len(), n);

        let roots: HashSet<_> = hierarchy.roots().iter().collect();
        let mut seen_as_child = HashSet::new();
        for decl in &declarations {
            let path = hierarchy.path_to_root(decl.id.as_str());
            assert_eq!(path.first().copied(), Some(&decl.id));
            assert!(roots.contains(path.last().unwrap()));

            // Walking parents one step at a time gives the same path.
            let mut expected = vec![&decl.id];
            let mut cursor = decl.parent.as_ref();
            while let Some(parent) = cursor {
                expected.push(parent);
                cursor = declarations
                    .iter()
                    .find(|d| &d.id == parent)
                    .and_then(|d| d.parent.as_ref());
            }
            assert_eq!(path, expected);

            for child in hierarchy.children(decl.id.as_str()) {
                assert!(seen_as_child.insert(child.clone()), "{child} has two parents");
            }
        }
        assert_eq!(seen_as_child.len() + roots.len(), n);
    }
}

#[test]
fn cycles_are_rejected_without_partial_tree() {
    for len in 2..=6 {
        let mut declarations: Vec<_> = (0..len)
            .map(|i| {
                contract(
                    format!("Loop{i}"),
                    ContractKind::Output,
                    Some(format!("Loop{}", (i + 1) % len)),
                )
            })
            .collect();
        declarations.push(contract("Output".into(), ContractKind::Output, None));
        declarations.push(contract(
            "ChatOutput".into(),
            ContractKind::Output,
            Some("Output".into()),
        ));

        let mut builder = HierarchyBuilder::new();
        for decl in declarations {
            builder.insert(decl).unwrap();
        }

        let err = builder.build().unwrap_err();
        let CoreError::Declaration(DeclarationError::CyclicHierarchy { cycle }) = &err else {
            panic!("expected a cycle error, got {err:?}");
        };
        assert_eq!(cycle.len(), len);
        assert!(cycle.iter().all(|id| id.as_str().starts_with("Loop")));

        // Nothing was frozen; the builder is still open for corrections.
        assert_eq!(builder.phase(), BuildPhase::Open);
    }
}

#[test]
fn requirement_descendants_need_connector() {
    let contracts = vec![
        contract("Requirement".into(), ContractKind::Requirement, None),
        contract(
            "ChatRequirement".into(),
            ContractKind::Requirement,
            Some("Requirement".into()),
        ),
        contract(
            "WhisperRequirement".into(),
            ContractKind::Requirement,
            Some("ChatRequirement".into()),
        ),
    ];
    let hierarchy = build(contracts.clone()).unwrap();

    for target in &contracts {
        let implementation = ImplementationDeclaration::new(
            format!("{}Impl", target.id),
            target.id.clone(),
            plugin_factory!(Noop => dyn Marker),
        );
        let err = BindingTable::bind(&[implementation], Arc::clone(&hierarchy), &[]).unwrap_err();
        assert!(
            matches!(
                err,
                CoreError::Declaration(DeclarationError::MissingConnectorDeclaration { .. })
            ),
            "{} bound without a connector",
            target.id
        );
    }
}

#[test]
fn inputs_and_outputs_reject_connector() {
    let mut registry = MetadataRegistry::new();
    registry
        .register_all([
            Declaration::from(ContractDeclaration::new("Output", ContractKind::Output)),
            ConnectorTypeDeclaration::new("TwitchConnector").into(),
            ImplementationDeclaration::new(
                "TwitchOutputImpl",
                "Output",
                plugin_factory!(Noop => dyn Marker),
            )
            .with_connector("TwitchConnector")
            .into(),
        ])
        .unwrap();
    registry.freeze();

    let hierarchy = HierarchyBuilder::from_registry(&registry)
        .unwrap()
        .build()
        .unwrap();
    let err = BindingTable::from_registry(&registry, &hierarchy).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Declaration(DeclarationError::ConnectorNotAllowed { .. })
    ));
}
