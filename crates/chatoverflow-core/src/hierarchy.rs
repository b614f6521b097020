//! Contract hierarchy construction.
//!
//! Contracts may name a parent contract, forming a forest of lineages such as
//! `Input -> ChatInput -> TwitchChatInput`.  The [`HierarchyBuilder`] collects
//! contract declarations, validates them as a whole and produces an immutable
//! [`ContractHierarchy`].  Validation runs in a fixed order:
//!
//! 1. identifiers are unique
//! 2. every declared parent exists
//! 3. a child has the same kind as its parent
//! 4. the parent relation has no cycle (a self-parent is a cycle of one)
//!
//! No partial hierarchy is ever returned.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info};

use crate::declaration::ContractDeclaration;
use crate::error::{CoreResult, DeclarationError, StateError};
use crate::metadata::MetadataRegistry;
use crate::types::{ContractId, ContractKind};

const WHAT: &str = "contract hierarchy";

// =============================================================================
// ContractNode / ContractHierarchy
// =============================================================================

/// One contract in the built hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractNode {
    id: ContractId,
    kind: ContractKind,
    parent: Option<ContractId>,
    children: Vec<ContractId>,
    depth: usize,
}

impl ContractNode {
    pub fn id(&self) -> &ContractId {
        &self.id
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&ContractId> {
        self.parent.as_ref()
    }

    /// Direct children in declaration order.
    pub fn children(&self) -> &[ContractId] {
        &self.children
    }

    /// Distance to the root (roots have depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Immutable forest of contracts.
///
/// Nodes refer to each other by identifier; the hierarchy owns every edge.
#[derive(Debug)]
pub struct ContractHierarchy {
    nodes: HashMap<ContractId, ContractNode>,
    order: Vec<ContractId>,
    roots: Vec<ContractId>,
}

impl ContractHierarchy {
    /// Looks up a contract.
    pub fn get(&self, id: &str) -> Option<&ContractNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn kind_of(&self, id: &str) -> Option<ContractKind> {
        self.get(id).map(ContractNode::kind)
    }

    pub fn parent(&self, id: &str) -> Option<&ContractId> {
        self.get(id).and_then(ContractNode::parent)
    }

    /// Direct children of `id`; empty for leaves and unknown identifiers.
    pub fn children(&self, id: &str) -> &[ContractId] {
        self.get(id).map(ContractNode::children).unwrap_or_default()
    }

    /// Root contracts in declaration order.
    pub fn roots(&self) -> &[ContractId] {
        &self.roots
    }

    /// Iterates over the strict ancestors of `id`, nearest first.
    pub fn ancestors<'a>(&'a self, id: &str) -> Ancestors<'a> {
        Ancestors {
            hierarchy: self,
            next: self.parent(id),
        }
    }

    /// The unique path from `id` up to its root, both included.
    ///
    /// Empty if `id` is unknown.
    pub fn path_to_root(&self, id: &str) -> Vec<&ContractId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        std::iter::once(&node.id)
            .chain(self.ancestors(id).map(ContractNode::id))
            .collect()
    }

    /// The root of the tree containing `id`.
    pub fn root_of(&self, id: &str) -> Option<&ContractId> {
        self.path_to_root(id).last().copied()
    }

    /// Returns `true` if `id` is `ancestor` or lies below it.
    pub fn is_descendant_of(&self, id: &str, ancestor: &str) -> bool {
        self.contains(ancestor) && self.path_to_root(id).iter().any(|p| *p == ancestor)
    }

    /// Every contract below `id`, breadth first.
    pub fn descendants(&self, id: &str) -> Vec<&ContractId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&ContractId> = self.children(id).iter().collect();
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.children(next.as_str()));
        }
        out
    }

    pub fn depth(&self, id: &str) -> Option<usize> {
        self.get(id).map(ContractNode::depth)
    }

    /// Nodes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ContractNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Iterator returned by [`ContractHierarchy::ancestors`].
pub struct Ancestors<'a> {
    hierarchy: &'a ContractHierarchy,
    next: Option<&'a ContractId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ContractNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.hierarchy.get(self.next?.as_str())?;
        self.next = node.parent();
        Some(node)
    }
}

// =============================================================================
// HierarchyBuilder
// =============================================================================

/// Build phase of a [`HierarchyBuilder`]. Transitions are one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    /// Accepting declarations.
    Open,
    /// Validation in progress.
    Building,
    /// Built; no further changes.
    Frozen,
}

/// Collects contract declarations and builds the [`ContractHierarchy`].
#[derive(Debug)]
pub struct HierarchyBuilder {
    declarations: Vec<ContractDeclaration>,
    phase: BuildPhase,
}

impl Default for HierarchyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            declarations: Vec::new(),
            phase: BuildPhase::Open,
        }
    }

    /// Creates a builder holding every contract of a frozen registry.
    pub fn from_registry(registry: &MetadataRegistry) -> CoreResult<Self> {
        if !registry.is_frozen() {
            return Err(StateError::RegistryNotFrozen { what: WHAT }.into());
        }
        Ok(Self {
            declarations: registry.contracts().to_vec(),
            phase: BuildPhase::Open,
        })
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Adds a contract declaration.
    ///
    /// Fails with [`StateError::ImmutableTree`] once the hierarchy is built.
    pub fn insert(&mut self, declaration: ContractDeclaration) -> CoreResult<&mut Self> {
        if self.phase != BuildPhase::Open {
            return Err(StateError::ImmutableTree { what: WHAT }.into());
        }
        self.declarations.push(declaration);
        Ok(self)
    }

    /// Validates the declarations and builds the hierarchy.
    ///
    /// On error the builder returns to [`BuildPhase::Open`]; on success it is
    /// frozen and further calls fail with [`StateError::ImmutableTree`].
    pub fn build(&mut self) -> CoreResult<Arc<ContractHierarchy>> {
        if self.phase != BuildPhase::Open {
            return Err(StateError::ImmutableTree { what: WHAT }.into());
        }

        self.phase = BuildPhase::Building;
        match build_hierarchy(&self.declarations) {
            Ok(hierarchy) => {
                self.phase = BuildPhase::Frozen;
                info!(
                    contracts = hierarchy.len(),
                    roots = hierarchy.roots().len(),
                    "Contract hierarchy built"
                );
                Ok(Arc::new(hierarchy))
            }
            Err(e) => {
                self.phase = BuildPhase::Open;
                Err(e.into())
            }
        }
    }
}

fn build_hierarchy(
    declarations: &[ContractDeclaration],
) -> Result<ContractHierarchy, DeclarationError> {
    let mut by_id: HashMap<&ContractId, &ContractDeclaration> = HashMap::new();
    for decl in declarations {
        if by_id.insert(&decl.id, decl).is_some() {
            return Err(DeclarationError::DuplicateDeclaration {
                id: decl.id.to_string(),
            });
        }
    }

    for decl in declarations {
        let Some(parent_id) = &decl.parent else {
            continue;
        };
        let parent = by_id
            .get(parent_id)
            .ok_or_else(|| DeclarationError::UnknownParent {
                contract: decl.id.clone(),
                parent: parent_id.clone(),
            })?;
        if parent.kind != decl.kind {
            return Err(DeclarationError::ContractKindMismatch {
                contract: decl.id.clone(),
                kind: decl.kind,
                parent: parent.id.clone(),
                parent_kind: parent.kind,
            });
        }
    }

    check_cycles(declarations, &by_id)?;

    let mut nodes: HashMap<ContractId, ContractNode> = declarations
        .iter()
        .map(|d| {
            let node = ContractNode {
                id: d.id.clone(),
                kind: d.kind,
                parent: d.parent.clone(),
                children: Vec::new(),
                depth: 0,
            };
            (d.id.clone(), node)
        })
        .collect();

    let mut roots = Vec::new();
    for decl in declarations {
        match &decl.parent {
            Some(parent) => {
                if let Some(node) = nodes.get_mut(parent) {
                    node.children.push(decl.id.clone());
                }
            }
            None => roots.push(decl.id.clone()),
        }
    }

    let mut queue: VecDeque<(ContractId, usize)> = roots.iter().map(|r| (r.clone(), 0)).collect();
    while let Some((id, depth)) = queue.pop_front() {
        if let Some(node) = nodes.get_mut(&id) {
            node.depth = depth;
            queue.extend(node.children.iter().map(|c| (c.clone(), depth + 1)));
        }
    }

    Ok(ContractHierarchy {
        nodes,
        order: declarations.iter().map(|d| d.id.clone()).collect(),
        roots,
    })
}

/// Walks each parent chain with a visiting set.
///
/// Every node has at most one parent, so the depth-first walk from a node is
/// its parent chain.  Reaching a node already on the current path closes a
/// cycle; reaching a finished node ends the walk.
fn check_cycles(
    declarations: &[ContractDeclaration],
    by_id: &HashMap<&ContractId, &ContractDeclaration>,
) -> Result<(), DeclarationError> {
    let mut done: HashSet<&ContractId> = HashSet::new();

    for decl in declarations {
        let mut path: Vec<&ContractId> = Vec::new();
        let mut visiting: HashSet<&ContractId> = HashSet::new();
        let mut current = Some(&decl.id);

        while let Some(id) = current {
            if done.contains(id) {
                break;
            }
            if !visiting.insert(id) {
                let start = path.iter().position(|p| *p == id).unwrap_or_default();
                let cycle: Vec<ContractId> = path[start..].iter().map(|p| (*p).clone()).collect();
                debug!(?cycle, "Cycle detected in contract hierarchy");
                return Err(DeclarationError::CyclicHierarchy { cycle });
            }
            path.push(id);
            current = by_id.get(id).and_then(|d| d.parent.as_ref());
        }

        done.extend(path);
    }
    Ok(())
}
