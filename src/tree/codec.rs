//! Tree persistence.
//!
//! Two record shapes are supported:
//!
//! - [`NodeRecord`]: nested, children embedded in their parent. This is the
//!   file format and the input of the offline extraction tooling.
//! - [`FlatTree`]: one entry per node, linked by ids. Useful for tabular
//!   stores; validated for dangling links, cycles and unreachable nodes.
//!
//! Parent links are never serialized; decoding rebuilds them.

use crate::search::BeamConfig;
use crate::tree::node::{root_trajectory, step_line, Node, NodeId, ThoughtTree};
use crate::{Result, ThoughtBeamError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// Version written into every [`TreeFile`]
pub const TREE_FORMAT_VERSION: u32 = 1;

/// Nested record of a node and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Arena position; preserves creation order across a round trip
    pub id: usize,
    pub content: String,
    pub trajectory: String,
    pub depth: usize,
    pub value: Option<f64>,
    pub visits: usize,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

/// Flat record of a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatNode {
    pub id: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub content: String,
    pub trajectory: String,
    pub depth: usize,
    pub value: Option<f64>,
    pub visits: usize,
}

/// Flat, id-linked representation of a whole tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatTree {
    pub root: usize,
    pub nodes: Vec<FlatNode>,
}

/// Persisted search artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeFile {
    pub format_version: u32,
    pub tree_id: Uuid,
    pub saved_at: DateTime<Utc>,
    /// Parameters the tree was searched with, when known
    #[serde(default)]
    pub config: Option<BeamConfig>,
    pub root: NodeRecord,
}

impl TreeFile {
    pub fn new(tree: &ThoughtTree, config: Option<BeamConfig>) -> Self {
        TreeFile {
            format_version: TREE_FORMAT_VERSION,
            tree_id: Uuid::new_v4(),
            saved_at: Utc::now(),
            config,
            root: encode(tree),
        }
    }

    pub fn into_tree(self) -> Result<ThoughtTree> {
        if self.format_version != TREE_FORMAT_VERSION {
            return Err(ThoughtBeamError::MalformedTree(format!(
                "unsupported format version {} (expected {})",
                self.format_version, TREE_FORMAT_VERSION
            )));
        }
        decode(&self.root)
    }
}

// ============================================================================
// NESTED RECORDS
// ============================================================================

impl ThoughtTree {
    /// Nested record of the whole tree, parent links omitted.
    pub fn to_record(&self) -> NodeRecord {
        // a child follows its parent in preorder, so the reversed walk
        // finishes every subtree before the node that owns it
        let mut built: Vec<Option<NodeRecord>> = vec![None; self.len()];
        for id in self.preorder().into_iter().skip(1).rev() {
            let record = self.assemble_record(id, &mut built);
            built[id.index()] = Some(record);
        }
        self.assemble_record(self.root(), &mut built)
    }

    fn assemble_record(&self, id: NodeId, built: &mut [Option<NodeRecord>]) -> NodeRecord {
        let node = self.node(id);
        NodeRecord {
            id: id.index(),
            content: node.content.clone(),
            trajectory: node.trajectory.clone(),
            depth: node.depth,
            value: node.value,
            visits: node.visits,
            children: node
                .children
                .iter()
                .filter_map(|&child| built[child.index()].take())
                .collect(),
        }
    }

    /// Rebuilds a tree from a nested record, restoring parent links.
    pub fn from_record(record: &NodeRecord) -> Result<ThoughtTree> {
        if record.id != NodeId::ROOT.index() {
            return Err(malformed(format!("root id must be 0, got {}", record.id)));
        }
        let total = count_records(record);
        let mut slots: Vec<Option<Node>> = vec![None; total];
        let mut stack: Vec<(&NodeRecord, Option<NodeId>)> = vec![(record, None)];
        while let Some((record, parent)) = stack.pop() {
            claim_slot(&slots, record.id)?;
            check_links(
                record.id,
                record.depth,
                &record.content,
                &record.trajectory,
                placed_parent(&slots, parent, record.id)?,
            )?;

            let id = NodeId(record.id);
            for child in record.children.iter().rev() {
                stack.push((child, Some(id)));
            }
            slots[record.id] = Some(Node {
                content: record.content.clone(),
                trajectory: record.trajectory.clone(),
                depth: record.depth,
                value: record.value,
                visits: record.visits,
                parent,
                children: record.children.iter().map(|c| NodeId(c.id)).collect(),
            });
        }

        let nodes = slots.into_iter().flatten().collect::<Vec<_>>();
        if nodes.len() != total {
            return Err(malformed("node ids do not cover the whole tree"));
        }
        Ok(ThoughtTree::from_nodes(nodes))
    }
}

pub fn encode(tree: &ThoughtTree) -> NodeRecord {
    tree.to_record()
}

pub fn decode(record: &NodeRecord) -> Result<ThoughtTree> {
    ThoughtTree::from_record(record)
}

fn count_records(record: &NodeRecord) -> usize {
    let mut count = 0;
    let mut stack = vec![record];
    while let Some(record) = stack.pop() {
        count += 1;
        stack.extend(&record.children);
    }
    count
}

// ============================================================================
// FLAT RECORDS
// ============================================================================

pub fn encode_flat(tree: &ThoughtTree) -> FlatTree {
    FlatTree {
        root: tree.root().index(),
        nodes: tree
            .iter()
            .map(|(id, node)| FlatNode {
                id: id.index(),
                parent: node.parent.map(NodeId::index),
                children: node.children.iter().map(|c| c.index()).collect(),
                content: node.content.clone(),
                trajectory: node.trajectory.clone(),
                depth: node.depth,
                value: node.value,
                visits: node.visits,
            })
            .collect(),
    }
}

/// Rebuilds a tree from flat records.
///
/// Node ids may appear in any order but must be exactly `0..len`, with the
/// root at 0.
pub fn decode_flat(flat: &FlatTree) -> Result<ThoughtTree> {
    let by_id: HashMap<usize, &FlatNode> = flat.nodes.iter().map(|n| (n.id, n)).collect();
    if by_id.len() != flat.nodes.len() {
        return Err(malformed("duplicate node ids in flat tree"));
    }
    if flat.root != NodeId::ROOT.index() {
        return Err(malformed(format!("root id must be 0, got {}", flat.root)));
    }
    let root = by_id
        .get(&flat.root)
        .ok_or_else(|| malformed(format!("root id {} has no record", flat.root)))?;
    if root.parent.is_some() {
        return Err(malformed("root record has a parent"));
    }

    let mut slots: Vec<Option<Node>> = vec![None; flat.nodes.len()];
    let mut stack = vec![(*root, None::<NodeId>)];
    while let Some((record, parent)) = stack.pop() {
        if slots.get(record.id).is_some_and(Option::is_some) {
            return Err(malformed(format!("node {} is reachable twice", record.id)));
        }
        claim_slot(&slots, record.id)?;
        check_links(
            record.id,
            record.depth,
            &record.content,
            &record.trajectory,
            placed_parent(&slots, parent, record.id)?,
        )?;
        if record.parent != parent.map(NodeId::index) {
            return Err(malformed(format!(
                "node {} claims parent {:?} but is listed under {:?}",
                record.id,
                record.parent,
                parent.map(NodeId::index)
            )));
        }

        let id = NodeId(record.id);
        let mut children = Vec::with_capacity(record.children.len());
        for child_id in &record.children {
            let child = by_id.get(child_id).ok_or_else(|| {
                malformed(format!("node {} references missing child {}", record.id, child_id))
            })?;
            children.push(NodeId(*child_id));
            stack.push((*child, Some(id)));
        }
        slots[record.id] = Some(Node {
            content: record.content.clone(),
            trajectory: record.trajectory.clone(),
            depth: record.depth,
            value: record.value,
            visits: record.visits,
            parent,
            children,
        });
    }

    let nodes = slots.into_iter().flatten().collect::<Vec<_>>();
    if nodes.len() != flat.nodes.len() {
        return Err(malformed(format!(
            "{} node(s) are unreachable from the root",
            flat.nodes.len() - nodes.len()
        )));
    }
    Ok(ThoughtTree::from_nodes(nodes))
}

// ============================================================================
// FILES
// ============================================================================

pub fn save_tree<P: AsRef<Path>>(
    path: P,
    tree: &ThoughtTree,
    config: Option<BeamConfig>,
) -> Result<TreeFile> {
    let file = TreeFile::new(tree, config);
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, &file)?;
    writer.flush()?;
    log::info!(
        "Saved tree {} ({} nodes) to {}",
        file.tree_id,
        tree.len(),
        path.as_ref().display()
    );
    Ok(file)
}

pub fn load_tree<P: AsRef<Path>>(path: P) -> Result<ThoughtTree> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    // nesting grows with tree depth; the stacker grows the stack to match
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    deserializer.disable_recursion_limit();
    let file = TreeFile::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    log::debug!("Loaded tree {} saved at {}", file.tree_id, file.saved_at);
    file.into_tree()
}

// ============================================================================
// VALIDATION
// ============================================================================

fn claim_slot(slots: &[Option<Node>], id: usize) -> Result<()> {
    match slots.get(id) {
        None => Err(malformed(format!(
            "node id {} is out of range for a tree of {} nodes",
            id,
            slots.len()
        ))),
        Some(Some(_)) => Err(malformed(format!("duplicate node id {}", id))),
        Some(None) => Ok(()),
    }
}

fn placed_parent(
    slots: &[Option<Node>],
    parent: Option<NodeId>,
    id: usize,
) -> Result<Option<(NodeId, &Node)>> {
    match parent {
        None => Ok(None),
        Some(pid) => match slots.get(pid.index()).and_then(Option::as_ref) {
            Some(node) => Ok(Some((pid, node))),
            None => Err(malformed(format!(
                "parent {} of node {} not yet placed",
                pid, id
            ))),
        },
    }
}

/// Depth and trajectory must be exactly what `create_child` would produce.
fn check_links(
    id: usize,
    depth: usize,
    content: &str,
    trajectory: &str,
    parent: Option<(NodeId, &Node)>,
) -> Result<()> {
    match parent {
        None => {
            if depth != 0 {
                return Err(malformed(format!(
                    "root node {} has depth {} (expected 0)",
                    id, depth
                )));
            }
            if trajectory != root_trajectory(content) {
                return Err(malformed(format!(
                    "trajectory of root node {} does not match its content",
                    id
                )));
            }
            Ok(())
        }
        Some((parent_id, parent_node)) => {
            if depth != parent_node.depth + 1 {
                return Err(malformed(format!(
                    "node {} has depth {} but its parent {} has depth {}",
                    id, depth, parent_id, parent_node.depth
                )));
            }
            let step = step_line(depth, content);
            if trajectory.len() != parent_node.trajectory.len() + step.len()
                || !trajectory.starts_with(&parent_node.trajectory)
                || !trajectory.ends_with(&step)
            {
                return Err(malformed(format!(
                    "trajectory of node {} is not its parent {} trajectory plus step {:?}",
                    id, parent_id, content
                )));
            }
            Ok(())
        }
    }
}

fn malformed(message: impl Into<String>) -> ThoughtBeamError {
    ThoughtBeamError::MalformedTree(message.into())
}
