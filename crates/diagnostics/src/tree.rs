//! Diagnostic Tree
//!
//! Groups a diagnostic set for display: severity category at the root, then the
//! originating module (package targets only), then one node per message.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lintview_core::NavigationRef;
use serde::Serialize;

use crate::models::{DiagnosticRecord, Severity, Target};

/// A node of the display tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagnosticTreeNode {
    Category(CategoryNode),
    Module(ModuleNode),
    Message(MessageNode),
}

impl DiagnosticTreeNode {
    /// Display label of the node
    pub fn label(&self) -> &str {
        match self {
            DiagnosticTreeNode::Category(node) => &node.label,
            DiagnosticTreeNode::Module(node) => &node.label,
            DiagnosticTreeNode::Message(node) => &node.text,
        }
    }

    /// Navigation reference, present on message nodes only
    pub fn navigation(&self) -> Option<&NavigationRef> {
        match self {
            DiagnosticTreeNode::Message(node) => Some(&node.navigation),
            _ => None,
        }
    }
}

/// Root-level grouping by severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub severity: Severity,
    /// e.g. `Convention (3 messages)`
    pub label: String,
    /// Set when the category has no messages; the node is still shown
    pub disabled: bool,
    /// Module nodes for package targets, message nodes for file targets
    pub children: Vec<DiagnosticTreeNode>,
}

/// Messages that resolve to the same source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    /// Module path relative to the target's directory
    pub label: String,
    /// Resolved module path
    pub path: PathBuf,
    pub children: Vec<MessageNode>,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNode {
    /// `[id] line : message`, or `line : message` without a usable id
    pub text: String,
    pub navigation: NavigationRef,
}

/// Display hierarchy for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticTree {
    pub title: String,
    pub target: PathBuf,
    pub nodes: Vec<DiagnosticTreeNode>,
}

impl DiagnosticTree {
    /// All message nodes in display order
    pub fn messages(&self) -> Vec<&MessageNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            collect_messages(node, &mut out);
        }
        out
    }

    /// Category nodes in display order
    pub fn categories(&self) -> impl Iterator<Item = &CategoryNode> {
        self.nodes.iter().filter_map(|node| match node {
            DiagnosticTreeNode::Category(category) => Some(category),
            _ => None,
        })
    }
}

fn collect_messages<'a>(node: &'a DiagnosticTreeNode, out: &mut Vec<&'a MessageNode>) {
    match node {
        DiagnosticTreeNode::Category(category) => {
            for child in &category.children {
                collect_messages(child, out);
            }
        }
        DiagnosticTreeNode::Module(module) => out.extend(module.children.iter()),
        DiagnosticTreeNode::Message(message) => out.push(message),
    }
}

/// Category label with the message count, `1 message` / `N messages`.
pub fn category_label(severity: Severity, count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{} ({} message{})", severity.display_name(), count, plural)
}

/// Display text of a message node. Single-character ids carry no information
/// and are left out.
pub fn message_text(record: &DiagnosticRecord) -> String {
    if record.id.chars().count() > 1 {
        format!("[{}] {} : {}", record.id, record.line, record.message)
    } else {
        format!("{} : {}", record.line, record.message)
    }
}

fn module_label(path: &Path, directory: &Path) -> String {
    path.strip_prefix(directory)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Builds the display tree from a diagnostic set
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticTreeBuilder;

impl DiagnosticTreeBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, target: &Target, diagnostics: &[DiagnosticRecord]) -> DiagnosticTree {
        let nodes = Severity::ALL
            .iter()
            .map(|severity| {
                let messages: Vec<&DiagnosticRecord> = diagnostics
                    .iter()
                    .filter(|record| record.severity == *severity)
                    .collect();
                self.build_category(target, *severity, &messages)
            })
            .collect();

        DiagnosticTree {
            title: format!("Results for {}", target),
            target: target.path().to_path_buf(),
            nodes,
        }
    }

    fn build_category(
        &self,
        target: &Target,
        severity: Severity,
        messages: &[&DiagnosticRecord],
    ) -> DiagnosticTreeNode {
        let children = if target.is_package() {
            self.group_by_module(target, messages)
                .into_iter()
                .map(DiagnosticTreeNode::Module)
                .collect()
        } else {
            messages
                .iter()
                .map(|record| DiagnosticTreeNode::Message(message_node(record)))
                .collect()
        };

        DiagnosticTreeNode::Category(CategoryNode {
            severity,
            label: category_label(severity, messages.len()),
            disabled: messages.is_empty(),
            children,
        })
    }

    /// Module nodes in order of first appearance
    fn group_by_module(&self, target: &Target, messages: &[&DiagnosticRecord]) -> Vec<ModuleNode> {
        let mut modules: Vec<ModuleNode> = Vec::new();
        let mut index: HashMap<PathBuf, usize> = HashMap::new();

        for record in messages {
            let path = record.module_path().to_path_buf();
            let slot = match index.get(&path) {
                Some(slot) => *slot,
                None => {
                    modules.push(ModuleNode {
                        label: module_label(&path, target.directory()),
                        path: path.clone(),
                        children: Vec::new(),
                    });
                    index.insert(path, modules.len() - 1);
                    modules.len() - 1
                }
            };
            modules[slot].children.push(message_node(record));
        }

        modules
    }
}

fn message_node(record: &DiagnosticRecord) -> MessageNode {
    MessageNode {
        text: message_text(record),
        navigation: NavigationRef::new(record.module_path(), record.line),
    }
}
