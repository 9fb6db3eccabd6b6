//! Usage lines and help pages.

use serde::Serialize;

use crate::synopsis;
use crate::tree::{CommandTree, NodeId};

/// Serializable view of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub shortdesc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Rendered synopsis, for leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<NodeSummary>,
}

impl CommandTree {
    /// Synopsis line for one node: the leaf's synopsis, or `<command>` for composites.
    pub fn synopsis_line(&self, id: NodeId) -> String {
        let node = self.node(id);
        let tail = match node.leaf() {
            Some(leaf) => synopsis::render(&leaf.synopsis),
            None => "<command>".to_string(),
        };
        let path = self.full_path(id);
        if tail.is_empty() {
            path
        } else {
            format!("{path} {tail}")
        }
    }

    /// Usage lines for `id`.
    ///
    /// A leaf yields one line. A composite yields one line per child and a
    /// pointer to `help`.
    pub fn show_usage(&self, id: NodeId) -> Vec<String> {
        if self.node(id).is_leaf() {
            return vec![format!("usage: {}", self.synopsis_line(id))];
        }

        let mut lines: Vec<String> = self
            .get_subcommands(id)
            .into_iter()
            .enumerate()
            .map(|(i, child)| {
                let prefix = if i == 0 { "usage:" } else { "   or:" };
                format!("{prefix} {}", self.synopsis_line(child))
            })
            .collect();

        let root = self.node(self.root()).name();
        let path = self.path(id);
        let help_target = if path.is_empty() {
            "<command>".to_string()
        } else {
            format!("{} <command>", path.join(" "))
        };
        lines.push(String::new());
        lines.push(format!(
            "See '{root} help {help_target}' for more information on a specific command."
        ));
        lines
    }

    /// Summary of `id` and everything below it.
    pub fn summarize(&self, id: NodeId) -> NodeSummary {
        let node = self.node(id);
        NodeSummary {
            name: node.name().to_string(),
            shortdesc: node.shortdesc().to_string(),
            alias: node.alias().map(str::to_string),
            synopsis: node.leaf().map(|leaf| synopsis::render(&leaf.synopsis)),
            subcommands: self
                .get_subcommands(id)
                .into_iter()
                .map(|child| self.summarize(child))
                .collect(),
        }
    }

    /// Full help page for `id`.
    pub fn render_help(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut out = String::new();

        push_section(&mut out, "NAME", &self.full_path(id));
        if !node.shortdesc().is_empty() {
            push_section(&mut out, "DESCRIPTION", node.shortdesc());
        }
        push_section(&mut out, "SYNOPSIS", &self.synopsis_line(id));
        if let Some(alias) = node.alias() {
            push_section(&mut out, "ALIAS", alias);
        }
        if !node.longdesc().is_empty() {
            out.push_str(node.longdesc());
            out.push_str("\n\n");
        }

        let children = self.get_subcommands(id);
        if !children.is_empty() {
            let width = children
                .iter()
                .map(|child| self.node(*child).name().len())
                .max()
                .unwrap_or(0);
            out.push_str("SUBCOMMANDS\n\n");
            for child in children {
                let child = self.node(child);
                let line = format!("  {:<width$}  {}", child.name(), child.shortdesc());
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }

        out.trim_end().to_string()
    }
}

fn push_section(out: &mut String, title: &str, body: &str) {
    out.push_str(title);
    out.push_str("\n\n  ");
    out.push_str(body);
    out.push_str("\n\n");
}
