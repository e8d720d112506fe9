use std::fmt::Write as _;
use std::path::Path;

use super::OverlapGraph;
use crate::error::{Error, Result};

impl OverlapGraph {
    /// Renders the graph in Graphviz `dot` syntax, nodes and edges in ascending order.
    pub fn to_dot(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "graph {} {{", sanitize(name));
        for node in &self.nodes {
            let _ = writeln!(out, "  n{} [label=\"{}\"];", node, node);
        }
        for edge in &self.edges {
            let _ = writeln!(out, "  n{} -- n{};", edge.lo(), edge.hi());
        }
        out.push_str("}\n");
        out
    }

    /// Writes `<dir>/<name>.dot`.
    pub fn write_dot(&self, dir: &Path, name: &str) -> Result<()> {
        let path = dir.join(format!("{}.dot", name));
        std::fs::write(&path, self.to_dot(name)).map_err(|source| Error::WriteFile {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Wrote graph snapshot");
        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
