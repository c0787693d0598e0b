use std::{collections::VecDeque, fmt};

use crate::{AvlTree, NodeId};

impl<K, V> AvlTree<K, V>
where
    K: fmt::Display,
{
    /// Writes a Graphviz rendering of the tree to `w`.
    ///
    /// Each level of the tree is placed on its own rank. Nodes are labelled `key:balance`, and
    /// missing children are drawn as points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let id = match queue.pop_front() {
                    Some(Item::Node(id)) => id,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let node = &self.nodes[id];
                let key = &node.key;
                let balance = node.balance();
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{balance}\"]; ")?;

                // Leaves get no missing-child markers, which keeps the bottom row readable.
                if node.is_leaf() {
                    continue;
                }

                for child in [node.left(), node.right()] {
                    match child {
                        Some(child) => {
                            let child_key = &self.nodes[child].key;

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
