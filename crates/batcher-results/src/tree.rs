use batcher_core::errors::{BatcherError, ErrorInfo};

#[derive(Debug, Clone, PartialEq)]
enum Level {
    Branch(Vec<(String, Level)>),
    Leaf(Vec<String>),
}

impl Level {
    fn empty(depth: usize) -> Self {
        if depth == 0 {
            Level::Leaf(Vec::new())
        } else {
            Level::Branch(Vec::new())
        }
    }
}

/// Grouping-value tree whose leaves accumulate stat strings.
///
/// Every path from the root to a leaf has exactly `depth` keys. Children keep
/// first-insertion order and leaves concatenate contributions in arrival
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTree {
    depth: usize,
    root: Level,
}

impl ResultTree {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            root: Level::empty(depth),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn depth_error(&self, actual: usize) -> BatcherError {
        BatcherError::Config(
            ErrorInfo::new("results.path_depth", "path length does not match tree depth")
                .with_context("expected", self.depth.to_string())
                .with_context("actual", actual.to_string()),
        )
    }

    /// Appends `values` to the leaf at `path`, creating the path as needed.
    pub fn insert(&mut self, path: &[String], values: Vec<String>) -> Result<(), BatcherError> {
        if path.len() != self.depth {
            return Err(self.depth_error(path.len()));
        }
        let depth = self.depth;
        let mut level = &mut self.root;
        for (idx, key) in path.iter().enumerate() {
            let children = match level {
                Level::Branch(children) => children,
                Level::Leaf(_) => {
                    return Err(BatcherError::Config(
                        ErrorInfo::new("results.path_depth", "leaf reached before end of path")
                            .with_context("expected", depth.to_string())
                            .with_context("actual", idx.to_string()),
                    ))
                }
            };
            let pos = match children.iter().position(|(k, _)| k == key) {
                Some(pos) => pos,
                None => {
                    children.push((key.clone(), Level::empty(depth - idx - 1)));
                    children.len() - 1
                }
            };
            level = &mut children[pos].1;
        }
        if let Level::Leaf(acc) = level {
            acc.extend(values);
        }
        Ok(())
    }

    /// Depth-first rows: path keys followed by the leaf's values.
    ///
    /// A tree of depth zero yields its single root leaf as one row.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut prefix = Vec::new();
        collect(&self.root, &mut prefix, &mut rows);
        rows
    }
}

fn collect(level: &Level, prefix: &mut Vec<String>, rows: &mut Vec<Vec<String>>) {
    match level {
        Level::Leaf(values) => {
            let mut row = prefix.clone();
            row.extend(values.iter().cloned());
            rows.push(row);
        }
        Level::Branch(children) => {
            for (key, child) in children {
                prefix.push(key.clone());
                collect(child, prefix, rows);
                prefix.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matching_paths_share_a_leaf() {
        let mut tree = ResultTree::new(2);
        tree.insert(&keys(&["1", "a"]), keys(&["0.5"])).unwrap();
        tree.insert(&keys(&["2", "a"]), keys(&["0.7"])).unwrap();
        tree.insert(&keys(&["1", "a"]), keys(&["0.6"])).unwrap();
        assert_eq!(
            tree.rows(),
            vec![keys(&["1", "a", "0.5", "0.6"]), keys(&["2", "a", "0.7"])]
        );
    }

    #[test]
    fn wrong_path_length_is_rejected() {
        let mut tree = ResultTree::new(1);
        let err = tree.insert(&[], keys(&["1.0"])).unwrap_err();
        assert_eq!(err.info().code, "results.path_depth");
    }

    #[test]
    fn depth_zero_is_one_row() {
        let mut tree = ResultTree::new(0);
        tree.insert(&[], keys(&["1.0"])).unwrap();
        tree.insert(&[], keys(&["2.0"])).unwrap();
        assert_eq!(tree.rows(), vec![keys(&["1.0", "2.0"])]);
    }
}
