//! Genre hierarchy parsing and canonical-map construction
//!
//! The hierarchy file is a YAML forest: top-level entries are either bare
//! strings (leaf genres) or single-key mappings whose value is again a list
//! of entries. Each genre canonicalizes to the nearest ancestor whose
//! subtree meets the roll-up threshold; a root always canonicalizes to
//! itself. With threshold 0 every genre collapses to its immediate parent.

use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenreMapError {
    #[error("failed to read genre file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error in {path:?} at line {line}: {source}")]
    Yaml {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("genre file {path:?} must be a list of top-level genres")]
    NotAList { path: PathBuf },
}

/// Canonical lookup: lowercase genre name -> lowercase canonical name.
/// Unknown names canonicalize to themselves.
#[derive(Debug, Clone, Default)]
pub struct GenreMap {
    map: HashMap<String, String>,
}

impl GenreMap {
    /// Build a map from explicit pairs, mainly for tests.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into().to_lowercase(), v.into().to_lowercase()))
            .collect();
        Self { map }
    }

    /// Canonical form of `name`, lowercased. Unknown genres map to
    /// themselves.
    pub fn canonical_of(&self, name: &str) -> String {
        let key = name.trim().to_lowercase();
        self.map.get(&key).cloned().unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

struct Node {
    parent: Option<String>,
    children: Vec<String>,
    descendants: usize,
}

/// Parse a genre hierarchy file and build its canonical map.
pub fn load_genre_map(path: &Path, roll_up_threshold: usize) -> Result<GenreMap, GenreMapError> {
    let text = std::fs::read_to_string(path).map_err(|source| GenreMapError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let doc: Value = serde_yaml::from_str(&text).map_err(|source| GenreMapError::Yaml {
        path: path.to_path_buf(),
        line: source.location().map(|l| l.line()).unwrap_or(0),
        source,
    })?;

    let Value::Sequence(roots) = doc else {
        return Err(GenreMapError::NotAList {
            path: path.to_path_buf(),
        });
    };

    Ok(build_map(&roots, roll_up_threshold))
}

fn build_map(roots: &[Value], roll_up_threshold: usize) -> GenreMap {
    // Discovery order is parents-before-children, which makes the
    // descendant count a single reverse pass.
    let mut nodes: HashMap<String, Node> = HashMap::new();
    let mut discovery: Vec<String> = Vec::new();

    for root in roots {
        walk(root, None, &mut nodes, &mut discovery);
    }

    for name in discovery.iter().rev() {
        let children = nodes[name].children.clone();
        let descendants = 1 + children
            .iter()
            .map(|c| nodes[c].descendants)
            .sum::<usize>();
        if let Some(node) = nodes.get_mut(name) {
            node.descendants = descendants;
        }
    }

    let mut map = HashMap::new();
    for name in &discovery {
        map.insert(name.clone(), canonical_for(name, &nodes, roll_up_threshold));
    }

    GenreMap { map }
}

fn walk(
    value: &Value,
    parent: Option<&str>,
    nodes: &mut HashMap<String, Node>,
    discovery: &mut Vec<String>,
) {
    match value {
        Value::String(name) => {
            register(name, parent, nodes, discovery);
        }
        Value::Mapping(mapping) => {
            for (key, children) in mapping {
                let Some(name) = key.as_str() else { continue };
                let name = register(name, parent, nodes, discovery);
                if let Value::Sequence(children) = children {
                    for child in children {
                        walk(child, Some(&name), nodes, discovery);
                    }
                }
            }
        }
        // Numbers and the like still name a genre.
        Value::Number(n) => {
            register(&n.to_string(), parent, nodes, discovery);
        }
        _ => {}
    }
}

fn register(
    name: &str,
    parent: Option<&str>,
    nodes: &mut HashMap<String, Node>,
    discovery: &mut Vec<String>,
) -> String {
    let name = name.trim().to_lowercase();
    if !nodes.contains_key(&name) {
        nodes.insert(
            name.clone(),
            Node {
                parent: parent.map(str::to_owned),
                children: Vec::new(),
                descendants: 0,
            },
        );
        discovery.push(name.clone());
    }
    if let Some(parent) = parent {
        if let Some(parent_node) = nodes.get_mut(parent) {
            if !parent_node.children.contains(&name) {
                parent_node.children.push(name.clone());
            }
        }
    }
    name
}

fn canonical_for(name: &str, nodes: &HashMap<String, Node>, threshold: usize) -> String {
    let Some(parent) = nodes[name].parent.as_deref() else {
        // Top-level genres are their own canonical form.
        return name.to_owned();
    };

    // Nearest ancestor whose subtree meets the threshold wins.
    let mut ancestor = Some(parent);
    while let Some(current) = ancestor {
        let node = &nodes[current];
        if node.descendants >= threshold {
            return current.to_owned();
        }
        ancestor = node.parent.as_deref();
    }

    // No ancestor is big enough: fall back to the top-level ancestor.
    let mut top = name;
    while let Some(parent) = nodes[top].parent.as_deref() {
        top = parent;
    }
    top.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from_yaml(yaml: &str, threshold: usize) -> GenreMap {
        let doc: Value = serde_yaml::from_str(yaml).unwrap();
        let Value::Sequence(roots) = doc else {
            panic!("test fixture must be a sequence")
        };
        build_map(&roots, threshold)
    }

    const METAL_AND_POP: &str = "
- metal:
    - heavy metal
    - death metal
- pop
";

    #[test]
    fn threshold_zero_collapses_to_the_immediate_parent() {
        let map = map_from_yaml(METAL_AND_POP, 0);
        assert_eq!(map.canonical_of("heavy metal"), "metal");
        assert_eq!(map.canonical_of("death metal"), "metal");
        assert_eq!(map.canonical_of("metal"), "metal");
        assert_eq!(map.canonical_of("pop"), "pop");
    }

    #[test]
    fn unknown_genres_map_to_themselves_case_folded() {
        let map = map_from_yaml(METAL_AND_POP, 0);
        assert_eq!(map.canonical_of("Shoegaze"), "shoegaze");
        assert_eq!(map.canonical_of("  POP  "), "pop");
    }

    #[test]
    fn small_subtrees_roll_up_past_their_parent() {
        let yaml = "
- rock:
    - alternative rock:
        - britpop
        - grunge
        - post-rock
    - surf:
        - surf punk
";
        // alternative rock has 4 descendants, surf only 2: with threshold 3
        // surf punk rolls past surf up to rock.
        let map = map_from_yaml(yaml, 3);
        assert_eq!(map.canonical_of("britpop"), "alternative rock");
        assert_eq!(map.canonical_of("surf punk"), "rock");
        assert_eq!(map.canonical_of("surf"), "rock");
    }

    #[test]
    fn roots_stay_canonical_even_when_small() {
        let map = map_from_yaml(METAL_AND_POP, 100);
        assert_eq!(map.canonical_of("metal"), "metal");
        // No ancestor meets the threshold: top-level ancestor wins.
        assert_eq!(map.canonical_of("heavy metal"), "metal");
    }

    #[test]
    fn load_reports_yaml_errors_with_a_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("genres.yaml");
        std::fs::write(&path, "- rock:\n  broken: [unclosed\n").unwrap();

        match load_genre_map(&path, 0) {
            Err(GenreMapError::Yaml { line, .. }) => assert!(line > 0),
            other => panic!("expected YAML error, got {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn load_rejects_non_list_documents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("genres.yaml");
        std::fs::write(&path, "rock: pop\n").unwrap();

        assert!(matches!(
            load_genre_map(&path, 0),
            Err(GenreMapError::NotAList { .. })
        ));
    }
}
