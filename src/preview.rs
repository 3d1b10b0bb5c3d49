use crate::manifest::Manifest;
use colored::Colorize;
use std::fmt::Write;
use std::path::{Component, Path};

/// Represents a node in the tree (either file or directory).
#[derive(Debug)]
struct TreeNode {
    name: String,
    children: Vec<TreeNode>,
    is_file: bool,
}
impl TreeNode {
    fn new(name: String, is_file: bool) -> Self {
        Self {
            name,
            children: Vec::new(),
            is_file,
        }
    }

    fn child_dir(&mut self, name: &str) -> &mut TreeNode {
        let index = match self
            .children
            .iter()
            .position(|child| !child.is_file && child.name == name)
        {
            Some(index) => index,
            None => {
                self.children.push(TreeNode::new(name.to_string(), false));
                self.children.len() - 1
            }
        };

        &mut self.children[index]
    }
}

/// Build the directory tree from the manifest, synthesizing every intermediate directory.
fn build_tree(manifest: &Manifest, destination: &Path) -> TreeNode {
    let root_name = destination
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string());

    let mut root = TreeNode::new(root_name, false);

    for spec in manifest {
        let segments: Vec<String> = spec
            .relative_path()
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();

        let Some((file_name, directories)) = segments.split_last() else {
            continue;
        };

        let mut node = &mut root;
        for directory in directories {
            node = node.child_dir(directory);
        }

        // a later entry for the same path overwrites the earlier one on disk
        if !node
            .children
            .iter()
            .any(|child| child.is_file && &child.name == file_name)
        {
            node.children.push(TreeNode::new(file_name.clone(), true));
        }
    }

    root
}

fn render_node(node: &TreeNode, prefix: &str, is_last: bool, out: &mut String) {
    let connector = if is_last { "└── " } else { "├── " };
    let name = if node.is_file {
        node.name.green()
    } else {
        node.name.blue()
    };
    let _ = writeln!(out, "{}{}{}", prefix.yellow(), connector.yellow(), name);

    let child_prefix = if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let len = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        render_node(child, &child_prefix, i == len - 1, out);
    }
}

/// Renders `manifest` as an ASCII tree rooted at `destination`, directories in blue and files
/// in green, entries in manifest order.
pub fn render_tree(manifest: &Manifest, destination: &Path) -> String {
    let tree_root = build_tree(manifest, destination);
    let mut out = String::new();

    render_node(&tree_root, "", true, &mut out);

    out
}

pub fn preview_as_tree(manifest: &Manifest, destination: &Path) {
    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    let fancy_prompt = format!(
        "{} {}\n",
        "┌─".bold().bright_blue(),
        "Preview".bold().bright_blue(),
    );

    println!("{}", fancy_prompt);

    print!("{}", render_tree(manifest, destination));

    let fancy_prompt = format!(
        "\n{} {}",
        "└─".bold().bright_blue(),
        "Dry run: nothing was written".bright_green()
    );

    println!("{}", fancy_prompt);
}
