//! # Units Command Implementation
//!
//! Lists the registered convention units in registration order with their
//! prerequisites and exclusions. `--tree` prints the prerequisite tree of
//! each unit (or of one unit) using `ptree`. `--plan` prints the order in
//! which a fresh project would apply each unit, using the version constants
//! of the project's `conventions.properties` (nothing is regenerated).
//!
//! ## Example Output
//!
//! ```text
//! frameworkWeb
//! └─ frameworkCore
//!    ├─ base
//!    └─ testSupport
//!       └─ base
//! ```

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::path::PathBuf;

use conventions::descriptor::ProjectDescriptor;
use conventions::engine::CompositionEngine;
use conventions::properties::PropertySource;
use conventions::registry::UnitRegistry;
use conventions::suggestions;
use conventions::units::builtin_registry;
use conventions::versions::Versions;

/// List registered convention units
#[derive(Args, Debug)]
pub struct UnitsArgs {
    /// Show prerequisites as a tree
    #[arg(long, conflicts_with = "plan")]
    pub tree: bool,

    /// Show the application order of each unit
    #[arg(long)]
    pub plan: bool,

    /// Project root directory, read by `--plan`
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Only show this unit
    #[arg(value_name = "UNIT")]
    pub unit: Option<String>,
}

/// Execute the `units` command.
pub fn execute(args: UnitsArgs) -> Result<()> {
    let registry = builtin_registry()?;

    let names: Vec<&str> = match args.unit.as_deref() {
        Some(name) if !registry.contains(name) => {
            return Err(suggestions::unknown_unit(name, None, &registry));
        }
        Some(name) => vec![name],
        None => registry.names(),
    };

    if args.plan {
        let source = PropertySource::for_project(&args.project_dir)
            .map_err(|e| suggestions::explain(e, &registry))?;
        let versions = Versions::from_properties(source.properties())
            .map_err(|e| suggestions::explain(e, &registry))?;
        let engine = CompositionEngine::new(&registry, &versions);
        let project = ProjectDescriptor::new("plan");
        for name in names {
            let order = engine
                .plan(&project, name)
                .map_err(|e| suggestions::explain(e, &registry))?;
            println!("{}", format_plan(name, &order));
        }
        return Ok(());
    }

    for name in names {
        if args.tree {
            let tree = build_tree_node(&registry, name, &mut Vec::new());
            print_tree(&tree).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
        } else {
            println!("{}", describe_unit(&registry, name));
        }
    }
    Ok(())
}

/// One line per unit: name, prerequisites and exclusions.
fn describe_unit(registry: &UnitRegistry, name: &str) -> String {
    let Some(unit) = registry.get(name) else {
        return name.to_string();
    };
    let mut line = unit.name().to_string();
    if !unit.prerequisites().is_empty() {
        line.push_str(&format!("  requires: {}", unit.prerequisites().join(", ")));
    }
    if !unit.excluded_units().is_empty() {
        line.push_str(&format!("  excludes: {}", unit.excluded_units().join(", ")));
    }
    line
}

fn format_plan(name: &str, order: &[&str]) -> String {
    format!("{}: {}", name, order.join(" -> "))
}

/// Build the prerequisite tree of `name`. `path` holds the units above this
/// node so a cycle shows up as a marked leaf instead of recursing forever.
fn build_tree_node(registry: &UnitRegistry, name: &str, path: &mut Vec<String>) -> TreeNode {
    if path.iter().any(|p| p == name) {
        return TreeNode {
            label: format!("{} (cycle)", name),
            children: Vec::new(),
        };
    }

    let Some(unit) = registry.get(name) else {
        return TreeNode {
            label: format!("{} (unknown)", name),
            children: Vec::new(),
        };
    };

    path.push(name.to_string());
    let children = unit
        .prerequisites()
        .iter()
        .map(|prerequisite| build_tree_node(registry, prerequisite, path))
        .collect();
    path.pop();

    TreeNode {
        label: name.to_string(),
        children,
    }
}

#[derive(Clone, Debug)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
