//! Plain-text views of walk and search results

use procwalk_core::{Chain, Edges, ProcessInstance, ResourceKey};
use std::collections::HashSet;

/// One instance per line: key, tenant, process, version, state, dates,
/// parent and incident flag.
pub fn standard_line(pi: &ProcessInstance) -> String {
    let version_tag = pi
        .process_version_tag
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!("/{t}"))
        .unwrap_or_default();
    let end = pi
        .end_date
        .as_deref()
        .filter(|e| !e.is_empty())
        .map(|e| format!(" e:{e}"))
        .unwrap_or_default();
    let parent = match pi.parent() {
        Some(p) => format!(" p:{p}"),
        None => " p:<root>".to_string(),
    };
    format!(
        "{:<16} {} {} v{}{} {} s:{}{}{} i:{}",
        pi.key.get(),
        pi.tenant_id,
        pi.bpmn_process_id,
        pi.process_version,
        version_tag,
        pi.state,
        pi.start_date.as_deref().unwrap_or_default(),
        end,
        parent,
        pi.incident
    )
}

fn short_label(pi: &ProcessInstance) -> String {
    let id = if pi.bpmn_process_id.is_empty() {
        "undefined"
    } else {
        &pi.bpmn_process_id
    };
    format!("{} ({id})", pi.key)
}

/// Label every key of `path`; keys absent from the chain print bare.
fn join(path: &[ResourceKey], chain: &Chain, label: fn(&ProcessInstance) -> String, sep: &str) -> String {
    path.iter()
        .map(|k| chain.get(k).map(label).unwrap_or_else(|| k.to_string()))
        .collect::<Vec<_>>()
        .join(sep)
}

pub fn standard_lines(path: &[ResourceKey], chain: &Chain) -> String {
    join(path, chain, standard_line, "\n")
}

pub fn keys_only(path: &[ResourceKey], chain: &Chain) -> String {
    join(path, chain, |pi| pi.key.to_string(), "\n")
}

/// `100 (child) → 50 (middle) → 10 (root)`
pub fn pretty_line(path: &[ResourceKey], chain: &Chain) -> String {
    join(path, chain, short_label, " → ")
}

/// Indented tree below `root`, children in edge order. A key listed by
/// several parents is drawn under each but only expanded once.
pub fn tree(root: ResourceKey, edges: &Edges, chain: &Chain) -> String {
    let mut out = String::new();
    let mut seen = HashSet::new();
    let label = |k: ResourceKey| chain.get(&k).map(short_label).unwrap_or_else(|| k.to_string());

    out.push_str(&label(root));
    out.push('\n');
    seen.insert(root);

    // (key, prefix for its children, connector drawn before it)
    let mut stack: Vec<(ResourceKey, String, &'static str)> = Vec::new();
    push_children(&mut stack, root, "", edges);
    while let Some((key, prefix, connector)) = stack.pop() {
        out.push_str(&prefix);
        out.push_str(connector);
        out.push_str(&label(key));
        out.push('\n');
        if !seen.insert(key) {
            continue;
        }
        let child_prefix = if connector == LAST {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        push_children(&mut stack, key, &child_prefix, edges);
    }
    out.truncate(out.trim_end().len());
    out
}

const BRANCH: &str = "├── ";
const LAST: &str = "└── ";

fn push_children(
    stack: &mut Vec<(ResourceKey, String, &'static str)>,
    parent: ResourceKey,
    prefix: &str,
    edges: &Edges,
) {
    let Some(children) = edges.get(&parent) else { return };
    for (i, child) in children.iter().enumerate().rev() {
        let connector = if i + 1 == children.len() { LAST } else { BRANCH };
        stack.push((*child, prefix.to_string(), connector));
    }
}
