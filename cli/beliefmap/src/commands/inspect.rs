//! Read-only views of the map: `show`, `list`, `status` and `layout`.

use beliefmap_core::{layout_with, BeliefNode, BeliefStatus, GraphState};
use serde::Serialize;

use super::{clip, resolve_id, short_id, Workspace};

/// `beliefmap show <id>`: full details of one belief.
pub fn show(ws: &Workspace, id: &str) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let state = store.state();
    let id = resolve_id(state, id)?;
    let Some(node) = state.node(id) else {
        anyhow::bail!("no belief {id}");
    };

    println!("Belief: {}", node.text);
    println!("  ID:         {}", node.id);
    println!("  Status:     {}", node.status);
    println!("  Confidence: {}", node.confidence);
    if let Some(depth) = state.depth(id) {
        println!("  Depth:      {depth}");
    }
    if let Some(ref notes) = node.notes {
        println!("  Notes:      {notes}");
    }
    if let Some(ref tldr) = node.tldr {
        println!("  Summary:    {tldr}");
    }
    if let Some(ref explanation) = node.explanation {
        println!("  Explanation: {explanation}");
    }
    println!("  Created:    {}", node.created_at.to_rfc3339());

    let chain = state.ancestor_chain(id);
    if !chain.is_empty() {
        println!("\n  Ancestors (core first):");
        for a in chain {
            println!("    - {} [{}] {}", short_id(a.id), a.status, clip(&a.text, 60));
        }
    }

    let children = state.children(id);
    if !children.is_empty() {
        println!("\n  Children:");
        for c in children {
            println!("    - {} [{}] {}", short_id(c.id), c.status, clip(&c.text, 60));
        }
    }

    if state.blocked_by() == Some(id) {
        println!("\n  This belief is blocking growth.");
    }
    Ok(())
}

/// `beliefmap list`: the tree, indented by depth.
pub fn list(ws: &Workspace, status: Option<BeliefStatus>) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let state = store.state();

    let rows = tree_rows(state);
    let rows: Vec<_> = rows
        .into_iter()
        .filter(|(_, n)| status.map_or(true, |s| n.status == s))
        .collect();
    if rows.is_empty() {
        println!("No beliefs found.");
        return Ok(());
    }

    println!("{:<8}  {:<13}  {:>4}  BELIEF", "ID", "STATUS", "CONF");
    println!("{}", "-".repeat(72));
    for (depth, node) in rows {
        let marker = if state.active_upstream_id() == Some(node.id) && !node.is_core {
            "*"
        } else {
            " "
        };
        println!(
            "{:<8}  {:<13}  {:>4}  {}{marker}{}",
            short_id(node.id),
            node.status.to_string(),
            node.confidence,
            "  ".repeat(depth),
            clip(&node.text, 60)
        );
    }
    Ok(())
}

/// `beliefmap status`: counts and whether the map can grow.
pub fn status(ws: &Workspace) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let state = store.state();
    let summary = state.status_summary();

    println!("Belief map ({}):", state.mode());
    println!("  Coherent:       {:>3}", summary.coherent);
    println!("  Pending:        {:>3}", summary.pending);
    println!("  Contradictory:  {:>3}", summary.contradictory);
    println!("  Harmful:        {:>3}", summary.harmful);
    println!("  Incoherent:     {:>3}", summary.incoherent);
    println!("  Protected:      {:>3}", summary.protected);
    println!("  ──────────────────");
    println!("  Total:          {:>3}", summary.total);
    println!();

    match state.blocker() {
        Some(b) => println!("Blocked by {} [{}] {}", short_id(b.id), b.status, clip(&b.text, 48)),
        None => println!("Growth is open."),
    }
    if let Some(active) = state.active_upstream_id().and_then(|id| state.node(id)) {
        println!("New beliefs attach to {} {}", short_id(active.id), clip(&active.text, 48));
    }
    if state.mode() == beliefmap_core::Mode::Sandbox {
        println!("Undo steps available: {}", state.history().len());
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacedBelief<'a> {
    id: String,
    text: &'a str,
    status: BeliefStatus,
    color: &'static str,
    x: f64,
    y: f64,
    depth: usize,
    radius: f64,
    theta: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacedEdge {
    source: String,
    target: String,
    kind: beliefmap_core::EdgeKind,
    color: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutReport<'a> {
    width: f64,
    height: f64,
    r0: f64,
    r_step: f64,
    nodes: Vec<PlacedBelief<'a>>,
    edges: Vec<PlacedEdge>,
}

/// `beliefmap layout`: ring coordinates for every belief.
pub fn layout(
    ws: &Workspace,
    width: Option<f64>,
    height: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let store = ws.open_initialized()?;
    let state = store.state();
    let width = width.unwrap_or(ws.manifest.layout.width);
    let height = height.unwrap_or(ws.manifest.layout.height);
    let placed = layout_with(state, width, height, &ws.manifest.layout.geometry())?;

    let mut nodes: Vec<PlacedBelief> = tree_rows(state)
        .into_iter()
        .filter_map(|(_, n)| {
            let p = placed.get(n.id)?;
            Some(PlacedBelief {
                id: n.id.to_string(),
                text: &n.text,
                status: n.status,
                color: n.status.color(),
                x: p.x,
                y: p.y,
                depth: p.depth,
                radius: p.radius,
                theta: p.theta,
            })
        })
        .collect();
    nodes.sort_by(|a, b| a.depth.cmp(&b.depth).then(a.theta.total_cmp(&b.theta)));

    let mut edges: Vec<PlacedEdge> = state
        .edges()
        .map(|e| {
            let kind = state.edge_kind(e);
            PlacedEdge {
                source: e.source_id.to_string(),
                target: e.target_id.to_string(),
                kind,
                color: kind.color(),
            }
        })
        .collect();
    edges.sort_by(|a, b| a.target.cmp(&b.target));

    if json {
        let report = LayoutReport {
            width,
            height,
            r0: placed.r0,
            r_step: placed.r_step,
            nodes,
            edges,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Layout {width}x{height}: r0 = {:.1}, ring step = {:.1}",
        placed.r0, placed.r_step
    );
    println!(
        "{:<8}  {:>5}  {:>7}  {:>7}  {:>8}  {:>8}  {:<13}  BELIEF",
        "ID", "DEPTH", "RADIUS", "THETA", "X", "Y", "STATUS"
    );
    for n in &nodes {
        println!(
            "{:<8}  {:>5}  {:>7.1}  {:>7.3}  {:>8.1}  {:>8.1}  {:<13}  {}",
            &n.id[..8],
            n.depth,
            n.radius,
            n.theta,
            n.x,
            n.y,
            n.status.to_string(),
            clip(n.text, 40)
        );
    }
    Ok(())
}

/// Beliefs in depth-first order from the core, with their depth.
fn tree_rows(state: &GraphState) -> Vec<(usize, &BeliefNode)> {
    let mut rows = Vec::with_capacity(state.node_count());
    let Some(core) = state.core() else {
        return rows;
    };
    let mut stack = vec![(0usize, core)];
    while let Some((depth, node)) = stack.pop() {
        rows.push((depth, node));
        if rows.len() > state.node_count() {
            break;
        }
        for child in state.children(node.id).into_iter().rev() {
            stack.push((depth + 1, child));
        }
    }
    rows
}
