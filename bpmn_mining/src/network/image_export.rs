use std::{fs::File, io::Write};

use graphviz_rust::{
    cmd::Format,
    dot_generator::{attr, edge, graph, id, node, node_id, stmt},
    dot_structures::*,
    printer::{DotPrinter, PrinterContext},
};
use uuid::Uuid;

use super::network_struct::{GateKind, Network, Node, NodeType};

///
/// Export the image of a [`Network`]
///
/// Also see [`export_network_image_svg`] and [`export_network_image_png`]
///
pub fn export_network_image<P: AsRef<std::path::Path>>(
    net: &Network,
    path: P,
    format: Format,
    dpi_factor: Option<f32>,
) -> Result<(), std::io::Error> {
    let g = export_network_to_dot_graph(net, dpi_factor);

    let out = graphviz_rust::exec(g, &mut PrinterContext::default(), vec![format.into()])?;

    let mut f = File::create(path)?;
    f.write_all(&out)?;
    Ok(())
}

fn fill_color(node: &Node) -> &'static str {
    if node.is_start && node.is_end {
        "\"#4B9969:#D4001F\""
    } else if node.is_start {
        "\"#4B9969\""
    } else if node.is_end {
        "\"#D4001F\""
    } else {
        "\"white\""
    }
}

fn node_stmt(node: &Node) -> Stmt {
    let name = node.name();
    let fill_color = fill_color(node);
    match node.node_type {
        NodeType::Event => {
            let counted_label = format!("{name}: {}", node.weight);
            stmt!(node!(esc name; attr!("label", esc counted_label), attr!("gradientangle", "45"), attr!("shape","box"), attr!("fontsize",12), attr!("style","filled"), attr!("fillcolor",fill_color), attr!("width",1), attr!("height",0.5)))
        }
        NodeType::Gate { kind, .. } => {
            let symbol = match kind {
                GateKind::And => "+",
                GateKind::Xor => "×",
            };
            stmt!(node!(esc name; attr!("label", esc symbol), attr!("shape","diamond"), attr!("fontsize",16), attr!("style","filled"), attr!("fillcolor",fill_color), attr!("fixedsize",true), attr!("width",0.5), attr!("height",0.5)))
        }
        NodeType::Dummy => {
            stmt!(node!(esc name; attr!("label", esc ""), attr!("shape","point"), attr!("width",0.1)))
        }
    }
}

///
/// Export a [`Network`] to a DOT graph (used in Graphviz)
///
/// Events are drawn as boxes labelled with their count, gates as diamonds (`+` for AND,
/// `×` for XOR) and dummies as points. Start events are green, end events red.
///
/// Also see [`export_network_image`], as well as [`export_network_image_svg`] and
/// [`export_network_image_png`]
///
pub fn export_network_to_dot_graph(net: &Network, dpi_factor: Option<f32>) -> Graph {
    let nodes: Vec<Stmt> = net.nodes().map(node_stmt).collect();

    let arcs: Vec<Stmt> = net
        .edges()
        .map(|e| {
            let (from, to) = (e.from(), e.to());
            let attrs = if e.weight == 1 {
                Vec::default()
            } else {
                vec![attr!("label", (format!("{}", e.weight)))]
            };
            stmt!(edge!(node_id!(esc from) => node_id!(esc to), attrs))
        })
        .collect();

    let mut global_graph_options = vec![stmt!(attr!("rankdir", "LR"))];
    if let Some(dpi_fac) = dpi_factor {
        global_graph_options.push(stmt!(attr!("dpi", (dpi_fac * 96.0))))
    }

    graph!(strict di id!(esc Uuid::new_v4()), vec![global_graph_options, nodes, arcs].into_iter().flatten().collect())
}

///
/// Convert a DOT graph to a String containing the DOT source
///
pub fn graph_to_dot(g: &Graph) -> String {
    g.print(&mut PrinterContext::default())
}

///
/// Export the image of a [`Network`] as a SVG file
///
pub fn export_network_image_svg<P: AsRef<std::path::Path>>(
    net: &Network,
    path: P,
) -> Result<(), std::io::Error> {
    export_network_image(net, path, Format::Svg, None)
}

///
/// Export the image of a [`Network`] as a PNG file
///
pub fn export_network_image_png<P: AsRef<std::path::Path>>(
    net: &Network,
    path: P,
) -> Result<(), std::io::Error> {
    export_network_image(net, path, Format::Png, Some(2.0))
}
