use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use crate::differ::ComparisonResult;
use crate::graph::PipelineGraph;
use crate::rendering::{PipelineComparison, PipelineRendering};

use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim, status};
use super::tables::{allow_failure_cell, create_table, names_cell, status_cell, when_cell};

/// Prints a human-readable view of one rendered pipeline to stdout.
///
/// Shows an overview (source, upstream pipeline, job and stage counts) and one
/// table row per job grouped by stage, with its legacy `dependencies` and its
/// `needs` edges. Edges pointing at jobs missing from the graph are marked.
pub fn print_rendering(rendering: &PipelineRendering) {
    println!("{}", render_rendering(rendering));
}

/// Prints the structural drift between two renderings to stdout.
pub fn print_comparison(comparison: &PipelineComparison) {
    println!("{}", render_comparison(comparison));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn add_field(output: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(output, "  {} {}", dim(label), value);
}

fn mark_dangling(graph: &PipelineGraph, names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            if graph.contains(name) {
                name.clone()
            } else {
                format!("{name} (missing)")
            }
        })
        .collect()
}

fn render_rendering(rendering: &PipelineRendering) -> String {
    let mut output = String::new();
    let graph = &rendering.job_graph;

    add_section_header(&mut output, "📊", "Pipeline");
    add_field(&mut output, "Source:", cyan(&rendering.source));
    if let Some(pipeline) = &rendering.pipeline {
        add_field(
            &mut output,
            "Pipeline:",
            format!(
                "#{} ({}) on {}",
                pipeline.id,
                status(pipeline.status),
                pipeline.ref_.as_deref().unwrap_or("unknown ref")
            ),
        );
        if let Some(url) = &pipeline.web_url {
            add_field(&mut output, "URL:", dim(url));
        }
    }
    add_field(&mut output, "Jobs:", bright_yellow(graph.len()));
    add_field(&mut output, "Stages:", bright_yellow(graph.stages().join(" → ")));
    if !rendering.variables.is_empty() {
        add_field(&mut output, "Variables:", bright_yellow(rendering.variables.len()));
    }
    add_field(
        &mut output,
        "Rendered at:",
        dim(rendering.rendered_at.format("%Y-%m-%d %H:%M UTC")),
    );
    output.push('\n');

    if graph.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No jobs found."));
        return output;
    }

    add_section_header(&mut output, "🧩", "Jobs");

    let mut table = create_table(&[
        "Stage",
        "Job",
        "Status",
        "When",
        "Allow Failure",
        "Dependencies",
        "Needs",
    ]);

    for stage in graph.stages() {
        for (name, node) in graph.iter().filter(|(_, node)| node.stage == stage) {
            table.add_row(vec![
                Cell::new(stage).fg(TableColor::Magenta),
                Cell::new(name),
                status_cell(node.status),
                when_cell(node.when),
                allow_failure_cell(node.allow_failure),
                names_cell(&mark_dangling(graph, &node.dependencies), None),
                names_cell(&mark_dangling(graph, &node.needs), None),
            ]);
        }
    }

    let _ = writeln!(output, "{table}\n");
    output
}

fn render_comparison(result: &PipelineComparison) -> String {
    let mut output = String::new();
    let comparison = &result.comparison;

    add_section_header(&mut output, "📊", "Overview");
    add_field(
        &mut output,
        "Baseline:",
        format!(
            "{} {}",
            cyan(&result.baseline.source),
            dim(format!("({} jobs)", result.baseline.job_graph.len()))
        ),
    );
    add_field(
        &mut output,
        "Candidate:",
        format!(
            "{} {}",
            cyan(&result.candidate.source),
            dim(format!("({} jobs)", result.candidate.job_graph.len()))
        ),
    );
    add_field(&mut output, "Jobs added:", bright_green(comparison.jobs_added.len()));
    add_field(&mut output, "Jobs removed:", bright_red(comparison.jobs_removed.len()));
    add_field(
        &mut output,
        "Stage changes:",
        bright_yellow(comparison.stage_changes.len()),
    );
    add_field(
        &mut output,
        "Dependency changes:",
        bright_yellow(comparison.dependency_changes.len()),
    );
    output.push('\n');

    if comparison.is_empty() {
        let _ = writeln!(output, "{}", bright_green("No structural drift detected ✓"));
    } else {
        render_changes(&mut output, comparison);
    }

    let _ = writeln!(
        output,
        "{}",
        dim("Note: only `dependencies` edges are compared; `needs` edges are not diffed.")
    );
    output
}

fn render_changes(output: &mut String, comparison: &ComparisonResult) {
    if !comparison.jobs_added.is_empty() || !comparison.jobs_removed.is_empty() {
        add_section_header(output, "📋", "Jobs");
        for name in &comparison.jobs_added {
            let _ = writeln!(output, "  {}", bright_green(format!("+ {name}")));
        }
        for name in &comparison.jobs_removed {
            let _ = writeln!(output, "  {}", bright_red(format!("- {name}")));
        }
        output.push('\n');
    }

    if !comparison.stage_changes.is_empty() {
        add_section_header(output, "🔀", "Stage Changes");
        let mut table = create_table(&["Job", "Baseline Stage", "Candidate Stage"]);
        for change in &comparison.stage_changes {
            table.add_row(vec![
                Cell::new(&change.job),
                Cell::new(&change.from).fg(TableColor::Red),
                Cell::new(&change.to).fg(TableColor::Green),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    if !comparison.dependency_changes.is_empty() {
        add_section_header(output, "🔗", "Dependency Changes");
        let mut table = create_table(&["Job", "Removed", "Added"]);
        for change in &comparison.dependency_changes {
            table.add_row(vec![
                Cell::new(&change.job),
                names_cell(&change.removed, Some(TableColor::Red)),
                names_cell(&change.added, Some(TableColor::Green)),
            ]);
        }
        let _ = writeln!(output, "{table}\n");
    }
}
