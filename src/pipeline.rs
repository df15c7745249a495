//! Orchestration of the two generation modes.
//!
//! Random mode: build, explore, analyze and write each accepted sample
//! directly. Grid mode: write raw samples, partition them into (places,
//! markings) cells on disk, then re-sample uniformly per cell and emit
//! rate-variation augmentations of the drawn subset.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::{self, LuSolver};
use crate::augment::{self, VariationLimits};
use crate::builder;
use crate::config::{Config, GenerationMode};
use crate::graph::{explore, ReachabilityGraph};
use crate::grid;
use crate::net::PetriNet;
use crate::output::{self, OutputFormat, SampleRecord};
use crate::report::{self, SampleStat};
use crate::sample::Sample;

pub fn run(config: &Config) -> Result<()> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    match config.generation_mode {
        GenerationMode::Random => run_random(config, &mut rng),
        GenerationMode::Grid => run_grid(config, &mut rng),
    }
}

/// One generation attempt: build, prune, seed tokens and explore. Returns
/// `None` when the sample is rejected.
fn generate_candidate(
    config: &Config,
    attempt: usize,
    rng: &mut StdRng,
) -> Option<(PetriNet, ReachabilityGraph)> {
    let mut net = builder::generate_random_net(config.num_places, config.num_transitions, rng);
    debug!(
        "generated Petri net with {} places and {} transitions",
        net.places(),
        net.transitions()
    );
    builder::prune(&mut net, rng);
    builder::add_random_tokens(&mut net, rng);

    let graph = explore(&net, config.place_upper_bound, config.marks_upper_limit);
    if !graph.bounded || graph.num_vertices() < config.marks_lower_limit {
        info!("skipping sample {attempt}: graph is unbounded or has too few markings");
        return None;
    }
    Some((net, graph))
}

fn variation_limits(config: &Config) -> VariationLimits {
    VariationLimits {
        place_upper_bound: config.place_upper_bound,
        marks_lower_limit: config.marks_lower_limit,
        marks_upper_limit: config.marks_upper_limit,
        min_firing_rate: config.min_firing_rate,
        max_firing_rate: config.max_firing_rate,
    }
}

fn run_random(config: &Config, rng: &mut StdRng) -> Result<()> {
    let solver = LuSolver::default();
    let mut writer = output::create_writer(config.format, &config.output_file)
        .with_context(|| format!("failed to create {}", config.output_file.display()))?;
    let mut stats = Vec::new();

    for attempt in 0..config.num_samples {
        let Some((net, graph)) = generate_candidate(config, attempt, rng) else {
            continue;
        };

        let rates = augment::draw_firing_rates(
            net.transitions(),
            config.min_firing_rate,
            config.max_firing_rate,
            rng,
        );
        let analysis = match analysis::analyze(&graph, &rates, &solver) {
            Ok(analysis) => analysis,
            Err(err) => {
                info!("skipping sample {attempt}: {err}");
                continue;
            }
        };
        let sample = Sample {
            net,
            graph,
            firing_rates: rates,
            analysis,
        };

        if config.enable_transformations {
            let variants = augment::token_perturbations(
                &sample.net,
                &variation_limits(config),
                config.max_transforms_per_sample,
                rng,
                &solver,
            );
            for variant in &variants {
                writer
                    .write_sample(&SampleRecord::from_sample(variant))
                    .context("failed to write sample")?;
                stats.push(SampleStat::of(variant));
            }
        } else {
            writer
                .write_sample(&SampleRecord::from_sample(&sample))
                .context("failed to write sample")?;
            stats.push(SampleStat::of(&sample));
        }
    }
    writer.finish().context("failed to flush output")?;
    info!(
        "accepted {} of {} generation attempts",
        stats.len(),
        config.num_samples
    );

    if config.enable_statistics_report {
        let report_path = html_report_path(&config.output_file);
        report::write_report(&report_path, &report::calculate_stats(&stats))?;
    }
    Ok(())
}

fn run_grid(config: &Config, rng: &mut StdRng) -> Result<()> {
    let solver = LuSolver::default();
    let grid_dir = config.temporary_grid_location.as_path();
    fs::create_dir_all(grid_dir)
        .with_context(|| format!("failed to create {}", grid_dir.display()))?;

    let raw_path = grid_dir.join("raw_data.jsonl");
    generate_raw(config, &raw_path, rng)?;

    grid::partition_into_grid(
        grid_dir,
        config.accumulation_data,
        &raw_path,
        &config.places_grid_boundaries,
        &config.markings_grid_boundaries,
    )?;

    let records = grid::sample_and_transform(
        grid_dir,
        config.samples_per_grid,
        config.lambda_variations_per_sample,
        config.min_firing_rate,
        config.max_firing_rate,
        rng,
        &solver,
    )?;

    let mut writer = output::create_writer(config.format, &config.output_grid_location)
        .with_context(|| format!("failed to create {}", config.output_grid_location.display()))?;
    for record in &records {
        writer
            .write_sample(record)
            .context("failed to write sample")?;
    }
    writer.finish().context("failed to flush output")?;
    info!("wrote {} grid samples", records.len());
    Ok(())
}

/// Raw grid-phase records are always JSONL so the partitioner can read them
/// back line by line, independent of the dataset output format.
fn generate_raw(config: &Config, raw_path: &Path, rng: &mut StdRng) -> Result<()> {
    let mut writer = output::create_writer(OutputFormat::Jsonl, raw_path)
        .with_context(|| format!("failed to create {}", raw_path.display()))?;
    for attempt in 0..config.num_samples {
        let Some((net, graph)) = generate_candidate(config, attempt, rng) else {
            continue;
        };
        writer
            .write_sample(&SampleRecord::raw(&net, &graph))
            .context("failed to write raw sample")?;
    }
    writer.finish().context("failed to flush raw output")?;
    Ok(())
}

fn html_report_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".html");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_appends_html_suffix() {
        assert_eq!(
            html_report_path(Path::new("out/dataset.jsonl")),
            PathBuf::from("out/dataset.jsonl.html")
        );
    }
}
