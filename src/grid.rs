//! Grid-based stratified re-sampling.
//!
//! The raw sample distribution over (place count, marking count) is heavily
//! skewed. Raw samples are binned into per-cell directories on disk, then
//! drawn uniformly per cell and augmented with fresh rate vectors.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::analysis::DenseSolver;
use crate::augment;
use crate::output::SampleRecord;

/// Persisted grid layout: the boundary arrays and the per-cell file counts,
/// kept in `config.json` so later runs can accumulate into the same tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub row_p: Vec<usize>,
    pub col_m: Vec<usize>,
    pub json_count: Vec<Vec<usize>>,
}

/// 1-based cell index: the first boundary strictly greater than `value`.
pub fn grid_index(value: usize, boundaries: &[usize]) -> usize {
    for (i, &boundary) in boundaries.iter().enumerate() {
        if value < boundary {
            return i + 1;
        }
    }
    boundaries.len() + 1
}

fn cell_dir(grid_dir: &Path, p_idx: usize, m_idx: usize) -> PathBuf {
    grid_dir.join(format!("p{p_idx}")).join(format!("m{m_idx}"))
}

fn initialize_grid(
    grid_dir: &Path,
    accumulate: bool,
    p_bounds: &[usize],
    m_bounds: &[usize],
) -> Result<GridConfig> {
    let config_path = grid_dir.join("config.json");
    if accumulate && config_path.exists() {
        let data = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read grid config {}", config_path.display()))?;
        let config: GridConfig = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse grid config {}", config_path.display()))?;
        return Ok(config);
    }

    let config = GridConfig {
        row_p: p_bounds.to_vec(),
        col_m: m_bounds.to_vec(),
        json_count: vec![vec![0; m_bounds.len() + 1]; p_bounds.len() + 1],
    };
    for i in 1..=p_bounds.len() + 1 {
        for j in 1..=m_bounds.len() + 1 {
            let dir = cell_dir(grid_dir, i, j);
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create grid directory {}", dir.display()))?;
        }
    }
    Ok(config)
}

/// Partitions the raw JSONL file into per-cell `data{k}.json` files and
/// persists the updated count matrix.
pub fn partition_into_grid(
    grid_dir: &Path,
    accumulate: bool,
    raw_path: &Path,
    p_bounds: &[usize],
    m_bounds: &[usize],
) -> Result<()> {
    let mut grid_config = initialize_grid(grid_dir, accumulate, p_bounds, m_bounds)?;
    let lines = load_jsonl(raw_path)?;

    for line in &lines {
        let sample: SampleRecord =
            serde_json::from_str(line).context("failed to parse raw grid sample")?;
        let p_idx = grid_index(sample.petri_net.places, p_bounds);
        let m_idx = grid_index(sample.reachability_graph.vertices.len(), m_bounds);
        grid_config.json_count[p_idx - 1][m_idx - 1] += 1;
        let k = grid_config.json_count[p_idx - 1][m_idx - 1];

        let path = cell_dir(grid_dir, p_idx, m_idx).join(format!("data{k}.json"));
        save_json(&path, &sample)?;
    }
    debug!("partitioned {} raw samples", lines.len());

    save_json(&grid_dir.join("config.json"), &grid_config)
}

/// Uniformly draws up to `samples_per_grid` files from every cell and runs
/// the rate-variation augmenter on each drawn sample.
pub fn sample_and_transform(
    grid_dir: &Path,
    samples_per_grid: usize,
    lambda_variations_per_sample: usize,
    min_rate: u32,
    max_rate: u32,
    rng: &mut StdRng,
    solver: &dyn DenseSolver,
) -> Result<Vec<SampleRecord>> {
    let config_path = grid_dir.join("config.json");
    let data = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read grid config {}", config_path.display()))?;
    let grid_config: GridConfig = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse grid config {}", config_path.display()))?;

    let mut selected = Vec::new();
    for i in 1..=grid_config.row_p.len() + 1 {
        for j in 1..=grid_config.col_m.len() + 1 {
            let dir = cell_dir(grid_dir, i, j);
            for content in sample_json_files(&dir, samples_per_grid, rng)? {
                let sample: SampleRecord =
                    serde_json::from_str(&content).context("failed to parse grid cell sample")?;
                selected.push(sample);
            }
        }
    }
    debug!("drew {} samples across grid cells", selected.len());

    let mut transformed = Vec::new();
    for sample in &selected {
        let net = sample.petri_net.to_net().context("invalid grid sample")?;
        let graph = sample
            .reachability_graph
            .to_graph(net.transitions())
            .context("invalid grid sample")?;
        let variations = augment::rate_variations(
            &graph,
            net.transitions(),
            lambda_variations_per_sample,
            min_rate,
            max_rate,
            rng,
            solver,
        );
        for (rates, analysis) in variations {
            transformed.push(SampleRecord {
                petri_net: sample.petri_net.clone(),
                reachability_graph: sample.reachability_graph.clone(),
                lambda_values: Some(rates.iter().copied().collect()),
                steady_state_probs: Some(analysis.steady_state_probs),
                average_markings: Some(analysis.average_markings),
                marking_densities: Some(analysis.marking_densities),
            });
        }
    }
    Ok(transformed)
}

fn load_jsonl(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect())
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}

/// Draws up to `count` files from `dir` without replacement. Entries are
/// sorted before shuffling so the draw depends only on the RNG stream.
fn sample_json_files(dir: &Path, count: usize, rng: &mut StdRng) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    files.shuffle(rng);
    files.truncate(count);

    files
        .iter()
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read grid sample {}", path.display()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LuSolver;
    use crate::graph::explore;
    use crate::net::{PetriNet, PlaceId, TransitionId};
    use crate::output::record::SampleRecord;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn boundary_assignment_is_one_based() {
        let boundaries = [10, 20, 30];
        assert_eq!(grid_index(5, &boundaries), 1);
        assert_eq!(grid_index(15, &boundaries), 2);
        assert_eq!(grid_index(25, &boundaries), 3);
        assert_eq!(grid_index(35, &boundaries), 4);
    }

    #[test]
    fn empty_boundaries_map_everything_to_cell_one() {
        assert_eq!(grid_index(123, &[]), 1);
    }

    fn cycle_net(places: usize) -> PetriNet {
        // A two-place cycle embedded in a possibly larger net.
        let mut net = PetriNet::new(places, 2);
        net.set_pre(PlaceId::new(0), TransitionId::new(0), 1);
        net.set_post(PlaceId::new(1), TransitionId::new(0), 1);
        net.set_pre(PlaceId::new(1), TransitionId::new(1), 1);
        net.set_post(PlaceId::new(0), TransitionId::new(1), 1);
        net.set_initial_tokens(PlaceId::new(0), 1);
        net
    }

    #[test]
    fn partition_and_sample_rebalance_two_cells() {
        let dir = tempfile::tempdir().unwrap();
        let grid_dir = dir.path().join("grid");
        fs::create_dir_all(&grid_dir).unwrap();

        let raw_path = grid_dir.join("raw_data.jsonl");
        let mut raw = fs::File::create(&raw_path).unwrap();
        for places in [2, 12] {
            let net = cycle_net(places);
            let graph = explore(&net, 5, 100);
            let line = serde_json::to_string(&SampleRecord::raw(&net, &graph)).unwrap();
            writeln!(raw, "{line}").unwrap();
        }
        drop(raw);

        let p_bounds = [10];
        let m_bounds = [20];
        partition_into_grid(&grid_dir, false, &raw_path, &p_bounds, &m_bounds).unwrap();

        assert!(grid_dir.join("p1/m1/data1.json").exists());
        assert!(grid_dir.join("p2/m1/data1.json").exists());

        let config: GridConfig =
            serde_json::from_str(&fs::read_to_string(grid_dir.join("config.json")).unwrap())
                .unwrap();
        assert_eq!(config.json_count[0][0], 1);
        assert_eq!(config.json_count[1][0], 1);

        let mut rng = StdRng::seed_from_u64(1);
        let solver = LuSolver::default();
        let records =
            sample_and_transform(&grid_dir, 1, 2, 1, 10, &mut rng, &solver).unwrap();
        // Both cells were drawn, each expanded into two rate variations.
        assert_eq!(records.len(), 4);
        for record in &records {
            assert!(record.lambda_values.is_some());
            let mass: f64 = record.steady_state_probs.as_ref().unwrap().iter().sum();
            assert!((mass - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn accumulation_continues_existing_counts() {
        let dir = tempfile::tempdir().unwrap();
        let grid_dir = dir.path().join("grid");
        fs::create_dir_all(&grid_dir).unwrap();

        let raw_path = grid_dir.join("raw_data.jsonl");
        let net = cycle_net(2);
        let graph = explore(&net, 5, 100);
        let line = serde_json::to_string(&SampleRecord::raw(&net, &graph)).unwrap();
        fs::write(&raw_path, format!("{line}\n")).unwrap();

        partition_into_grid(&grid_dir, false, &raw_path, &[10], &[20]).unwrap();
        partition_into_grid(&grid_dir, true, &raw_path, &[10], &[20]).unwrap();

        let config: GridConfig =
            serde_json::from_str(&fs::read_to_string(grid_dir.join("config.json")).unwrap())
                .unwrap();
        assert_eq!(config.json_count[0][0], 2);
        assert!(grid_dir.join("p1/m1/data2.json").exists());
    }
}
