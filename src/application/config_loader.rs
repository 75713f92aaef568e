// YAML configuration loader.
//
// The document is deserialized into plain DTOs (unknown keys rejected) and
// then fed through `ParameterStoreBuilder`, which owns all cross-reference
// validation. The three accepted line/size compatibility encodings are
// normalized here into `(line, size index)` pairs so nothing downstream knows
// which one was used.
//
// ```yaml
// products: [FIL]
// lines: { L1: 1000 }
// packing_areas: { Fresco: 2000 }
// box_formats: [10lb]
// pieces_per_box: { 10lb: { 6: 5 } }
// avg_unit_weight_lb: { 6: 7.5 }
// pieces_per_unit: { FIL: 2 }
// yield: { FIL: 1.0 }
// priority_weight: { FIL: 1 }
// price: { FIL: { 10lb: 10 } }
// line_size_indices: { L1: [6] }
// ```

use crate::domain::{
    AllocationStrategy, ParameterStore, ParameterStoreBuilder, PlannerSettings, PlanningError,
    SolverBackend, DEFAULT_MASS_CEILING_KG, DEFAULT_SIZE_LABELS,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, PlanningError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDocument {
    products: Vec<String>,
    lines: IndexMap<String, f64>,
    packing_areas: IndexMap<String, f64>,
    box_formats: Vec<String>,
    pieces_per_box: IndexMap<String, IndexMap<usize, u32>>,
    avg_unit_weight_lb: IndexMap<usize, f64>,
    pieces_per_unit: IndexMap<String, f64>,
    #[serde(rename = "yield")]
    yield_fraction: IndexMap<String, f64>,
    priority_weight: IndexMap<String, f64>,
    price: IndexMap<String, IndexMap<String, f64>>,

    #[serde(default)]
    line_size_pairs: Option<Vec<(usize, String)>>,
    #[serde(default)]
    line_size_indices: Option<IndexMap<String, Vec<usize>>>,
    #[serde(default)]
    line_size_labels: Option<IndexMap<String, Vec<String>>>,

    #[serde(default)]
    size_classes: Option<IndexMap<usize, String>>,
    #[serde(default)]
    product_area_compatibility: Option<IndexMap<String, Vec<String>>>,
    #[serde(default)]
    mass_limit: Option<MassLimitSection>,
    #[serde(default)]
    exclusive_lines: IndexMap<String, String>,
    #[serde(default)]
    solver: Option<SolverSection>,
    #[serde(default)]
    heuristic: Option<HeuristicSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MassLimitSection {
    area: String,
    #[serde(default = "default_ceiling")]
    ceiling_kg: f64,
}

fn default_ceiling() -> f64 {
    DEFAULT_MASS_CEILING_KG
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolverSection {
    #[serde(default)]
    strategy: AllocationStrategy,
    #[serde(default)]
    backend: SolverBackend,
    time_limit_secs: Option<f64>,
    mip_gap: Option<f64>,
    diagnostics_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeuristicSection {
    default_product: Option<String>,
    #[serde(default)]
    rotation: Vec<RotationStep>,
    #[serde(default)]
    area_priority: IndexMap<String, Vec<String>>,
    #[serde(default)]
    preferred_format: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RotationStep {
    product: String,
    #[serde(default = "default_weight")]
    weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// Reads and validates a configuration file.
pub fn load_parameters(path: impl AsRef<Path>) -> Result<ParameterStore> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        PlanningError::Configuration(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    let params = parse_parameters(&text)?;
    info!(
        path = %path.display(),
        products = params.products().len(),
        lines = params.lines().len(),
        areas = params.areas().len(),
        "configuration loaded"
    );
    Ok(params)
}

/// Parses a configuration document held in memory.
pub fn parse_parameters(text: &str) -> Result<ParameterStore> {
    let doc: ConfigDocument = serde_yaml::from_str(text)
        .map_err(|e| PlanningError::Configuration(format!("Malformed configuration: {}", e)))?;
    into_builder(doc)?.build()
}

fn into_builder(doc: ConfigDocument) -> Result<ParameterStoreBuilder> {
    let labels = size_labels(doc.size_classes.as_ref())?;
    let mut builder = ParameterStore::builder().size_labels(labels.clone());

    for (&size, &weight) in &doc.avg_unit_weight_lb {
        builder = builder.unit_weight(size, weight);
    }

    for product in &doc.products {
        let ppu = *required(&doc.pieces_per_unit, "pieces_per_unit", product)?;
        let yield_fraction = *required(&doc.yield_fraction, "yield", product)?;
        let weight = *required(&doc.priority_weight, "priority_weight", product)?;
        builder = builder.product(product.clone(), weight, yield_fraction, ppu);

        for (format, &price) in required(&doc.price, "price", product)? {
            builder = builder.price(product.clone(), format.clone(), price);
        }
    }

    for (id, &capacity) in &doc.lines {
        builder = builder.line(id.clone(), capacity);
    }
    for (id, &capacity) in &doc.packing_areas {
        builder = builder.area(id.clone(), capacity);
    }
    for format in &doc.box_formats {
        builder = builder.format(format.clone());
    }
    for (format, per_size) in &doc.pieces_per_box {
        for (&size, &pieces) in per_size {
            builder = builder.pieces_per_box(format.clone(), size, pieces);
        }
    }

    for (line, size) in line_size_pairs(&doc, &labels)? {
        builder = builder.line_accepts(line, size);
    }

    if let Some(compat) = &doc.product_area_compatibility {
        builder = builder.restrict_product_areas();
        for product in &doc.products {
            for area in required(compat, "product_area_compatibility", product)? {
                builder = builder.product_area(product.clone(), area.clone());
            }
        }
    }

    if let Some(limit) = &doc.mass_limit {
        builder = builder.mass_limit(limit.area.clone(), limit.ceiling_kg);
    }
    for (product, line) in &doc.exclusive_lines {
        builder = builder.exclusive_line(product.clone(), line.clone());
    }

    if let Some(heuristic) = &doc.heuristic {
        if let Some(product) = &heuristic.default_product {
            builder = builder.default_product(product.clone());
        }
        for step in &heuristic.rotation {
            builder = builder.rotation_step(step.product.clone(), step.weight);
        }
        for (product, areas) in &heuristic.area_priority {
            builder = builder.area_priority(product.clone(), areas.iter().cloned());
        }
        for (product, format) in &heuristic.preferred_format {
            builder = builder.preferred_format(product.clone(), format.clone());
        }
    }

    Ok(builder.settings(settings(doc.solver.unwrap_or_default())?))
}

fn required<'a, V>(map: &'a IndexMap<String, V>, key: &str, product: &str) -> Result<&'a V> {
    map.get(product).ok_or_else(|| {
        PlanningError::Configuration(format!("Missing '{}' for product '{}'", key, product))
    })
}

/// Labels in index order; the map must cover `0..n` without gaps.
fn size_labels(map: Option<&IndexMap<usize, String>>) -> Result<Vec<String>> {
    let Some(map) = map else {
        return Ok(DEFAULT_SIZE_LABELS.iter().map(|s| s.to_string()).collect());
    };
    (0..map.len())
        .map(|i| {
            map.get(&i).map(|l| l.trim().to_string()).ok_or_else(|| {
                PlanningError::Configuration(format!(
                    "size_classes must cover indices 0..{} (missing {})",
                    map.len(),
                    i
                ))
            })
        })
        .collect()
}

/// Canonical `(line, size index)` pairs. Precedence: pairs, indices, labels.
fn line_size_pairs(doc: &ConfigDocument, labels: &[String]) -> Result<Vec<(String, usize)>> {
    if let Some(pairs) = &doc.line_size_pairs {
        debug!(encoding = "pairs", count = pairs.len(), "line/size compatibility");
        return Ok(pairs.iter().map(|(size, line)| (line.clone(), *size)).collect());
    }
    if let Some(by_index) = &doc.line_size_indices {
        debug!(encoding = "indices", "line/size compatibility");
        return Ok(by_index
            .iter()
            .flat_map(|(line, sizes)| sizes.iter().map(move |&c| (line.clone(), c)))
            .collect());
    }
    if let Some(by_label) = &doc.line_size_labels {
        debug!(encoding = "labels", "line/size compatibility");
        let mut pairs = Vec::new();
        for (line, sizes) in by_label {
            for label in sizes {
                let c = labels
                    .iter()
                    .position(|l| l == label.trim())
                    .ok_or_else(|| {
                        PlanningError::Configuration(format!(
                            "Unknown size label '{}' for line '{}'",
                            label, line
                        ))
                    })?;
                pairs.push((line.clone(), c));
            }
        }
        return Ok(pairs);
    }
    Err(PlanningError::Configuration(
        "Missing line/size compatibility: give one of line_size_pairs, \
         line_size_indices or line_size_labels"
            .to_string(),
    ))
}

fn settings(section: SolverSection) -> Result<PlannerSettings> {
    if let Some(limit) = section.time_limit_secs {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(PlanningError::Configuration(format!(
                "solver.time_limit_secs must be > 0 (got {})",
                limit
            )));
        }
    }
    if let Some(gap) = section.mip_gap {
        if !gap.is_finite() || gap < 0.0 {
            return Err(PlanningError::Configuration(format!(
                "solver.mip_gap must be >= 0 (got {})",
                gap
            )));
        }
    }
    let defaults = PlannerSettings::default();
    Ok(PlannerSettings {
        strategy: section.strategy,
        backend: section.backend,
        time_limit_secs: section.time_limit_secs,
        mip_gap: section.mip_gap,
        diagnostics_dir: section.diagnostics_dir.unwrap_or(defaults.diagnostics_dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
products: [FIL, HON]
lines: { L1: 1000, L2: 800 }
packing_areas: { Fresco: 2000, Congelado: 1500 }
box_formats: [10lb, 35lb]
pieces_per_box:
  10lb: { 6: 5 }
  35lb: { 6: 12, 7: 10 }
avg_unit_weight_lb: { 6: 7.5, 7: 8.5 }
pieces_per_unit: { FIL: 2, HON: 1 }
yield: { FIL: 1.0, HON: 0.9 }
priority_weight: { FIL: 1, HON: 2 }
price:
  FIL: { 10lb: 10 }
  HON: { 35lb: 30 }
"#;

    fn with(extra: &str) -> String {
        format!("{}{}", BASE, extra)
    }

    #[test]
    fn parses_index_encoding() {
        let params =
            parse_parameters(&with("line_size_indices: { L1: [6], L2: [6, 7] }\n")).unwrap();
        assert_eq!(params.products().len(), 2);
        assert_eq!(params.sizes()[6].label, "7-8");
        assert_eq!(params.sizes()[6].avg_unit_weight_lb, 7.5);
        assert!(params.line_accepts(0, 6));
        assert!(!params.line_accepts(0, 7));
        assert!(params.line_accepts(1, 7));
        assert_eq!(params.products()[1].price(1), 30.0);
        assert_eq!(params.settings(), &PlannerSettings::default());
    }

    #[test]
    fn label_and_pair_encodings_normalize_to_the_same_matrix() {
        let labels =
            parse_parameters(&with("line_size_labels: { L1: ['7-8'], L2: ['7-8', '8-9'] }\n"))
                .unwrap();
        let pairs = parse_parameters(&with(
            "line_size_pairs: [[6, L1], [6, L2], [7, L2]]\n",
        ))
        .unwrap();
        for j in 0..2 {
            for c in 0..14 {
                assert_eq!(labels.line_accepts(j, c), pairs.line_accepts(j, c));
            }
        }
    }

    #[test]
    fn pairs_take_precedence_over_labels() {
        let params = parse_parameters(&with(
            "line_size_pairs: [[6, L1]]\nline_size_labels: { L2: ['7-8'] }\n",
        ))
        .unwrap();
        assert!(params.line_accepts(0, 6));
        assert!(!params.line_accepts(1, 6));
    }

    #[test]
    fn missing_compatibility_is_a_configuration_error() {
        let err = parse_parameters(BASE).unwrap_err();
        assert!(matches!(err, PlanningError::Configuration(_)));
        assert!(err.to_string().contains("line/size compatibility"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_parameters(&with("line_size_pairs: [[6, L1]]\nshifts: 2\n")).unwrap_err();
        assert!(err.to_string().contains("shifts"));
    }

    #[test]
    fn product_area_compatibility_needs_every_product() {
        let err = parse_parameters(&with(
            "line_size_pairs: [[6, L1]]\nproduct_area_compatibility: { FIL: [Fresco] }\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("HON"));

        let params = parse_parameters(&with(
            "line_size_pairs: [[6, L1]]\n\
             product_area_compatibility: { FIL: [Fresco], HON: [Congelado] }\n",
        ))
        .unwrap();
        assert!(params.area_accepts(0, 0));
        assert!(!params.area_accepts(0, 1));
        assert!(params.area_accepts(1, 1));
    }

    #[test]
    fn optional_sections_reach_the_store() {
        let params = parse_parameters(&with(
            "line_size_pairs: [[6, L1], [6, L2]]\n\
             mass_limit: { area: Congelado }\n\
             exclusive_lines: { HON: L2 }\n\
             solver:\n  \
               { strategy: greedy, backend: highs, time_limit_secs: 30, diagnostics_dir: out }\n\
             heuristic:\n  \
               rotation: [{ product: FIL, weight: 2 }, { product: HON }]\n  \
               preferred_format: { HON: 35lb }\n",
        ))
        .unwrap();

        let limit = params.mass_limit().unwrap();
        assert_eq!(limit.area, 1);
        assert_eq!(limit.ceiling_kg, DEFAULT_MASS_CEILING_KG);
        assert!(!params.product_allowed_on(1, 0));
        assert!(params.product_allowed_on(1, 1));
        assert_eq!(params.settings().strategy, AllocationStrategy::Greedy);
        assert_eq!(params.settings().time_limit_secs, Some(30.0));
        assert_eq!(params.settings().diagnostics_dir, PathBuf::from("out"));
        assert_eq!(params.heuristic().rotation, vec![0, 0, 1]);
        assert_eq!(params.heuristic().preferred_format[1], Some(1));
    }

    #[test]
    fn missing_yield_names_the_product() {
        let text = BASE.replace("yield: { FIL: 1.0, HON: 0.9 }", "yield: { FIL: 1.0 }");
        let err = parse_parameters(&format!("{}line_size_pairs: [[6, L1]]\n", text)).unwrap_err();
        assert!(err.to_string().contains("'yield' for product 'HON'"));
    }

    #[test]
    fn custom_size_classes_must_be_contiguous() {
        let err = parse_parameters(&with(
            "line_size_pairs: [[0, L1]]\nsize_classes: { 0: small, 2: large }\n",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("size_classes"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.yaml");
        std::fs::write(&path, with("line_size_pairs: [[6, L1]]\n")).unwrap();
        assert!(load_parameters(&path).is_ok());
        assert!(load_parameters(dir.path().join("missing.yaml")).is_err());
    }
}
