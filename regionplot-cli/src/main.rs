//! regionplot: regional plots of GWAS results.
//!
//! Pipeline per run:
//! 1. Find the independent significant loci in the association results
//! 2. Compute LD with each locus's best hit
//! 3. Render one regional plot per locus

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use regionplot_core::{
    find_loci, resolve_ld, AssociationRecord, CancelToken, Locus, LocusMode, RegionError,
};
use regionplot_genotypes::{load_genotypes, DosageMatrix, GenotypeFormat};
use regionplot_io::{
    load_associations, load_feature_table, load_genetic_map_window, load_gtf_features,
    load_imputed_sites, load_sample_list, save_feature_table, AssocColumns, MapColumns,
};
use regionplot_plotting::{
    layout_annotation_track, render_region, RegionMarker, RegionPlotConfig, RegionScene, Theme,
};

/// Plots significant regions of GWAS results
#[derive(Parser)]
#[command(
    name = "regionplot",
    version,
    about = "Plots significant regions of GWAS results"
)]
struct Cli {
    /// The association file containing the hits
    #[arg(long, value_name = "FILE", help_heading = "Input Files")]
    assoc: PathBuf,

    /// The genotype file used for LD (dosage matrix TSV or VCF)
    #[arg(long, value_name = "FILE", help_heading = "Input Files")]
    genotypes: PathBuf,

    /// The file containing the genetic map
    #[arg(long, value_name = "FILE", help_heading = "Input Files")]
    genetic_map: PathBuf,

    /// Imputed marker names, one per line (markers not listed render as
    /// genotyped)
    #[arg(long, value_name = "FILE", help_heading = "Input Files")]
    imputed_sites: Option<PathBuf>,

    /// A GTF file containing annotations
    #[arg(long, value_name = "FILE", help_heading = "Annotation Options")]
    annotation_gtf: Option<PathBuf>,

    /// A feature table (start/end/strand/label) containing annotations
    #[arg(
        long,
        value_name = "FILE",
        help_heading = "Annotation Options",
        conflicts_with = "annotation_gtf"
    )]
    annotation_features: Option<PathBuf>,

    /// GTF attributes used as feature labels, in order of preference
    #[arg(
        long,
        value_name = "LABEL",
        num_args = 1..,
        default_values_t = [
            "gene_name".to_string(),
            "gene_id".to_string(),
            "transcript_id".to_string(),
            "exon_number".to_string(),
        ],
        help_heading = "Annotation Options"
    )]
    annotation_label: Vec<String>,

    /// The genotype file format (guessed from the extension if omitted)
    #[arg(long, value_enum, value_name = "FORMAT", help_heading = "Genotypes Options")]
    genotypes_format: Option<FormatArg>,

    /// The list of samples to keep for the LD calculation
    #[arg(long, value_name = "FILE", help_heading = "Genotypes Options")]
    keep: Option<PathBuf>,

    /// The significant association threshold
    #[arg(
        long,
        value_name = "FLOAT",
        default_value_t = 5e-8,
        help_heading = "Association Options"
    )]
    significant: f64,

    /// Report secondary peaks with p lower than this value
    #[arg(
        long,
        value_name = "FLOAT",
        default_value_t = 5e-8,
        help_heading = "Association Options"
    )]
    plot_p_lower: f64,

    /// The name of the marker column
    #[arg(long, value_name = "COL", default_value = "snp", help_heading = "Association Options")]
    snp_col: String,

    /// The name of the chromosome column
    #[arg(long, value_name = "COL", default_value = "chr", help_heading = "Association Options")]
    chr_col: String,

    /// The name of the position column
    #[arg(long, value_name = "COL", default_value = "pos", help_heading = "Association Options")]
    pos_col: String,

    /// The name of the p-value column
    #[arg(long, value_name = "COL", default_value = "p", help_heading = "Association Options")]
    p_col: String,

    /// The name of the column containing the first allele
    #[arg(long, value_name = "COL", default_value = "minor", help_heading = "Association Options")]
    a1_col: String,

    /// The name of the column containing the second allele
    #[arg(long, value_name = "COL", default_value = "major", help_heading = "Association Options")]
    a2_col: String,

    /// The name of the chromosome column for the genetic map
    #[arg(
        long,
        value_name = "COL",
        default_value = "chromosome",
        help_heading = "Genetic Map Options"
    )]
    genetic_chr_col: String,

    /// The name of the position column for the genetic map
    #[arg(
        long,
        value_name = "COL",
        default_value = "position",
        help_heading = "Genetic Map Options"
    )]
    genetic_pos_col: String,

    /// The name of the recombination-rate column for the genetic map
    #[arg(
        long,
        value_name = "COL",
        default_value = "rate",
        help_heading = "Genetic Map Options"
    )]
    genetic_rate_col: String,

    /// The format of the output plots
    #[arg(long, value_enum, default_value_t = PlotFormat::Svg, help_heading = "Plot Options")]
    plot_format: PlotFormat,

    /// Base pairs added on each side of a best hit to form its window
    #[arg(long, value_name = "INT", default_value_t = 500_000, help_heading = "Plot Options")]
    region_padding: u64,

    /// Plot every marker on the best hit's chromosome (no padding)
    #[arg(long, help_heading = "Plot Options")]
    whole_dataset: bool,

    /// Color theme
    #[arg(long, value_enum, default_value_t = ThemeArg::Classic, help_heading = "Plot Options")]
    theme: ThemeArg,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1200, help_heading = "Plot Options")]
    width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 600, help_heading = "Plot Options")]
    height: u32,

    /// The output directory
    #[arg(long, value_name = "DIR", default_value = ".", help_heading = "Output Options")]
    output_directory: PathBuf,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Dosage,
    Vcf,
}

impl From<FormatArg> for GenotypeFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Dosage => GenotypeFormat::Dosage,
            FormatArg::Vcf => GenotypeFormat::Vcf,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ThemeArg {
    Classic,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Classic => Theme::classic(),
            ThemeArg::Dark => Theme::dark(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlotFormat {
    Svg,
    Png,
}

impl PlotFormat {
    fn extension(&self) -> &'static str {
        match self {
            PlotFormat::Svg => "svg",
            PlotFormat::Png => "png",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(&cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Validate user-supplied parameters before any locus is processed.
fn check_args(cli: &Cli) -> Result<()> {
    let required = [
        (&cli.assoc, "association file"),
        (&cli.genotypes, "genotype file"),
        (&cli.genetic_map, "genetic map"),
    ];
    for (path, what) in required {
        if !path.is_file() {
            return Err(
                RegionError::config(format!("{}: no such {}", path.display(), what)).into(),
            );
        }
    }
    for path in [&cli.imputed_sites, &cli.annotation_gtf, &cli.annotation_features, &cli.keep]
        .into_iter()
        .flatten()
    {
        if !path.is_file() {
            return Err(RegionError::config(format!("{}: no such file", path.display())).into());
        }
    }

    if cli.region_padding >= 2_500_000 {
        return Err(RegionError::config(format!(
            "{}: padding too large (must be below 2500000)",
            cli.region_padding
        ))
        .into());
    }

    if !cli.output_directory.is_dir() {
        fs::create_dir_all(&cli.output_directory).map_err(|e| {
            RegionError::config(format!(
                "{}: cannot create output directory: {}",
                cli.output_directory.display(),
                e
            ))
        })?;
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    check_args(cli)?;

    let columns = AssocColumns {
        marker: cli.snp_col.clone(),
        chrom: cli.chr_col.clone(),
        pos: cli.pos_col.clone(),
        p_value: cli.p_col.clone(),
        allele1: cli.a1_col.clone(),
        allele2: cli.a2_col.clone(),
    };
    info!("Reading assoc file '{}'", cli.assoc.display());
    let records = load_associations(&cli.assoc, &columns)?;
    info!("  - {} markers from association data", records.len());

    let mode = if cli.whole_dataset {
        LocusMode::WholeDataset
    } else {
        LocusMode::Peaks
    };
    let loci = find_loci(&records, cli.plot_p_lower, cli.region_padding, mode);
    if loci.is_empty() {
        warn!("No markers in association data; nothing to plot");
        return Ok(());
    }

    let by_id: HashMap<&str, &AssociationRecord> =
        records.iter().map(|r| (r.id.as_str(), r)).collect();

    for (i, locus) in loci.iter().enumerate() {
        let anchor = by_id
            .get(locus.anchor.as_str())
            .ok_or_else(|| anyhow!("locus anchor '{}' missing from records", locus.anchor))?;
        let kind = if i == 0 { "Best" } else { "Secondary" };
        info!("{} hit is '{}'", kind, locus.anchor);
        info!(
            "  - chr{}:{} (p={:.1e})",
            anchor.chrom, anchor.pos, anchor.p_value
        );
    }

    let samples_to_keep = match &cli.keep {
        Some(path) => {
            let samples = load_sample_list(path)?;
            info!("Keeping {} samples", samples.len());
            Some(samples)
        }
        None => None,
    };

    info!("Loading genotypes from '{}'", cli.genotypes.display());
    let genotypes = load_genotypes(&cli.genotypes, cli.genotypes_format.map(Into::into))?;
    info!(
        "  - {} markers x {} samples",
        genotypes.n_markers(),
        genotypes.n_samples()
    );

    let imputed_sites = match &cli.imputed_sites {
        Some(path) => {
            info!("Reading imputed sites '{}'", path.display());
            let sites = load_imputed_sites(path)?;
            info!("  - {} imputed sites", sites.len());
            sites
        }
        None => {
            info!("No imputed sites specified");
            HashSet::new()
        }
    };

    // Loci are independent; a cancelled run stops cleanly between them.
    let cancel = CancelToken::new();

    for locus in &loci {
        if cancel.is_cancelled() {
            warn!("Cancelled by user; stopping before the next locus");
            break;
        }
        let result = process_locus(
            cli,
            locus,
            &records,
            &by_id,
            &genotypes,
            &imputed_sites,
            samples_to_keep.as_ref(),
        );
        if let Err(err) = result {
            // LD failures are fatal for this locus only.
            if matches!(
                err.downcast_ref::<RegionError>(),
                Some(RegionError::Resolution { .. })
            ) {
                error!(
                    "chr{}:{}-{}: {:#}; skipping locus",
                    locus.chrom, locus.start, locus.end, err
                );
                continue;
            }
            return Err(err);
        }
    }

    Ok(())
}

fn process_locus(
    cli: &Cli,
    locus: &Locus,
    records: &[AssociationRecord],
    by_id: &HashMap<&str, &AssociationRecord>,
    genotypes: &DosageMatrix,
    imputed_sites: &HashSet<String>,
    samples_to_keep: Option<&HashSet<String>>,
) -> Result<()> {
    info!(
        "Plotting the region chr{}:{}-{}",
        locus.chrom, locus.start, locus.end
    );

    let in_region: Vec<&AssociationRecord> = records
        .iter()
        .filter(|r| r.chrom == locus.chrom && locus.start <= r.pos && r.pos <= locus.end)
        .collect();
    let anchor = by_id
        .get(locus.anchor.as_str())
        .ok_or_else(|| anyhow!("locus anchor '{}' missing from records", locus.anchor))?;

    info!("Computing LD");
    info!("  - {} markers to fetch", in_region.len());
    let candidates: HashSet<String> = in_region.iter().map(|r| r.marker_id.clone()).collect();
    let ld = resolve_ld(genotypes, &anchor.marker_id, &candidates, samples_to_keep)?;
    for dup in &ld.duplicates {
        warn!("  - duplicated LD entry for '{}', keeping only the first occurrence", dup);
    }
    if ld.defaulted > 0 {
        info!("  - {} markers without LD set to r2 = 0", ld.defaulted);
    }

    let ld_path = cli
        .output_directory
        .join(format!("{}.ld.csv", anchor.marker_id));
    info!("  - saving LD values to '{}'", ld_path.display());
    let mut sorted: Vec<(&String, &f64)> = ld.r2.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let mut writer = csv::Writer::from_path(&ld_path)?;
    for (marker, r2) in sorted {
        let value = format!("{:.6}", r2);
        writer.write_record([marker.as_str(), value.as_str()])?;
    }
    writer.flush()?;

    info!("Reading genetic map '{}'", cli.genetic_map.display());
    let map_columns = MapColumns {
        chrom: cli.genetic_chr_col.clone(),
        pos: cli.genetic_pos_col.clone(),
        rate: cli.genetic_rate_col.clone(),
    };
    let genetic_map = load_genetic_map_window(
        &cli.genetic_map,
        &map_columns,
        &locus.chrom,
        locus.start,
        locus.end,
    )?;
    info!("  - {} data points", genetic_map.len());

    let features = if let Some(gtf) = &cli.annotation_gtf {
        load_gtf_features(gtf, &locus.chrom, locus.start, locus.end, &cli.annotation_label)?
    } else if let Some(table) = &cli.annotation_features {
        load_feature_table(table, locus.start, locus.end)?
    } else {
        Vec::new()
    };
    if !features.is_empty() {
        info!("  - {} features in region", features.len());
        let annotation_path = cli.output_directory.join(format!(
            "annotations_in_chr{}_{}_{}.txt",
            locus.chrom, locus.start, locus.end
        ));
        save_feature_table(&annotation_path, &features)?;
    }

    let config = RegionPlotConfig {
        width: cli.width,
        height: cli.height,
        significance: cli.significant,
        theme: cli.theme.into(),
        ..RegionPlotConfig::default()
    };

    let annotations = if features.is_empty() {
        None
    } else {
        match layout_annotation_track(&features, locus.start, locus.end, &config) {
            Ok(layout) => {
                if layout.clipped > 0 {
                    info!("  - {} feature extents clipped to the window", layout.clipped);
                }
                Some(layout)
            }
            // The locus still renders, just without its annotation track.
            Err(err @ RegionError::Layout { .. }) => {
                error!("  - {}; rendering without the annotation track", err);
                None
            }
            Err(err) => return Err(err.into()),
        }
    };

    let markers: Vec<RegionMarker> = in_region
        .iter()
        .map(|r| RegionMarker {
            pos: r.pos,
            p_value: r.p_value,
            r2: ld.r2.get(&r.marker_id).copied().unwrap_or(0.0),
            imputed: imputed_sites.contains(&r.marker_id),
        })
        .collect();
    let n_imputed = markers.iter().filter(|m| m.imputed).count();
    let n_significant = markers
        .iter()
        .filter(|m| m.p_value < cli.significant)
        .count();
    info!("  - {} imputed markers", n_imputed);
    info!("  - {} genotyped markers", markers.len() - n_imputed);
    info!("  - {} significant markers", n_significant);

    let scene = RegionScene {
        chrom: locus.chrom.clone(),
        start: locus.start,
        end: locus.end,
        markers,
        genetic_map,
        annotations,
    };
    let out_path = cli.output_directory.join(format!(
        "chr{}_{}-{}.{}",
        locus.chrom,
        locus.start,
        locus.end,
        cli.plot_format.extension()
    ));
    info!("  - saving to '{}'", out_path.display());
    render_region(&scene, &out_path, &config)?;

    Ok(())
}
