//! ttk-sheet CLI.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use ttk_sheet::config::{AnalysisConfig, ExtractConfig, LayoutChoice};
use ttk_sheet::diagnostics::Severity;
use ttk_sheet::diff::diff_trees;
use ttk_sheet::extract::{extract_workbook, ExtractOptions};
use ttk_sheet::metrics::{
    btk, damage_at_range, required_ranges, ttk, ConfigStats, KillinessTable, MetricIndex,
    NormalizationScope,
};
use ttk_sheet::model::{CategoryTree, WeaponConfiguration};
use ttk_sheet::optimizer::{Requirements, Strategy};
use ttk_sheet::report::{write_diagnostics, write_html_report, write_json_report};
use ttk_sheet::store::Store;
use ttk_sheet::util::init_logging;
use ttk_sheet::workbook::load_workbook;

#[derive(Parser)]
#[command(name = "ttk-sheet")]
#[command(about = "Weapon stats spreadsheet extractor and time-to-kill calculator")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the canonical data file from a workbook export, store a snapshot and emit reports.
    Extract {
        #[arg(
            long,
            value_name = "PATH",
            help = "Workbook export: .json file, directory of sheet .json files, or .zip"
        )]
        workbook: PathBuf,
        #[arg(long, value_name = "DIR", default_value = "out")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = LayoutChoice::Auto)]
        layout: LayoutChoice,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
    },
    /// Print configurations, BTK and TTK for one weapon.
    Weapon {
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        name: String,
    },
    /// Auto-configure a loadout and print it as JSON.
    Optimize {
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Range in meters for min-ttk and --max-ttk.
        #[arg(long, default_value_t = 0.0)]
        range: f64,
        /// Comma-separated weapon names; all weapons when omitted.
        #[arg(long, value_delimiter = ',')]
        weapons: Vec<String>,
        #[arg(long, value_name = "MS")]
        max_ttk: Option<u32>,
        #[arg(long)]
        min_velocity: Option<u32>,
        #[arg(long)]
        min_mag_size: Option<u32>,
    },
    /// Score configurations by killiness and print them as JSON, best first.
    Killiness {
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        /// Normalize against the scored set or the whole catalog.
        #[arg(long, value_enum, default_value_t = NormalizationScope::Visible)]
        scope: NormalizationScope,
        /// Comma-separated weapon names; all weapons when omitted.
        #[arg(long, value_delimiter = ',')]
        weapons: Vec<String>,
    },
    /// Compare the latest snapshots of two stores (e.g. before/after patch).
    Diff {
        #[arg(long)]
        a: PathBuf,
        #[arg(long)]
        b: PathBuf,
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
    },
    /// Serve the data file over HTTP.
    #[cfg(feature = "serve")]
    Serve {
        #[arg(long, value_name = "FILE")]
        data: PathBuf,
        #[arg(long, value_name = "TOML")]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    MinTtk,
    MaxRpm,
    MaxVelocity,
    MaxMagazine,
    Killiness,
    Stealth,
}

impl StrategyArg {
    fn strategy(self, range: f64) -> Strategy {
        match self {
            StrategyArg::MinTtk => Strategy::MinTtk { range },
            StrategyArg::MaxRpm => Strategy::MaxRpm,
            StrategyArg::MaxVelocity => Strategy::MaxVelocity,
            StrategyArg::MaxMagazine => Strategy::MaxMagazine,
            StrategyArg::Killiness => Strategy::Killiness,
            StrategyArg::Stealth => Strategy::Stealth,
        }
    }
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract {
            workbook,
            out,
            layout,
            config,
        } => {
            let mut cfg = ExtractConfig::new(workbook, out);
            cfg.layout = layout;
            run_extract(cfg, load_config(config.as_deref())?)
        }
        Commands::Weapon { data, config, name } => {
            run_weapon(&data, load_config(config.as_deref())?, &name)
        }
        Commands::Optimize {
            data,
            config,
            strategy,
            range,
            weapons,
            max_ttk,
            min_velocity,
            min_mag_size,
        } => {
            let requirements = Requirements {
                max_ttk: max_ttk.map(|ms| (ms, range)),
                min_velocity,
                min_mag_size,
            };
            run_optimize(
                &data,
                load_config(config.as_deref())?,
                strategy.map(|s| s.strategy(range)),
                &weapons,
                &requirements,
            )
        }
        Commands::Killiness {
            data,
            config,
            scope,
            weapons,
        } => run_killiness(&data, load_config(config.as_deref())?, scope, &weapons),
        Commands::Diff { a, b, out, config } => {
            run_diff(&a, &b, out, load_config(config.as_deref())?)
        }
        #[cfg(feature = "serve")]
        Commands::Serve { data, config, port } => {
            run_serve(&data, load_config(config.as_deref())?, port)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, String> {
    match path {
        Some(p) => AnalysisConfig::load(p),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_tree(path: &Path) -> Result<CategoryTree, String> {
    let s = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    CategoryTree::from_json(&s).map_err(|e| format!("{}: {}", path.display(), e))
}

fn run_extract(cfg: ExtractConfig, analysis: AnalysisConfig) -> Result<(), String> {
    let workbook = load_workbook(&cfg.workbook)?;
    let options = ExtractOptions {
        layout: cfg.layout,
        exceptions: analysis.exception_table(),
    };
    let extraction = extract_workbook(&workbook, &options);
    let diagnostics = &extraction.diagnostics;

    fs::create_dir_all(&cfg.out_dir).map_err(|e| e.to_string())?;
    let data_path = cfg.out_dir.join("data.json");
    write_json_report(&extraction.tree, &data_path)?;
    write_diagnostics(diagnostics, &cfg.out_dir.join("diagnostics.json"))?;

    let db_path = cfg.out_dir.join("snapshots.sqlite");
    let mut store = Store::open(&db_path)?;
    let source = cfg.workbook.to_string_lossy();
    let id = store.insert_snapshot(&source, &extraction.tree, diagnostics)?;
    tracing::info!("stored snapshot {} in {}", id, db_path.display());

    let index = MetricIndex::new(extraction.tree, options.exceptions);
    let html_dir = cfg.out_dir.join("html");
    write_html_report(&index, diagnostics, &analysis.modifiers, &html_dir)?;

    println!(
        "{} weapons, {} configurations; {} errors, {} warnings",
        index.tree().weapon_count(),
        index.tree().stat_count(),
        diagnostics.count(Severity::Error),
        diagnostics.count(Severity::Warn)
    );
    tracing::info!("wrote {} and {}", data_path.display(), html_dir.display());
    Ok(())
}

fn fmt_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn run_weapon(data: &Path, cfg: AnalysisConfig, name: &str) -> Result<(), String> {
    let index = MetricIndex::new(load_tree(data)?, cfg.exception_table());
    let weapon = match index.weapon(name) {
        Some(w) => w,
        // Fall back to a case-insensitive match.
        None => index
            .tree()
            .weapons()
            .find(|w| w.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| format!("weapon not found: {}", name))?,
    };
    let m = &cfg.modifiers;
    let configs: Vec<ConfigStats<'_>> = index.weapon_configurations(&weapon.name).collect();
    let ranges = required_ranges(&configs, |c, damage| btk(c.ammo, m, damage).map(f64::from));

    println!(
        "Weapon: {} ({})",
        weapon.name,
        index.category_of(&weapon.name).unwrap_or("-")
    );
    println!("\nConfigurations:");
    for c in &configs {
        let s = c.stat;
        println!(
            "  {} / {}  velocity={}  rpm single={} burst={} auto={}",
            s.barrel_type,
            s.ammo_type,
            fmt_opt(s.velocity),
            fmt_opt(s.rpm_single),
            fmt_opt(s.rpm_burst),
            fmt_opt(s.rpm_auto)
        );
        for d in &s.dropoffs {
            println!("      {:>6}m  {}", d.range, d.damage);
        }
    }
    println!("\nTTK ms ({:?} fire mode):", cfg.optimizer.rpm_selector);
    for c in &configs {
        let rpm = cfg.optimizer.rpm_selector.select(c.stat);
        let cells: Vec<String> = ranges
            .iter()
            .map(|&r| {
                let damage = damage_at_range(&c.stat.dropoffs, r);
                let b = damage.and_then(|d| btk(c.ammo, m, d));
                let t = damage.and_then(|d| ttk(c.ammo, m, d, rpm));
                format!("{}m: {} ({} btk)", r, fmt_opt(t), fmt_opt(b))
            })
            .collect();
        println!(
            "  {} / {}  {}",
            c.stat.barrel_type,
            c.stat.ammo_type,
            cells.join("  ")
        );
    }
    println!("\nAmmo:");
    for (ammo, s) in &weapon.ammo_stats {
        println!(
            "  {}  mag={}  empty={}s  tactical={}s  headshot={}x  pellets={}",
            ammo,
            fmt_opt(s.mag_size),
            fmt_opt(s.empty_reload),
            fmt_opt(s.tactical_reload),
            fmt_opt(s.headshot_multiplier),
            fmt_opt(s.pellet_count)
        );
    }
    Ok(())
}

fn run_optimize(
    data: &Path,
    cfg: AnalysisConfig,
    strategy: Option<Strategy>,
    weapons: &[String],
    requirements: &Requirements,
) -> Result<(), String> {
    let index = MetricIndex::new(load_tree(data)?, cfg.exception_table());
    let mut start = Vec::new();
    if weapons.is_empty() {
        for w in index.tree().weapons() {
            if let Some(s) = w.stats.first() {
                start.push(WeaponConfiguration::for_stat(w, s));
            }
        }
    } else {
        for name in weapons {
            let w = index
                .weapon(name.trim())
                .ok_or_else(|| format!("weapon not found: {}", name))?;
            match w.stats.first() {
                Some(s) => start.push(WeaponConfiguration::for_stat(w, s)),
                None => tracing::warn!("{} has no configurations; skipped", w.name),
            }
        }
    }

    let ctx = cfg.optimizer_context();
    let chosen = match strategy {
        Some(s) => ctx.apply(&index, &start, s),
        None => start,
    };
    let chosen = ctx.filter_requirements(&index, &chosen, requirements);
    tracing::info!("{} configuration(s) selected", chosen.len());
    let json = serde_json::to_string_pretty(&chosen).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn run_killiness(
    data: &Path,
    cfg: AnalysisConfig,
    scope: NormalizationScope,
    weapons: &[String],
) -> Result<(), String> {
    let index = MetricIndex::new(load_tree(data)?, cfg.exception_table());
    let mut configs: Vec<WeaponConfiguration> = Vec::new();
    if weapons.is_empty() {
        configs.extend(index.catalog().map(|c| c.configuration()));
    } else {
        for name in weapons {
            let name = name.trim();
            if index.weapon(name).is_none() {
                return Err(format!("weapon not found: {}", name));
            }
            configs.extend(index.weapon_configurations(name).map(|c| c.configuration()));
        }
    }

    let table = KillinessTable::build(&index, &cfg.modifiers, &cfg.killiness);
    let mut scored: Vec<(WeaponConfiguration, Option<f64>)> = configs
        .iter()
        .cloned()
        .zip(table.score(&configs, scope))
        .collect();
    scored.sort_by(|a, b| b.1.unwrap_or(-1.0).total_cmp(&a.1.unwrap_or(-1.0)));
    let rows: Vec<serde_json::Value> = scored
        .iter()
        .map(|(c, score)| {
            serde_json::json!({
                "name": c.name,
                "barrelType": c.barrel_type,
                "ammoType": c.ammo_type,
                "score": score,
                "components": table.components(c),
            })
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn run_diff(a: &Path, b: &Path, out: Option<PathBuf>, cfg: AnalysisConfig) -> Result<(), String> {
    let store_a = Store::open(a)?;
    let store_b = Store::open(b)?;
    let id_a = store_a
        .latest_snapshot_id()?
        .ok_or("store A has no snapshots")?;
    let id_b = store_b
        .latest_snapshot_id()?
        .ok_or("store B has no snapshots")?;
    let tree_a = store_a.get_snapshot_tree(id_a)?;
    let tree_b = store_b.get_snapshot_tree(id_b)?;
    let diff = diff_trees(&tree_a, &tree_b, &cfg.modifiers);

    println!("Diff: {} vs {}", a.display(), b.display());
    println!("Weapons added: {}", diff.added_weapons.len());
    for name in &diff.added_weapons {
        println!("  + {}", name);
    }
    println!("Weapons removed: {}", diff.removed_weapons.len());
    for name in &diff.removed_weapons {
        println!("  - {}", name);
    }
    if !diff.ttk_changes.is_empty() {
        println!("TTK changes at 0m, fastest fire mode, over 5%:");
        for c in &diff.ttk_changes {
            println!(
                "  {} / {} / {}  {}ms -> {}ms",
                c.weapon, c.barrel_type, c.ammo_type, c.before_ms, c.after_ms
            );
        }
    }

    if let Some(dir) = out {
        fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
        let path = dir.join("diff.json");
        let json = serde_json::to_string_pretty(&diff).map_err(|e| e.to_string())?;
        fs::write(&path, json).map_err(|e| e.to_string())?;
        tracing::info!("wrote {}", path.display());
    }
    Ok(())
}

#[cfg(feature = "serve")]
fn run_serve(data: &Path, cfg: AnalysisConfig, port: u16) -> Result<(), String> {
    use ttk_sheet::serve::{run, AppState};

    let state = AppState {
        index: MetricIndex::new(load_tree(data)?, cfg.exception_table()),
        modifiers: cfg.modifiers.clone(),
        rpm_selector: cfg.optimizer.rpm_selector,
    };
    let addr = format!("0.0.0.0:{}", port);
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime.block_on(run(state, &addr))
}
