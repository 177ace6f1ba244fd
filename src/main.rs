use anyhow::{Context, Result};
use clap::Parser;
use classmark::cli::{self, OutputFormat};
use classmark::{loader, output, AnalysisConfig, CapabilityRules};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse args early to get verbose flag for logging initialization
    let args = cli::Args::parse();

    // Use RUST_LOG env var if set, otherwise use verbose flag
    // Examples: RUST_LOG=debug, RUST_LOG=classmark=trace, RUST_LOG=classmark::loader=trace
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if args.verbose {
        EnvFilter::new("classmark=debug")
    } else {
        EnvFilter::new("classmark=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", args.verbose);

    let format = args.format;
    let (result, success) = match args.command {
        cli::Command::Analyze {
            dir,
            module,
            rules,
            scope,
            exclude,
            library,
            include_abstract,
            skip_nested,
            entry_point,
            bootstrap_hook,
            loader,
        } => {
            let config = AnalysisConfig {
                plugin_module: !library,
                scope,
                exclude,
                include_abstract,
                skip_nested,
                entry_point,
                bootstrap_hook,
                loader,
                ..AnalysisConfig::default()
            };
            analyze(&dir, module, rules.as_deref(), &config, format)?
        }
        cli::Command::Classes { dir } => (list_classes(&dir, format)?, true),
        cli::Command::Rules { rules } => (list_rules(rules.as_deref(), format)?, true),
    };

    // Output results
    if let Some(output_path) = args.output {
        fs::write(&output_path, &result).context(format!("Failed to write output to {}", output_path))?;
        eprintln!("Results written to: {}", output_path);
    } else {
        // Results go to stdout
        print!("{}", result);
    }

    if !success {
        std::io::stdout().flush()?;
        std::process::exit(1);
    }
    Ok(())
}

fn load_rules(path: Option<&str>) -> Result<CapabilityRules> {
    match path {
        Some(path) => CapabilityRules::from_path(path).context(format!("Failed to load rules from {}", path)),
        None => Ok(CapabilityRules::paper()),
    }
}

/// Module name from the class directory, e.g. `sample` for `sample/build/classes/java/main`.
fn default_module_name(dir: &Path) -> String {
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let mut components: Vec<String> = canonical
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(build) = components.iter().rposition(|c| c == "build") {
        components.truncate(build);
    }
    components
        .into_iter()
        .rev()
        .find(|c| !c.is_empty() && c != "/")
        .unwrap_or_else(|| "module".to_string())
}

fn analyze(
    dir: &str,
    module: Option<String>,
    rules: Option<&str>,
    config: &AnalysisConfig,
    format: OutputFormat,
) -> Result<(String, bool)> {
    let path = Path::new(dir);
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", dir);
    }

    let rules = load_rules(rules)?;
    let module = module.unwrap_or_else(|| default_module_name(path));
    let analysis = classmark::analyze_directory(path, &module, &rules, config)?;

    let result = match format {
        OutputFormat::Json => output::format_analysis_json(&analysis)?,
        OutputFormat::Terminal => {
            eprint!("{}", output::format_diagnostics_terminal(&analysis.diagnostics));
            output::format_analysis_terminal(&analysis)
        }
    };
    Ok((result, analysis.is_success()))
}

fn list_classes(dir: &str, format: OutputFormat) -> Result<String> {
    let path = Path::new(dir);
    let config = AnalysisConfig::default();
    let (inputs, mut diagnostics) = loader::read_class_directory(path, config.max_class_size)?;
    let loaded = loader::load_classes(&inputs);
    diagnostics.extend(loaded.diagnostics);

    match format {
        OutputFormat::Json => output::format_classes_json(&loaded.classes, &diagnostics),
        OutputFormat::Terminal => {
            eprint!("{}", output::format_diagnostics_terminal(&diagnostics));
            Ok(output::format_classes_terminal(&loaded.classes))
        }
    }
}

fn list_rules(path: Option<&str>, format: OutputFormat) -> Result<String> {
    let rules = load_rules(path)?;
    match format {
        OutputFormat::Json => output::format_rules_json(&rules),
        OutputFormat::Terminal => Ok(output::format_rules_terminal(&rules)),
    }
}
