//! rackbrackets: builds the top/bottom, left/right rack brackets from one
//! Dimension Set and writes them out as STL.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bracket_planner::params::{load_file, to_toml_string};
use bracket_planner::{BracketPlan, DimensionSet};
use bracket_types::RoleTag;
use clap::{Parser, Subcommand, ValueEnum};
use mesh_export::{artifact_name, Exporter, MemoryWriter, StlDirWriter, StlFormat};
use part_assembler::{generate, BatchReport};
use solid_kernel::{KernelBundle, MockKernel};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rackbrackets")]
#[command(about = "Parametric rack bracket generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the requested brackets and export them
    Generate(GenerateArgs),
    /// Print the built-in Dimension Set as TOML
    Defaults,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Dimension Set file (.toml or .json); built-in values when omitted
    #[arg(short, long)]
    dimensions: Option<PathBuf>,

    /// Directory for the STL files (created if missing)
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    ascii: bool,

    /// Build and report without writing any files
    #[arg(long)]
    no_export: bool,

    /// Tessellation tolerance in mm
    #[arg(long, default_value_t = mesh_export::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Roles to build, e.g. `top_bracket_left` or `bottom-right`; all when omitted
    #[arg(long, value_delimiter = ',')]
    roles: Vec<RoleTag>,

    /// Modeling kernel [default: truck when built with it, otherwise mock]
    #[arg(long, value_enum)]
    kernel: Option<KernelChoice>,

    /// Print each built part's plan as JSON
    #[arg(long)]
    dump_plan: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KernelChoice {
    Mock,
    Truck,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Defaults => {
            let text = to_toml_string(&DimensionSet::prusa_6u().to_params())?;
            print!("{text}");
            Ok(())
        }
    }
}

fn load_dimensions(path: Option<&Path>) -> Result<DimensionSet> {
    let Some(path) = path else {
        return Ok(DimensionSet::prusa_6u());
    };
    let params =
        load_file(path).with_context(|| format!("reading dimensions from {}", path.display()))?;
    let dims = DimensionSet::from_params(&params)
        .with_context(|| format!("invalid dimensions in {}", path.display()))?;
    info!(path = %path.display(), keys = params.len(), "loaded dimension set");
    Ok(dims)
}

fn default_kernel() -> KernelChoice {
    if cfg!(feature = "truck") {
        KernelChoice::Truck
    } else {
        KernelChoice::Mock
    }
}

fn make_kernel(choice: KernelChoice) -> Result<Box<dyn KernelBundle>> {
    match choice {
        KernelChoice::Mock => Ok(Box::new(MockKernel::new())),
        #[cfg(feature = "truck")]
        KernelChoice::Truck => Ok(Box::new(solid_kernel::TruckKernel::new())),
        #[cfg(not(feature = "truck"))]
        KernelChoice::Truck => bail!("this build has no truck kernel; rebuild with --features truck"),
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    if !(args.tolerance > 0.0) {
        bail!("--tolerance must be positive, got {}", args.tolerance);
    }
    let kernel_choice = args.kernel.unwrap_or_else(default_kernel);
    // The mock kernel leaves holes out of its meshes.
    if kernel_choice == KernelChoice::Mock && !args.no_export {
        bail!(
            "the mock kernel cannot produce printable meshes; \
             pass --no-export for a dry run or build with --features truck"
        );
    }
    let dims = load_dimensions(args.dimensions.as_deref())?;
    let roles: Vec<RoleTag> = if args.roles.is_empty() {
        RoleTag::ALL.to_vec()
    } else {
        args.roles.clone()
    };
    debug!(?roles, kernel = ?kernel_choice, "starting run");

    let mut kernel = make_kernel(kernel_choice)?;
    let outcome = generate(kernel.as_mut(), &dims, &roles)?;
    let mut report = BatchReport::new(kernel.as_ref(), &outcome);

    if args.dump_plan {
        let plans: Vec<&BracketPlan> = outcome.parts.iter().map(|p| p.plan()).collect();
        println!("{}", serde_json::to_string_pretty(&plans)?);
    }

    if !args.no_export {
        let format = if args.ascii {
            StlFormat::Ascii
        } else {
            StlFormat::Binary
        };
        let mut exporter = Exporter::new(StlDirWriter::new(&args.output_dir, format))
            .with_tolerance(args.tolerance);
        for (role, result) in exporter.export_all(kernel.as_mut(), outcome.parts) {
            report.record_export(
                artifact_name(role),
                result.map(|a| a.location).map_err(|e| e.to_string()),
            );
        }
    } else {
        // Tessellate anyway so a dry run still catches meshing failures.
        let mut exporter = Exporter::new(MemoryWriter::new()).with_tolerance(args.tolerance);
        for (role, result) in exporter.export_all(kernel.as_mut(), outcome.parts) {
            if let Err(e) = result {
                report.record_export(artifact_name(role), Err(e.to_string()));
            }
        }
    }

    print!("{}", report.to_text());
    if !report.is_clean() {
        bail!("some brackets were not produced");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_types::{BracketFamily, Hand};

    fn parse(args: &[&str]) -> GenerateArgs {
        let argv = std::iter::once("rackbrackets").chain(args.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Generate(args) => args,
            Commands::Defaults => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_defaults() {
        let args = parse(&["generate"]);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.tolerance, 0.1);
        assert!(args.roles.is_empty());
        assert_eq!(args.kernel, None);
        assert!(!args.ascii && !args.no_export && !args.dump_plan);
    }

    #[test]
    fn roles_accept_both_spellings() {
        let args = parse(&["generate", "--roles", "top_bracket_left,bottom-right"]);
        assert_eq!(
            args.roles,
            [
                RoleTag::new(BracketFamily::Top, Hand::Left),
                RoleTag::new(BracketFamily::Bottom, Hand::Right),
            ]
        );
        let argv = ["rackbrackets", "generate", "--roles", "middle-left"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn dry_run_with_mock_kernel_is_clean() {
        let args = parse(&["generate", "--no-export", "--kernel", "mock"]);
        assert!(run_generate(&args).is_ok());
    }

    #[test]
    fn mock_kernel_never_writes_files() {
        let dir = std::env::temp_dir().join(format!("rackbrackets-mock-{}", std::process::id()));
        let out = dir.to_str().unwrap();
        let args = parse(&["generate", "--kernel", "mock", "--output-dir", out]);
        let err = run_generate(&args).unwrap_err();
        assert!(err.to_string().contains("--no-export"));
        assert!(!dir.exists());
    }

    #[cfg(not(feature = "truck"))]
    #[test]
    fn default_kernel_without_truck_is_a_dry_run_only() {
        assert_eq!(default_kernel(), KernelChoice::Mock);
        let dir = std::env::temp_dir().join(format!("rackbrackets-default-{}", std::process::id()));
        let args = parse(&["generate", "--output-dir", dir.to_str().unwrap()]);
        assert!(run_generate(&args).is_err());
        assert!(!dir.exists());
    }

    #[cfg(feature = "truck")]
    #[test]
    fn truck_is_the_default_kernel_when_built_in() {
        assert_eq!(default_kernel(), KernelChoice::Truck);
    }

    #[test]
    fn bad_tolerance_is_refused() {
        let args = parse(&["generate", "--no-export", "--tolerance", "0"]);
        assert!(run_generate(&args).is_err());
    }

    #[test]
    fn missing_dimension_file_names_the_path() {
        let err = load_dimensions(Some(Path::new("/nonexistent/dims.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/dims.toml"));
    }
}
