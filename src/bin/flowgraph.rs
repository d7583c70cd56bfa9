use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flowgraph::{
    Composition, CompositionId, FlowSession, FrameIndex, PassOutcome, Project, PropertyId,
    PropertyStore,
};

#[derive(Parser, Debug)]
#[command(name = "flowgraph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a composition and print its evaluation order.
    Compile(CompileArgs),
    /// Compute every property of a composition at one frame and print them as JSON.
    Eval(EvalArgs),
    /// Print what a property depends on.
    Deps(DepsArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Composition id (defaults to the first composition).
    #[arg(long)]
    composition: Option<String>,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u64,
}

#[derive(Parser, Debug)]
struct DepsArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Property id.
    #[arg(long)]
    property: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Eval(args) => cmd_eval(args),
        Command::Deps(args) => cmd_deps(args),
    }
}

fn load(args: &ProjectArgs) -> anyhow::Result<(Project, CompositionId)> {
    let project = Project::from_path(&args.in_path)
        .with_context(|| format!("load project '{}'", args.in_path.display()))?;
    project.validate().context("validate project")?;

    let id = match &args.composition {
        Some(id) => CompositionId::new(id.as_str()),
        None => project
            .compositions
            .first()
            .map(|c| c.id.clone())
            .context("project has no compositions")?,
    };
    if project.composition(&id).is_none() {
        anyhow::bail!("unknown composition '{id}'");
    }
    Ok((project, id))
}

fn composition<'a>(project: &'a Project, id: &CompositionId) -> anyhow::Result<&'a Composition> {
    project
        .composition(id)
        .with_context(|| format!("unknown composition '{id}'"))
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let (project, id) = load(&args.project)?;
    let comp = composition(&project, &id)?;

    let session = FlowSession::new(comp, &project.graphs);
    if !session.can_render() {
        for e in session.errors() {
            eprintln!("error: {e}");
        }
        anyhow::bail!("{} compilation error(s)", session.errors().len());
    }

    if let Some(program) = session.program() {
        for node in program.ordered() {
            println!(
                "{:>4} {} {} ({})",
                node.compute_index,
                node.graph,
                node.id,
                node.node.kind.name()
            );
        }
    }
    let fp = session.fingerprint();
    eprintln!("fingerprint {:016x}{:016x}", fp.hi, fp.lo);
    Ok(())
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let (project, id) = load(&args.project)?;
    let comp = composition(&project, &id)?;

    let session = FlowSession::new(comp, &project.graphs);
    let mut store = PropertyStore::new();
    match session.compute(comp, FrameIndex(args.frame), &mut store)? {
        PassOutcome::Committed { .. } => {}
        PassOutcome::Abandoned { error } => return Err(error).context("evaluation abandoned"),
        PassOutcome::Blocked { errors } => {
            for e in &errors {
                eprintln!("error: {e}");
            }
            anyhow::bail!("{} compilation error(s)", errors.len());
        }
    }

    let out = serde_json::to_string_pretty(&store).context("serialize property values")?;
    println!("{out}");
    Ok(())
}

fn cmd_deps(args: DepsArgs) -> anyhow::Result<()> {
    let (project, id) = load(&args.project)?;
    let comp = composition(&project, &id)?;

    let deps =
        flowgraph::property_dependencies(comp, &project.graphs, &PropertyId::new(args.property))?;
    let out = serde_json::to_string_pretty(&deps).context("serialize dependencies")?;
    println!("{out}");
    Ok(())
}
