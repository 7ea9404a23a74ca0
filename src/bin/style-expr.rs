use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use style_expr::{
    CompileResult, CompiledExpression, EvalStack, EvaluationContext, Feature, Type, Value,
};

#[derive(Parser, Debug)]
#[command(name = "style-expr", version)]
struct Cli {
    /// Log compile and evaluation events to stderr.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile an expression and report its type and dependence.
    Check(CheckArgs),
    /// Evaluate an expression against one or many features.
    Eval(EvalArgs),
}

#[derive(Parser, Debug)]
struct ExprArgs {
    /// Expression JSON, or `@path` to read it from a file.
    #[arg(long)]
    expr: String,

    /// Expected result type, e.g. `number`, `color`, `array<number, 2>`.
    #[arg(long = "type")]
    expected: Option<Type>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    expr: ExprArgs,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    #[command(flatten)]
    expr: ExprArgs,

    /// Zoom level.
    #[arg(long, default_value_t = 0.0)]
    zoom: f64,

    /// JSON file holding one feature.
    #[arg(long, conflicts_with = "features")]
    feature: Option<PathBuf>,

    /// JSON file holding an array of features, evaluated in parallel.
    #[arg(long)]
    features: Option<PathBuf>,

    /// JSON file holding a feature-state object.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Eval(args) => cmd_eval(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let input = read_expr(&args.expr.expr)?;
    match style_expr::compile(&input, args.expr.expected.as_ref()) {
        CompileResult::Success(c) => {
            if args.json {
                let report = serde_json::json!({
                    "type": c.ty(),
                    "zoom_constant": c.is_zoom_constant(),
                    "feature_constant": c.is_feature_constant(),
                    "expression": c.expression().to_json(),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("type: {}", c.ty());
                println!("zoom-constant: {}", c.is_zoom_constant());
                println!("feature-constant: {}", c.is_feature_constant());
            }
            Ok(())
        }
        CompileResult::Failure(errors) => {
            if args.json {
                let report = serde_json::json!({ "errors": errors });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for e in &errors {
                    eprintln!("{e}");
                }
            }
            anyhow::bail!("expression rejected with {} error(s)", errors.len())
        }
    }
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let input = read_expr(&args.expr.expr)?;
    let compiled = style_expr::compile(&input, args.expr.expected.as_ref())
        .into_result()
        .context("compile expression")?;

    let state: Option<BTreeMap<String, Value>> =
        args.state.as_deref().map(read_json).transpose()?;

    if let Some(path) = &args.features {
        let features: Vec<Feature> = read_json(path)?;
        if let Some(threads) = args.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("configure rayon thread pool")?;
        }
        let results: Vec<serde_json::Value> = features
            .par_iter()
            .map_init(EvalStack::new, |stack, f| {
                let mut ctx = EvaluationContext::new(args.zoom, f);
                ctx.state = state.as_ref();
                report(&compiled, &ctx, stack)
            })
            .collect();
        for r in results {
            println!("{r}");
        }
        return Ok(());
    }

    let feature: Feature = match &args.feature {
        Some(path) => read_json(path)?,
        None => Feature::default(),
    };
    let mut ctx = EvaluationContext::new(args.zoom, &feature);
    ctx.state = state.as_ref();
    println!("{}", report(&compiled, &ctx, &mut EvalStack::new()));
    Ok(())
}

fn report(
    compiled: &CompiledExpression,
    ctx: &EvaluationContext<'_>,
    stack: &mut EvalStack,
) -> serde_json::Value {
    match compiled.evaluate_with_stack(ctx, stack) {
        Ok(v) => v.to_json(),
        Err(e) => serde_json::json!({ "error": e }),
    }
}

fn read_expr(raw: &str) -> anyhow::Result<serde_json::Value> {
    match raw.strip_prefix('@') {
        Some(path) => read_json(Path::new(path)),
        None => serde_json::from_str(raw).context("parse expression JSON"),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse JSON '{}'", path.display()))
}
