use anyhow::{bail, Context, Result};
use clap::Parser;
use filterchart::data::{DataFormat, TableData};
use filterchart::parser::{parse_selection, SelectionExpr};
use filterchart::{ChartConfig, ChartSession, SelectionUpdate, ViewState};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filterchart")]
#[command(about = "Slice an indicator dataset into bar chart data with error bars", long_about = None)]
struct Args {
    /// Chart configuration (filters, indicators, optional selections) as JSON
    #[arg(long)]
    config: PathBuf,

    /// Row data as CSV or JSON; read from stdin when omitted
    #[arg(long)]
    data: Option<PathBuf>,

    /// Data format, guessed from the file extension when omitted (stdin defaults to csv)
    #[arg(long)]
    format: Option<DataFormat>,

    /// Indicator id
    #[arg(long)]
    indicator: Option<String>,

    /// Filter id shown on the x axis
    #[arg(long = "x-axis")]
    x_axis: Option<String>,

    /// Filter id used to split bars into series
    #[arg(long = "disaggregate-by")]
    disaggregate_by: Option<String>,

    /// Filter selection, e.g. 'sex=female,male' (repeatable, 'sex=' selects nothing)
    #[arg(long = "select", value_parser = parse_select_arg)]
    select: Vec<SelectionExpr>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Debug logging (otherwise RUST_LOG, default warn)
    #[arg(short, long)]
    verbose: bool,
}

fn parse_select_arg(input: &str) -> std::result::Result<SelectionExpr, String> {
    parse_selection(input).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = ChartConfig::load(&args.config)?;
    let table = TableData::load(args.data.as_deref(), args.format)
        .context("Failed to read row data")?;
    info!(rows = table.rows.len(), "Loaded data");

    let mut session = ChartSession::new(table.rows, config);
    session.initialise();

    if let Some(indicator) = args.indicator {
        session.apply(SelectionUpdate::IndicatorId(indicator));
    }
    if let Some(x_axis) = args.x_axis {
        session.apply(SelectionUpdate::XAxisId(x_axis));
    }
    if let Some(disaggregate_by) = args.disaggregate_by {
        session.apply(SelectionUpdate::DisaggregateById(disaggregate_by));
    }
    for expr in &args.select {
        session
            .select_options(&expr.filter_id, &expr.option_ids)
            .with_context(|| format!("Invalid selection for filter '{}'", expr.filter_id))?;
    }

    let view = match session.state() {
        ViewState::Ready(view) => view,
        ViewState::Failed(err) => return Err(err.clone()).context("Failed to build chart"),
        ViewState::Uninitialised => {
            bail!("Selections are incomplete: the config needs at least one indicator and one filter")
        }
    };
    info!(
        datasets = view.chart_data.datasets.len(),
        max = view.chart_data.max_value_plus_error,
        "Chart ready"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(view)
    } else {
        serde_json::to_string(view)
    }
    .context("Failed to serialize chart")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write chart to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
