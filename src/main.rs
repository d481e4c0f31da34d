//! Chronicle RTS CLI
//!
//! Command-line interface for building and inspecting time-series queries:
//! - Render the command a query produces
//! - Decode a JSON-encoded reply into typed records
//! - Generate a default config file

use anyhow::Context;
use chrono::Duration;
use chronicle_rts::command::{Arg, Command, RangeOptions};
use chronicle_rts::reply::{
    decode_data_point, decode_data_points, decode_last_datapoints, decode_time_series_list,
};
use chronicle_rts::{
    AggregationType, Config, DataPoint, DecodeMode, Filter, GetCommand, Label, LabelSelection,
    LoggingConfig, MGetCommand, MRangeCommand, RangeCommand, ReducerType, Reply, Timestamp,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chronicle-rts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build time-series range queries and decode their replies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the command a query renders to
    Render {
        #[command(subcommand)]
        query: QueryArgs,
    },

    /// Decode a JSON-encoded reply
    Decode {
        /// Reply shape
        shape: Shape,
        /// Input file (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Fail on unparsable samples instead of substituting zero
        #[arg(long)]
        strict: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum QueryArgs {
    /// Single-series range (TS.RANGE / TS.REVRANGE)
    Range {
        key: String,
        /// Start: "-", a millisecond epoch or RFC 3339
        from: Timestamp,
        /// End: "+", a millisecond epoch or RFC 3339
        to: Timestamp,
        /// Reverse order
        #[arg(long)]
        rev: bool,
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Multi-series range (TS.MRANGE / TS.MREVRANGE)
    Mrange {
        from: Timestamp,
        to: Timestamp,
        /// Label filter, e.g. region=us or region!=(eu,ap)
        #[arg(long = "filter")]
        filters: Vec<Filter>,
        #[arg(long)]
        rev: bool,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        labels: LabelArgs,
        /// Group series by this label
        #[arg(long, requires = "reduce")]
        group_by: Option<String>,
        /// Reducer applied to each group
        #[arg(long, requires = "group_by")]
        reduce: Option<ReducerType>,
    },

    /// Last sample of one series (TS.GET)
    Get { key: String },

    /// Last sample of matching series (TS.MGET)
    Mget {
        #[arg(long = "filter")]
        filters: Vec<Filter>,
        #[command(flatten)]
        labels: LabelArgs,
    },
}

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Only samples at these millisecond timestamps
    #[arg(long, value_delimiter = ',')]
    filter_ts: Vec<i64>,
    /// Only samples with MIN <= value <= MAX
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    filter_value: Option<Vec<f64>>,
    /// Maximum samples returned
    #[arg(long)]
    count: Option<i64>,
    /// Bucket alignment
    #[arg(long)]
    align: Option<Timestamp>,
    /// Aggregation type (avg, sum, min, max, range, count, first, last,
    /// std.p, std.s, var.p, var.s, twa)
    #[arg(long, requires = "bucket")]
    aggregation: Option<AggregationType>,
    /// Bucket width: 500ms, 10s, 5m, 1h, 1d or plain milliseconds
    #[arg(long, requires = "aggregation", value_parser = parse_bucket)]
    bucket: Option<Duration>,
}

impl RangeArgs {
    fn to_options(&self) -> anyhow::Result<RangeOptions> {
        let mut options = RangeOptions::default();

        let timestamps = self
            .filter_ts
            .iter()
            .map(|ms| {
                chrono::DateTime::from_timestamp_millis(*ms)
                    .with_context(|| format!("Timestamp out of range: {}", ms))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        options.set_ts_filter(timestamps);

        if let Some([min, max]) = self.filter_value.as_deref() {
            options.set_value_filter(*min, *max);
        }
        if let Some(count) = self.count {
            options.set_count(count);
        }
        if let Some(align) = self.align {
            options.set_align(align);
        }
        if let (Some(kind), Some(bucket)) = (self.aggregation, self.bucket) {
            options.set_aggregation(kind, bucket);
        }

        Ok(options)
    }
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Return every label
    #[arg(long, conflicts_with = "selected_labels")]
    with_labels: bool,
    /// Return only these labels (comma-separated)
    #[arg(long, value_delimiter = ',')]
    selected_labels: Vec<String>,
}

impl LabelArgs {
    fn selection(&self) -> LabelSelection {
        if self.with_labels {
            LabelSelection::All
        } else if !self.selected_labels.is_empty() {
            LabelSelection::Only(self.selected_labels.clone())
        } else {
            LabelSelection::Unset
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Shape {
    Range,
    Mrange,
    Get,
    Mget,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Render { query } => {
            let (name, args) = render(query)?;
            tracing::debug!(command = name, args = args.len(), "Rendered query");

            match cli.format.as_str() {
                "json" => {
                    let args: Vec<serde_json::Value> = args.iter().map(arg_to_json).collect();
                    let body = serde_json::json!({ "command": name, "args": args });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                _ => {
                    let line: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    println!("{} {}", name, line.join(" "));
                }
            }
        }

        Commands::Decode {
            shape,
            input,
            strict,
        } => {
            let text = match &input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {:?}", path))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let value: serde_json::Value =
                serde_json::from_str(&text).context("Reply is not valid JSON")?;
            let reply = Reply::from(value);
            let mode = if strict {
                DecodeMode::Strict
            } else {
                config.client.decode_mode
            };
            tracing::debug!(shape = ?shape, mode = %mode, "Decoding reply");

            decode(shape, reply, mode, &cli.format)?;
        }

        Commands::Config { output } => {
            let config = chronicle_rts::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("chronicle_rts={}", config.level))
    });

    // stdout carries command output, so logs go to stderr or a file
    let writer = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .init();
    }

    Ok(())
}

fn render(query: QueryArgs) -> anyhow::Result<(&'static str, Vec<Arg>)> {
    Ok(match query {
        QueryArgs::Range {
            key,
            from,
            to,
            rev,
            range,
        } => {
            let cmd = if rev {
                RangeCommand::rev_range(key, from, to)
            } else {
                RangeCommand::range(key, from, to)
            }
            .with_options(range.to_options()?);
            (cmd.name(), cmd.args())
        }

        QueryArgs::Mrange {
            from,
            to,
            filters,
            rev,
            range,
            labels,
            group_by,
            reduce,
        } => {
            let mut cmd = if rev {
                MRangeCommand::mrev_range(from, to, filters)
            } else {
                MRangeCommand::mrange(from, to, filters)
            }
            .with_options(range.to_options()?)
            .labels(labels.selection());

            if let (Some(label), Some(reducer)) = (group_by, reduce) {
                cmd = cmd.group_by(label, reducer);
            }
            (cmd.name(), cmd.args())
        }

        QueryArgs::Get { key } => {
            let cmd = GetCommand::new(key);
            (cmd.name(), cmd.args())
        }

        QueryArgs::Mget { filters, labels } => {
            let cmd = MGetCommand::new(filters).labels(labels.selection());
            (cmd.name(), cmd.args())
        }
    })
}

fn decode(shape: Shape, reply: Reply, mode: DecodeMode, format: &str) -> anyhow::Result<()> {
    let json = format == "json";

    match shape {
        Shape::Range => {
            let points = decode_data_points(reply, mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                print_points(&points);
            }
        }
        Shape::Get => {
            let point = decode_data_point(reply, mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&point)?);
            } else {
                print_points(&[point]);
            }
        }
        Shape::Mrange => {
            let series = decode_time_series_list(reply, mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else if series.is_empty() {
                println!("No series");
            } else {
                for s in &series {
                    println!("{} {}", s.key, format_labels(&s.labels));
                    print_points(&s.data_points);
                    println!();
                }
            }
        }
        Shape::Mget => {
            let latest = decode_last_datapoints(reply, mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&latest)?);
            } else if latest.is_empty() {
                println!("No series");
            } else {
                println!("{:<24} {:<26} {:<12} {}", "Key", "Timestamp", "Value", "Labels");
                println!("{}", "-".repeat(80));
                for last in &latest {
                    println!(
                        "{:<24} {:<26} {:<12} {}",
                        last.key,
                        format_timestamp(&last.data_point),
                        last.data_point.value,
                        format_labels(&last.labels)
                    );
                }
            }
        }
    }

    Ok(())
}

fn parse_bucket(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    let (amount, unit): (&str, fn(i64) -> Option<Duration>) =
        if let Some(ms) = s.strip_suffix("ms") {
            (ms, Duration::try_milliseconds)
        } else if let Some(secs) = s.strip_suffix('s') {
            (secs, Duration::try_seconds)
        } else if let Some(mins) = s.strip_suffix('m') {
            (mins, Duration::try_minutes)
        } else if let Some(hours) = s.strip_suffix('h') {
            (hours, Duration::try_hours)
        } else if let Some(days) = s.strip_suffix('d') {
            (days, Duration::try_days)
        } else {
            (s.as_str(), Duration::try_milliseconds)
        };

    amount
        .parse::<i64>()
        .ok()
        .and_then(unit)
        .ok_or_else(|| format!("Invalid bucket: {}. Use: 500ms, 10s, 5m, 1h, 1d", s))
}

fn arg_to_json(arg: &Arg) -> serde_json::Value {
    match arg {
        Arg::Str(s) => serde_json::Value::from(s.as_str()),
        Arg::Int(n) => serde_json::Value::from(*n),
        Arg::Float(n) => serde_json::Value::from(*n),
    }
}

fn format_timestamp(point: &DataPoint) -> String {
    point.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn format_labels(labels: &[Label]) -> String {
    let pairs: Vec<String> = labels
        .iter()
        .map(|l| format!("{}={}", l.name, l.value))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}

fn print_points(points: &[DataPoint]) {
    if points.is_empty() {
        println!("No samples");
        return;
    }

    println!("{:<26} {:<15} {}", "Timestamp", "Epoch (ms)", "Value");
    println!("{}", "-".repeat(56));

    for point in points {
        println!(
            "{:<26} {:<15} {}",
            format_timestamp(point),
            point.timestamp_millis(),
            point.value
        );
    }
}
