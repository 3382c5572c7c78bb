use std::path::PathBuf;

use anyhow::{Result, Context as _, bail};
use clap::Parser as ClapParser;
use lazyhtml::{att, dump, Context, HtmlAllocator, RecordList, RenderConfig, Renderer, Value};
use serde_json::Value as JsonValue;


#[derive(clap::Parser, Debug)]
/// Render a JSON array of records as an HTML table.
struct Args {
    /// Path to a file holding a JSON array of objects
    #[clap(required(true))]
    data: PathBuf,

    /// The columns to show, comma separated (default: the keys of
    /// the first record)
    #[clap(long)]
    columns: Option<String>,

    /// Swap rows and columns
    #[clap(long)]
    pivot: bool,

    /// With --pivot, how many of the resulting rows go into the table
    /// head
    #[clap(long, default_value = "0")]
    header_rows: usize,

    /// Classes to cycle over the body rows, e.g. "odd,even"
    #[clap(long)]
    stripe: Option<String>,

    #[clap(long)]
    caption: Option<String>,

    /// Put newlines after block elements
    #[clap(long)]
    readable: bool,

    /// Show the records as nested tables instead
    #[clap(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let s = std::fs::read_to_string(&args.data)
        .with_context(|| format!("reading {:?}", args.data))?;
    let records: Vec<JsonValue> = serde_json::from_str(&s)
        .with_context(|| format!("parsing {:?}: expecting a JSON array", args.data))?;

    let html = HtmlAllocator::try_new(100_000)?;
    let mut config = RenderConfig::from_env()?;
    if args.readable {
        config = config.readable();
    }

    if args.dump {
        let table = dump(&html, &Value::from(JsonValue::Array(records)))?;
        println!("{}", Renderer::new(&html).with_config(config).render(table)?);
        return Ok(());
    }

    let columns: Vec<String> = match &args.columns {
        Some(c) => c.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| ! s.is_empty())
            .collect(),
        None => match records.first() {
            Some(JsonValue::Object(m)) => m.keys().cloned().collect(),
            Some(v) => bail!("records must be JSON objects, got: {v}"),
            None => Vec::new(),
        }
    };

    let table = html.element("table", [att("caption", args.caption.clone()),
                                       att("row_classes", args.stripe.clone())])?;
    html.add_header_row(table, columns.iter().map(Value::from).collect::<Vec<_>>())?;

    let rows = html.named_repeater("row", RecordList::new(records))?;
    let cells = columns.iter()
        .map(|c| html.td([html.field(rows, c.as_str())]).map(Value::from))
        .collect::<Result<Vec<_>>>()?;
    let row = html.add_row(table, cells)?;
    let none = html.tr([html.td([att("colspan", columns.len().max(1)),
                                 "(no records)".into()])?])?;
    html.bind_repeater(row, rows, none, true)?;
    if args.pivot {
        html.set_pivot(table, true, args.header_rows, 0)?;
    }

    let mut ctx = Context::new();
    let out = Renderer::new(&html)
        .with_context(&mut ctx)
        .with_config(config)
        .render(table)?;
    println!("{out}");
    Ok(())
}
