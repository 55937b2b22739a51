use redlay::engine::{Engine, RunOptions};
use redlay::table::FsResolver;

use anyhow::{bail, Result};
use yansi::Paint;

use std::path::Path;

fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let Some(filepath) = args.next() else {
        bail!("usage: redlay <layout.rl>");
    };

    let path = Path::new(&filepath);
    let root = path.parent().unwrap_or(Path::new("."));
    let Some(entry) = path.file_name() else {
        bail!("'{}' is not a file path", filepath);
    };

    let resolver = FsResolver::new(root);
    let engine = Engine::new(&resolver);
    let report = engine.run(&RunOptions::new(entry.to_string_lossy()));

    report.diagnostics.print();

    if let Some(placement) = &report.placement {
        println!("{}", format!("{} placements", placement.len()).bold());
        for entry in placement {
            let facing = entry
                .facing
                .map(|f| format!(" facing {}", f))
                .unwrap_or_default();
            println!(
                "  {:>4}  {:<16} {}{}  power {}",
                entry.id,
                entry.element.name(),
                entry.position,
                facing,
                entry.power
            );
        }
    }

    if report.has_errors() {
        eprintln!("{}", "validation failed".red().bold());
        std::process::exit(1);
    }
    println!("{}", "ok".green().bold());
    Ok(())
}

fn init_logging() {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let level = std::env::var("LEVEL").unwrap_or_default().to_string();
    if level == "DEBUG" {
        dispatch = dispatch.level(log::LevelFilter::Debug);
    } else {
        dispatch = dispatch.level(log::LevelFilter::Warn);
    }

    dispatch.apply().unwrap_or(());
}
