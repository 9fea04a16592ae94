use std::process::ExitCode;

use env_logger::{Builder, Env};
use paux_raster::{DatasetReport, OpenOptions, PauxDriver};

fn usage() -> ExitCode {
    eprintln!("Usage: paux-info <path> [--json]");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let mut path = None;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            "-h" | "--help" => return usage(),
            _ if path.is_none() => path = Some(arg),
            _ => return usage(),
        }
    }
    let Some(path) = path else {
        return usage();
    };

    let driver = PauxDriver::new();
    let dataset = match driver.open(&path, &OpenOptions::new()) {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let report = DatasetReport::from_dataset(&dataset);
    if json {
        match report.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report);
    }

    if let Err(e) = dataset.close() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
