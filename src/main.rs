use anyhow::Result;
use app_sizer::cli::{Cli, OutputFormat};
use app_sizer::{
    CsvReportWriter, DatabaseReportWriter, JsonCatalogSource, JsonReportWriter, ReportKind,
    ReportWriter, Scope, SizeAnalyzer, SizerConfig, TeamMapping,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let mut config = match &args.config {
        Some(path) => SizerConfig::from_file(path)?,
        None => SizerConfig::default(),
    };
    if let Some(mode) = args.mode {
        config = config.with_size_mode(mode.into());
    }
    if let Some(library) = &args.library {
        config = config.with_library_name(library.as_str());
    }
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }

    let mapping_path = args.team_mapping.as_ref().or(config.team_mapping.as_ref());
    let mapping = match mapping_path {
        Some(path) => TeamMapping::from_file(path)?,
        None => TeamMapping::new(),
    };

    let analyzer = SizeAnalyzer::from_config(JsonCatalogSource::new(&args.catalogs), &config, mapping);

    let kinds: Vec<ReportKind> = if args.reports.is_empty() {
        ReportKind::ALL
            .into_iter()
            .filter(|k| *k != ReportKind::LibContent || config.library_name.is_some())
            .collect()
    } else {
        args.reports.clone()
    };

    let mut writers: Vec<Box<dyn ReportWriter>> = Vec::new();
    if let Some(dir) = &config.output_dir {
        writers.push(Box::new(JsonReportWriter::new(dir)));
        writers.push(Box::new(CsvReportWriter::new(dir)));
    }
    if let Some(db) = &args.db {
        writers.push(Box::new(DatabaseReportWriter::open(db)?));
    }

    for kind in kinds {
        let report = analyzer.analyze(kind)?;

        match args.format {
            OutputFormat::Text => println!("{}", report.to_text()),
            OutputFormat::Json => println!("{}", report.to_json()?),
            OutputFormat::Csv => print!("{}", report.to_csv()?),
        }

        for writer in &writers {
            writer.write(&report)?;
        }
    }

    if args.audit {
        for scope in [Scope::All, Scope::Libraries, Scope::Modules] {
            let audit = analyzer.audit(scope)?;
            let marker = if audit.is_balanced() { "✅" } else { "❌" };
            eprintln!("{} {:?}: {}", marker, scope, audit.summary());
        }
    }

    Ok(())
}
