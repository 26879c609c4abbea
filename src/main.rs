use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

mod aggregate;
mod config;
mod console;
mod datetime;
mod entry_command;
mod error;
mod export_command;
mod logging;
mod project;
mod project_command;
mod rate_command;
mod report;
mod store;
mod time_entry;
mod xlsx;

use config::Config;
use console::{ConsoleMarkdown, ConsolePresenter};
use entry_command::{EntryAction, EntryArgs, EntryCommand};
use export_command::{ExportArgs, ExportCommand, PreviewArgs};
use project_command::{ProjectAction, ProjectArgs, ProjectCommand};
use rate_command::{RateAction, RateArgs, RateCommand};
use store::JsonFileStore;

/// 工数を記録し、プロジェクトごとの帳票を出力するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- project new 工地A
/// $ cargo run -- entry add 工地A -d 2024-05-01 -w 粤A12345 -s 09:00:00 -e 17:00:00 -r 20
/// $ cargo run -- export 工地A
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    subcommand: SubCommands,

    #[clap(
        long = "data-dir",
        global = true,
        help = "Directory holding projects.json and rate_settings.json",
        parse(from_os_str)
    )]
    data_dir: Option<PathBuf>,

    #[clap(
        long = "output-dir",
        global = true,
        help = "Directory the reports are written to",
        parse(from_os_str)
    )]
    output_dir: Option<PathBuf>,

    #[clap(
        short = 'v',
        long = "verbose",
        global = true,
        help = "Increases log verbosity",
        parse(from_occurrences)
    )]
    verbose: u64,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Manage projects
    Project(ProjectArgs),
    /// Add or edit time entries
    Entry(EntryArgs),
    /// Manage rate presets
    Rate(RateArgs),
    /// Show the entries that would be exported
    Preview(PreviewArgs),
    /// Export spreadsheet reports
    Export(ExportArgs),
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(args.data_dir, args.output_dir);

    if let Err(err) = logging::init(args.verbose, Some(&config.log_file())) {
        logging::init(args.verbose, None)?;
        warn!("Logging to file is disabled: {:#}", err);
    }
    info!("Data directory: {}", config.data_dir.display());

    let store = JsonFileStore::new(&config.data_dir);
    let mut stdout = io::stdout();
    let mut presenter = ConsoleMarkdown::new(&mut stdout);

    match args.subcommand {
        SubCommands::Project(project) => {
            let command = ProjectCommand::new(&store);
            match project.action {
                ProjectAction::New { name } => {
                    let name = command.create(&name)?;
                    println!("Project created: {}", name);
                }
                ProjectAction::List => presenter.show_projects(&command.list())?,
                ProjectAction::Dates(dates) => command.set_dates(dates)?,
                ProjectAction::Show { name } => {
                    let (project, totals) = command.show(&name)?;
                    presenter.show_project(&name, &project, &totals)?;
                }
            }
        }
        SubCommands::Entry(entry) => {
            let command = EntryCommand::new(&store);
            match entry.action {
                EntryAction::Add(add) => {
                    let index = command.add(add)?;
                    println!("Entry added: {}", index);
                }
                EntryAction::Edit(edit) => command.edit(edit)?,
            }
        }
        SubCommands::Rate(rate) => {
            let command = RateCommand::new(&store);
            match rate.action {
                RateAction::List => presenter.show_rates(&command.list())?,
                RateAction::Set { name, rate } => command.set(&name, rate)?,
                RateAction::Update {
                    old_name,
                    new_name,
                    rate,
                } => command.update(&old_name, &new_name, rate)?,
                RateAction::Remove { name } => command.remove(&name)?,
                RateAction::Apply { project, name } => {
                    if !command.apply(&project, &name)? {
                        println!("No entries in {}", project);
                    }
                }
            }
        }
        SubCommands::Preview(preview) => {
            let command = ExportCommand::new(&store, &config.output_dir);
            presenter.show_preview(&command.preview(preview)?)?;
        }
        SubCommands::Export(export) => {
            let command = ExportCommand::new(&store, &config.output_dir);
            for path in command.run(export)? {
                println!("Report generated: {}", path.display());
            }
        }
    }

    Ok(())
}
