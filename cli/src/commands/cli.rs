use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use condabridge_core::ops::{ExportFormat, Operation};

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum ExportFormatArg {
    /// YAML environment file.
    Structured,
    /// One package pin per line.
    Flat,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Structured => ExportFormat::Structured,
            ExportFormatArg::Flat => ExportFormat::Flat,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "condabridge",
    about = "Line-protocol backend driving conda for a host frontend"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe conda availability and report tool metadata.
    Probe,
    /// List environments, enriched with their Python versions.
    EnvList,
    /// List packages installed in an environment.
    PkgList(PkgListArgs),
    /// Create a new environment.
    EnvCreate(EnvCreateArgs),
    /// Remove an environment by prefix.
    EnvRemove(EnvRemoveArgs),
    /// Rename an environment (clone, then remove the original).
    EnvRename(EnvRenameArgs),
    /// Export an environment specification to a file.
    EnvExport(EnvExportArgs),
    /// Create an environment from an exported file.
    EnvImport(EnvImportArgs),
    /// Clone an environment under a new name.
    EnvClone(EnvCloneArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PkgListArgs {
    /// Path of the environment to inspect.
    #[arg(long)]
    pub prefix: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnvCreateArgs {
    #[arg(long)]
    pub name: String,

    /// Python version spec for the new environment, e.g. "3.11".
    #[arg(long)]
    pub python: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnvRemoveArgs {
    /// Path of the environment to remove.
    #[arg(long)]
    pub prefix: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnvRenameArgs {
    #[arg(long)]
    pub old_name: String,

    #[arg(long)]
    pub new_name: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnvExportArgs {
    #[arg(long)]
    pub name: String,

    /// Destination file for the exported specification.
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormatArg::Structured)]
    pub format: ExportFormatArg,

    /// Drop build tags (and, for flat exports, comment lines).
    #[arg(long, default_value_t = false)]
    pub no_build: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnvImportArgs {
    /// Exported specification to create the environment from.
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long)]
    pub name: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnvCloneArgs {
    #[arg(long)]
    pub source: String,

    #[arg(long)]
    pub dest: String,
}

impl Commands {
    pub fn into_operation(self) -> Operation {
        match self {
            Commands::Probe => Operation::Probe,
            Commands::EnvList => Operation::EnvList,
            Commands::PkgList(a) => Operation::PkgList { prefix: a.prefix },
            Commands::EnvCreate(a) => Operation::EnvCreate {
                name: a.name,
                python: a.python,
            },
            Commands::EnvRemove(a) => Operation::EnvRemove { prefix: a.prefix },
            Commands::EnvRename(a) => Operation::EnvRename {
                old_name: a.old_name,
                new_name: a.new_name,
            },
            Commands::EnvExport(a) => Operation::EnvExport {
                name: a.name,
                file: a.file,
                format: a.format.into(),
                no_build: a.no_build,
            },
            Commands::EnvImport(a) => Operation::EnvImport {
                file: a.file,
                name: a.name,
            },
            Commands::EnvClone(a) => Operation::EnvClone {
                source: a.source,
                dest: a.dest,
            },
        }
    }
}
