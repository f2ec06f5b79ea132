use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ramas::taxonomy::BucketPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "ramas",
    version,
    about = "Category tree builder and article rama assignment"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and validate the category tree, then write the flat exports.
    Tree(TreeArgs),
    /// List the selectable ramas per gender.
    Options(OptionsArgs),
    /// Assign articles to ramas and write the assignment exports.
    Assign(AssignArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum BucketPolicyArg {
    Exclusive,
    Independent,
}

impl BucketPolicyArg {
    pub fn as_policy(self) -> BucketPolicy {
        match self {
            Self::Exclusive => BucketPolicy::Exclusive,
            Self::Independent => BucketPolicy::Independent,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    #[arg(long)]
    pub categories: PathBuf,

    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OptionsArgs {
    #[arg(long)]
    pub categories: PathBuf,

    /// Free-text gender; classified the same way article values are.
    #[arg(long)]
    pub genero: Option<String>,

    #[arg(long, value_enum, default_value_t = BucketPolicyArg::Exclusive)]
    pub bucket_policy: BucketPolicyArg,
}

#[derive(Args, Debug, Clone)]
pub struct AssignArgs {
    #[arg(long)]
    pub categories: PathBuf,

    #[arg(long)]
    pub articles: PathBuf,

    /// `CODIGO=RAMA`, repeatable.
    #[arg(long = "assign")]
    pub assignments: Vec<String>,

    /// Tabular file with `codigo` and `rama` columns.
    #[arg(long)]
    pub assignments_file: Option<PathBuf>,

    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long, default_value = "out")]
    pub out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = BucketPolicyArg::Exclusive)]
    pub bucket_policy: BucketPolicyArg,
}
