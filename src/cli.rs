use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docfill")]
#[command(version)]
#[command(about = "Fill %%PLACEHOLDER%% fields in a docx from a key,value lookup file", long_about = None)]
#[command(after_help = "Examples:\n  \
  docfill letter.docx database.txt out.docx      fill letter.docx using database.txt\n  \
  docfill -t work letter.docx db.txt out.docx    stage the unpacked tree in ./work\n  \
  docfill -k letter.docx db.txt out.docx         keep the staging tree for inspection")]
pub struct Cli {
    /// Input docx archive
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Lookup file (KEY,VALUE per line)
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,

    /// Output docx archive
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Staging directory for the unpacked tree
    #[arg(short = 't', long = "temp-dir", value_name = "DIR", default_value = "docfill-staging")]
    pub temp_dir: PathBuf,

    /// Keep the staging tree after a successful run
    #[arg(short = 'k', long = "keep-tree")]
    pub keep_tree: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
