use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "classmark")]
#[command(about = "Resolve plugin entry points, listeners and tasks from compiled classes")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output format (json, terminal)
    #[arg(short, long, default_value = "terminal", global = true)]
    pub format: OutputFormat,

    /// Write output to file
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve manifest facts for a directory of compiled classes
    Analyze {
        /// Class output directory (e.g. build/classes/java/main)
        dir: String,

        /// Module name used in reports (defaults to the directory name)
        #[arg(short, long)]
        module: Option<String>,

        /// Rule file or directory of rule files (defaults to built-in Paper rules)
        #[arg(short, long)]
        rules: Option<String>,

        /// Only report classes whose name starts with this prefix
        #[arg(long)]
        scope: Vec<String>,

        /// Never report classes whose name starts with this prefix
        #[arg(long)]
        exclude: Vec<String>,

        /// The module is a library: a missing entry point is not an error
        #[arg(long)]
        library: bool,

        /// Report abstract classes and interfaces too
        #[arg(long)]
        include_abstract: bool,

        /// Never report nested or anonymous classes
        #[arg(long)]
        skip_nested: bool,

        /// Use this main class instead of detecting one
        #[arg(long = "main", value_name = "CLASS")]
        entry_point: Option<String>,

        /// Use this bootstrapper instead of detecting one
        #[arg(long = "bootstrapper", value_name = "CLASS")]
        bootstrap_hook: Option<String>,

        /// Use this loader instead of detecting one
        #[arg(long, value_name = "CLASS")]
        loader: Option<String>,
    },

    /// Dump the class descriptors found in a directory
    Classes {
        /// Class output directory
        dir: String,
    },

    /// List the active capability rules
    Rules {
        /// Rule file or directory of rule files (defaults to built-in Paper rules)
        #[arg(short, long)]
        rules: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output for machine consumption
    Json,
    /// Human-readable terminal output
    Terminal,
}
