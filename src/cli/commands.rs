use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "osabridge")]
#[command(author, version, about = "Notes, Calendar and Contacts as MCP tools", long_about = None)]
pub struct Cli {
    /// Configuration file, overriding config/<CONFIG_ENV>
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the tools over MCP on stdin/stdout
    Serve,

    /// List the available tools and their parameters
    Tools {
        /// Print the MCP JSON schema instead of text
        #[arg(long)]
        json: bool,
    },

    /// Call a single tool and print its result
    Call {
        tool: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
}
