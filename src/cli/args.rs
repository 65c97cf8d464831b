//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the standard lookup
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sso-bridge - Automatic sign-in behind an OAuth2 proxy
#[derive(Parser, Debug)]
#[command(name = "sso-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file to use
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; only warnings are logged
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report whether the credential store holds a usable token
    #[command(
        name = "probe",
        long_about = "Report whether the credential store holds a usable token.\n\n\
            Reads the credential record the way the login coordinator does: the \
            first server's first user must carry a non-empty access token. A \
            missing or malformed record reads as signed out.",
        after_help = "\
EXAMPLES:
    # Check the configured store
    sso-bridge probe

    # Check a specific store file
    sso-bridge probe --store ./storage.json"
    )]
    Probe {
        /// Store file to read instead of the configured one
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,
    },

    /// Query the session-status endpoint
    #[command(
        name = "status",
        long_about = "Query the identity provider's session-status endpoint.\n\n\
            200 means authenticated, 401 means unauthenticated; anything else, \
            including a failed request, is inconclusive.",
        after_help = "\
EXAMPLES:
    sso-bridge status --base-url https://media.example.com"
    )]
    Status {
        /// Base URL the endpoint path is appended to
        #[arg(long, value_name = "URL")]
        base_url: String,
    },

    /// Run the login coordinator headlessly against a server
    #[command(
        name = "login",
        long_about = "Run the full login coordinator against a media server.\n\n\
            Every trigger is registered as it would be in a page. The command \
            waits until the gate reaches a terminal state or the timeout \
            expires, then prints the final state and every navigation the \
            coordinator performed.",
        after_help = "\
EXAMPLES:
    # Sign in with the configured credential pair
    sso-bridge login --server http://media.local:8096

    # Start from the manual login route and prompt for the secret
    sso-bridge login --server http://media.local:8096 \\
        --route '#!/startup/manuallogin' --prompt-secret"
    )]
    Login {
        /// Media server base URL
        #[arg(long, value_name = "URL")]
        server: String,

        /// Route fragment the headless page starts at
        #[arg(long, default_value = "#!/")]
        route: String,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Read the secret from the terminal instead of the config file
        #[arg(long)]
        prompt_secret: bool,

        /// Store file to use instead of the configured one
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,
    },

    /// Clear cached credentials and the session flag
    #[command(
        name = "logout",
        long_about = "Clear cached credentials and the session flag.\n\n\
            Performs the same clear a rewritten sign-out control does: every \
            server keeps its identity but loses its users and tokens."
    )]
    Logout {
        /// Store file to clear instead of the configured one
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,
    },

    /// Show the effective configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash (add to ~/.bashrc)
    sso-bridge completion bash >> ~/.bashrc

    # Zsh
    sso-bridge completion zsh > ~/.zfunc/_sso-bridge"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration (secret redacted)
    Show,
    /// Print the path of the configuration file in use
    Path,
}

/// Shells for completion generation
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
