pub mod auto;
pub mod multi;
pub mod passive;
pub mod router;
pub mod sweep;
pub mod trace;

use clap::{Parser, Subcommand};

use hopmap_common::config::DiscoveryConfig;

#[derive(Parser)]
#[command(name = "hopmap")]
#[command(about = "Automatic network topology discovery.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Candidate community strings for router queries, in preference order
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub communities: Option<Vec<String>>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover the whole reachable topology with zero configuration
    #[command(alias = "a")]
    Auto,
    /// Sweep one subnet, given as CIDR (bare addresses sweep the /24)
    #[command(alias = "s")]
    Sweep { cidr: String },
    /// Harvest the tables of a single router
    #[command(alias = "r")]
    Router {
        address: String,
        /// Known community string; when absent the candidate list is tried
        #[arg(short = 'C', long)]
        community: Option<String>,
    },
    /// Trace the path to a target address
    #[command(alias = "t")]
    Trace { target: String },
    /// Sweep the local subnet plus the subnets around upstream hops
    #[command(alias = "m")]
    Multi,
    /// Read the local kernel tables without sending any probe
    #[command(alias = "p")]
    Passive,
}

impl CommandLine {
    pub fn config(&self) -> DiscoveryConfig {
        let mut config = DiscoveryConfig::default();
        if let Some(communities) = &self.communities {
            config.communities = communities.clone();
        }
        config
    }
}
