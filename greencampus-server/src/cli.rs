use clap::{Args, Parser, Subcommand};

pub mod leaderboard;
pub mod refresh_badges;
pub mod seed;
pub mod server;

#[derive(Parser, Debug)]
#[clap(author, version, about = "GreenCampus mission validation backend", long_about = None)]
pub struct AppCli {
    #[clap(subcommand)]
    pub command: Command,
    /// Overrides DATABASE_URL
    #[clap(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Server(ServerCli),
    /// Reload the mission catalog and the demo users
    Seed(SeedCli),
    /// Print the user leaderboard
    Leaderboard(LeaderboardCli),
    /// Print the campus leaderboard
    Campuses,
    /// Re-evaluate badge eligibility of every user
    RefreshBadges,
}

#[derive(Args, Debug)]
pub struct ServerCli {
    /// Overrides LISTEN_ON
    #[clap(long, short = 'l')]
    pub listen_on: Option<std::net::SocketAddr>,
    /// Do not seed the database at startup
    #[clap(long)]
    pub no_seed: bool,
}

#[derive(Args, Debug)]
pub struct SeedCli {
    /// Only reload the mission catalog
    #[clap(long)]
    pub missions_only: bool,
}

#[derive(Args, Debug)]
pub struct LeaderboardCli {
    /// Only rank users of this campus
    #[clap(long, short = 'c')]
    pub campus: Option<String>,
    #[clap(long, short = 'n', default_value = "10")]
    pub limit: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    pub fn test_cli_parses() {
        let cli = AppCli::parse_from(["greencampus", "leaderboard", "--campus", "Lyon Campus"]);
        match cli.command {
            Command::Leaderboard(args) => {
                assert_eq!(Some("Lyon Campus".to_string()), args.campus);
                assert_eq!(10, args.limit);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = AppCli::parse_from(["greencampus", "server", "--no-seed", "--database-url", "sqlite::memory:"]);
        assert!(matches!(cli.command, Command::Server(ServerCli { no_seed: true, .. })));
        assert_eq!(Some("sqlite::memory:".to_string()), cli.database_url);

        let cli = AppCli::parse_from(["greencampus", "refresh-badges"]);
        assert!(matches!(cli.command, Command::RefreshBadges));
    }
}
