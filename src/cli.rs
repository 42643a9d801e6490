use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "movie-list-sync")]
#[command(about = "Keep a TMDB list in sync with a scraped feed of movie titles")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add every movie currently in the feed to the TMDB list
    Sync,

    /// Start the TMDB authentication process
    Auth,

    /// Add a single movie to the cache and to the TMDB list
    Add {
        /// TMDB id, or an IMDb id such as tt0110912
        id: String,

        /// Title as it appears in the feed
        title: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["movie-list-sync", "add", "tt0110912", "Pulp Fiction"]).unwrap();
        match cli.command {
            Command::Add { id, title } => {
                assert_eq!(id, "tt0110912");
                assert_eq!(title.as_deref(), Some("Pulp Fiction"));
            }
            _ => panic!("expected add"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["movie-list-sync", "sync", "-v"]).unwrap();
        assert!(matches!(cli.command, Command::Sync));
        assert!(cli.verbose);
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["movie-list-sync"]).is_err());
    }
}
