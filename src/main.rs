use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use soundsmith::catalog::{CandidateCriteria, CatalogGateway, JsonCatalog, SpotifyGateway};
use soundsmith::classifier::{EmotionClassifier, EmotionModel, HuggingFaceModel, StaticModel};
use soundsmith::client::SpotifyClient;
use soundsmith::config::{Config, load_config};
use soundsmith::playlist::{AssembledPlaylist, EngineConfig, MoodPlaylistGenerator, PlaylistRequest};

#[derive(Parser)]
#[command(name = "soundsmith")]
#[command(about = "Mood-driven playlist generator for Spotify")]
#[command(version)]
struct Cli {
    /// Quiet mode - reduce output verbosity
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a playlist from a mood description
    Generate(GenerateArgs),
    /// Import a Spotify playlist with its audio features into the local catalog
    Import {
        /// Playlist URL, URI or id
        #[arg(short = 'p', long = "playlist")]
        playlist: String,

        /// Catalog file to write (defaults to CATALOG_PATH)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Check that Spotify credentials work
    Ping,
}

#[derive(Args)]
struct GenerateArgs {
    /// Free-text keywords describing the mood
    #[arg(short = 't', long = "text", default_value = "")]
    text: String,

    /// Mood hint such as happy, sad, chill or hype
    #[arg(short = 'm', long = "mood")]
    mood: Option<String>,

    /// Number of tracks in the playlist
    #[arg(short = 'l', long = "length")]
    length: Option<usize>,

    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    #[arg(long = "description")]
    description: Option<String>,

    /// Take candidates from this Spotify playlist instead of the local catalog
    #[arg(short = 'p', long = "playlist")]
    playlist: Option<String>,

    /// Engine tuning JSON (label table, hints, projection weights)
    #[arg(short = 'c', long = "engine-config")]
    engine_config: Option<String>,

    /// Use fixed `{label: score}` emotions from a file instead of the inference endpoint
    #[arg(long = "emotions")]
    emotions: Option<String>,

    /// Write the classifier output to this file
    #[arg(long = "emotions-out")]
    emotions_out: Option<PathBuf>,

    /// Enable debug mode - print playlist details to stdout instead of uploading
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "soundsmith=warn" } else { "soundsmith=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config().context("Failed to load configuration")?;

    match cli.command {
        Command::Generate(args) => {
            let engine = match &args.engine_config {
                Some(path) => EngineConfig::load_from_file(path)
                    .with_context(|| format!("Failed to load engine configuration '{path}'"))?,
                None => EngineConfig::default(),
            };
            let engine = Arc::new(engine);

            match &args.emotions {
                Some(path) => {
                    let model = StaticModel::load_from_file(path)
                        .with_context(|| format!("Failed to load emotions '{path}'"))?;
                    run_generate(&args, &config, model, engine, cli.quiet)
                }
                None => {
                    let model = HuggingFaceModel::new(&config);
                    run_generate(&args, &config, model, engine, cli.quiet)
                }
            }
        }
        Command::Import { playlist, output } => {
            config.require_spotify_credentials()?;
            let catalog_path = output.unwrap_or_else(|| config.catalog_path.clone());
            let gateway = spotify_gateway(&config, catalog_path.clone());

            println!("Importing playlist {playlist}...");
            let count = gateway.import_playlist(&playlist)?;
            println!("✓ Saved {count} tracks to {}", catalog_path.display());
            Ok(())
        }
        Command::Ping => {
            config.require_spotify_credentials()?;
            let client = SpotifyClient::new(&config);
            println!("Testing API connection...");
            match client.ping() {
                Ok(who) => {
                    println!("✓ API connection successful ({who})");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ API connection failed: {e}");
                    Err(e.into())
                }
            }
        }
    }
}

fn spotify_gateway(config: &Config, catalog_path: PathBuf) -> SpotifyGateway {
    SpotifyGateway::new(
        JsonCatalog::new(catalog_path),
        SpotifyClient::new(config),
        config.public_playlists,
    )
}

fn run_generate<M: EmotionModel>(
    args: &GenerateArgs,
    config: &Config,
    model: M,
    engine: Arc<EngineConfig>,
    quiet: bool,
) -> Result<()> {
    let generator = MoodPlaylistGenerator::new(model, engine)?;
    if args.playlist.is_some() || !args.debug {
        config.require_spotify_credentials()?;
    }
    let gateway = spotify_gateway(config, config.catalog_path.clone());

    let request = PlaylistRequest {
        keywords: args.text.clone(),
        description: args.description.clone(),
        mood: args.mood.clone(),
        target_length: args.length,
        name: args.name.clone(),
    };

    let criteria = match &args.playlist {
        Some(playlist) => CandidateCriteria::RemotePlaylist(playlist.clone()),
        None => CandidateCriteria::LocalCatalog,
    };

    println!("Fetching candidate tracks...");
    let candidates = gateway.fetch_candidates(&criteria)?;
    println!("Fetched {} candidate tracks.", candidates.len());

    let generated = generator.generate_detailed(&request, &candidates)?;
    if let Some(path) = &args.emotions_out {
        match &generated.emotions {
            Some(scores) => {
                let map = EmotionClassifier::<M>::to_prediction_map(scores);
                std::fs::write(path, serde_json::to_string_pretty(&map)?)
                    .with_context(|| format!("Failed to write emotions to '{}'", path.display()))?;
                println!("Saved {} emotion scores to {}", map.len(), path.display());
            }
            None => println!("No text was classified - {} not written.", path.display()),
        }
    }

    let assembled = generated.assembled;
    print_report(&assembled, quiet);

    if let Some(warning) = &assembled.warning {
        println!(
            "⚠️ Only {}/{} tracks available after removing duplicates and capped artists",
            warning.available, warning.requested
        );
    }

    let draft = &assembled.draft;
    if args.debug {
        println!("\n🔍 DEBUG MODE: Playlist '{}' (would create via API)", draft.name);
        return Ok(());
    }
    if draft.is_empty() {
        println!("No tracks selected - skipping playlist creation.");
        return Err(anyhow::anyhow!("Playlist creation failed"));
    }

    println!("\n🎵 Creating playlist '{}' via API...", draft.name);
    match gateway.materialize_playlist(draft) {
        Ok(playlist_id) => {
            println!(
                "✓ Successfully created playlist '{}' with ID: {}",
                draft.name, playlist_id
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Failed to create playlist '{}': {}", draft.name, e);
            Err(e.into())
        }
    }
}

fn print_report(assembled: &AssembledPlaylist, brief: bool) {
    let draft = &assembled.draft;
    let metadata = &draft.metadata;

    println!("\n{}", draft.name);
    println!("{}", "=".repeat(draft.name.chars().count()));
    if let Some(description) = &draft.description {
        println!("{description}");
    }

    let (minutes, seconds) = metadata.duration_minutes_seconds();
    println!("\n📊 Playlist Details:");
    println!(
        "   Tracks: {} | Duration: {}m{}s | Avg Tempo: {:.1}",
        metadata.total_tracks, minutes, seconds, metadata.average_tempo
    );
    println!(
        "   Unique Artists: {} | Tempo Range: {}-{} | Avg Fit: {:.2}",
        metadata.artist_count, metadata.tempo_range.0, metadata.tempo_range.1, metadata.average_score
    );
    println!(
        "   Avg Valence: {:.2} | Avg Energy: {:.2}",
        metadata.average_valence, metadata.average_energy
    );

    if brief {
        return;
    }

    for (i, track) in draft.tracks.iter().enumerate() {
        println!(
            "     {}. \"{}\" by {} | Fit: {:.3} | Rank: {}",
            i + 1,
            track.track_name,
            track.artist_name,
            track.score,
            track.rank + 1
        );
        println!("        URI: {}", track.uri);
    }
}
