use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use corpus::{Corpus, PersonId, SimilarityFeature};
use media::{MediaConfig, MediaLookup};
use rayon::prelude::*;
use recommender::{
    ArtifactPaths, DEFAULT_RECOMMENDATIONS, MovieDetails, Recommendation, Recommender,
    build_artifacts,
};
use similarity::DEFAULT_VOCABULARY_LIMIT;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// movie-recs - Content-based movie recommendations
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Content-based movie recommendations from the TMDB 5000 dataset", long_about = None)]
struct Cli {
    /// Directory holding the corpus snapshot and similarity matrices
    #[arg(short, long, global = true, default_value = "artifacts")]
    artifacts_dir: PathBuf,

    /// Never call the TMDB API; use the fallback image everywhere
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the corpus snapshot and similarity matrices from the CSV files
    Build {
        #[arg(long, default_value = "data/tmdb_5000_movies.csv")]
        movies: PathBuf,

        #[arg(long, default_value = "data/tmdb_5000_credits.csv")]
        credits: PathBuf,

        /// Feature to build a matrix for (repeatable; default: all)
        #[arg(long = "feature")]
        features: Vec<SimilarityFeature>,

        /// Maximum vocabulary size per feature
        #[arg(long, default_value_t = DEFAULT_VOCABULARY_LIMIT)]
        vocabulary_limit: usize,
    },

    /// Recommend movies similar to a title
    Recommend {
        /// Exact movie title
        #[arg(long)]
        title: String,

        #[arg(long, default_value_t = DEFAULT_RECOMMENDATIONS)]
        limit: usize,

        /// Which similarity matrix to rank with
        #[arg(long, default_value = "tags")]
        feature: SimilarityFeature,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the details of a movie
    Details {
        /// Exact movie title
        #[arg(long)]
        title: String,

        #[arg(long)]
        json: bool,
    },

    /// Show a cast member's profile image and biography
    Person {
        /// TMDB person id (see `details`)
        #[arg(long)]
        id: PersonId,
    },

    /// Search for movies by title
    Search {
        /// Case-insensitive substring of the title
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test query performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "4")]
        concurrent: usize,

        #[arg(long, default_value = "tags")]
        feature: SimilarityFeature,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            movies,
            credits,
            features,
            vocabulary_limit,
        } => handle_build(&cli.artifacts_dir, &movies, &credits, features, vocabulary_limit)?,
        Commands::Recommend {
            title,
            limit,
            feature,
            json,
        } => {
            let recommender = load_recommender(&cli.artifacts_dir, feature, cli.offline)?;
            handle_recommend(&recommender, &title, limit, json)?
        }
        Commands::Details { title, json } => {
            let recommender =
                load_recommender(&cli.artifacts_dir, SimilarityFeature::Tags, cli.offline)?;
            handle_details(&recommender, &title, json)?
        }
        Commands::Person { id } => handle_person(id, cli.offline)?,
        Commands::Search { title } => handle_search(&cli.artifacts_dir, &title)?,
        Commands::Benchmark {
            requests,
            concurrent,
            feature,
        } => {
            let recommender = load_recommender(&cli.artifacts_dir, feature, cli.offline)?;
            handle_benchmark(&recommender, requests, concurrent)?
        }
    }

    Ok(())
}

fn media_lookup(offline: bool) -> Result<MediaLookup> {
    let config = MediaConfig::from_env().context("Failed to read TMDB settings")?;
    MediaLookup::from_config(&config, offline).context("Failed to set up media lookups")
}

fn load_recommender(dir: &Path, feature: SimilarityFeature, offline: bool) -> Result<Recommender> {
    println!("Loading artifacts from {}...", dir.display());
    let start = Instant::now();
    let recommender = Recommender::load(dir, feature, media_lookup(offline)?).with_context(|| {
        format!(
            "Failed to load {} artifacts from {} (run `movie-recs build` first)",
            feature,
            dir.display()
        )
    })?;
    println!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        recommender.corpus().len(),
        start.elapsed()
    );
    Ok(recommender)
}

/// Handle the 'build' command
fn handle_build(
    out_dir: &Path,
    movies: &Path,
    credits: &Path,
    mut features: Vec<SimilarityFeature>,
    vocabulary_limit: usize,
) -> Result<()> {
    if features.is_empty() {
        features = SimilarityFeature::ALL.to_vec();
    }

    let start = Instant::now();
    let summary = build_artifacts(movies, credits, out_dir, &features, vocabulary_limit)
        .context("Failed to build artifacts")?;

    println!(
        "{} Built artifacts for {} movies in {:?}",
        "✓".green(),
        summary.movies,
        start.elapsed()
    );
    println!("  corpus hash: {}", summary.corpus_hash);
    for (feature, vocabulary) in &summary.features {
        println!(
            "  {} {} ({} terms)",
            "•".cyan(),
            ArtifactPaths::new(out_dir).matrix(*feature).display(),
            vocabulary
        );
    }
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(recommender: &Recommender, title: &str, limit: usize, json: bool) -> Result<()> {
    let recommendations = recommender
        .recommend(title, limit)
        .with_context(|| format!("No recommendations for {:?}", title))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        print_recommendations(title, &recommendations);
    }
    Ok(())
}

/// Handle the 'details' command
fn handle_details(recommender: &Recommender, title: &str, json: bool) -> Result<()> {
    let details = recommender
        .get_details(title)
        .with_context(|| format!("No details for {:?}", title))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        print_details(&details);
    }
    Ok(())
}

/// Handle the 'person' command
fn handle_person(person_id: PersonId, offline: bool) -> Result<()> {
    let profile = media_lookup(offline)?.fetch_person(person_id);

    println!("{}", format!("Person {}", person_id).bold().blue());
    println!("{}Profile: {}", "• ".green(), profile.profile_url);
    if profile.biography.is_empty() {
        println!("{}Biography: (none)", "• ".green());
    } else {
        println!("{}Biography: {}", "• ".green(), profile.biography);
    }
    Ok(())
}

/// Handle the 'search' command
///
/// Only needs the corpus snapshot, not a matrix or the media API.
fn handle_search(dir: &Path, query: &str) -> Result<()> {
    let corpus = Corpus::load_snapshot(&ArtifactPaths::new(dir).corpus())
        .context("Failed to load corpus snapshot (run `movie-recs build` first)")?;

    let matches = corpus.search_titles(query);

    println!("{}", format!("Search results for '{}':", query).bold().blue());
    if matches.is_empty() {
        println!("  (no matches)");
        return Ok(());
    }
    for record in matches.iter().take(20) {
        println!(
            "{}: {} [{}] {}",
            record.id,
            record.title,
            record.genres.join(", "),
            record.display.release_date
        );
    }
    Ok(())
}

/// Handle the 'benchmark' command
fn handle_benchmark(recommender: &Recommender, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }

    let records = recommender.corpus().records();
    let titles: Vec<&str> = (0..requests)
        .map(|_| records[rand::random::<u64>() as usize % records.len()].title.as_str())
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrent.max(1))
        .build()
        .context("Failed to build benchmark thread pool")?;

    let wall = Instant::now();
    let mut timings = pool.install(|| {
        titles
            .par_iter()
            .map(|title| -> Result<Duration> {
                let start = Instant::now();
                recommender.recommend(title, DEFAULT_RECOMMENDATIONS)?;
                Ok(start.elapsed())
            })
            .collect::<Result<Vec<Duration>>>()
    })?;
    let wall_time = wall.elapsed();

    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / wall_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Format and print recommendations
fn print_recommendations(title: &str, recommendations: &[Recommendation]) {
    println!("{}", format!("Movies similar to {}:", title).bold().blue());
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} - Score: {:.3}",
            (rank + 1).to_string().green(),
            rec.title,
            rec.score
        );
        println!("   {}", rec.poster_url.dimmed());
    }
}

fn print_details(details: &MovieDetails) {
    let unknown = || "?".to_string();

    println!("{}", details.title.bold().blue());
    println!("{}Poster: {}", "• ".green(), details.poster_url);
    println!("{}Released: {}", "• ".green(), details.release_date);
    println!("{}Genres: {}", "• ".green(), details.genres.join(", "));
    println!(
        "{}Runtime: {} min",
        "• ".green(),
        details.runtime.map(|r| r.to_string()).unwrap_or_else(unknown)
    );
    println!(
        "{}Rating: {} ({} votes)",
        "• ".green(),
        details.vote_average.map(|v| format!("{:.1}", v)).unwrap_or_else(unknown),
        details.vote_count.map(|v| v.to_string()).unwrap_or_else(unknown)
    );
    println!(
        "{}Budget: {} / Revenue: {}",
        "• ".cyan(),
        details.budget.map(|b| b.to_string()).unwrap_or_else(unknown),
        details.revenue.map(|r| r.to_string()).unwrap_or_else(unknown)
    );
    println!(
        "{}Languages: {}",
        "• ".cyan(),
        details.spoken_languages.join(", ")
    );
    if let Some(status) = &details.status {
        println!("{}Status: {}", "• ".cyan(), status);
    }
    if let Some(director) = &details.director {
        println!("{}Director: {}", "• ".cyan(), director);
    }
    println!("\n{}", details.overview);

    println!("\n{}", "Cast:".bold());
    for (name, id) in details.cast.iter().zip(&details.cast_ids).take(10) {
        println!("  - {} (id {})", name, id);
    }
}
