use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tagcache_tool::genre::{canonicalize_genres, load_genre_map};
use tagcache_tool::progress::{LogProgress, NoopProgress, ProgressSink};
use tagcache_tool::scan::LoftyReader;
use tagcache_tool::tcd::{write_database, IndexFile, Tag};
use tagcache_tool::validation::compare_databases;
use tagcache_tool::{inspect, BuildConfig, BuildPipeline};

#[derive(Parser, Debug)]
#[command(name = "tagcache-tool")]
#[command(about = "Build and edit player music databases", long_about = None)]
struct Args {
    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a fresh database from a directory of music files
    Build {
        /// Directory containing the music files to index
        music_dir: String,

        /// Path of the music directory as the device sees it (e.g. /Music)
        device_prefix: String,

        /// Directory receiving the database files
        output_db_dir: PathBuf,

        /// Genre hierarchy file for canonicalization
        #[arg(long)]
        genre_file: Option<PathBuf>,

        /// Worker count for tag extraction (default: logical core count)
        #[arg(long)]
        num_processes: Option<usize>,

        /// Suppress progress reporting
        #[arg(long)]
        no_progress: bool,

        /// Prior database directory to carry player state from
        #[arg(long)]
        old_db: Option<PathBuf>,

        /// Print database statistics after building
        #[arg(long)]
        stats: bool,
    },

    /// Canonicalize genres of an existing database
    Canonic {
        in_db_dir: PathBuf,
        out_db_dir: PathBuf,
        genre_file: PathBuf,

        /// Modify in memory only, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Roll-up threshold: subtrees smaller than this collapse upward
        #[arg(long, default_value = "5")]
        genre_count: usize,
    },

    /// Load a database and write it back out unchanged
    Copy {
        in_db_dir: PathBuf,
        out_db_dir: PathBuf,

        /// Compare the written files byte-for-byte with the originals
        #[arg(long)]
        compare: bool,
    },

    /// Print information about a database
    Inspect {
        db_dir: PathBuf,

        /// Header fields and entry counts (default)
        #[arg(long)]
        stats: bool,

        #[arg(long)]
        albums: bool,

        #[arg(long)]
        artists: bool,

        #[arg(long)]
        tracks: bool,

        #[arg(long)]
        genres: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let started = Instant::now();
    run(args.command)?;
    log::info!("finished in {:.2?}", started.elapsed());
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Build {
            music_dir,
            device_prefix,
            output_db_dir,
            genre_file,
            num_processes,
            no_progress,
            old_db,
            stats,
        } => {
            let music_dir = PathBuf::from(shellexpand::tilde(&music_dir).as_ref());

            let mut config = BuildConfig::new(music_dir, device_prefix, output_db_dir.clone());
            if let Some(genre_file) = genre_file {
                config = config.with_genre_file(genre_file, 0);
            }
            if let Some(old_db) = old_db {
                config = config.with_old_db(old_db);
            }
            if let Some(workers) = num_processes {
                config = config.with_workers(workers);
            }

            let progress: Box<dyn ProgressSink> = if no_progress {
                Box::new(NoopProgress)
            } else {
                Box::new(LogProgress)
            };

            let pipeline = BuildPipeline::new(config, LoftyReader::new());
            let report = pipeline.run(progress.as_ref())?;

            log::info!("indexed {} tracks", report.track_count);
            for (tag, count) in &report.tag_entry_counts {
                log::info!("  {:<16} {} entries", tag.name(), count);
            }
            if let Some(unmatched) = report.unmatched_carryover {
                log::info!("carry-over: {} unmatched records", unmatched);
            }

            if stats {
                let index = IndexFile::load_dir(&output_db_dir, None)
                    .context("Failed to reload database for --stats")?;
                inspect::print_stats(&index);
            }
            Ok(())
        }

        Command::Canonic {
            in_db_dir,
            out_db_dir,
            genre_file,
            dry_run,
            genre_count,
        } => {
            log::info!("loading database from {:?}", in_db_dir);
            let mut index = IndexFile::load_dir(&in_db_dir, None)
                .with_context(|| format!("Failed to load database from {:?}", in_db_dir))?;

            let map = load_genre_map(&genre_file, genre_count)
                .with_context(|| format!("Failed to load genre file: {:?}", genre_file))?;
            if map.is_empty() {
                anyhow::bail!("no genre mappings found in {:?}", genre_file);
            }

            let modified = canonicalize_genres(&mut index, &map)?;
            log::info!("canonicalized genres on {} of {} records", modified, index.len());

            if dry_run {
                log::info!("dry run: no changes written");
                return Ok(());
            }

            write_database(&mut index, &out_db_dir, true, None)
                .with_context(|| format!("Failed to write database to {:?}", out_db_dir))?;
            log::info!(
                "wrote {} records, {} genre entries",
                index.len(),
                index.tag_files.get(Tag::Genre).map(|f| f.len()).unwrap_or(0)
            );
            Ok(())
        }

        Command::Copy {
            in_db_dir,
            out_db_dir,
            compare,
        } => {
            log::info!("loading database from {:?}", in_db_dir);
            let mut index = IndexFile::load_dir(&in_db_dir, None)
                .with_context(|| format!("Failed to load database from {:?}", in_db_dir))?;
            log::info!("loaded {} records", index.len());

            // A pure copy: slots are integers straight from disk, so no
            // finalization pass is wanted.
            write_database(&mut index, &out_db_dir, false, None)
                .with_context(|| format!("Failed to write database to {:?}", out_db_dir))?;
            log::info!("database written to {:?}", out_db_dir);

            if compare {
                if compare_databases(&in_db_dir, &out_db_dir)? {
                    log::info!("all files match byte-for-byte");
                } else {
                    anyhow::bail!("written files differ from originals");
                }
            }
            Ok(())
        }

        Command::Inspect {
            db_dir,
            stats,
            albums,
            artists,
            tracks,
            genres,
        } => {
            let index = IndexFile::load_dir(&db_dir, None)
                .with_context(|| format!("Failed to load database from {:?}", db_dir))?;

            let any_listing = albums || artists || tracks || genres;
            if stats || !any_listing {
                inspect::print_stats(&index);
            }
            if artists {
                inspect::print_unique_values(&index, Tag::Artist);
            }
            if albums {
                inspect::print_unique_values(&index, Tag::Album);
            }
            if genres {
                inspect::print_unique_values(&index, Tag::Genre);
            }
            if tracks {
                inspect::print_tracks(&index);
            }
            Ok(())
        }
    }
}
