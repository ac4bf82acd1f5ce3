use chrono::{DateTime, Utc};
use mediacat_core::config::{AppConfig, MediaRoot};
use mediacat_core::enrichment::Enricher;
use mediacat_core::models::{MediaKey, MediaRecord, MediaType};
use mediacat_core::pipeline;
use mediacat_core::reconciler::Reconciler;
use mediacat_core::scanner::FileFilter;
use mediacat_core::store::{RecordStore, SqliteStore};
use providers::{Candidate, MetadataProvider, MovieDetails, ProviderError};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Knows exactly one movie and counts every search.
#[derive(Default)]
struct KnownMovies {
    searches: AtomicUsize,
}

#[async_trait::async_trait]
impl MetadataProvider for KnownMovies {
    async fn search(&self, title: &str) -> Result<Vec<Candidate>, ProviderError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if title == "The Matrix" {
            Ok(vec![Candidate {
                link: "/movie/603".into(),
                title: Some("The Matrix".into()),
            }])
        } else {
            Ok(vec![])
        }
    }

    async fn fetch_detail(&self, _candidate: &Candidate) -> Result<MovieDetails, ProviderError> {
        Ok(MovieDetails {
            description: "A hacker learns the truth.".into(),
            genres: vec!["Action".into(), "Science Fiction".into()],
            poster: Some("https://img.example/poster.jpg".into()),
            runtime_minutes: Some(136),
        })
    }

    fn name(&self) -> &'static str {
        "known-movies"
    }
}

/// Delegates to SQLite but refuses to save files whose name contains "broken".
struct FlakyStore {
    inner: SqliteStore,
}

#[async_trait::async_trait]
impl RecordStore for FlakyStore {
    async fn find_or_create(&self, key: &MediaKey) -> anyhow::Result<(MediaRecord, bool)> {
        self.inner.find_or_create(key).await
    }

    async fn save(&self, record: &mut MediaRecord) -> anyhow::Result<()> {
        if record.filename.contains("broken") {
            anyhow::bail!("disk full");
        }
        self.inner.save(record).await
    }

    async fn soft_delete_stale(&self, before: DateTime<Utc>) -> anyhow::Result<u64> {
        self.inner.soft_delete_stale(before).await
    }

    async fn exec(&self, statement: &str) -> anyhow::Result<u64> {
        self.inner.exec(statement).await
    }
}

/// Delegates to SQLite but every staleness sweep fails.
struct SweepFailsStore {
    inner: SqliteStore,
}

#[async_trait::async_trait]
impl RecordStore for SweepFailsStore {
    async fn find_or_create(&self, key: &MediaKey) -> anyhow::Result<(MediaRecord, bool)> {
        self.inner.find_or_create(key).await
    }

    async fn save(&self, record: &mut MediaRecord) -> anyhow::Result<()> {
        self.inner.save(record).await
    }

    async fn soft_delete_stale(&self, _before: DateTime<Utc>) -> anyhow::Result<u64> {
        anyhow::bail!("database is locked")
    }

    async fn exec(&self, statement: &str) -> anyhow::Result<u64> {
        self.inner.exec(statement).await
    }
}

fn filter() -> FileFilter {
    FileFilter::new(
        &["m4a".into(), "m4v".into(), "mp3".into(), "mp4".into()],
        &[],
        false,
    )
    .unwrap()
}

fn root(path: &Path) -> MediaRoot {
    MediaRoot::flat(path.to_string_lossy())
}

fn seed_library(dir: &Path) {
    fs::write(dir.join("The.Matrix.1999.mp4"), b"matrix").unwrap();
    fs::write(dir.join("Home.Video.2003.mp4"), b"home").unwrap();
    fs::write(dir.join("Show.Name.S02E10.m4v"), b"episode").unwrap();
    fs::write(dir.join("song.mp3"), b"la").unwrap();
    fs::write(dir.join("readme.txt"), b"not media").unwrap();
}

async fn active_count(store: &SqliteStore) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM media WHERE deleted_at IS NULL")
        .fetch_one(store.pool())
        .await
        .unwrap()
}

async fn by_name(store: &SqliteStore, filename: &str) -> MediaRecord {
    store
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.filename == filename)
        .unwrap_or_else(|| panic!("no record for {filename}"))
}

#[tokio::test]
async fn first_scan_classifies_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    seed_library(dir.path());
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let provider = Arc::new(KnownMovies::default());
    let enricher = Enricher::new(provider.clone(), Duration::from_secs(1));
    let filter = filter();

    let summary = Reconciler::new(&store, &enricher, &filter)
        .reconcile(&[root(dir.path())])
        .await;
    assert_eq!(summary.files_seen, 4);
    assert_eq!(summary.classified, 4);
    assert_eq!(summary.created, 4);
    assert_eq!(summary.failed, 0);
    assert_eq!(active_count(&store).await, 4);

    let movie = by_name(&store, "The.Matrix.1999.mp4").await;
    assert_eq!(movie.media_type, Some(MediaType::Movie));
    assert_eq!(movie.title.as_deref(), Some("The Matrix"));
    assert_eq!(movie.year, Some(1999));
    assert_eq!(movie.genres.as_deref(), Some("Action, Science Fiction"));
    assert_eq!(movie.runtime_minutes, Some(136));
    assert_eq!(movie.size, 6);
    assert_eq!(
        movie.path,
        dir.path().join("The.Matrix.1999.mp4").to_string_lossy()
    );

    let video = by_name(&store, "Home.Video.2003.mp4").await;
    assert_eq!(video.media_type, Some(MediaType::Video));
    assert_eq!(video.title.as_deref(), Some("Home Video"));
    assert_eq!(video.year, Some(2003));
    assert!(video.description.is_none());

    let episode = by_name(&store, "Show.Name.S02E10.m4v").await;
    assert_eq!(episode.media_type, Some(MediaType::TvShow));
    assert_eq!((episode.season, episode.episode), (Some(2), Some(10)));
    assert!(episode.title.is_none());

    let song = by_name(&store, "song.mp3").await;
    assert_eq!(song.media_type, Some(MediaType::Audio));
    assert!(song.title.is_none() && song.year.is_none());
    assert!(song.season.is_none() && song.episode.is_none());

    // Only the two feature files reached the provider.
    assert_eq!(provider.searches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn rescan_refreshes_without_duplicating_or_reclassifying() {
    let dir = tempfile::tempdir().unwrap();
    seed_library(dir.path());
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let provider = Arc::new(KnownMovies::default());
    let enricher = Enricher::new(provider.clone(), Duration::from_secs(1));
    let filter = filter();
    let reconciler = Reconciler::new(&store, &enricher, &filter);
    let roots = [root(dir.path())];

    reconciler.reconcile(&roots).await;
    let before = by_name(&store, "Home.Video.2003.mp4").await;

    // A manual correction must survive rescans.
    store
        .exec(&format!(
            "UPDATE media SET media_type = 'movie', title = 'Family Reunion' WHERE id = {}",
            before.id
        ))
        .await
        .unwrap();
    fs::write(dir.path().join("Home.Video.2003.mp4"), b"re-encoded home video").unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let summary = reconciler.reconcile(&roots).await;
    assert_eq!(summary.refreshed, 4);
    assert_eq!(summary.classified, 0);
    assert_eq!(active_count(&store).await, 4);
    assert_eq!(provider.searches.load(Ordering::SeqCst), 2);

    let after = by_name(&store, "Home.Video.2003.mp4").await;
    assert_eq!(after.id, before.id);
    assert_eq!(after.media_type, Some(MediaType::Movie));
    assert_eq!(after.title.as_deref(), Some("Family Reunion"));
    assert_eq!(after.size, 21);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn unreadable_root_is_skipped_and_scan_continues() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    let summary = Reconciler::new(&store, &enricher, &filter)
        .reconcile(&[root(&dir.path().join("missing")), root(dir.path())])
        .await;
    assert_eq!(summary.roots_skipped, 1);
    assert_eq!(summary.roots_scanned, 1);
    assert_eq!(active_count(&store).await, 1);
}

#[tokio::test]
async fn store_failure_only_affects_that_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.broken.mp4"), b"x").unwrap();
    fs::write(dir.path().join("b.fine.mp4"), b"x").unwrap();
    let store = FlakyStore {
        inner: SqliteStore::open("sqlite::memory:").await.unwrap(),
    };
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    let summary = Reconciler::new(&store, &enricher, &filter)
        .reconcile(&[root(dir.path())])
        .await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.classified, 1);
    let fine = by_name(&store.inner, "b.fine.mp4").await;
    assert_eq!(fine.media_type, Some(MediaType::Video));
}

#[tokio::test]
async fn files_removed_between_scans_are_swept() {
    let dir = tempfile::tempdir().unwrap();
    seed_library(dir.path());
    let mut config = AppConfig::default();
    config.scan.roots = vec![root(dir.path())];
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    let first = pipeline::run_scan_with(&config, &store, &enricher, &filter)
        .await
        .unwrap();
    assert_eq!(first.swept, 0);

    fs::remove_file(dir.path().join("song.mp3")).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = pipeline::run_scan_with(&config, &store, &enricher, &filter)
        .await
        .unwrap();
    assert_eq!(second.swept, 1);
    assert_eq!(active_count(&store).await, 3);
    assert!(store
        .list(None)
        .await
        .unwrap()
        .iter()
        .all(|r| r.filename != "song.mp3"));

    // Coming back later yields a fresh record.
    fs::write(dir.path().join("song.mp3"), b"la").unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let third = pipeline::run_scan_with(&config, &store, &enricher, &filter)
        .await
        .unwrap();
    assert_eq!(third.created, 1);
    assert_eq!(third.swept, 0);
    assert_eq!(active_count(&store).await, 4);
}

#[tokio::test]
async fn failed_sweep_keeps_stale_records_and_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    seed_library(dir.path());
    let mut config = AppConfig::default();
    config.scan.roots = vec![root(dir.path())];
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    pipeline::run_scan_with(&config, &store, &enricher, &filter)
        .await
        .unwrap();
    fs::remove_file(dir.path().join("song.mp3")).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let failing = SweepFailsStore {
        inner: store.clone(),
    };
    let summary = pipeline::run_scan_with(&config, &failing, &enricher, &filter)
        .await
        .unwrap();
    assert_eq!(summary.refreshed, 3);
    assert_eq!(summary.swept, 0);
    assert_eq!(active_count(&store).await, 4);
    assert_eq!(by_name(&store, "song.mp3").await.media_type, Some(MediaType::Audio));
}

#[tokio::test]
async fn no_configured_roots_leaves_catalog_untouched() {
    let dir = tempfile::tempdir().unwrap();
    seed_library(dir.path());
    let mut config = AppConfig::default();
    config.scan.roots = vec![root(dir.path())];
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    pipeline::run_scan_with(&config, &store, &enricher, &filter)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    config.scan.roots.clear();
    let summary = pipeline::run_scan_with(&config, &store, &enricher, &filter)
        .await
        .unwrap();
    assert_eq!(summary.roots_scanned, 0);
    assert_eq!(summary.roots_skipped, 0);
    assert_eq!(summary.swept, 0);
    assert_eq!(active_count(&store).await, 4);
}

#[tokio::test]
async fn untyped_leftover_is_classified_but_not_counted_as_created() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Home.Video.2003.mp4"), b"home").unwrap();
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    // Same shape a scan interrupted between insert and save leaves behind.
    let path = dir.path().join("Home.Video.2003.mp4");
    let key = MediaKey {
        path: path.to_string_lossy().into_owned(),
        filename: "Home.Video.2003.mp4".into(),
    };
    let (leftover, inserted) = store.find_or_create(&key).await.unwrap();
    assert!(inserted);
    assert!(leftover.media_type.is_none());

    let summary = Reconciler::new(&store, &enricher, &filter)
        .reconcile(&[root(dir.path())])
        .await;
    assert_eq!(summary.created, 0);
    assert_eq!(summary.classified, 1);
    let video = by_name(&store, "Home.Video.2003.mp4").await;
    assert_eq!(video.id, leftover.id);
    assert_eq!(video.media_type, Some(MediaType::Video));
}

#[tokio::test]
async fn shows_layout_records_show_title() {
    let dir = tempfile::tempdir().unwrap();
    let show = dir.path().join("The Expanse");
    fs::create_dir(&show).unwrap();
    fs::write(show.join("The.Expanse.S03E05.m4v"), b"x").unwrap();
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let enricher = Enricher::new(Arc::new(KnownMovies::default()), Duration::from_secs(1));
    let filter = filter();

    Reconciler::new(&store, &enricher, &filter)
        .reconcile(&[MediaRoot::shows(dir.path().to_string_lossy())])
        .await;
    let episode = by_name(&store, "The.Expanse.S03E05.m4v").await;
    assert_eq!(episode.media_type, Some(MediaType::TvShow));
    assert_eq!(episode.show_title.as_deref(), Some("The Expanse"));
    assert_eq!((episode.season, episode.episode), (Some(3), Some(5)));
}
