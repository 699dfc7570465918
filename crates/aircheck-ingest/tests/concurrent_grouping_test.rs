//! Concurrency properties of the catalog grouper.
//!
//! Overlapping inputs from parallel workers must never produce duplicate
//! works or recordings; the conflict-retry discipline, not locking, is
//! what these tests exercise.

use std::sync::Arc;

use aircheck_core::memory::MemoryCatalog;
use aircheck_core::ScannedTrack;
use aircheck_ingest::{CatalogGrouper, GrouperConfig};

fn track(artist: &str, title: &str, path: String) -> ScannedTrack {
    ScannedTrack {
        artist: artist.to_string(),
        title: title.to_string(),
        version_hint: None,
        duration_secs: None,
        path,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_workers_never_duplicate_works() {
    let catalog = MemoryCatalog::new();
    let grouper = Arc::new(CatalogGrouper::new(
        Arc::new(catalog.clone()),
        GrouperConfig::default(),
    ));

    // Eight workers, each scanning a different rip of the same song.
    let mut handles = Vec::new();
    for worker in 0..8 {
        let grouper = grouper.clone();
        handles.push(tokio::spawn(async move {
            grouper
                .group(&track(
                    "Great White",
                    "Once Bitten Twice Shy",
                    format!("/m/worker-{worker}.flac"),
                ))
                .await
        }));
    }

    let mut work_ids = Vec::new();
    let mut recording_ids = Vec::new();
    for handle in handles {
        let grouped = handle.await.unwrap().expect("grouping must absorb races");
        work_ids.push(grouped.work.id);
        recording_ids.push(grouped.recording.id);
    }

    // Every worker resolved to the same rows.
    assert!(work_ids.iter().all(|id| *id == work_ids[0]));
    assert!(recording_ids.iter().all(|id| *id == recording_ids[0]));
    assert_eq!(catalog.work_count(), 1);
    assert_eq!(catalog.recording_count(), 1);
    assert_eq!(catalog.file_count(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_workers_share_one_artist() {
    let catalog = MemoryCatalog::new();
    let grouper = Arc::new(CatalogGrouper::new(
        Arc::new(catalog.clone()),
        GrouperConfig::default(),
    ));

    // Different titles, same artist, racing on artist creation. Titles
    // are dissimilar enough that fuzzy folding stays out of the way.
    let titles = [
        "Enter Sandman",
        "Master of Puppets",
        "Fade to Black",
        "One",
        "Battery",
        "Orion",
        "The Unforgiven",
        "Whiplash",
    ];
    let mut handles = Vec::new();
    for (i, title) in titles.into_iter().enumerate() {
        let grouper = grouper.clone();
        handles.push(tokio::spawn(async move {
            grouper
                .group(&track(
                    "Metallica",
                    title,
                    format!("/m/metallica-{i}.flac"),
                ))
                .await
        }));
    }

    let mut artist_ids = Vec::new();
    for handle in handles {
        artist_ids.push(handle.await.unwrap().unwrap().artist.id);
    }

    assert!(artist_ids.iter().all(|id| *id == artist_ids[0]));
    assert_eq!(catalog.work_count(), 8);
}
