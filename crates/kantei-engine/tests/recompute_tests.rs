//! Integration tests for kantei-engine against the SQLite store

use kantei_domain::traits::{ArtisanQuery, ArtisanStore};
use kantei_domain::{ArtisanRecord, Domain, Grade, OwnershipEntry, PercentileService, ScoreKind, TierResolver};
use kantei_engine::{
    rank_domain, Cancellable, CancellationToken, EngineConfig, EngineError, RecomputeStatus, Recomputer,
};
use kantei_store::SqliteStore;
use std::cell::Cell;

struct CancelAfter(Cell<usize>);

impl Cancellable for CancelAfter {
    fn is_cancelled(&self) -> bool {
        let left = self.0.get();
        if left == 0 {
            return true;
        }
        self.0.set(left - 1);
        false
    }

    fn cancel(&self) {
        self.0.set(0);
    }
}

fn seeded_store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let artisans = [
        ("MAS-001", Domain::Smith, 29, 30, vec![("tokugawa-shogunate", 3), ("maeda", 2)]),
        ("KUN-002", Domain::Smith, 59, 93, vec![("imperial-family", 1), ("hosokawa-tadaoki", 4)]),
        ("SAD-003", Domain::Smith, 17, 75, vec![("some-collector", 6)]),
        ("KIY-004", Domain::Smith, 0, 12, vec![]),
        ("GOT-001", Domain::FittingMaker, 1, 1, vec![("oda-nobunaga", 1)]),
        ("NAT-002", Domain::FittingMaker, 5, 40, vec![("mitsui", 2), ("nbthk", 1)]),
    ];

    for (code, domain, elite, total, owners) in artisans {
        store
            .upsert_artisan(&ArtisanRecord::new(code, domain, elite, total))
            .unwrap();
        let entries: Vec<_> = owners
            .into_iter()
            .map(|(owner, count)| OwnershipEntry::new(owner, count))
            .collect();
        store.replace_ownership(code, &entries).unwrap();
    }
    store
}

fn snapshot(store: &SqliteStore) -> Vec<(Option<f64>, Option<f64>)> {
    store
        .list_codes(&ArtisanQuery::default())
        .unwrap()
        .iter()
        .map(|code| {
            let record = store.get_artisan(code).unwrap().unwrap();
            (record.elite_factor, record.provenance_factor())
        })
        .collect()
}

fn config(chunk_size: usize) -> EngineConfig {
    EngineConfig {
        chunk_size,
        ..EngineConfig::default()
    }
}

#[test]
fn test_full_recompute_on_sqlite() {
    let mut store = seeded_store();
    let mut recomputer = Recomputer::new(config(4), TierResolver::standard()).unwrap();

    let report = recomputer
        .recompute_all(&mut store, None, false, &CancellationToken::new())
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.written, 6);
    assert!(store.load_checkpoint().unwrap().is_none());

    let mas = store.get_artisan("MAS-001").unwrap().unwrap();
    assert_eq!(mas.elite_factor, Some(0.6388));
    let provenance = mas.provenance.unwrap();
    assert_eq!(provenance.n, 5);
    assert_eq!(provenance.apex, Some(9.0));
    // Strong owners lift the factor above the prior mean
    assert!(provenance.provenance_factor > 2.0);

    let kiy = store.get_artisan("KIY-004").unwrap().unwrap();
    assert_eq!(kiy.elite_factor, Some(0.0));
    assert_eq!(kiy.provenance_factor(), Some(1.26));
}

#[test]
fn test_batch_and_targeted_are_bit_identical() {
    let mut batch = seeded_store();
    let mut targeted = seeded_store();

    Recomputer::new(config(2), TierResolver::standard()).unwrap()
        .recompute_all(&mut batch, None, false, &CancellationToken::new())
        .unwrap();

    let codes = targeted.list_codes(&ArtisanQuery::default()).unwrap();
    let mut recomputer = Recomputer::default_config();
    for code in &codes {
        recomputer.recompute_one(&mut targeted, code).unwrap();
    }

    let bits = |rows: Vec<(Option<f64>, Option<f64>)>| {
        rows.into_iter()
            .map(|(e, p)| (e.map(f64::to_bits), p.map(f64::to_bits)))
            .collect::<Vec<_>>()
    };
    assert_eq!(bits(snapshot(&batch)), bits(snapshot(&targeted)));
}

#[test]
fn test_checkpoint_resume_matches_uninterrupted_run() {
    let mut baseline = seeded_store();
    Recomputer::new(config(2), TierResolver::standard()).unwrap()
        .recompute_all(&mut baseline, None, false, &CancellationToken::new())
        .unwrap();

    let mut store = seeded_store();
    let mut recomputer = Recomputer::new(config(2), TierResolver::standard()).unwrap();
    let first = recomputer
        .recompute_all(&mut store, None, false, &CancelAfter(Cell::new(3)))
        .unwrap();

    let RecomputeStatus::Interrupted { last_code: Some(last_code) } = &first.status else {
        panic!("expected an interrupted run, got {:?}", first.status);
    };
    let checkpoint = store.load_checkpoint().unwrap().unwrap();
    assert_eq!(&checkpoint.last_code, last_code);

    let second = recomputer
        .recompute_all(&mut store, None, true, &CancellationToken::new())
        .unwrap();

    assert!(second.is_complete());
    assert_eq!(first.written + second.written, 6);
    assert_eq!(snapshot(&store), snapshot(&baseline));
    assert!(store.load_checkpoint().unwrap().is_none());
}

#[test]
fn test_corrupted_counter_is_reported_not_written() {
    let mut store = seeded_store();
    store
        .upsert_artisan(&ArtisanRecord::new("BAD-999", Domain::Smith, 9, 3))
        .unwrap();

    let report = Recomputer::default_config()
        .recompute_all(&mut store, None, false, &CancellationToken::new())
        .unwrap();

    assert_eq!(report.written, 6);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].code, "BAD-999");
    assert!(store.get_artisan("BAD-999").unwrap().unwrap().elite_factor.is_none());
}

#[test]
fn test_rank_domain_from_store() {
    let mut store = seeded_store();
    Recomputer::default_config()
        .recompute_all(&mut store, None, false, &CancellationToken::new())
        .unwrap();

    let service = PercentileService::default();
    let smiths = rank_domain(&store, &service, Domain::Smith, ScoreKind::Elite).unwrap();

    assert_eq!(smiths.len(), 4);
    let best = &smiths.entries()[0];
    assert_eq!(best.code, "MAS-001");
    assert_eq!(best.rank, 1);
    assert_eq!(best.percentile, 100.0);
    assert_eq!(best.grade, Grade::S);
    assert_eq!(smiths.get("KIY-004").unwrap().percentile, 0.0);

    let fitting = rank_domain(&store, &service, Domain::FittingMaker, ScoreKind::Provenance).unwrap();
    assert_eq!(fitting.len(), 2);
    assert!(fitting.get("MAS-001").is_none());
}

#[test]
fn test_rank_reflects_targeted_recompute() {
    let mut store = seeded_store();
    let mut recomputer = Recomputer::default_config();
    recomputer
        .recompute_all(&mut store, None, false, &CancellationToken::new())
        .unwrap();

    let service = PercentileService::default();
    assert_eq!(rank_domain(&store, &service, Domain::Smith, ScoreKind::Elite).unwrap().len(), 4);

    store
        .upsert_artisan(&ArtisanRecord::new("NEW-005", Domain::Smith, 2, 2))
        .unwrap();
    // Not ranked until its scores exist
    assert_eq!(rank_domain(&store, &service, Domain::Smith, ScoreKind::Elite).unwrap().len(), 4);

    recomputer
        .recompute_codes(&mut store, &["NEW-005".to_string()])
        .unwrap();
    let smiths = rank_domain(&store, &service, Domain::Smith, ScoreKind::Elite).unwrap();
    assert_eq!(smiths.len(), 5);
    assert!(smiths.get("NEW-005").is_some());
}

#[test]
fn test_recompute_one_missing() {
    let mut store = seeded_store();
    let result = Recomputer::default_config().recompute_one(&mut store, "NOPE-000");
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}
