use personstore_core::{
    CorruptEntryPolicy, HashBackend, HashPersonRepository, MemoryHashBackend, PageRequest,
    PaginationMode, PersonDraft, PersonRepository, RepoError, SqliteHashBackend, StoreConfig,
};
use std::collections::HashSet;

/// Sorts after every UUID in key order and is written last in creation order,
/// so it is the final entry on both backends.
const CORRUPT_FIELD: &str = "zz-corrupt";

fn repos() -> Vec<HashPersonRepository<Box<dyn HashBackend>>> {
    repos_with(CorruptEntryPolicy::Abort)
}

/// One repository per pagination mode and backend.
fn repos_with(
    corrupt_entries: CorruptEntryPolicy,
) -> Vec<HashPersonRepository<Box<dyn HashBackend>>> {
    let mut repos = Vec::new();
    for pagination in [PaginationMode::Ranged, PaginationMode::FullScan] {
        let config = StoreConfig {
            pagination,
            corrupt_entries,
            ..StoreConfig::default()
        };
        let memory: Box<dyn HashBackend> = Box::new(MemoryHashBackend::new());
        let sqlite: Box<dyn HashBackend> = Box::new(SqliteHashBackend::open_in_memory().unwrap());
        repos.push(HashPersonRepository::with_config(memory, &config));
        repos.push(HashPersonRepository::with_config(sqlite, &config));
    }
    repos
}

fn seed<R: PersonRepository>(repo: &R, count: i64) -> HashSet<String> {
    (0..count)
        .map(|age| repo.create_person(&PersonDraft::new("p", age)).unwrap().id)
        .collect()
}

#[test]
fn three_records_two_per_page() {
    for repo in repos() {
        seed(&repo, 3);
        assert_eq!(repo.list_persons(PageRequest::new(1, 2)).unwrap().len(), 2);
        assert_eq!(repo.list_persons(PageRequest::new(2, 2)).unwrap().len(), 1);
        assert!(repo.list_persons(PageRequest::new(3, 2)).unwrap().is_empty());
    }
}

#[test]
fn page_lengths_follow_formula() {
    for repo in repos() {
        let total: u64 = 7;
        seed(&repo, total as i64);
        for size in 1..=8u32 {
            for page in 1..=9u32 {
                let expected = u64::from(size)
                    .min(total.saturating_sub(u64::from(page - 1) * u64::from(size)));
                let actual = repo.list_persons(PageRequest::new(page, size)).unwrap().len();
                assert_eq!(actual as u64, expected, "page={page} size={size}");
            }
        }
    }
}

#[test]
fn pages_cover_every_record_exactly_once() {
    for repo in repos() {
        let ids = seed(&repo, 11);
        let size = 3u32;
        let mut seen = Vec::new();
        for page in 1..=4u32 {
            seen.extend(
                repo.list_persons(PageRequest::new(page, size))
                    .unwrap()
                    .into_iter()
                    .map(|person| person.id),
            );
        }
        assert_eq!(seen.len(), ids.len());
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), ids);
    }
}

#[test]
fn empty_collection_lists_nothing() {
    for repo in repos() {
        assert!(repo.list_persons(PageRequest::default()).unwrap().is_empty());
    }
}

#[test]
fn huge_page_number_is_empty_not_an_error() {
    for repo in repos() {
        seed(&repo, 2);
        assert!(repo
            .list_persons(PageRequest::new(u32::MAX, u32::MAX))
            .unwrap()
            .is_empty());
    }
}

#[test]
fn zero_page_or_size_is_rejected() {
    for repo in repos() {
        assert!(matches!(
            repo.list_persons(PageRequest::new(0, 10)).unwrap_err(),
            RepoError::Validation(_)
        ));
        assert!(matches!(
            repo.list_persons(PageRequest::new(1, 0)).unwrap_err(),
            RepoError::Validation(_)
        ));
    }
}

fn seed_with_corrupt_tail(repo: &HashPersonRepository<Box<dyn HashBackend>>) {
    seed(repo, 2);
    repo.backend()
        .hash_set(repo.collection(), CORRUPT_FIELD, "[]")
        .unwrap();
}

#[test]
fn corrupt_entry_outside_window_does_not_fail_page() {
    for repo in repos() {
        seed_with_corrupt_tail(&repo);

        assert_eq!(repo.list_persons(PageRequest::new(1, 2)).unwrap().len(), 2);
        let err = repo.list_persons(PageRequest::new(2, 2)).unwrap_err();
        assert!(
            matches!(err, RepoError::Serialization { id: Some(ref id), .. } if id == CORRUPT_FIELD)
        );
        assert!(repo.list_persons(PageRequest::new(1, 10)).is_err());
    }
}

#[test]
fn skip_policy_drops_corrupt_entry_from_page() {
    for repo in repos_with(CorruptEntryPolicy::Skip) {
        seed_with_corrupt_tail(&repo);

        let all = repo.list_persons(PageRequest::new(1, 10)).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|person| person.id != CORRUPT_FIELD));
        assert!(repo.list_persons(PageRequest::new(2, 2)).unwrap().is_empty());
        assert_eq!(repo.count_persons().unwrap(), 3);
    }
}
