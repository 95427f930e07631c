use strata_store::{BlockCommit, ChainHead, Persistence, StateStore, WriteOp};
use strata_store_lmdb::LmdbPersistence;
use strata_types::{BlockHash, TxHash};

const MAP_SIZE: usize = 16 * 1024 * 1024;

fn commit_for(number: u64, previous: BlockHash) -> BlockCommit {
    BlockCommit {
        number,
        previous_hash: previous,
        hash: BlockHash::new([number as u8; 32]),
        encoded_block: vec![0xB0, number as u8],
        transactions: vec![TxHash::new([0xA0 + number as u8; 32])],
    }
}

#[test]
fn raw_roundtrip_and_batch() {
    let dir = tempfile::tempdir().unwrap();
    let db = LmdbPersistence::open(dir.path(), MAP_SIZE).unwrap();

    assert_eq!(db.raw_get(b"missing").unwrap(), None);
    db.raw_set(b"k", b"v").unwrap();
    assert_eq!(db.raw_get(b"k").unwrap(), Some(b"v".to_vec()));

    db.raw_commit_batch(vec![WriteOp::put("a", "1"), WriteOp::put("b", "2")])
        .unwrap();
    assert_eq!(db.raw_get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(db.len().unwrap(), 3);
}

#[test]
fn committed_blocks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let head = {
        let mut store = StateStore::new(LmdbPersistence::open(dir.path(), MAP_SIZE).unwrap(), 100);
        store.stage("currency.balances:aa", vec![9]);
        store.commit(commit_for(1, BlockHash::ZERO)).unwrap()
    };

    let store = StateStore::new(LmdbPersistence::open(dir.path(), MAP_SIZE).unwrap(), 100);
    assert_eq!(store.chain_head().unwrap(), head);
    assert_eq!(store.get("currency.balances:aa").unwrap(), Some(vec![9]));
    assert_eq!(store.load_block(1).unwrap(), Some(vec![0xB0, 1]));
    assert!(store
        .contains_transaction(&TxHash::new([0xA1; 32]))
        .unwrap());
}

#[test]
fn crash_before_commit_leaves_previous_block() {
    let dir = tempfile::tempdir().unwrap();
    let head = {
        let mut store = StateStore::new(LmdbPersistence::open(dir.path(), MAP_SIZE).unwrap(), 100);
        store.stage("c.v:x", vec![1]);
        let head = store.commit(commit_for(1, BlockHash::ZERO)).unwrap();

        // Stage the next block, then "crash" by dropping the store.
        store.stage("c.v:x", vec![2]);
        store.stage("c.v:y", vec![3]);
        head
    };

    let store = StateStore::new(LmdbPersistence::open(dir.path(), MAP_SIZE).unwrap(), 100);
    assert_eq!(store.chain_head().unwrap(), head);
    assert_eq!(store.get("c.v:x").unwrap(), Some(vec![1]));
    assert_eq!(store.get("c.v:y").unwrap(), None);
    assert_ne!(store.chain_head().unwrap(), ChainHead::EMPTY);
}
