use ramhog_txinfo::txinfo::{CTxInfo, TxInfoKey, TxInfoStore, TxInfoType};

fn temp_db_path(name: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "ramhog_txinfo_integration_{name}_{}_{}.sqlite",
        std::process::id(),
        name.len()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn s2_write_once() {
    let path = temp_db_path("s2");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::WriteOnce, "bio");
    let (ok, _) = store.process("addrA", &CTxInfo::new(key.clone(), "first")).unwrap();
    assert!(ok);

    let (ok, reason) = store.process("addrA", &CTxInfo::new(key, "second")).unwrap();
    assert!(!ok);
    assert!(reason.contains("non-overwritable"));
}

#[test]
fn s3_uniqueness_across_addresses() {
    let path = temp_db_path("s3");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::Unique, "handle");
    let (ok, _) = store.process("addrA", &CTxInfo::new(key.clone(), "alice")).unwrap();
    assert!(ok);

    let (ok, reason) = store.process("addrB", &CTxInfo::new(key.clone(), "alice")).unwrap();
    assert!(!ok);
    assert!(reason.contains("Unique value"));

    let owner = store.unique_address_with_value(&key, "alice").unwrap();
    assert_eq!(owner, Some("addrA".to_string()));
}

#[test]
fn s4_undo_lifo_for_normal() {
    let path = temp_db_path("s4");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::Normal, "x");
    store.process("addrA", &CTxInfo::new(key.clone(), "1")).unwrap();
    store.process("addrA", &CTxInfo::new(key.clone(), "2")).unwrap();
    assert_eq!(store.get("addrA", &key).unwrap(), Some("2".to_string()));

    let (ok, _) = store.undo("addrA", &CTxInfo::new(key.clone(), "2")).unwrap();
    assert!(ok);
    assert_eq!(store.get("addrA", &key).unwrap(), Some("1".to_string()));

    let (ok, _) = store.undo("addrA", &CTxInfo::new(key.clone(), "1")).unwrap();
    assert!(ok);
    assert_eq!(store.get("addrA", &key).unwrap(), None);
}

#[test]
fn s5_undo_of_wrong_value() {
    let path = temp_db_path("s5");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::Normal, "x");
    store.process("addrA", &CTxInfo::new(key.clone(), "1")).unwrap();

    let (ok, reason) = store.undo("addrA", &CTxInfo::new(key, "2")).unwrap();
    assert!(!ok);
    assert_eq!(reason, "Nothing to undo");
}

#[test]
fn s6_transaction_rollback() {
    let path = temp_db_path("s6");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::Normal, "x");
    {
        let mut guard = store.begin_transaction().unwrap();
        guard.process("addrA", &CTxInfo::new(key.clone(), "1")).unwrap();
        guard.rollback().unwrap();
    }
    assert_eq!(store.get("addrA", &key).unwrap(), None);
}

#[test]
fn process_twice_then_undo_twice_returns_to_original_state() {
    let path = temp_db_path("round_trip");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::Normal, "x");
    assert_eq!(store.get("addrA", &key).unwrap(), None);

    store.process("addrA", &CTxInfo::new(key.clone(), "1")).unwrap();
    store.process("addrA", &CTxInfo::new(key.clone(), "2")).unwrap();

    store.undo("addrA", &CTxInfo::new(key.clone(), "2")).unwrap();
    store.undo("addrA", &CTxInfo::new(key.clone(), "1")).unwrap();

    assert_eq!(store.get("addrA", &key).unwrap(), None);
}

#[test]
fn at_most_one_latest_entry_per_address_key() {
    let path = temp_db_path("single_latest");
    let mut store = TxInfoStore::open(&path).unwrap();

    let key = TxInfoKey::new(TxInfoType::Normal, "x");
    for value in ["1", "2", "3", "4"] {
        store.process("addrA", &CTxInfo::new(key.clone(), value)).unwrap();
    }

    let matches = store.addresses_with_value(&key, "4").unwrap();
    assert_eq!(matches, vec!["addrA".to_string()]);
    for stale in ["1", "2", "3"] {
        assert!(store.addresses_with_value(&key, stale).unwrap().is_empty());
    }
}

#[test]
fn nested_transaction_is_an_invariant_violation() {
    // `store.begin_transaction()` a second time would not compile while
    // `guard` still holds the store's `&mut` borrow (E0499) — the only
    // reachable path to this rejection from safe code is through the
    // guard's own `DerefMut`, the same way `process`/`undo` reach the
    // store's other methods while a transaction is already open.
    let path = temp_db_path("nested");
    let mut store = TxInfoStore::open(&path).unwrap();

    let mut guard = store.begin_transaction().unwrap();
    assert!(guard.begin_transaction().is_err());
}
